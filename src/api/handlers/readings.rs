use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    api::{
        dto::{
            IngestResponse, LatestReadingResponse, ReadingsResponse, SensorPayload,
            StatsResponse,
        },
        errors::ApiError,
        AppState,
    },
    db::{
        models::ReadingSource,
        readings::{self, Order},
    },
    ingest,
    status,
};

pub const DEFAULT_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ReadingsParams {
    pub limit: Option<String>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub device_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeviceFilter {
    pub device_id: Option<String>,
}

/// Non-numeric or non-positive limits fall back to [`DEFAULT_LIMIT`].
fn parse_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_LIMIT)
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Store a reading sent directly by a jacket. Every numeric field must be a
/// JSON number; numeric strings are rejected.
#[utoipa::path(
    post,
    path = "/api/sensors",
    request_body = SensorPayload,
    responses(
        (status = 201, description = "Reading stored", body = IngestResponse),
        (status = 400, description = "Missing or non-numeric fields"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn receive_sensor_data(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    ingest_reading(&state, payload, ReadingSource::Http).await
}

/// Store a reading relayed from a Bluetooth link. Numeric fields are coerced
/// (`"36.5"` → 36.5, `""`/`null` → 0, `true` → 1).
#[utoipa::path(
    post,
    path = "/api/bluetooth",
    request_body = SensorPayload,
    responses(
        (status = 201, description = "Reading stored", body = IngestResponse),
        (status = 400, description = "Missing or non-numeric fields"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn receive_bluetooth_data(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    ingest_reading(&state, payload, ReadingSource::Bluetooth).await
}

async fn ingest_reading(
    state: &AppState,
    payload: Result<Json<Value>, JsonRejection>,
    source: ReadingSource,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let Json(payload) = payload?;

    let reading = ingest::normalize(&payload, source, Utc::now()).map_err(|rejection| {
        warn!(source = %source, error = %rejection, "Reading rejected");
        rejection
    })?;
    let stored = readings::insert(&state.pool, &reading).await?;

    info!(
        reading_id = %stored.id,
        device_id = %stored.device_id,
        source = %source,
        "Reading stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            success: true,
            message: "Reading saved".to_owned(),
            reading_id: stored.id,
            device_id: stored.device_id,
            source,
            timestamp: Utc::now(),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// List readings ordered by creation time (newest first unless
/// `orderBy=asc`), optionally for one device.
#[utoipa::path(
    get,
    path = "/api/readings",
    params(
        ("limit"     = Option<i64>,    Query, description = "Maximum rows (default 100)"),
        ("orderBy"   = Option<String>, Query, description = "`asc` or `desc` (default)"),
        ("device_id" = Option<String>, Query, description = "Only this device"),
    ),
    responses(
        (status = 200, description = "Readings", body = ReadingsResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn get_readings(
    State(state): State<AppState>,
    Query(params): Query<ReadingsParams>,
) -> Result<Json<ReadingsResponse>, ApiError> {
    let rows = readings::list(
        &state.pool,
        non_empty(&params.device_id),
        Order::parse(params.order_by.as_deref()),
        parse_limit(params.limit.as_deref()),
    )
    .await?;

    Ok(Json(ReadingsResponse {
        success: true,
        count: rows.len(),
        readings: rows.into_iter().map(Into::into).collect(),
    }))
}

/// The single most recent reading, overall or for one device.
#[utoipa::path(
    get,
    path = "/api/readings/latest",
    params(
        ("device_id" = Option<String>, Query, description = "Only this device"),
    ),
    responses(
        (status = 200, description = "Latest reading", body = LatestReadingResponse),
        (status = 404, description = "No readings"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn get_latest_reading(
    State(state): State<AppState>,
    Query(filter): Query<DeviceFilter>,
) -> Result<Json<LatestReadingResponse>, ApiError> {
    let reading = readings::latest(&state.pool, non_empty(&filter.device_id))
        .await?
        .ok_or_else(|| ApiError::not_found("No readings available"))?;

    Ok(Json(LatestReadingResponse {
        success: true,
        reading: reading.into(),
    }))
}

/// Count, latest reading and per-field means over the most recent window
/// of readings.
#[utoipa::path(
    get,
    path = "/api/readings/stats",
    responses(
        (status = 200, description = "Reading statistics", body = StatsResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn get_readings_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let window = state.stats_window;
    let limit = i64::try_from(window).unwrap_or(i64::MAX);
    let rows = readings::list(&state.pool, None, Order::Desc, limit).await?;

    Ok(Json(StatsResponse {
        success: true,
        stats: status::summarize(&rows, window).into(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use sqlx::PgPool;

    use super::*;
    use crate::api::handlers::tests::test_server;

    fn payload(device_id: &str, temp_object: f64) -> Value {
        json!({
            "mq2_raw": 400,
            "mq2_percent": 12.5,
            "temp_ambient": 26.0,
            "temp_object": temp_object,
            "pulse_raw": 84,
            "device_id": device_id,
        })
    }

    #[test]
    fn parse_limit_falls_back_to_default() {
        assert_eq!(parse_limit(None), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("abc")), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("0")), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("-4")), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("25")), 25);
    }

    // -----------------------------------------------------------------------
    // POST /api/sensors
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn sensors_stores_valid_reading(pool: PgPool) {
        let server = test_server(pool);
        let resp = server.post("/api/sensors").json(&payload("JKT-7", 36.4)).await;
        resp.assert_status(StatusCode::CREATED);

        let body: Value = resp.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["device_id"], "JKT-7");
        assert_eq!(body["source"], "http");
        assert!(body["reading_id"].is_string());
        assert!(body["timestamp"].is_string());

        let latest: Value = server.get("/api/readings/latest").await.json();
        assert_eq!(latest["reading"]["temp_object"], 36.4);
        assert_eq!(latest["reading"]["source"], "http");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sensors_defaults_device_id_to_unknown(pool: PgPool) {
        let server = test_server(pool);
        let mut p = payload("", 36.0);
        p.as_object_mut().unwrap().remove("device_id");

        let resp = server.post("/api/sensors").json(&p).await;
        resp.assert_status(StatusCode::CREATED);
        let body: Value = resp.json();
        assert_eq!(body["device_id"], "unknown");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sensors_missing_field_is_400_and_stores_nothing(pool: PgPool) {
        let server = test_server(pool);
        let mut p = payload("JKT-7", 36.0);
        p.as_object_mut().unwrap().remove("pulse_raw");

        let resp = server.post("/api/sensors").json(&p).await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing fields");
        assert!(body["message"].as_str().unwrap().contains("pulse_raw"));

        let list: Value = server.get("/api/readings").await.json();
        assert_eq!(list["count"], 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sensors_rejects_numeric_strings(pool: PgPool) {
        let server = test_server(pool);
        let mut p = payload("JKT-7", 36.0);
        p["temp_object"] = json!("36.0");

        let resp = server.post("/api/sensors").json(&p).await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert_eq!(body["error"], "Invalid type");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sensors_malformed_json_is_400_envelope(pool: PgPool) {
        let server = test_server(pool);
        let resp = server
            .post("/api/sensors")
            .content_type("application/json")
            .bytes("{not json".into())
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid body");
    }

    // -----------------------------------------------------------------------
    // POST /api/bluetooth
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn bluetooth_coerces_and_tags_source(pool: PgPool) {
        let server = test_server(pool);
        let p = json!({
            "mq2_raw": "400",
            "mq2_percent": "12.5",
            "temp_ambient": "26",
            "temp_object": "37.9",
            "pulse_raw": "88",
            "device_id": "BT-1",
        });

        let resp = server.post("/api/bluetooth").json(&p).await;
        resp.assert_status(StatusCode::CREATED);
        let body: Value = resp.json();
        assert_eq!(body["source"], "bluetooth");

        let latest: Value = server.get("/api/readings/latest?device_id=BT-1").await.json();
        assert_eq!(latest["reading"]["temp_object"], 37.9);
        assert_eq!(latest["reading"]["source"], "bluetooth");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn bluetooth_still_requires_all_fields(pool: PgPool) {
        let server = test_server(pool);
        let resp = server.post("/api/bluetooth").json(&json!({ "mq2_raw": 1 })).await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    // -----------------------------------------------------------------------
    // GET /api/readings
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn readings_default_newest_first_with_filter_and_limit(pool: PgPool) {
        let server = test_server(pool);
        for (device, temp) in [("a", 36.1), ("b", 36.2), ("a", 36.3)] {
            server
                .post("/api/sensors")
                .json(&payload(device, temp))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let all: Value = server.get("/api/readings").await.json();
        assert_eq!(all["success"], true);
        assert_eq!(all["count"], 3);
        assert_eq!(all["readings"][0]["temp_object"], 36.3);

        let asc: Value = server.get("/api/readings?orderBy=asc").await.json();
        assert_eq!(asc["readings"][0]["temp_object"], 36.1);

        let only_a: Value = server.get("/api/readings?device_id=a").await.json();
        assert_eq!(only_a["count"], 2);

        let limited: Value = server.get("/api/readings?limit=1").await.json();
        assert_eq!(limited["count"], 1);
    }

    // -----------------------------------------------------------------------
    // GET /api/readings/latest
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn latest_is_404_when_empty(pool: PgPool) {
        let server = test_server(pool);
        let resp = server.get("/api/readings/latest").await;
        resp.assert_status(StatusCode::NOT_FOUND);
        let body: Value = resp.json();
        assert_eq!(body["success"], false);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn latest_for_unknown_device_is_404(pool: PgPool) {
        let server = test_server(pool);
        server.post("/api/sensors").json(&payload("a", 36.0)).await;
        let resp = server.get("/api/readings/latest?device_id=zzz").await;
        resp.assert_status(StatusCode::NOT_FOUND);
    }

    // -----------------------------------------------------------------------
    // GET /api/readings/stats
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn stats_empty(pool: PgPool) {
        let server = test_server(pool);
        let body: Value = server.get("/api/readings/stats").await.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["stats"]["total"], 0);
        assert!(body["stats"]["latest"].is_null());
        assert!(body["stats"]["averages"].is_null());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stats_averages_over_readings(pool: PgPool) {
        let server = test_server(pool);
        server.post("/api/sensors").json(&payload("a", 36.0)).await;
        server.post("/api/sensors").json(&payload("b", 38.0)).await;

        let body: Value = server.get("/api/readings/stats").await.json();
        assert_eq!(body["stats"]["total"], 2);
        assert_eq!(body["stats"]["averages"]["temp_object"], 37.0);
        assert_eq!(body["stats"]["averages"]["pulse_raw"], 84.0);
        assert_eq!(body["stats"]["latest"]["device_id"], "b");
    }
}
