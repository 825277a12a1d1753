use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::warn;

use crate::{
    api::{
        dto::{AlertsResponse, FleetSummaryResponse, StatusResponse},
        errors::ApiError,
        AppState,
    },
    db::{personnel, readings},
    status::{self, PersonStatus},
};

/// Classify the store's current contents. Reads the newest reading per
/// device and the full registry concurrently; the two reads are not one
/// transaction.
async fn current_statuses(state: &AppState) -> Result<Vec<PersonStatus>, ApiError> {
    let (latest, registry) = tokio::try_join!(
        readings::latest_per_device(&state.pool),
        personnel::list(&state.pool),
    )?;
    Ok(status::classify(&latest, &registry))
}

/// One entry per person whose device has reported, in registry order.
#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Per-person status", body = StatusResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "status"
)]
pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    Ok(Json(StatusResponse::new(current_statuses(&state).await?)))
}

#[utoipa::path(
    get,
    path = "/api/status/summary",
    responses(
        (status = 200, description = "Head count per severity", body = FleetSummaryResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "status"
)]
pub async fn get_fleet_summary(
    State(state): State<AppState>,
) -> Result<Json<FleetSummaryResponse>, ApiError> {
    let statuses = current_statuses(&state).await?;
    Ok(Json(FleetSummaryResponse {
        success: true,
        summary: status::summarize_fleet(&statuses),
    }))
}

/// Every vital currently outside its normal range, danger first.
#[utoipa::path(
    get,
    path = "/api/alerts",
    responses(
        (status = 200, description = "Active alerts", body = AlertsResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "status"
)]
pub async fn get_alerts(State(state): State<AppState>) -> Result<Json<AlertsResponse>, ApiError> {
    let statuses = current_statuses(&state).await?;
    let alerts = status::alerts(&statuses);
    Ok(Json(AlertsResponse {
        success: true,
        count: alerts.len(),
        alerts,
    }))
}

/// Server-sent events: a `status` event with the full per-person list now
/// and after every change to readings or personnel.
#[utoipa::path(
    get,
    path = "/api/status/stream",
    responses(
        (status = 200, description = "Stream of `status` events", content_type = "text/event-stream", body = StatusResponse),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    tag = "status"
)]
pub async fn stream_status(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.statuses.clone()).filter_map(|snapshot| {
        match Event::default()
            .event("status")
            .json_data(StatusResponse::new(snapshot.to_vec()))
        {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                warn!(error = %e, "Failed to encode status event");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use sqlx::PgPool;

    use crate::api::handlers::tests::test_server;

    async fn register(server: &TestServer, name: &str, device_id: &str) {
        server
            .post("/api/personnel")
            .json(&json!({
                "name": name,
                "rank": "Firefighter",
                "unit": "Station 4",
                "device_id": device_id,
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    async fn report(server: &TestServer, device_id: &str, temp: f64, pulse: f64, gas: f64) {
        server
            .post("/api/sensors")
            .json(&json!({
                "mq2_raw": 300,
                "mq2_percent": gas,
                "temp_ambient": 25.0,
                "temp_object": temp,
                "pulse_raw": pulse,
                "device_id": device_id,
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn status_empty_without_data(pool: PgPool) {
        let server = test_server(pool);
        let body: Value = server.get("/api/status").await.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 0);
        assert_eq!(body["personnel"], json!([]));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn status_uses_latest_reading_and_skips_silent_devices(pool: PgPool) {
        let server = test_server(pool);
        register(&server, "Amal", "JKT-1").await;
        register(&server, "Omar", "JKT-2").await;
        report(&server, "JKT-1", 36.5, 80.0, 5.0).await;
        report(&server, "JKT-1", 38.0, 80.0, 5.0).await;
        report(&server, "ORPHAN", 41.0, 150.0, 90.0).await;

        let body: Value = server.get("/api/status").await.json();
        assert_eq!(body["count"], 1);

        let amal = &body["personnel"][0];
        assert_eq!(amal["name"], "Amal");
        assert_eq!(amal["device_id"], "JKT-1");
        assert_eq!(amal["status"], "warning");
        assert_eq!(amal["sensors"]["temperature"]["value"], 38.0);
        assert_eq!(amal["sensors"]["temperature"]["state"], "warning");
        assert_eq!(amal["sensors"]["heart_rate"]["state"], "normal");
        assert_eq!(amal["sensors"]["gas"]["unit"], "%");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn summary_counts_each_tier(pool: PgPool) {
        let server = test_server(pool);
        register(&server, "Amal", "JKT-1").await;
        register(&server, "Omar", "JKT-2").await;
        register(&server, "Lina", "JKT-3").await;
        report(&server, "JKT-1", 36.5, 80.0, 5.0).await;
        report(&server, "JKT-2", 36.5, 110.0, 5.0).await;
        report(&server, "JKT-3", 36.5, 80.0, 60.0).await;

        let body: Value = server.get("/api/status/summary").await.json();
        assert_eq!(
            body["summary"],
            json!({ "total": 3, "normal": 1, "warning": 1, "danger": 1 })
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn alerts_list_danger_before_warning(pool: PgPool) {
        let server = test_server(pool);
        register(&server, "Amal", "JKT-1").await;
        register(&server, "Omar", "JKT-2").await;
        report(&server, "JKT-1", 38.0, 80.0, 5.0).await;
        report(&server, "JKT-2", 36.5, 80.0, 55.0).await;

        let body: Value = server.get("/api/alerts").await.json();
        assert_eq!(body["count"], 2);
        assert_eq!(body["alerts"][0]["severity"], "danger");
        assert_eq!(body["alerts"][0]["type"], "gas");
        assert_eq!(body["alerts"][0]["person_name"], "Omar");
        assert_eq!(body["alerts"][1]["severity"], "warning");
        assert_eq!(body["alerts"][1]["type"], "temperature");
    }
}
