use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::info;

use crate::{
    api::{
        dto::{
            DeviceConfigRequest, DeviceConfigResponse, DeviceConfigSavedResponse,
            RawDeviceConfigResponse,
        },
        errors::ApiError,
        AppState,
    },
    db::{
        device_configs::{self, NewDeviceConfig},
        models::DeviceConfig,
    },
};

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl DeviceConfigRequest {
    fn into_new(self) -> Result<NewDeviceConfig, ApiError> {
        let device_id = filled(self.device_id)
            .ok_or_else(|| ApiError::validation("Missing fields", "device_id is required"))?;
        Ok(NewDeviceConfig {
            device_id,
            ssid: filled(self.ssid),
            password: filled(self.password),
            server_url: filled(self.server_url),
        })
    }
}

async fn find_config(state: &AppState, device_id: &str) -> Result<DeviceConfig, ApiError> {
    device_configs::find(&state.pool, device_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No configuration for this device"))
}

/// Create or replace the Wi-Fi/server settings a jacket boots with.
#[utoipa::path(
    post,
    path = "/api/device-config",
    request_body = DeviceConfigRequest,
    responses(
        (status = 200, description = "Configuration saved (password redacted)", body = DeviceConfigSavedResponse),
        (status = 400, description = "device_id missing"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "device-config"
)]
pub async fn save_device_config(
    State(state): State<AppState>,
    body: Result<Json<DeviceConfigRequest>, JsonRejection>,
) -> Result<Json<DeviceConfigSavedResponse>, ApiError> {
    let Json(req) = body?;
    let config = device_configs::upsert(&state.pool, &req.into_new()?).await?;

    info!(device_id = %config.device_id, "Device config saved");

    Ok(Json(DeviceConfigSavedResponse {
        success: true,
        message: "Configuration saved".to_owned(),
        config_id: config.id,
        data: config.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/device-config/{device_id}",
    params(("device_id" = String, Path, description = "Jacket identifier")),
    responses(
        (status = 200, description = "Configuration (password redacted)", body = DeviceConfigResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "No configuration for the device"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "device-config"
)]
pub async fn get_device_config(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceConfigResponse>, ApiError> {
    let config = find_config(&state, &device_id).await?;
    Ok(Json(DeviceConfigResponse {
        success: true,
        config: config.into(),
    }))
}

/// Device-facing: includes the Wi-Fi password.
#[utoipa::path(
    get,
    path = "/api/device-config/{device_id}/raw",
    params(("device_id" = String, Path, description = "Jacket identifier")),
    responses(
        (status = 200, description = "Configuration including password", body = RawDeviceConfigResponse),
        (status = 404, description = "No configuration for the device"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "device-config"
)]
pub async fn get_device_config_raw(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<RawDeviceConfigResponse>, ApiError> {
    let config = find_config(&state, &device_id).await?;
    Ok(Json(RawDeviceConfigResponse {
        success: true,
        config: config.into(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use sqlx::PgPool;

    use crate::api::{dto::REDACTED, handlers::tests::test_server};

    #[sqlx::test(migrations = "./migrations")]
    async fn save_then_read_redacted_and_raw(pool: PgPool) {
        let server = test_server(pool);
        let resp = server
            .post("/api/device-config")
            .json(&json!({
                "device_id": "JKT-1",
                "ssid": "station-wifi",
                "password": "hunter2",
                "server_url": "http://10.0.0.2:3000",
            }))
            .await;
        resp.assert_status_ok();
        let saved: Value = resp.json();
        assert_eq!(saved["success"], true);
        assert!(saved["config_id"].is_string());
        assert_eq!(saved["data"]["password"], REDACTED);

        let redacted: Value = server.get("/api/device-config/JKT-1").await.json();
        assert_eq!(redacted["config"]["ssid"], "station-wifi");
        assert_eq!(redacted["config"]["password"], REDACTED);

        let raw: Value = server.get("/api/device-config/JKT-1/raw").await.json();
        assert_eq!(raw["config"]["password"], "hunter2");
        assert_eq!(raw["config"]["server_url"], "http://10.0.0.2:3000");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn save_twice_updates_in_place(pool: PgPool) {
        let server = test_server(pool);
        let first: Value = server
            .post("/api/device-config")
            .json(&json!({ "device_id": "JKT-1", "ssid": "old", "password": "a" }))
            .await
            .json();
        let second: Value = server
            .post("/api/device-config")
            .json(&json!({ "device_id": "JKT-1", "ssid": "new" }))
            .await
            .json();

        assert_eq!(first["config_id"], second["config_id"]);

        let raw: Value = server.get("/api/device-config/JKT-1/raw").await.json();
        assert_eq!(raw["config"]["ssid"], "new");
        assert!(raw["config"]["password"].is_null());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn save_requires_device_id(pool: PgPool) {
        let server = test_server(pool);
        let resp = server
            .post("/api/device-config")
            .json(&json!({ "ssid": "station-wifi" }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert_eq!(body["error"], "Missing fields");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_device_is_404_on_both_views(pool: PgPool) {
        let server = test_server(pool);
        server
            .get("/api/device-config/nope")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get("/api/device-config/nope/raw")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
