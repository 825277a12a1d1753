use axum::{http::Uri, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::api::errors::ApiError;

const ENDPOINTS: &[(&str, &str)] = &[
    ("POST /api/sensors", "Receive a reading from a jacket"),
    ("POST /api/bluetooth", "Receive a reading relayed over Bluetooth"),
    ("GET /api/readings", "List readings"),
    ("GET /api/readings/latest", "Most recent reading"),
    ("GET /api/readings/stats", "Reading statistics"),
    ("POST /api/personnel", "Register personnel"),
    ("GET /api/personnel", "List personnel"),
    ("GET /api/personnel/device/{device_id}", "Personnel wearing a device"),
    ("PUT /api/personnel/{id}", "Update personnel"),
    ("DELETE /api/personnel/{id}", "Remove personnel"),
    ("POST /api/device-config", "Save a device configuration"),
    ("GET /api/device-config/{device_id}", "Device configuration (password redacted)"),
    ("GET /api/device-config/{device_id}/raw", "Device configuration for the device itself"),
    ("GET /api/status", "Per-person health status"),
    ("GET /api/status/summary", "Head count per severity"),
    ("GET /api/status/stream", "Live status as server-sent events"),
    ("GET /api/alerts", "Vitals outside their normal range"),
];

/// Service banner with the endpoint catalogue.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner")),
    tag = "system"
)]
pub async fn index() -> Json<Value> {
    let endpoints: serde_json::Map<String, Value> = ENDPOINTS
        .iter()
        .map(|(route, what)| ((*route).to_owned(), Value::from(*what)))
        .collect();

    Json(json!({
        "success": true,
        "message": "Smart Jacket Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    }))
}

/// Returns `200 OK` while the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy")),
    tag = "system"
)]
pub async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "healthy",
        "timestamp": Utc::now(),
    }))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route {} not found", uri.path()))
}
