pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{auth, status::StatusSnapshot};
use handlers::{device_config, personnel, readings, status, system, ApiDoc};

pub const DEFAULT_STATS_WINDOW: usize = 1000;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Output of the status monitor, streamed to dashboards.
    pub statuses: watch::Receiver<StatusSnapshot>,
    pub api_token: Option<Arc<str>>,
    pub stats_window: usize,
}

impl AppState {
    pub fn new(pool: PgPool, statuses: watch::Receiver<StatusSnapshot>) -> Self {
        Self {
            pool,
            statuses,
            api_token: None,
            stats_window: DEFAULT_STATS_WINDOW,
        }
    }

    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token.map(Arc::from);
        self
    }

    pub fn with_stats_window(mut self, window: usize) -> Self {
        self.stats_window = window;
        self
    }
}

pub fn router(state: AppState) -> Router {
    // Dashboard/operator surface; devices only use the open routes below.
    let operator = OpenApiRouter::new()
        .route("/api/readings", get(readings::get_readings))
        .route("/api/readings/latest", get(readings::get_latest_reading))
        .route("/api/readings/stats", get(readings::get_readings_stats))
        .route(
            "/api/personnel",
            post(personnel::add_personnel).get(personnel::list_personnel),
        )
        .route(
            "/api/personnel/device/{device_id}",
            get(personnel::get_personnel_by_device),
        )
        .route(
            "/api/personnel/{id}",
            put(personnel::update_personnel).delete(personnel::delete_personnel),
        )
        .route("/api/device-config", post(device_config::save_device_config))
        .route(
            "/api/device-config/{device_id}",
            get(device_config::get_device_config),
        )
        .route("/api/status", get(status::get_status))
        .route("/api/status/summary", get(status::get_fleet_summary))
        .route("/api/status/stream", get(status::stream_status))
        .route("/api/alerts", get(status::get_alerts))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/api/sensors", post(readings::receive_sensor_data))
        .route("/api/bluetooth", post(readings::receive_bluetooth_data))
        .route(
            "/api/device-config/{device_id}/raw",
            get(device_config::get_device_config_raw),
        )
        .merge(operator)
        .with_state(state)
        .split_for_parts();

    router
        .route("/", get(system::index))
        .route("/health", get(system::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .fallback(system::not_found)
        .layer(TraceLayer::new_for_http())
}

/// Exact-origin CORS with credentials when `frontend_url` is set, any origin
/// otherwise.
pub fn cors_layer(frontend_url: Option<&str>) -> Result<CorsLayer> {
    let Some(origin) = frontend_url else {
        return Ok(CorsLayer::permissive());
    };
    let origin = HeaderValue::from_str(origin)
        .with_context(|| format!("FRONTEND_URL is not a valid origin: {origin:?}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}
