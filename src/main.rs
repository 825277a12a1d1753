use std::time::Duration;

use anyhow::Result;
use tokio::{net::TcpListener, signal, time};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smart_jacket_service::{
    api::{self, errors, AppState},
    config::Config,
    db::{self, listen},
    feeds::Feeds,
    status::{monitor, StatusMonitor},
};

const LISTENER_RETRY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent; env vars may be set externally)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    errors::expose_details(config.is_development());
    info!(environment = ?config.environment, "Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database ready");

    // Live feeds of latest readings and the personnel registry
    let feeds = Feeds::new();
    {
        let pool = pool.clone();
        let feeds = feeds.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = listen::run(pool.clone(), feeds.clone()).await {
                    error!(error = %e, "Change listener failed; retrying");
                }
                time::sleep(LISTENER_RETRY).await;
            }
        });
    }

    let (status_monitor, statuses) = StatusMonitor::new(&feeds);
    tokio::spawn(status_monitor.run());
    tokio::spawn(monitor::log_alerts(statuses.clone()));

    let state = AppState::new(pool, statuses)
        .with_api_token(config.api_token.clone())
        .with_stats_window(config.stats_window);
    if state.api_token.is_none() {
        info!("API_TOKEN not set; operator endpoints are open");
    }

    let app = api::router(state).layer(api::cors_layer(config.frontend_url.as_deref())?);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
