use std::str::FromStr;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Deployment mode. Only `Development` exposes store error details to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(anyhow::anyhow!("unknown environment: {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub environment: Environment,
    /// Exact origin allowed by CORS. `None` means any origin.
    pub frontend_url: Option<String>,
    /// Bearer token required on operator endpoints. `None` leaves them open.
    pub api_token: Option<String>,
    /// Number of most recent readings covered by `/api/readings/stats`.
    pub stats_window: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "3000")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            environment: optional("APP_ENV", "production")
                .parse()
                .context("APP_ENV must be 'development' or 'production'")?,
            frontend_url: non_empty("FRONTEND_URL"),
            api_token: non_empty("API_TOKEN"),
            stats_window: parse_window(&optional("STATS_WINDOW", "1000"))
                .context("STATS_WINDOW must be a positive integer")?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse_window(raw: &str) -> Result<usize> {
    let n: usize = raw.trim().parse()?;
    anyhow::ensure!(n > 0, "window must be greater than zero");
    Ok(n)
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
