use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Mirrors the `reading_source` Postgres enum: the channel a reading arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reading_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    Http,
    Bluetooth,
}

impl fmt::Display for ReadingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReadingSource::Http => "http",
            ReadingSource::Bluetooth => "bluetooth",
        };
        f.write_str(s)
    }
}

/// One stored sensor sample. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Reading {
    pub id: Uuid,
    pub device_id: String,
    pub mq2_raw: f64,
    /// Gas concentration, 0–100.
    pub mq2_percent: f64,
    /// Degrees Celsius
    pub temp_ambient: f64,
    /// Degrees Celsius (body)
    pub temp_object: f64,
    pub pulse_raw: f64,
    pub source: ReadingSource,
    pub created_at: DateTime<Utc>,
}

/// Registry entry linking a person to a device.
///
/// `device_id` is a lookup key only; nothing guarantees a reading exists for
/// it, or that another entry does not carry the same one.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Personnel {
    pub id: Uuid,
    pub personnel_id: String,
    pub name: String,
    pub rank: String,
    pub unit: String,
    pub phone: Option<String>,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Personnel {
    /// Identifier shown to operators: the external personnel id, or the
    /// record id when none was assigned.
    pub fn display_id(&self) -> String {
        if self.personnel_id.is_empty() {
            self.id.to_string()
        } else {
            self.personnel_id.clone()
        }
    }
}

/// Remote network configuration for one device.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: Uuid,
    pub device_id: String,
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub server_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
