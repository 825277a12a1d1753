use sqlx::PgPool;
use uuid::Uuid;

use super::models::DeviceConfig;

const COLUMNS: &str = "id, device_id, ssid, password, server_url, created_at, updated_at";

#[derive(Debug, Clone, PartialEq)]
pub struct NewDeviceConfig {
    pub device_id: String,
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub server_url: Option<String>,
}

/// Insert the config for `device_id`, or overwrite the existing one.
///
/// All three optional fields are replaced on update, so omitting one clears
/// it. `created_at` survives updates.
pub async fn upsert(pool: &PgPool, config: &NewDeviceConfig) -> sqlx::Result<DeviceConfig> {
    sqlx::query_as::<_, DeviceConfig>(&format!(
        "INSERT INTO device_configs (id, device_id, ssid, password, server_url) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (device_id) DO UPDATE SET \
             ssid       = EXCLUDED.ssid, \
             password   = EXCLUDED.password, \
             server_url = EXCLUDED.server_url, \
             updated_at = now() \
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&config.device_id)
    .bind(&config.ssid)
    .bind(&config.password)
    .bind(&config.server_url)
    .fetch_one(pool)
    .await
}

pub async fn find(pool: &PgPool, device_id: &str) -> sqlx::Result<Option<DeviceConfig>> {
    sqlx::query_as::<_, DeviceConfig>(&format!(
        "SELECT {COLUMNS} FROM device_configs WHERE device_id = $1"
    ))
    .bind(device_id)
    .fetch_optional(pool)
    .await
}
