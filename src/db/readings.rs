use sqlx::PgPool;
use uuid::Uuid;

use super::models::Reading;
use crate::ingest::NewReading;

const COLUMNS: &str = "id, device_id, mq2_raw, mq2_percent, temp_ambient, temp_object, \
                       pulse_raw, source, created_at";

/// Sort direction on `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Order {
    /// Anything other than `"asc"` sorts newest first.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

pub async fn insert(pool: &PgPool, reading: &NewReading) -> sqlx::Result<Reading> {
    sqlx::query_as::<_, Reading>(&format!(
        "INSERT INTO readings \
             (id, device_id, mq2_raw, mq2_percent, temp_ambient, temp_object, pulse_raw, source, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&reading.device_id)
    .bind(reading.mq2_raw)
    .bind(reading.mq2_percent)
    .bind(reading.temp_ambient)
    .bind(reading.temp_object)
    .bind(reading.pulse_raw)
    .bind(reading.source)
    .bind(reading.created_at)
    .fetch_one(pool)
    .await
}

/// Up to `limit` readings ordered by `created_at`, optionally for one device.
/// Readings sharing a timestamp keep insertion order in either direction.
pub async fn list(
    pool: &PgPool,
    device_id: Option<&str>,
    order: Order,
    limit: i64,
) -> sqlx::Result<Vec<Reading>> {
    sqlx::query_as::<_, Reading>(&format!(
        "SELECT {COLUMNS} FROM readings \
         WHERE ($1::text IS NULL OR device_id = $1) \
         ORDER BY created_at {dir}, seq ASC \
         LIMIT $2",
        dir = order.sql(),
    ))
    .bind(device_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn latest(pool: &PgPool, device_id: Option<&str>) -> sqlx::Result<Option<Reading>> {
    Ok(list(pool, device_id, Order::Desc, 1).await?.into_iter().next())
}

/// The most recent reading of every device; on a timestamp tie the one
/// stored first. Reads the `latest_readings` index table, so the cost grows
/// with the number of devices rather than with the history.
pub async fn latest_per_device(pool: &PgPool) -> sqlx::Result<Vec<Reading>> {
    sqlx::query_as::<_, Reading>(&format!(
        "SELECT {COLUMNS} FROM readings \
         WHERE id IN (SELECT reading_id FROM latest_readings) \
         ORDER BY device_id"
    ))
    .fetch_all(pool)
    .await
}
