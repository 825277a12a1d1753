//! Drives [`Feeds`] from Postgres change notifications.
//!
//! Statement-level triggers raise `readings_changed` / `personnel_changed`;
//! each notification re-queries only the collection it names.

use anyhow::Result;
use sqlx::{postgres::PgListener, PgPool};
use tracing::{debug, info, warn};

use super::{personnel, readings};
use crate::feeds::Feeds;

pub const READINGS_CHANNEL: &str = "readings_changed";
pub const PERSONNEL_CHANNEL: &str = "personnel_changed";

pub async fn refresh_readings(pool: &PgPool, feeds: &Feeds) -> Result<()> {
    let rows = readings::latest_per_device(pool).await?;
    debug!(devices = rows.len(), "Readings feed refreshed");
    feeds.readings.publish(rows);
    Ok(())
}

pub async fn refresh_personnel(pool: &PgPool, feeds: &Feeds) -> Result<()> {
    let rows = personnel::list(pool).await?;
    debug!(personnel = rows.len(), "Personnel feed refreshed");
    feeds.personnel.publish(rows);
    Ok(())
}

/// Loads both feeds, then keeps them current until the listener fails.
///
/// A dropped connection is re-established by `PgListener`; notifications
/// sent while it was down are lost, so both feeds are reloaded afterwards.
pub async fn run(pool: PgPool, feeds: Feeds) -> Result<()> {
    let mut listener = PgListener::connect_with(&pool).await?;
    listener
        .listen_all([READINGS_CHANNEL, PERSONNEL_CHANNEL])
        .await?;
    info!("Listening for collection changes");

    refresh_readings(&pool, &feeds).await?;
    refresh_personnel(&pool, &feeds).await?;

    loop {
        match listener.try_recv().await? {
            Some(notification) => match notification.channel() {
                READINGS_CHANNEL => refresh_readings(&pool, &feeds).await?,
                PERSONNEL_CHANNEL => refresh_personnel(&pool, &feeds).await?,
                other => debug!(channel = %other, "Ignoring notification"),
            },
            None => {
                warn!("Change listener connection lost; reloading feeds after reconnect");
                refresh_readings(&pool, &feeds).await?;
                refresh_personnel(&pool, &feeds).await?;
            }
        }
    }
}
