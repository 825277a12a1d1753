use std::{
    collections::HashSet,
    sync::Arc,
};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    alerts::{alerts, Alert},
    classify::{classify, PersonStatus, Severity, Vital},
};
use crate::{
    db::models::{Personnel, Reading},
    feeds::Feeds,
};

pub type StatusSnapshot = Arc<Vec<PersonStatus>>;

/// Recomputes per-person status whenever either feed changes.
///
/// Each recomputation reads both feeds' current snapshots; the two are not
/// read atomically.
pub struct StatusMonitor {
    readings: watch::Receiver<Arc<Vec<Reading>>>,
    personnel: watch::Receiver<Arc<Vec<Personnel>>>,
    tx: watch::Sender<StatusSnapshot>,
}

impl StatusMonitor {
    /// Builds the monitor and its output channel. The channel starts out
    /// holding the classification of the feeds' current snapshots, so the
    /// returned receiver only reports changes made after this call.
    pub fn new(feeds: &Feeds) -> (Self, watch::Receiver<StatusSnapshot>) {
        let mut readings = feeds.readings.subscribe();
        let mut personnel = feeds.personnel.subscribe();
        let initial = current(&mut readings, &mut personnel);

        let (tx, rx) = watch::channel(initial);
        let monitor = Self {
            readings,
            personnel,
            tx,
        };
        (monitor, rx)
    }

    /// Runs until both feeds are closed. Spawn this via `tokio::spawn`.
    pub async fn run(mut self) {
        info!("Status monitor started");
        let mut readings_open = true;
        let mut personnel_open = true;

        while readings_open || personnel_open {
            tokio::select! {
                changed = self.readings.changed(), if readings_open => {
                    if changed.is_err() {
                        readings_open = false;
                        continue;
                    }
                }
                changed = self.personnel.changed(), if personnel_open => {
                    if changed.is_err() {
                        personnel_open = false;
                        continue;
                    }
                }
            }
            self.recompute();
        }

        info!("Status monitor stopped: feeds closed");
    }

    fn recompute(&mut self) {
        let statuses = current(&mut self.readings, &mut self.personnel);
        self.tx.send_replace(statuses);
    }
}

fn current(
    readings: &mut watch::Receiver<Arc<Vec<Reading>>>,
    personnel: &mut watch::Receiver<Arc<Vec<Personnel>>>,
) -> StatusSnapshot {
    let readings = Arc::clone(&readings.borrow_and_update());
    let personnel = Arc::clone(&personnel.borrow_and_update());

    let statuses = classify(&readings, &personnel);
    debug!(
        readings = readings.len(),
        personnel = personnel.len(),
        statuses = statuses.len(),
        "Person status recomputed"
    );
    Arc::new(statuses)
}

/// An alert stays the same alert while the person's vital remains in the
/// same tier, however many readings arrive in between.
type AlertKey = (String, Vital, Severity);

/// Logs every alert that was not present in the previous status snapshot.
/// Returns once the monitor is gone.
pub async fn log_alerts(mut rx: watch::Receiver<StatusSnapshot>) {
    let mut active: HashSet<AlertKey> = HashSet::new();

    loop {
        let current = Arc::clone(&rx.borrow_and_update());
        let (raised, now_active) = new_alerts(&current, &active);
        for alert in raised {
            warn!(
                person_id = %alert.person_id,
                person = %alert.person_name,
                device_id = %alert.device_id,
                severity = ?alert.severity,
                value = alert.value,
                "{}",
                alert.description
            );
        }
        active = now_active;

        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Splits the snapshot's alerts into those not in `active`, and the full
/// set of keys active now.
fn new_alerts(
    statuses: &[PersonStatus],
    active: &HashSet<AlertKey>,
) -> (Vec<Alert>, HashSet<AlertKey>) {
    let mut raised = Vec::new();
    let mut now_active = HashSet::new();
    for alert in alerts(statuses) {
        let key = (alert.person_id.clone(), alert.vital, alert.severity);
        if !active.contains(&key) {
            raised.push(alert);
        }
        now_active.insert(key);
    }
    (raised, now_active)
}
