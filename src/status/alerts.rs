use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::classify::{PersonStatus, Severity, Vital};

/// One vital of one person outside its normal range.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Alert {
    pub person_id: String,
    pub person_name: String,
    pub device_id: String,
    #[serde(rename = "type")]
    pub vital: Vital,
    pub severity: Severity,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Every non-normal vital across `statuses`, dangers first, then newest first.
pub fn alerts(statuses: &[PersonStatus]) -> Vec<Alert> {
    let mut out: Vec<Alert> = statuses
        .iter()
        .flat_map(|s| {
            Vital::ALL.into_iter().filter_map(move |vital| {
                let sensor = s.sensors.get(vital);
                (sensor.state != Severity::Normal).then(|| Alert {
                    person_id: s.id.clone(),
                    person_name: s.name.clone(),
                    device_id: s.device_id.clone(),
                    vital,
                    severity: sensor.state,
                    value: sensor.value,
                    timestamp: s.last_reading_at,
                    description: format!(
                        "{} {} at {}{}",
                        vital.label(),
                        match sensor.state {
                            Severity::Danger => "critical",
                            _ => "elevated",
                        },
                        sensor.value,
                        sensor.unit,
                    ),
                })
            })
        })
        .collect();

    out.sort_by_key(|a| (Reverse(a.severity), Reverse(a.timestamp)));
    out
}

/// Head count per overall severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FleetSummary {
    pub total: usize,
    pub normal: usize,
    pub warning: usize,
    pub danger: usize,
}

pub fn summarize_fleet(statuses: &[PersonStatus]) -> FleetSummary {
    statuses
        .iter()
        .fold(FleetSummary::default(), |mut acc, s| {
            acc.total += 1;
            match s.status {
                Severity::Normal => acc.normal += 1,
                Severity::Warning => acc.warning += 1,
                Severity::Danger => acc.danger += 1,
            }
            acc
        })
}
