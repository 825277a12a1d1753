use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{Personnel, Reading};

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Ordered by worseness, so `max` picks the worst tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Warning,
    Danger,
}

/// Upper bounds (inclusive) of the `normal` and `warning` tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warning_above: f64,
    pub danger_above: f64,
}

impl Thresholds {
    pub fn classify(&self, value: f64) -> Severity {
        if value > self.danger_above {
            Severity::Danger
        } else if value > self.warning_above {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}

// ---------------------------------------------------------------------------
// Vitals
// ---------------------------------------------------------------------------

/// The three readings channels that feed a person's status.
///
/// | Vital       | Field         | normal  | warning        | danger |
/// |-------------|---------------|---------|----------------|--------|
/// | Temperature | `temp_object` | ≤ 37.5  | 37.5 < v ≤ 39  | > 39   |
/// | HeartRate   | `pulse_raw`   | ≤ 100   | 100 < v ≤ 120  | > 120  |
/// | Gas         | `mq2_percent` | ≤ 25    | 25 < v ≤ 50    | > 50   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Vital {
    Temperature,
    HeartRate,
    Gas,
}

impl Vital {
    pub const ALL: [Vital; 3] = [Vital::Temperature, Vital::HeartRate, Vital::Gas];

    pub const fn thresholds(self) -> Thresholds {
        match self {
            Vital::Temperature => Thresholds {
                warning_above: 37.5,
                danger_above: 39.0,
            },
            Vital::HeartRate => Thresholds {
                warning_above: 100.0,
                danger_above: 120.0,
            },
            Vital::Gas => Thresholds {
                warning_above: 25.0,
                danger_above: 50.0,
            },
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Vital::Temperature => "°C",
            Vital::HeartRate => "bpm",
            Vital::Gas => "%",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Vital::Temperature => "body temperature",
            Vital::HeartRate => "heart rate",
            Vital::Gas => "gas level",
        }
    }

    pub fn value_of(self, reading: &Reading) -> f64 {
        match self {
            Vital::Temperature => reading.temp_object,
            Vital::HeartRate => reading.pulse_raw,
            Vital::Gas => reading.mq2_percent,
        }
    }

    pub fn classify(self, value: f64) -> Severity {
        self.thresholds().classify(value)
    }
}

// ---------------------------------------------------------------------------
// PersonStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VitalStatus {
    pub value: f64,
    pub unit: String,
    pub state: Severity,
}

impl VitalStatus {
    fn measure(vital: Vital, reading: &Reading) -> Self {
        let value = vital.value_of(reading);
        Self {
            value,
            unit: vital.unit().to_owned(),
            state: vital.classify(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VitalSigns {
    pub temperature: VitalStatus,
    pub heart_rate: VitalStatus,
    pub gas: VitalStatus,
}

impl VitalSigns {
    pub fn get(&self, vital: Vital) -> &VitalStatus {
        match vital {
            Vital::Temperature => &self.temperature,
            Vital::HeartRate => &self.heart_rate,
            Vital::Gas => &self.gas,
        }
    }

    /// Worst of the three sub-states.
    pub fn overall(&self) -> Severity {
        Vital::ALL
            .iter()
            .map(|v| self.get(*v).state)
            .max()
            .unwrap_or(Severity::Normal)
    }
}

/// Derived, never stored: one person's current state from their device's
/// latest reading.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PersonStatus {
    /// External personnel id, or the record id when none was assigned.
    pub id: String,
    pub record_id: Uuid,
    pub name: String,
    pub rank: String,
    pub unit: String,
    pub phone: Option<String>,
    pub device_id: String,
    pub status: Severity,
    pub last_reading_at: DateTime<Utc>,
    pub sensors: VitalSigns,
}

impl PersonStatus {
    pub fn new(person: &Personnel, reading: &Reading) -> Self {
        let sensors = VitalSigns {
            temperature: VitalStatus::measure(Vital::Temperature, reading),
            heart_rate: VitalStatus::measure(Vital::HeartRate, reading),
            gas: VitalStatus::measure(Vital::Gas, reading),
        };
        Self {
            id: person.display_id(),
            record_id: person.id,
            name: person.name.clone(),
            rank: person.rank.clone(),
            unit: person.unit.clone(),
            phone: person.phone.clone(),
            device_id: person.device_id.clone(),
            status: sensors.overall(),
            last_reading_at: reading.created_at,
            sensors,
        }
    }
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Latest reading per device id.
#[derive(Debug, Default)]
pub struct LatestReadings<'a> {
    by_device: HashMap<&'a str, &'a Reading>,
}

impl<'a> LatestReadings<'a> {
    /// Keeps the reading with the greatest `created_at` per device. On equal
    /// timestamps the one seen first wins.
    pub fn select(readings: &'a [Reading]) -> Self {
        let mut by_device: HashMap<&str, &Reading> = HashMap::new();
        for r in readings {
            by_device
                .entry(r.device_id.as_str())
                .and_modify(|current| {
                    if r.created_at > current.created_at {
                        *current = r;
                    }
                })
                .or_insert(r);
        }
        Self { by_device }
    }

    /// Absence is an ordinary outcome: the device has not reported yet, or
    /// the id belongs to nobody.
    pub fn for_device(&self, device_id: &str) -> Option<&'a Reading> {
        self.by_device.get(device_id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_device.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_device.is_empty()
    }
}

/// Join every person to the latest reading of their device and classify it.
///
/// People whose device has no reading are left out. Readings from devices
/// nobody is assigned to are ignored. Output follows `personnel` order.
pub fn classify(readings: &[Reading], personnel: &[Personnel]) -> Vec<PersonStatus> {
    let latest = LatestReadings::select(readings);
    personnel
        .iter()
        .filter_map(|p| {
            latest
                .for_device(&p.device_id)
                .map(|r| PersonStatus::new(p, r))
        })
        .collect()
}
