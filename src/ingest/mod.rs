//! Validation and shaping of raw sensor payloads into storable readings.
//!
//! The normalizer is transport-agnostic: it sees a JSON value and the
//! [`ReadingSource`] it arrived on, and either produces a [`NewReading`] or a
//! [`Rejection`]. Persisting the result is the caller's job.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::db::models::ReadingSource;

/// The five numeric channels every payload must carry, in reporting order.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "mq2_raw",
    "mq2_percent",
    "temp_ambient",
    "temp_object",
    "pulse_raw",
];

/// Device id stored when the payload does not name one.
pub const UNKNOWN_DEVICE: &str = "unknown";

// ---------------------------------------------------------------------------
// Coercion policy
// ---------------------------------------------------------------------------

/// How a channel treats non-number JSON values in the numeric fields.
///
/// | Channel   | Policy  | `36.6` | `"36.6"` | `""` | `true` | `null` |
/// |-----------|---------|--------|----------|------|--------|--------|
/// | HTTP      | Strict  | 36.6   | reject   | reject | reject | reject |
/// | Bluetooth | Lenient | 36.6   | 36.6     | 0    | 1      | 0      |
///
/// Non-finite results are rejected under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Strict,
    Lenient,
}

impl Coercion {
    pub fn for_source(source: ReadingSource) -> Self {
        match source {
            ReadingSource::Http => Self::Strict,
            ReadingSource::Bluetooth => Self::Lenient,
        }
    }

    fn coerce(self, value: &Value) -> Option<f64> {
        let n = match (self, value) {
            (_, Value::Number(n)) => n.as_f64(),
            (Self::Strict, _) => None,
            (Self::Lenient, Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    Some(0.0)
                } else {
                    s.parse::<f64>().ok()
                }
            }
            (Self::Lenient, Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            (Self::Lenient, Value::Null) => Some(0.0),
            (Self::Lenient, _) => None,
        };
        n.filter(|v| v.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A validated reading, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub device_id: String,
    pub mq2_raw: f64,
    pub mq2_percent: f64,
    pub temp_ambient: f64,
    pub temp_object: f64,
    pub pulse_raw: f64,
    pub source: ReadingSource,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("fields must be numbers: {}", .0.join(", "))]
    InvalidType(Vec<&'static str>),
}

impl Rejection {
    pub fn fields(&self) -> &[&'static str] {
        match self {
            Rejection::MissingFields(f) | Rejection::InvalidType(f) => f,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Validate `payload` under the policy of `source` and shape it into a
/// [`NewReading`] stamped with `received_at`.
///
/// Checks run in order: every required field present, then every required
/// field numeric under the channel's [`Coercion`]. The first failing check
/// reports all fields that fail it. A non-object payload has no fields.
pub fn normalize(
    payload: &Value,
    source: ReadingSource,
    received_at: DateTime<Utc>,
) -> Result<NewReading, Rejection> {
    let empty = Map::new();
    let fields = payload.as_object().unwrap_or(&empty);

    let missing: Vec<_> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|k| !fields.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        return Err(Rejection::MissingFields(missing));
    }

    let coercion = Coercion::for_source(source);
    let mut values = [0.0; REQUIRED_FIELDS.len()];
    let mut invalid = Vec::new();
    for (slot, key) in values.iter_mut().zip(REQUIRED_FIELDS) {
        match coercion.coerce(&fields[key]) {
            Some(v) => *slot = v,
            None => invalid.push(key),
        }
    }
    if !invalid.is_empty() {
        return Err(Rejection::InvalidType(invalid));
    }

    let [mq2_raw, mq2_percent, temp_ambient, temp_object, pulse_raw] = values;
    Ok(NewReading {
        device_id: device_id(fields.get("device_id")),
        mq2_raw,
        mq2_percent,
        temp_ambient,
        temp_object,
        pulse_raw,
        source,
        created_at: received_at,
    })
}

/// Absent, null, empty or otherwise falsy ids fall back to [`UNKNOWN_DEVICE`].
fn device_id(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => UNKNOWN_DEVICE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        "2025-03-01T10:00:00Z".parse().unwrap()
    }

    fn full_payload() -> Value {
        json!({
            "mq2_raw": 412,
            "mq2_percent": 10.5,
            "temp_ambient": 25.0,
            "temp_object": 36.6,
            "pulse_raw": 80,
            "device_id": "JKT-01"
        })
    }

    #[test]
    fn valid_http_payload_is_normalized() {
        let r = normalize(&full_payload(), ReadingSource::Http, now()).unwrap();
        assert_eq!(r.device_id, "JKT-01");
        assert_eq!(r.mq2_raw, 412.0);
        assert_eq!(r.mq2_percent, 10.5);
        assert_eq!(r.temp_ambient, 25.0);
        assert_eq!(r.temp_object, 36.6);
        assert_eq!(r.pulse_raw, 80.0);
        assert_eq!(r.source, ReadingSource::Http);
        assert_eq!(r.created_at, now());
    }

    #[test]
    fn absent_device_id_defaults_to_unknown() {
        let mut p = full_payload();
        p.as_object_mut().unwrap().remove("device_id");
        let r = normalize(&p, ReadingSource::Http, now()).unwrap();
        assert_eq!(r.device_id, UNKNOWN_DEVICE);
    }

    #[test]
    fn empty_or_null_device_id_defaults_to_unknown() {
        for id in [json!(""), Value::Null, json!(false), json!(0)] {
            let mut p = full_payload();
            p["device_id"] = id;
            let r = normalize(&p, ReadingSource::Http, now()).unwrap();
            assert_eq!(r.device_id, UNKNOWN_DEVICE);
        }
    }

    #[test]
    fn numeric_device_id_is_kept_as_text() {
        let mut p = full_payload();
        p["device_id"] = json!(17);
        let r = normalize(&p, ReadingSource::Http, now()).unwrap();
        assert_eq!(r.device_id, "17");
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let p = json!({ "mq2_raw": 1, "temp_object": 36.0 });
        let err = normalize(&p, ReadingSource::Http, now()).unwrap_err();
        assert_eq!(
            err,
            Rejection::MissingFields(vec!["mq2_percent", "temp_ambient", "pulse_raw"])
        );
    }

    #[test]
    fn missing_fields_rejected_on_bluetooth_too() {
        let mut p = full_payload();
        p.as_object_mut().unwrap().remove("pulse_raw");
        let err = normalize(&p, ReadingSource::Bluetooth, now()).unwrap_err();
        assert_eq!(err, Rejection::MissingFields(vec!["pulse_raw"]));
    }

    #[test]
    fn missing_check_runs_before_type_check() {
        let p = json!({
            "mq2_raw": "bad",
            "mq2_percent": 1,
            "temp_ambient": 1,
            "temp_object": 1
        });
        let err = normalize(&p, ReadingSource::Http, now()).unwrap_err();
        assert!(matches!(err, Rejection::MissingFields(_)));
    }

    #[test]
    fn non_object_payload_is_missing_everything() {
        let err = normalize(&json!([1, 2, 3]), ReadingSource::Http, now()).unwrap_err();
        assert_eq!(err.fields().len(), REQUIRED_FIELDS.len());
    }

    #[test]
    fn http_rejects_numeric_strings() {
        let mut p = full_payload();
        p["temp_object"] = json!("36.6");
        p["pulse_raw"] = json!(true);
        let err = normalize(&p, ReadingSource::Http, now()).unwrap_err();
        assert_eq!(err, Rejection::InvalidType(vec!["temp_object", "pulse_raw"]));
    }

    #[test]
    fn http_rejects_null_values() {
        let mut p = full_payload();
        p["mq2_raw"] = Value::Null;
        let err = normalize(&p, ReadingSource::Http, now()).unwrap_err();
        assert_eq!(err, Rejection::InvalidType(vec!["mq2_raw"]));
    }

    #[test]
    fn bluetooth_coerces_strings_bools_and_null() {
        let p = json!({
            "mq2_raw": " 300 ",
            "mq2_percent": "",
            "temp_ambient": true,
            "temp_object": "37.2",
            "pulse_raw": null
        });
        let r = normalize(&p, ReadingSource::Bluetooth, now()).unwrap();
        assert_eq!(r.mq2_raw, 300.0);
        assert_eq!(r.mq2_percent, 0.0);
        assert_eq!(r.temp_ambient, 1.0);
        assert_eq!(r.temp_object, 37.2);
        assert_eq!(r.pulse_raw, 0.0);
        assert_eq!(r.source, ReadingSource::Bluetooth);
        assert_eq!(r.device_id, UNKNOWN_DEVICE);
    }

    #[test]
    fn bluetooth_rejects_unparseable_and_non_finite() {
        let mut p = full_payload();
        p["mq2_raw"] = json!("abc");
        p["temp_object"] = json!("inf");
        p["pulse_raw"] = json!({ "bpm": 80 });
        let err = normalize(&p, ReadingSource::Bluetooth, now()).unwrap_err();
        assert_eq!(
            err,
            Rejection::InvalidType(vec!["mq2_raw", "temp_object", "pulse_raw"])
        );
    }

    #[test]
    fn rejection_message_lists_fields() {
        let err = Rejection::MissingFields(vec!["mq2_raw", "pulse_raw"]);
        assert_eq!(err.to_string(), "missing required fields: mq2_raw, pulse_raw");
    }

    #[test]
    fn coercion_policy_per_source() {
        assert_eq!(Coercion::for_source(ReadingSource::Http), Coercion::Strict);
        assert_eq!(
            Coercion::for_source(ReadingSource::Bluetooth),
            Coercion::Lenient
        );
    }
}
