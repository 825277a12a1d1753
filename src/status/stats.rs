use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::Reading;

/// Arithmetic means over one window of readings.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Averages {
    pub mq2_percent: f64,
    pub temp_ambient: f64,
    pub temp_object: f64,
    pub pulse_raw: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingStats {
    pub total: usize,
    pub latest: Option<Reading>,
    pub averages: Option<Averages>,
}

/// Summarize the `window` most recent of `readings`.
///
/// Readings outside the window do not contribute. An empty window yields
/// zero, no latest reading and no averages.
pub fn summarize(readings: &[Reading], window: usize) -> ReadingStats {
    let mut recent: Vec<&Reading> = readings.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(window);

    let Some(latest) = recent.first() else {
        return ReadingStats {
            total: 0,
            latest: None,
            averages: None,
        };
    };

    let n = recent.len() as f64;
    let mean = |field: fn(&Reading) -> f64| recent.iter().map(|r| field(r)).sum::<f64>() / n;

    ReadingStats {
        total: recent.len(),
        latest: Some((*latest).clone()),
        averages: Some(Averages {
            mq2_percent: mean(|r| r.mq2_percent),
            temp_ambient: mean(|r| r.temp_ambient),
            temp_object: mean(|r| r.temp_object),
            pulse_raw: mean(|r| r.pulse_raw),
        }),
    }
}
