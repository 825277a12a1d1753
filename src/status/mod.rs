//! Sensor-to-personnel correlation, threshold classification and the
//! aggregates derived from it.

pub mod alerts;
pub mod classify;
pub mod monitor;
pub mod stats;

pub use alerts::{alerts, summarize_fleet, Alert, FleetSummary};
pub use classify::{classify, PersonStatus, Severity, Vital};
pub use monitor::{StatusMonitor, StatusSnapshot};
pub use stats::{summarize, Averages, ReadingStats};
