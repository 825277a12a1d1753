use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::models::{DeviceConfig, Personnel, Reading, ReadingSource},
    status::{Alert, Averages, FleetSummary, PersonStatus, ReadingStats},
};

/// Stand-in for a stored password in operator-facing responses.
pub const REDACTED: &str = "***";

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Raw sensor payload. All five numeric fields are required; see the
/// endpoint description for how strictly each channel checks their type.
/// Handlers read the body as raw JSON, so this type only documents it.
#[derive(Debug, ToSchema)]
pub struct SensorPayload {
    pub mq2_raw: f64,
    pub mq2_percent: f64,
    pub temp_ambient: f64,
    pub temp_object: f64,
    pub pulse_raw: f64,
    /// Defaults to `"unknown"` when absent or empty.
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadingDto {
    pub id: Uuid,
    pub device_id: String,
    pub mq2_raw: f64,
    pub mq2_percent: f64,
    /// Degrees Celsius
    pub temp_ambient: f64,
    /// Degrees Celsius
    pub temp_object: f64,
    pub pulse_raw: f64,
    pub source: ReadingSource,
    pub created_at: DateTime<Utc>,
}

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            id: r.id,
            device_id: r.device_id,
            mq2_raw: r.mq2_raw,
            mq2_percent: r.mq2_percent,
            temp_ambient: r.temp_ambient,
            temp_object: r.temp_object,
            pulse_raw: r.pulse_raw,
            source: r.source,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub success: bool,
    pub message: String,
    pub reading_id: Uuid,
    pub device_id: String,
    pub source: ReadingSource,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingsResponse {
    pub success: bool,
    pub count: usize,
    pub readings: Vec<ReadingDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LatestReadingResponse {
    pub success: bool,
    pub reading: ReadingDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsDto {
    pub total: usize,
    pub latest: Option<ReadingDto>,
    pub averages: Option<Averages>,
}

impl From<ReadingStats> for StatsDto {
    fn from(s: ReadingStats) -> Self {
        Self {
            total: s.total,
            latest: s.latest.map(Into::into),
            averages: s.averages,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: StatsDto,
}

// ---------------------------------------------------------------------------
// Personnel
// ---------------------------------------------------------------------------

/// Request body for `POST /api/personnel`. Text fields also accept numbers
/// and booleans, stored in their JSON spelling (`7` → `"7"`).
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreatePersonnelRequest {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub rank: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub device_id: Option<String>,
    /// Generated as `P-<unix millis>` when absent.
    #[serde(default, deserialize_with = "scalar_string")]
    pub personnel_id: Option<String>,
}

/// Request body for `PUT /api/personnel/{id}`. Absent or empty fields are
/// left unchanged, except `phone`: a present `phone` key always overwrites,
/// and an empty or null value clears it.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePersonnelRequest {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub rank: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub device_id: Option<String>,
}

/// Accepts a string, number or boolean; `null` is `None`.
fn scalar_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(de::Error::custom("expected a string or number")),
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`).
fn present<'de, D>(d: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_string(d).map(Some)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PersonnelDto {
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

impl From<Personnel> for PersonnelDto {
    fn from(p: Personnel) -> Self {
        Self {
            id: p.id,
            personnel_id: p.personnel_id,
            name: p.name,
            rank: p.rank,
            unit: p.unit,
            phone: p.phone,
            device_id: p.device_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PersonnelCreatedResponse {
    pub success: bool,
    pub message: String,
    /// Record id, used in `PUT`/`DELETE` paths.
    pub personnel_id: Uuid,
    pub data: PersonnelDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PersonnelListResponse {
    pub success: bool,
    pub count: usize,
    pub personnel: Vec<PersonnelDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PersonnelResponse {
    pub success: bool,
    pub personnel: PersonnelDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Device config
// ---------------------------------------------------------------------------

/// Request body for `POST /api/device-config`. Fields accept numbers as
/// well as strings.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeviceConfigRequest {
    #[serde(default, deserialize_with = "scalar_string")]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub ssid: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub server_url: Option<String>,
}

/// Operator-facing view: the password is replaced by [`REDACTED`].
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceConfigDto {
    pub id: Uuid,
    pub device_id: String,
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub server_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeviceConfig> for DeviceConfigDto {
    fn from(c: DeviceConfig) -> Self {
        Self {
            id: c.id,
            device_id: c.device_id,
            ssid: c.ssid,
            password: c.password.map(|_| REDACTED.to_owned()),
            server_url: c.server_url,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Device-facing view, password included.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RawDeviceConfigDto {
    pub device_id: String,
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub server_url: Option<String>,
}

impl From<DeviceConfig> for RawDeviceConfigDto {
    fn from(c: DeviceConfig) -> Self {
        Self {
            device_id: c.device_id,
            ssid: c.ssid,
            password: c.password,
            server_url: c.server_url,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceConfigSavedResponse {
    pub success: bool,
    pub message: String,
    pub config_id: Uuid,
    pub data: DeviceConfigDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceConfigResponse {
    pub success: bool,
    pub config: DeviceConfigDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RawDeviceConfigResponse {
    pub success: bool,
    pub config: RawDeviceConfigDto,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub success: bool,
    pub count: usize,
    pub personnel: Vec<PersonStatus>,
}

impl StatusResponse {
    pub fn new(personnel: Vec<PersonStatus>) -> Self {
        Self {
            success: true,
            count: personnel.len(),
            personnel,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FleetSummaryResponse {
    pub success: bool,
    pub summary: FleetSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertsResponse {
    pub success: bool,
    pub count: usize,
    pub alerts: Vec<Alert>,
}
