pub mod device_config;
pub mod personnel;
pub mod readings;
pub mod status;
pub mod system;

use utoipa::OpenApi;

use super::dto::{
    AlertsResponse, CreatePersonnelRequest, DeviceConfigDto, DeviceConfigRequest,
    DeviceConfigResponse, DeviceConfigSavedResponse, FleetSummaryResponse, IngestResponse,
    LatestReadingResponse, MessageResponse, PersonnelCreatedResponse, PersonnelDto,
    PersonnelListResponse, PersonnelResponse, RawDeviceConfigDto, RawDeviceConfigResponse,
    ReadingDto, ReadingsResponse, SensorPayload, StatsDto, StatsResponse, StatusResponse,
    UpdatePersonnelRequest,
};
use crate::{
    db::models::ReadingSource,
    status::{
        classify::{VitalSigns, VitalStatus},
        Alert, Averages, FleetSummary, PersonStatus, Severity, Vital,
    },
};

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        readings::receive_sensor_data,
        readings::receive_bluetooth_data,
        readings::get_readings,
        readings::get_latest_reading,
        readings::get_readings_stats,
        personnel::add_personnel,
        personnel::list_personnel,
        personnel::get_personnel_by_device,
        personnel::update_personnel,
        personnel::delete_personnel,
        device_config::save_device_config,
        device_config::get_device_config,
        device_config::get_device_config_raw,
        status::get_status,
        status::get_fleet_summary,
        status::get_alerts,
        status::stream_status,
        system::index,
        system::health,
    ),
    components(schemas(
        SensorPayload, ReadingSource, ReadingDto, IngestResponse, ReadingsResponse,
        LatestReadingResponse, Averages, StatsDto, StatsResponse,
        CreatePersonnelRequest, UpdatePersonnelRequest, PersonnelDto,
        PersonnelCreatedResponse, PersonnelListResponse, PersonnelResponse, MessageResponse,
        DeviceConfigRequest, DeviceConfigDto, RawDeviceConfigDto, DeviceConfigSavedResponse,
        DeviceConfigResponse, RawDeviceConfigResponse,
        Severity, Vital, VitalStatus, VitalSigns, PersonStatus, StatusResponse,
        FleetSummary, FleetSummaryResponse, Alert, AlertsResponse,
    )),
    tags(
        (name = "readings",      description = "Sensor ingestion and reading queries"),
        (name = "personnel",     description = "Personnel registry"),
        (name = "device-config", description = "Per-device boot configuration"),
        (name = "status",        description = "Health classification and alerts"),
        (name = "system",        description = "System endpoints"),
    ),
    info(
        title = "Smart Jacket Backend API",
        version = "0.1.0",
        description = "Telemetry ingestion and health status for smart-jacket wearers"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
