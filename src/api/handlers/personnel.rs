use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    api::{
        dto::{
            CreatePersonnelRequest, MessageResponse, PersonnelCreatedResponse,
            PersonnelListResponse, PersonnelResponse, UpdatePersonnelRequest,
        },
        errors::ApiError,
        AppState,
    },
    db::personnel::{self, NewPersonnel, PersonnelChanges},
};

const PERSONNEL_NOT_FOUND: &str = "Personnel record not found";

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Unparseable ids cannot name a record, so they are a lookup miss.
fn record_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(PERSONNEL_NOT_FOUND))
}

impl CreatePersonnelRequest {
    fn into_new(self) -> Result<NewPersonnel, ApiError> {
        let (Some(name), Some(rank), Some(unit), Some(device_id)) = (
            filled(self.name),
            filled(self.rank),
            filled(self.unit),
            filled(self.device_id),
        ) else {
            return Err(ApiError::validation(
                "Missing fields",
                "name, rank, unit and device_id are required",
            ));
        };

        let personnel_id = filled(self.personnel_id)
            .unwrap_or_else(|| format!("P-{}", Utc::now().timestamp_millis()));

        Ok(NewPersonnel {
            personnel_id,
            name,
            rank,
            unit,
            phone: filled(self.phone),
            device_id,
        })
    }
}

impl From<UpdatePersonnelRequest> for PersonnelChanges {
    fn from(req: UpdatePersonnelRequest) -> Self {
        Self {
            name: filled(req.name),
            rank: filled(req.rank),
            unit: filled(req.unit),
            phone: req.phone.map(filled),
            device_id: filled(req.device_id),
        }
    }
}

/// Register a person and the jacket they wear.
#[utoipa::path(
    post,
    path = "/api/personnel",
    request_body = CreatePersonnelRequest,
    responses(
        (status = 201, description = "Personnel registered", body = PersonnelCreatedResponse),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "personnel"
)]
pub async fn add_personnel(
    State(state): State<AppState>,
    body: Result<Json<CreatePersonnelRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PersonnelCreatedResponse>), ApiError> {
    let Json(req) = body?;
    let new = req.into_new()?;
    let person = personnel::insert(&state.pool, &new).await?;

    info!(id = %person.id, device_id = %person.device_id, "Personnel registered");

    Ok((
        StatusCode::CREATED,
        Json(PersonnelCreatedResponse {
            success: true,
            message: "Personnel added".to_owned(),
            personnel_id: person.id,
            data: person.into(),
        }),
    ))
}

/// Every registry entry, newest first.
#[utoipa::path(
    get,
    path = "/api/personnel",
    responses(
        (status = 200, description = "Personnel registry", body = PersonnelListResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "personnel"
)]
pub async fn list_personnel(
    State(state): State<AppState>,
) -> Result<Json<PersonnelListResponse>, ApiError> {
    let rows = personnel::list(&state.pool).await?;
    Ok(Json(PersonnelListResponse {
        success: true,
        count: rows.len(),
        personnel: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/personnel/device/{device_id}",
    params(("device_id" = String, Path, description = "Jacket identifier")),
    responses(
        (status = 200, description = "Person wearing the device", body = PersonnelResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "No personnel linked to the device"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "personnel"
)]
pub async fn get_personnel_by_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<PersonnelResponse>, ApiError> {
    let person = personnel::find_by_device(&state.pool, &device_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No personnel linked to this device"))?;

    Ok(Json(PersonnelResponse {
        success: true,
        personnel: person.into(),
    }))
}

/// Partial update. Absent or empty fields keep their value; a present
/// `phone` overwrites and an empty or null one clears it.
#[utoipa::path(
    put,
    path = "/api/personnel/{id}",
    params(("id" = Uuid, Path, description = "Record id")),
    request_body = UpdatePersonnelRequest,
    responses(
        (status = 200, description = "Updated record", body = PersonnelCreatedResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Unknown record id"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "personnel"
)]
pub async fn update_personnel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdatePersonnelRequest>, JsonRejection>,
) -> Result<Json<PersonnelCreatedResponse>, ApiError> {
    let id = record_id(&id)?;
    let Json(req) = body?;

    let person = personnel::update(&state.pool, id, &req.into())
        .await?
        .ok_or_else(|| ApiError::not_found(PERSONNEL_NOT_FOUND))?;

    info!(id = %person.id, "Personnel updated");

    Ok(Json(PersonnelCreatedResponse {
        success: true,
        message: "Personnel updated".to_owned(),
        personnel_id: person.id,
        data: person.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/personnel/{id}",
    params(("id" = Uuid, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record removed", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Unknown record id"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "personnel"
)]
pub async fn delete_personnel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = record_id(&id)?;
    if !personnel::delete(&state.pool, id).await? {
        return Err(ApiError::not_found(PERSONNEL_NOT_FOUND));
    }

    info!(id = %id, "Personnel removed");

    Ok(Json(MessageResponse {
        success: true,
        message: "Personnel removed".to_owned(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
