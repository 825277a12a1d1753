use sqlx::PgPool;
use uuid::Uuid;

use super::models::Personnel;

const COLUMNS: &str =
    "id, personnel_id, name, rank, unit, phone, device_id, created_at, updated_at";

#[derive(Debug, Clone, PartialEq)]
pub struct NewPersonnel {
    pub personnel_id: String,
    pub name: String,
    pub rank: String,
    pub unit: String,
    pub phone: Option<String>,
    pub device_id: String,
}

/// Partial update. `None` leaves a column untouched; `phone: Some(None)`
/// clears the phone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonnelChanges {
    pub name: Option<String>,
    pub rank: Option<String>,
    pub unit: Option<String>,
    pub phone: Option<Option<String>>,
    pub device_id: Option<String>,
}

pub async fn insert(pool: &PgPool, p: &NewPersonnel) -> sqlx::Result<Personnel> {
    sqlx::query_as::<_, Personnel>(&format!(
        "INSERT INTO personnel (id, personnel_id, name, rank, unit, phone, device_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&p.personnel_id)
    .bind(&p.name)
    .bind(&p.rank)
    .bind(&p.unit)
    .bind(&p.phone)
    .bind(&p.device_id)
    .fetch_one(pool)
    .await
}

/// Every registry entry, newest first.
pub async fn list(pool: &PgPool) -> sqlx::Result<Vec<Personnel>> {
    sqlx::query_as::<_, Personnel>(&format!(
        "SELECT {COLUMNS} FROM personnel ORDER BY created_at DESC, id"
    ))
    .fetch_all(pool)
    .await
}

/// The earliest registered entry carrying `device_id`, if any.
pub async fn find_by_device(pool: &PgPool, device_id: &str) -> sqlx::Result<Option<Personnel>> {
    sqlx::query_as::<_, Personnel>(&format!(
        "SELECT {COLUMNS} FROM personnel WHERE device_id = $1 \
         ORDER BY created_at ASC, id LIMIT 1"
    ))
    .bind(device_id)
    .fetch_optional(pool)
    .await
}

/// Returns `None` when no entry has `id`.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &PersonnelChanges,
) -> sqlx::Result<Option<Personnel>> {
    let (set_phone, phone) = match &changes.phone {
        Some(phone) => (true, phone.clone()),
        None => (false, None),
    };

    sqlx::query_as::<_, Personnel>(&format!(
        "UPDATE personnel SET \
             name       = COALESCE($2, name), \
             rank       = COALESCE($3, rank), \
             unit       = COALESCE($4, unit), \
             phone      = CASE WHEN $5 THEN $6 ELSE phone END, \
             device_id  = COALESCE($7, device_id), \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.rank)
    .bind(&changes.unit)
    .bind(set_phone)
    .bind(phone)
    .bind(&changes.device_id)
    .fetch_optional(pool)
    .await
}

/// Returns `false` when no entry has `id`.
pub async fn delete(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM personnel WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
