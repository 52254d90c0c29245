use crate::api::error::{AppError, AppJson};
use crate::api::handlers::MessageResponse;
use crate::api::handlers::medications::MedicationResponse;
use crate::entities::activities::ActivityType;
use crate::entities::medications;
use crate::entities::prelude::*;
use crate::entities::prescriptions::{self, PrescriptionStatus};
use crate::services::populate;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A stored medication reference: the full record when populated, the raw id
/// otherwise. Serializes the way Mongoose `populate` does.
#[derive(Serialize, ToSchema)]
#[serde(untagged)]
pub enum MedicationRef {
    Populated(Box<MedicationResponse>),
    Id(String),
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RefillInfo {
    #[serde(default)]
    pub total: i32,
    #[serde(default)]
    pub remaining: i32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionResponse {
    pub id: String,
    pub user: String,
    pub medication: Option<MedicationRef>,
    pub doctor: String,
    pub prescribed_date: DateTime<Utc>,
    pub refills: RefillInfo,
    pub pharmacy: Option<String>,
    pub notes: Option<String>,
    pub status: PrescriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrescriptionResponse {
    fn shape(p: prescriptions::Model, medication: Option<MedicationRef>) -> Self {
        Self {
            id: p.id,
            user: p.user,
            medication,
            doctor: p.doctor,
            prescribed_date: p.prescribed_date,
            refills: RefillInfo {
                total: p.refills_total,
                remaining: p.refills_remaining,
            },
            pharmacy: p.pharmacy,
            notes: p.notes,
            status: p.status,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }

    /// Response with the raw medication id, as create/update/refill return it.
    pub fn raw(p: prescriptions::Model) -> Self {
        let medication = Some(MedicationRef::Id(p.medication.clone()));
        Self::shape(p, medication)
    }

    /// Response with the medication reference expanded; a dangling id
    /// resolves to null.
    pub fn populated(p: prescriptions::Model, medication: Option<medications::Model>) -> Self {
        let medication = medication.map(|m| MedicationRef::Populated(Box::new(m.into())));
        Self::shape(p, medication)
    }
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    #[validate(length(min = 1))]
    pub medication: String,
    #[validate(length(min = 1, max = 200))]
    pub doctor: String,
    pub prescribed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub refills: RefillInfo,
    pub pharmacy: Option<String>,
    pub notes: Option<String>,
    pub status: Option<PrescriptionStatus>,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrescriptionRequest {
    #[validate(length(min = 1))]
    pub medication: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub doctor: Option<String>,
    pub prescribed_date: Option<DateTime<Utc>>,
    pub refills: Option<RefillInfo>,
    #[serde(default)]
    pub pharmacy: Option<Option<String>>,
    #[serde(default)]
    pub notes: Option<Option<String>>,
    pub status: Option<PrescriptionStatus>,
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u64>,
}

/// Clamped refill increment: remaining never exceeds total.
pub fn next_refill_count(total: i32, remaining: i32) -> i32 {
    remaining.saturating_add(1).min(total)
}

async fn find_owned(
    state: &crate::AppState,
    user: &str,
    id: &str,
) -> Result<prescriptions::Model, AppError> {
    Prescriptions::find_by_id(id)
        .filter(prescriptions::Column::User.eq(user))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Prescription not found".to_string()))
}

async fn populate_all(
    state: &crate::AppState,
    user: &str,
    rows: Vec<prescriptions::Model>,
) -> Result<Vec<PrescriptionResponse>, AppError> {
    let medication_ids: Vec<String> = rows.iter().map(|p| p.medication.clone()).collect();
    let medications = populate::medications_by_id(&state.db, user, &medication_ids).await?;
    Ok(rows
        .into_iter()
        .map(|p| {
            let medication = medications.get(&p.medication).cloned();
            PrescriptionResponse::populated(p, medication)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/prescriptions",
    responses(
        (status = 200, description = "All prescriptions for the caller, newest first", body = Vec<PrescriptionResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "prescriptions",
    security(("jwt" = []))
)]
pub async fn list_prescriptions(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PrescriptionResponse>>, AppError> {
    let rows = Prescriptions::find()
        .filter(prescriptions::Column::User.eq(&claims.sub))
        .order_by_desc(prescriptions::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(populate_all(&state, &claims.sub, rows).await?))
}

#[utoipa::path(
    get,
    path = "/api/prescriptions/recent",
    params(("limit" = Option<u64>, Query, description = "Max records to return (default 5)")),
    responses(
        (status = 200, description = "Most recent prescriptions", body = Vec<PrescriptionResponse>)
    ),
    tag = "prescriptions",
    security(("jwt" = []))
)]
pub async fn recent_prescriptions(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<PrescriptionResponse>>, AppError> {
    // A zero limit falls back to the default rather than returning nothing.
    let limit = query.limit.filter(|&l| l > 0).unwrap_or(5);
    let rows = Prescriptions::find()
        .filter(prescriptions::Column::User.eq(&claims.sub))
        .order_by_desc(prescriptions::Column::CreatedAt)
        .limit(limit)
        .all(&state.db)
        .await?;

    Ok(Json(populate_all(&state, &claims.sub, rows).await?))
}

#[utoipa::path(
    get,
    path = "/api/prescriptions/{id}",
    params(("id" = String, Path, description = "Prescription ID")),
    responses(
        (status = 200, description = "Prescription found", body = PrescriptionResponse),
        (status = 404, description = "Prescription not found")
    ),
    tag = "prescriptions",
    security(("jwt" = []))
)]
pub async fn get_prescription(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<PrescriptionResponse>, AppError> {
    let prescription = find_owned(&state, &claims.sub, &id).await?;
    let medication = populate::medication(&state.db, &claims.sub, &prescription.medication).await?;
    Ok(Json(PrescriptionResponse::populated(
        prescription,
        medication,
    )))
}

#[utoipa::path(
    post,
    path = "/api/prescriptions",
    request_body = CreatePrescriptionRequest,
    responses(
        (status = 201, description = "Prescription created", body = PrescriptionResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "prescriptions",
    security(("jwt" = []))
)]
pub async fn create_prescription(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<PrescriptionResponse>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let now = Utc::now();
    let prescription = prescriptions::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user: Set(claims.sub.clone()),
        medication: Set(payload.medication),
        doctor: Set(payload.doctor),
        prescribed_date: Set(payload.prescribed_date.unwrap_or(now)),
        refills_total: Set(payload.refills.total),
        refills_remaining: Set(payload.refills.remaining),
        pharmacy: Set(payload.pharmacy),
        notes: Set(payload.notes),
        status: Set(payload.status.unwrap_or(PrescriptionStatus::Active)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let saved = prescription.insert(&state.db).await?;

    state
        .activity_log
        .log(
            &claims.sub,
            ActivityType::PrescriptionAdded,
            Some(saved.medication.clone()),
            Some(saved.id.clone()),
            None,
        )
        .await;

    Ok((StatusCode::CREATED, Json(PrescriptionResponse::raw(saved))))
}

#[utoipa::path(
    put,
    path = "/api/prescriptions/{id}",
    params(("id" = String, Path, description = "Prescription ID")),
    request_body = UpdatePrescriptionRequest,
    responses(
        (status = 200, description = "Prescription updated", body = PrescriptionResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Prescription not found")
    ),
    tag = "prescriptions",
    security(("jwt" = []))
)]
pub async fn update_prescription(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdatePrescriptionRequest>,
) -> Result<Json<PrescriptionResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let prescription = find_owned(&state, &claims.sub, &id).await?;
    let mut active: prescriptions::ActiveModel = prescription.into();

    if let Some(medication) = payload.medication {
        active.medication = Set(medication);
    }
    if let Some(doctor) = payload.doctor {
        active.doctor = Set(doctor);
    }
    if let Some(prescribed_date) = payload.prescribed_date {
        active.prescribed_date = Set(prescribed_date);
    }
    if let Some(refills) = payload.refills {
        // Loose invariant kept from the original model: a direct update may
        // set remaining above total; only the refill endpoint clamps.
        active.refills_total = Set(refills.total);
        active.refills_remaining = Set(refills.remaining);
    }
    if let Some(pharmacy) = payload.pharmacy {
        active.pharmacy = Set(pharmacy);
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(notes);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;

    state
        .activity_log
        .log(
            &claims.sub,
            ActivityType::PrescriptionModified,
            Some(updated.medication.clone()),
            Some(updated.id.clone()),
            None,
        )
        .await;

    Ok(Json(PrescriptionResponse::raw(updated)))
}

#[utoipa::path(
    post,
    path = "/api/prescriptions/{id}/refill",
    params(("id" = String, Path, description = "Prescription ID")),
    responses(
        (status = 200, description = "Refill recorded", body = PrescriptionResponse),
        (status = 404, description = "Prescription not found")
    ),
    tag = "prescriptions",
    security(("jwt" = []))
)]
pub async fn refill_prescription(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<PrescriptionResponse>, AppError> {
    let prescription = find_owned(&state, &claims.sub, &id).await?;

    // Read-modify-write, last-writer-wins: concurrent refills on the same
    // row may lose an increment but can never push remaining past total.
    let remaining = next_refill_count(prescription.refills_total, prescription.refills_remaining);
    let mut active: prescriptions::ActiveModel = prescription.into();
    active.refills_remaining = Set(remaining);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    state
        .activity_log
        .log(
            &claims.sub,
            ActivityType::PrescriptionFilled,
            Some(updated.medication.clone()),
            Some(updated.id.clone()),
            None,
        )
        .await;

    Ok(Json(PrescriptionResponse::raw(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/prescriptions/{id}",
    params(("id" = String, Path, description = "Prescription ID")),
    responses(
        (status = 200, description = "Prescription deleted", body = MessageResponse),
        (status = 404, description = "Prescription not found")
    ),
    tag = "prescriptions",
    security(("jwt" = []))
)]
pub async fn delete_prescription(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let prescription = find_owned(&state, &claims.sub, &id).await?;
    let medication = prescription.medication.clone();

    prescription.delete(&state.db).await?;

    state
        .activity_log
        .log(
            &claims.sub,
            ActivityType::PrescriptionDeleted,
            Some(medication),
            None,
            None,
        )
        .await;

    Ok(Json(MessageResponse::new("Prescription deleted")))
}

#[cfg(test)]
mod tests {
    use super::next_refill_count;

    #[test]
    fn refill_increments_until_total() {
        assert_eq!(next_refill_count(3, 0), 1);
        assert_eq!(next_refill_count(3, 2), 3);
        assert_eq!(next_refill_count(3, 3), 3);
    }

    #[test]
    fn refill_clamps_down_when_remaining_exceeds_total() {
        // remaining above total is possible via direct update
        assert_eq!(next_refill_count(3, 5), 3);
    }

    #[test]
    fn refill_with_zero_total_stays_zero() {
        assert_eq!(next_refill_count(0, 0), 0);
    }
}
