use crate::api::error::{AppError, AppJson};
use crate::api::handlers::MessageResponse;
use crate::entities::activities::ActivityType;
use crate::entities::medications::{self, TimeOfDay, TimeOfDayList};
use crate::entities::prelude::*;
use crate::utils::auth::Claims;
use axum::{Extension, Json, extract::Path, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicationResponse {
    pub id: String,
    pub user: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub time_of_day: TimeOfDayList,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<medications::Model> for MedicationResponse {
    fn from(m: medications::Model) -> Self {
        Self {
            id: m.id,
            user: m.user,
            name: m.name,
            dosage: m.dosage,
            frequency: m.frequency,
            time_of_day: m.time_of_day,
            start_date: m.start_date,
            end_date: m.end_date,
            instructions: m.instructions,
            active: m.active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub dosage: String,
    #[validate(length(min = 1, max = 100))]
    pub frequency: String,
    #[serde(default)]
    pub time_of_day: Vec<TimeOfDay>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
    pub active: Option<bool>,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub dosage: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub frequency: Option<String>,
    pub time_of_day: Option<Vec<TimeOfDay>>,
    pub start_date: Option<DateTime<Utc>>,
    // Double Option: absent leaves the field as is, an explicit null clears it
    #[serde(default)]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub instructions: Option<Option<String>>,
    pub active: Option<bool>,
}

async fn find_owned(
    state: &crate::AppState,
    user: &str,
    id: &str,
) -> Result<medications::Model, AppError> {
    Medications::find_by_id(id)
        .filter(medications::Column::User.eq(user))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medication not found".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/medications",
    responses(
        (status = 200, description = "All medications for the caller", body = Vec<MedicationResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "medications",
    security(("jwt" = []))
)]
pub async fn list_medications(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<MedicationResponse>>, AppError> {
    let rows = Medications::find()
        .filter(medications::Column::User.eq(&claims.sub))
        .order_by_desc(medications::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/medications/{id}",
    params(("id" = String, Path, description = "Medication ID")),
    responses(
        (status = 200, description = "Medication found", body = MedicationResponse),
        (status = 404, description = "Medication not found")
    ),
    tag = "medications",
    security(("jwt" = []))
)]
pub async fn get_medication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MedicationResponse>, AppError> {
    let medication = find_owned(&state, &claims.sub, &id).await?;
    Ok(Json(medication.into()))
}

#[utoipa::path(
    post,
    path = "/api/medications",
    request_body = CreateMedicationRequest,
    responses(
        (status = 201, description = "Medication created", body = MedicationResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "medications",
    security(("jwt" = []))
)]
pub async fn create_medication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<MedicationResponse>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let now = Utc::now();
    // The owner is always the authenticated caller, never payload data.
    let medication = medications::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user: Set(claims.sub.clone()),
        name: Set(payload.name),
        dosage: Set(payload.dosage),
        frequency: Set(payload.frequency),
        time_of_day: Set(TimeOfDayList(payload.time_of_day)),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        instructions: Set(payload.instructions),
        active: Set(payload.active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let saved = medication.insert(&state.db).await?;

    state
        .activity_log
        .log(
            &claims.sub,
            ActivityType::MedicationAdded,
            Some(saved.id.clone()),
            None,
            Some(json!({ "name": saved.name })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(saved.into())))
}

#[utoipa::path(
    put,
    path = "/api/medications/{id}",
    params(("id" = String, Path, description = "Medication ID")),
    request_body = UpdateMedicationRequest,
    responses(
        (status = 200, description = "Medication updated", body = MedicationResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Medication not found")
    ),
    tag = "medications",
    security(("jwt" = []))
)]
pub async fn update_medication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateMedicationRequest>,
) -> Result<Json<MedicationResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let medication = find_owned(&state, &claims.sub, &id).await?;
    let mut active: medications::ActiveModel = medication.into();

    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(dosage) = payload.dosage {
        active.dosage = Set(dosage);
    }
    if let Some(frequency) = payload.frequency {
        active.frequency = Set(frequency);
    }
    if let Some(time_of_day) = payload.time_of_day {
        active.time_of_day = Set(TimeOfDayList(time_of_day));
    }
    if let Some(start_date) = payload.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = payload.end_date {
        active.end_date = Set(end_date);
    }
    if let Some(instructions) = payload.instructions {
        active.instructions = Set(instructions);
    }
    if let Some(is_active) = payload.active {
        active.active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;

    state
        .activity_log
        .log(
            &claims.sub,
            ActivityType::MedicationModified,
            Some(updated.id.clone()),
            None,
            Some(json!({ "name": updated.name })),
        )
        .await;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/medications/{id}",
    params(("id" = String, Path, description = "Medication ID")),
    responses(
        (status = 200, description = "Medication deleted", body = MessageResponse),
        (status = 404, description = "Medication not found")
    ),
    tag = "medications",
    security(("jwt" = []))
)]
pub async fn delete_medication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let medication = find_owned(&state, &claims.sub, &id).await?;
    let name = medication.name.clone();

    // Hard delete. Prescriptions and reminders referencing this medication
    // are left in place with dangling ids.
    medication.delete(&state.db).await?;

    state
        .activity_log
        .log(
            &claims.sub,
            ActivityType::MedicationDeleted,
            None,
            None,
            Some(json!({ "name": name })),
        )
        .await;

    Ok(Json(MessageResponse::new("Medication deleted")))
}
