use crate::api::error::{AppError, AppJson};
use crate::api::handlers::MessageResponse;
use crate::api::handlers::prescriptions::MedicationRef;
use crate::entities::activities::ActivityType;
use crate::entities::medication_reminders::{self, ReminderStatus};
use crate::entities::medications;
use crate::entities::prelude::*;
use crate::services::populate;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub id: String,
    pub user: String,
    pub medication: Option<MedicationRef>,
    pub scheduled_time: DateTime<Utc>,
    pub status: ReminderStatus,
    pub snoozed_until: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub notification_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReminderResponse {
    fn shape(r: medication_reminders::Model, medication: Option<MedicationRef>) -> Self {
        Self {
            id: r.id,
            user: r.user,
            medication,
            scheduled_time: r.scheduled_time,
            status: r.status,
            snoozed_until: r.snoozed_until,
            completed_at: r.completed_at,
            notes: r.notes,
            notification_sent: r.notification_sent,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }

    pub fn raw(r: medication_reminders::Model) -> Self {
        let medication = Some(MedicationRef::Id(r.medication.clone()));
        Self::shape(r, medication)
    }

    pub fn populated(
        r: medication_reminders::Model,
        medication: Option<medications::Model>,
    ) -> Self {
        let medication = medication.map(|m| MedicationRef::Populated(Box::new(m.into())));
        Self::shape(r, medication)
    }
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderRequest {
    #[validate(length(min = 1))]
    pub medication: String,
    pub scheduled_time: DateTime<Utc>,
    pub status: Option<ReminderStatus>,
    pub notes: Option<String>,
    pub notification_sent: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnoozeRequest {
    /// Snooze duration in minutes
    pub snooze_duration: Option<i64>,
}

async fn find_owned(
    state: &crate::AppState,
    user: &str,
    id: &str,
) -> Result<medication_reminders::Model, AppError> {
    MedicationReminders::find_by_id(id)
        .filter(medication_reminders::Column::User.eq(user))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reminder not found".to_string()))
}

async fn populate_all(
    state: &crate::AppState,
    user: &str,
    rows: Vec<medication_reminders::Model>,
) -> Result<Vec<ReminderResponse>, AppError> {
    let medication_ids: Vec<String> = rows.iter().map(|r| r.medication.clone()).collect();
    let medications = populate::medications_by_id(&state.db, user, &medication_ids).await?;
    Ok(rows
        .into_iter()
        .map(|r| {
            let medication = medications.get(&r.medication).cloned();
            ReminderResponse::populated(r, medication)
        })
        .collect())
}

/// `[local midnight, local midnight + 1 day)` in UTC.
fn today_window() -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let start = Local::now()
        .with_time(NaiveTime::MIN)
        .single()
        .ok_or_else(|| AppError::Internal("Ambiguous local midnight".to_string()))?
        .with_timezone(&Utc);
    Ok((start, start + Duration::days(1)))
}

#[utoipa::path(
    get,
    path = "/api/reminders",
    responses(
        (status = 200, description = "All reminders for the caller in chronological order", body = Vec<ReminderResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "reminders",
    security(("jwt" = []))
)]
pub async fn list_reminders(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ReminderResponse>>, AppError> {
    let rows = MedicationReminders::find()
        .filter(medication_reminders::Column::User.eq(&claims.sub))
        .order_by_asc(medication_reminders::Column::ScheduledTime)
        .all(&state.db)
        .await?;

    Ok(Json(populate_all(&state, &claims.sub, rows).await?))
}

#[utoipa::path(
    get,
    path = "/api/reminders/today",
    responses(
        (status = 200, description = "Pending or snoozed reminders scheduled today", body = Vec<ReminderResponse>)
    ),
    tag = "reminders",
    security(("jwt" = []))
)]
pub async fn today_reminders(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ReminderResponse>>, AppError> {
    let (start, end) = today_window()?;

    // Completed or missed reminders never appear here, whatever the date.
    let rows = MedicationReminders::find()
        .filter(medication_reminders::Column::User.eq(&claims.sub))
        .filter(medication_reminders::Column::ScheduledTime.gte(start))
        .filter(medication_reminders::Column::ScheduledTime.lt(end))
        .filter(
            medication_reminders::Column::Status
                .is_in([ReminderStatus::Pending, ReminderStatus::Snoozed]),
        )
        .order_by_asc(medication_reminders::Column::ScheduledTime)
        .all(&state.db)
        .await?;

    Ok(Json(populate_all(&state, &claims.sub, rows).await?))
}

#[utoipa::path(
    get,
    path = "/api/reminders/{id}",
    params(("id" = String, Path, description = "Reminder ID")),
    responses(
        (status = 200, description = "Reminder found", body = ReminderResponse),
        (status = 404, description = "Reminder not found")
    ),
    tag = "reminders",
    security(("jwt" = []))
)]
pub async fn get_reminder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ReminderResponse>, AppError> {
    let reminder = find_owned(&state, &claims.sub, &id).await?;
    let medication = populate::medication(&state.db, &claims.sub, &reminder.medication).await?;
    Ok(Json(ReminderResponse::populated(reminder, medication)))
}

#[utoipa::path(
    post,
    path = "/api/reminders",
    request_body = CreateReminderRequest,
    responses(
        (status = 201, description = "Reminder created", body = ReminderResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "reminders",
    security(("jwt" = []))
)]
pub async fn create_reminder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateReminderRequest>,
) -> Result<(StatusCode, Json<ReminderResponse>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let now = Utc::now();
    let reminder = medication_reminders::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user: Set(claims.sub.clone()),
        medication: Set(payload.medication),
        scheduled_time: Set(payload.scheduled_time),
        status: Set(payload.status.unwrap_or(ReminderStatus::Pending)),
        snoozed_until: Set(None),
        completed_at: Set(None),
        notes: Set(payload.notes),
        notification_sent: Set(payload.notification_sent.unwrap_or(false)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let saved = reminder.insert(&state.db).await?;

    state
        .activity_log
        .log(
            &claims.sub,
            ActivityType::ReminderCreated,
            Some(saved.medication.clone()),
            None,
            None,
        )
        .await;

    Ok((StatusCode::CREATED, Json(ReminderResponse::raw(saved))))
}

#[utoipa::path(
    put,
    path = "/api/reminders/{id}/complete",
    params(("id" = String, Path, description = "Reminder ID")),
    responses(
        (status = 200, description = "Reminder marked completed", body = ReminderResponse),
        (status = 404, description = "Reminder not found")
    ),
    tag = "reminders",
    security(("jwt" = []))
)]
pub async fn complete_reminder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ReminderResponse>, AppError> {
    let reminder = find_owned(&state, &claims.sub, &id).await?;

    // No transition guard: re-completing refreshes completedAt.
    let mut active: medication_reminders::ActiveModel = reminder.into();
    active.status = Set(ReminderStatus::Completed);
    active.completed_at = Set(Some(Utc::now()));
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    state
        .activity_log
        .log(
            &claims.sub,
            ActivityType::MedicationTaken,
            Some(updated.medication.clone()),
            None,
            None,
        )
        .await;

    Ok(Json(ReminderResponse::raw(updated)))
}

#[utoipa::path(
    put,
    path = "/api/reminders/{id}/miss",
    params(("id" = String, Path, description = "Reminder ID")),
    responses(
        (status = 200, description = "Reminder marked missed", body = ReminderResponse),
        (status = 404, description = "Reminder not found")
    ),
    tag = "reminders",
    security(("jwt" = []))
)]
pub async fn miss_reminder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ReminderResponse>, AppError> {
    let reminder = find_owned(&state, &claims.sub, &id).await?;

    let mut active: medication_reminders::ActiveModel = reminder.into();
    active.status = Set(ReminderStatus::Missed);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    state
        .activity_log
        .log(
            &claims.sub,
            ActivityType::MedicationSkipped,
            Some(updated.medication.clone()),
            None,
            None,
        )
        .await;

    Ok(Json(ReminderResponse::raw(updated)))
}

#[utoipa::path(
    put,
    path = "/api/reminders/{id}/snooze",
    params(("id" = String, Path, description = "Reminder ID")),
    request_body = SnoozeRequest,
    responses(
        (status = 200, description = "Reminder snoozed", body = ReminderResponse),
        (status = 400, description = "Missing snooze duration"),
        (status = 404, description = "Reminder not found")
    ),
    tag = "reminders",
    security(("jwt" = []))
)]
pub async fn snooze_reminder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<SnoozeRequest>,
) -> Result<Json<ReminderResponse>, AppError> {
    let duration = match payload.snooze_duration {
        Some(minutes) if minutes > 0 => minutes,
        _ => {
            return Err(AppError::BadRequest(
                "Snooze duration is required".to_string(),
            ));
        }
    };

    let reminder = find_owned(&state, &claims.sub, &id).await?;

    let mut active: medication_reminders::ActiveModel = reminder.into();
    active.status = Set(ReminderStatus::Snoozed);
    active.snoozed_until = Set(Some(Utc::now() + Duration::minutes(duration)));
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    // Snoozing writes no activity row; only complete/miss do.
    Ok(Json(ReminderResponse::raw(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/reminders/{id}",
    params(("id" = String, Path, description = "Reminder ID")),
    responses(
        (status = 200, description = "Reminder deleted", body = MessageResponse),
        (status = 404, description = "Reminder not found")
    ),
    tag = "reminders",
    security(("jwt" = []))
)]
pub async fn delete_reminder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let reminder = find_owned(&state, &claims.sub, &id).await?;
    reminder.delete(&state.db).await?;

    Ok(Json(MessageResponse::new("Reminder deleted")))
}
