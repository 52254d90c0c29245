use crate::api::error::AppError;
use crate::api::handlers::prescriptions::{MedicationRef, PrescriptionResponse};
use crate::entities::activities::{self, ActivityType};
use crate::entities::prelude::*;
use crate::entities::{medications, prescriptions};
use crate::services::populate;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveEnum, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: String,
    pub user: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub medication: Option<MedicationRef>,
    /// Always expanded at read time; the embedded prescription keeps its raw
    /// medication id.
    pub prescription: Option<Box<PrescriptionResponse>>,
    pub details: Option<Value>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ActivityResponse {
    fn populated(
        a: activities::Model,
        medications: &HashMap<String, medications::Model>,
        prescriptions: &HashMap<String, prescriptions::Model>,
    ) -> Self {
        // Dangling references resolve to null, same as a reference that was
        // never set.
        let medication = a
            .medication
            .and_then(|id| medications.get(&id).cloned())
            .map(|m| MedicationRef::Populated(Box::new(m.into())));
        let prescription = a
            .prescription
            .and_then(|id| prescriptions.get(&id).cloned())
            .map(|p| Box::new(PrescriptionResponse::raw(p)));

        Self {
            id: a.id,
            user: a.user,
            activity_type: a.activity_type,
            medication,
            prescription,
            details: a.details,
            timestamp: a.timestamp,
            created_at: a.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListResponse {
    pub activities: Vec<ActivityResponse>,
    pub page: u64,
    pub total_pages: u64,
    pub total: u64,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u64>,
}

/// Resolves `(page, limit, skip)` with page >= 1 and limit >= 1.
fn page_params(query: &PageQuery, default_limit: u64) -> (u64, u64, u64) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(default_limit).max(1);
    (page, limit, (page - 1) * limit)
}

async fn query_page(
    state: &crate::AppState,
    claims: &Claims,
    condition: Condition,
    query: &PageQuery,
) -> Result<ActivityListResponse, AppError> {
    let (page, limit, skip) = page_params(query, 20);

    let total = Activities::find()
        .filter(condition.clone())
        .count(&state.db)
        .await?;

    let rows = Activities::find()
        .filter(condition)
        .order_by_desc(activities::Column::Timestamp)
        .offset(skip)
        .limit(limit)
        .all(&state.db)
        .await?;

    let activities = expand(state, &claims.sub, rows).await?;

    Ok(ActivityListResponse {
        activities,
        page,
        total_pages: total.div_ceil(limit),
        total,
    })
}

async fn expand(
    state: &crate::AppState,
    user: &str,
    rows: Vec<activities::Model>,
) -> Result<Vec<ActivityResponse>, AppError> {
    let medication_ids: Vec<String> = rows.iter().filter_map(|a| a.medication.clone()).collect();
    let prescription_ids: Vec<String> =
        rows.iter().filter_map(|a| a.prescription.clone()).collect();

    let medications = populate::medications_by_id(&state.db, user, &medication_ids).await?;
    let prescriptions = populate::prescriptions_by_id(&state.db, user, &prescription_ids).await?;

    Ok(rows
        .into_iter()
        .map(|a| ActivityResponse::populated(a, &medications, &prescriptions))
        .collect())
}

fn user_condition(claims: &Claims) -> Condition {
    Condition::all().add(activities::Column::User.eq(&claims.sub))
}

#[utoipa::path(
    get,
    path = "/api/activities",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u64>, Query, description = "Records per page (default 20)")
    ),
    responses(
        (status = 200, description = "Paginated activity history, newest first", body = ActivityListResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "activities",
    security(("jwt" = []))
)]
pub async fn list_activities(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ActivityListResponse>, AppError> {
    let response = query_page(&state, &claims, user_condition(&claims), &query).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/activities/recent",
    params(("limit" = Option<u64>, Query, description = "Max records to return (default 10)")),
    responses(
        (status = 200, description = "Most recent activities", body = Vec<ActivityResponse>)
    ),
    tag = "activities",
    security(("jwt" = []))
)]
pub async fn recent_activities(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<ActivityResponse>>, AppError> {
    // A zero limit falls back to the default rather than returning nothing.
    let limit = query.limit.filter(|&l| l > 0).unwrap_or(10);
    let rows = Activities::find()
        .filter(activities::Column::User.eq(&claims.sub))
        .order_by_desc(activities::Column::Timestamp)
        .limit(limit)
        .all(&state.db)
        .await?;

    Ok(Json(expand(&state, &claims.sub, rows).await?))
}

#[utoipa::path(
    get,
    path = "/api/activities/by-type/{type}",
    params(
        ("type" = String, Path, description = "Activity type"),
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u64>, Query, description = "Records per page (default 20)")
    ),
    responses(
        (status = 200, description = "Activities of one type, paginated", body = ActivityListResponse),
        (status = 400, description = "Unknown activity type")
    ),
    tag = "activities",
    security(("jwt" = []))
)]
pub async fn activities_by_type(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(type_name): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ActivityListResponse>, AppError> {
    let activity_type = ActivityType::try_from_value(&type_name)
        .map_err(|_| AppError::BadRequest(format!("Unknown activity type: {}", type_name)))?;

    let condition = user_condition(&claims).add(activities::Column::ActivityType.eq(activity_type));
    let response = query_page(&state, &claims, condition, &query).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/activities/by-medication/{medication_id}",
    params(
        ("medication_id" = String, Path, description = "Medication ID"),
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u64>, Query, description = "Records per page (default 20)")
    ),
    responses(
        (status = 200, description = "Activities linked to one medication, paginated", body = ActivityListResponse)
    ),
    tag = "activities",
    security(("jwt" = []))
)]
pub async fn activities_by_medication(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(medication_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ActivityListResponse>, AppError> {
    let condition = user_condition(&claims).add(activities::Column::Medication.eq(medication_id));
    let response = query_page(&state, &claims, condition, &query).await?;
    Ok(Json(response))
}
