use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Every event kind the handlers emit. Append-only history vocabulary; do
/// not remove variants, existing rows reference them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[sea_orm(string_value = "medication_taken")]
    MedicationTaken,
    #[sea_orm(string_value = "medication_skipped")]
    MedicationSkipped,
    #[sea_orm(string_value = "medication_added")]
    MedicationAdded,
    #[sea_orm(string_value = "medication_modified")]
    MedicationModified,
    #[sea_orm(string_value = "medication_deleted")]
    MedicationDeleted,
    #[sea_orm(string_value = "prescription_added")]
    PrescriptionAdded,
    #[sea_orm(string_value = "prescription_modified")]
    PrescriptionModified,
    #[sea_orm(string_value = "prescription_filled")]
    PrescriptionFilled,
    #[sea_orm(string_value = "prescription_deleted")]
    PrescriptionDeleted,
    #[sea_orm(string_value = "reminder_created")]
    ReminderCreated,
    #[sea_orm(string_value = "reminder_modified")]
    ReminderModified,
}

/// Append-only audit record. Never updated or deleted through the API.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user: String,
    pub activity_type: ActivityType,
    pub medication: Option<String>,
    pub prescription: Option<String>,
    pub details: Option<Json>,
    pub timestamp: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
