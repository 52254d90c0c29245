use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `pending` is the initial state. `completed`/`missed`/`snoozed` are set by
/// the transition endpoints; there is no transition table beyond that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "missed")]
    Missed,
    #[sea_orm(string_value = "snoozed")]
    Snoozed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "medication_reminders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user: String,
    pub medication: String,
    pub scheduled_time: DateTimeUtc,
    pub status: ReminderStatus,
    // Meaningful only while status is snoozed/completed respectively; the
    // model does not enforce the coupling.
    pub snoozed_until: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub notes: Option<String>,
    pub notification_sent: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
