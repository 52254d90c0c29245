use crate::entities::activities::{self, ActivityType};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

/// Appends one Activity row after a primary mutation has committed.
///
/// Best-effort: the audit insert is a second, independent write with no
/// transaction spanning both. A failed insert is traced and swallowed so the
/// already-committed mutation is still reported as a success.
#[derive(Clone)]
pub struct ActivityLogger {
    db: DatabaseConnection,
}

impl ActivityLogger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn log(
        &self,
        user: &str,
        activity_type: ActivityType,
        medication: Option<String>,
        prescription: Option<String>,
        details: Option<Value>,
    ) {
        info!(
            target: "activity",
            user = %user,
            activity_type = ?activity_type,
            medication = ?medication,
            prescription = ?prescription,
            "Activity recorded"
        );

        let now = Utc::now();
        let row = activities::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user: Set(user.to_string()),
            activity_type: Set(activity_type),
            medication: Set(medication),
            prescription: Set(prescription),
            details: Set(details),
            timestamp: Set(now),
            created_at: Set(now),
        };

        if let Err(e) = row.insert(&self.db).await {
            error!("Failed to persist activity log: {}", e);
        }
    }
}
