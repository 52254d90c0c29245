//! Read-time expansion of stored reference ids into full records.
//!
//! References are plain id strings with no SQL foreign key behind them, so a
//! referenced row may be gone (medications are hard-deleted without cascade).
//! Lookups are ownership-scoped and a dangling id simply resolves to nothing.

use crate::entities::{medications, prelude::*, prescriptions};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use std::collections::{HashMap, HashSet};

pub async fn medication(
    db: &DatabaseConnection,
    user: &str,
    id: &str,
) -> Result<Option<medications::Model>, DbErr> {
    Medications::find_by_id(id)
        .filter(medications::Column::User.eq(user))
        .one(db)
        .await
}

pub async fn medications_by_id(
    db: &DatabaseConnection,
    user: &str,
    ids: &[String],
) -> Result<HashMap<String, medications::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let unique: HashSet<String> = ids.iter().cloned().collect();
    let rows = Medications::find()
        .filter(medications::Column::User.eq(user))
        .filter(medications::Column::Id.is_in(unique))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|m| (m.id.clone(), m)).collect())
}

pub async fn prescriptions_by_id(
    db: &DatabaseConnection,
    user: &str,
    ids: &[String],
) -> Result<HashMap<String, prescriptions::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let unique: HashSet<String> = ids.iter().cloned().collect();
    let rows = Prescriptions::find()
        .filter(prescriptions::Column::User.eq(user))
        .filter(prescriptions::Column::Id.is_in(unique))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|p| (p.id.clone(), p)).collect())
}
