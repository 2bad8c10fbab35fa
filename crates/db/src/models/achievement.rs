//! Awarded achievement model.

use serde::Serialize;
use sqlx::FromRow;
use oneshot_core::types::{DbId, Timestamp};

/// A row from the `user_achievements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserAchievement {
    pub id: DbId,
    pub user_id: DbId,
    pub achievement_key: String,
    /// The task whose completion earned the award.
    pub task_key: String,
    pub awarded_at: Timestamp,
}
