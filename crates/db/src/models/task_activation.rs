//! Catalog activation override model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use oneshot_core::types::{DbId, Timestamp};

/// A row from the `task_activation_overrides` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskActivationOverride {
    pub task_key: String,
    pub is_active: bool,
    pub updated_by: Option<DbId>,
    pub updated_at: Timestamp,
}

/// DTO for toggling a task on or off.
#[derive(Debug, Deserialize)]
pub struct SetTaskActivation {
    pub is_active: bool,
}
