//! Per-user task state model.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use oneshot_core::journey::task_state::TaskStateMap;
use oneshot_core::types::{DbId, Timestamp};

/// A row from the `user_task_states` table: every task state for one user
/// in a single JSONB document.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserTaskStates {
    pub user_id: DbId,
    pub states_json: Json<TaskStateMap>,
    pub updated_at: Timestamp,
}
