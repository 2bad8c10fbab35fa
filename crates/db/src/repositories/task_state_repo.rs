//! Repository for the `user_task_states` table.
//!
//! All of a user's task states are one JSONB document. Writers replace the
//! whole document, so concurrent requests for the same user are
//! last-writer-wins.

use sqlx::types::Json;
use sqlx::PgPool;
use oneshot_core::journey::task_state::TaskStateMap;
use oneshot_core::types::DbId;

use crate::models::task_state::UserTaskStates;

/// Column list for `user_task_states` queries.
const COLUMNS: &str = "user_id, states_json, updated_at";

/// Loads and saves per-user task state.
pub struct TaskStateRepo;

impl TaskStateRepo {
    /// Load a user's task states. A user with no row has no states yet.
    pub async fn load(pool: &PgPool, user_id: DbId) -> Result<TaskStateMap, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_task_states WHERE user_id = $1");
        let row = sqlx::query_as::<_, UserTaskStates>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.states_json.0).unwrap_or_default())
    }

    /// Persist a user's full task-state map.
    pub async fn save(
        pool: &PgPool,
        user_id: DbId,
        states: &TaskStateMap,
    ) -> Result<UserTaskStates, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_task_states (user_id, states_json) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 states_json = EXCLUDED.states_json, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserTaskStates>(&query)
            .bind(user_id)
            .bind(Json(states))
            .fetch_one(pool)
            .await?;

        tracing::debug!(user_id, task_count = states.len(), "Saved task states");
        Ok(row)
    }
}
