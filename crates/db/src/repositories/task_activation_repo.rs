//! Repository for the `task_activation_overrides` table.

use sqlx::PgPool;
use oneshot_core::types::DbId;

use crate::models::task_activation::TaskActivationOverride;

/// Column list for `task_activation_overrides` queries.
const COLUMNS: &str = "task_key, is_active, updated_by, updated_at";

/// Persists admin activation toggles so they survive restarts.
pub struct TaskActivationRepo;

impl TaskActivationRepo {
    /// All overrides, ordered by task key.
    pub async fn list(pool: &PgPool) -> Result<Vec<TaskActivationOverride>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM task_activation_overrides ORDER BY task_key");
        sqlx::query_as::<_, TaskActivationOverride>(&query)
            .fetch_all(pool)
            .await
    }

    /// Record an activation toggle for a task.
    pub async fn set(
        pool: &PgPool,
        task_key: &str,
        is_active: bool,
        updated_by: DbId,
    ) -> Result<TaskActivationOverride, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_activation_overrides (task_key, is_active, updated_by) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (task_key) DO UPDATE SET \
                 is_active = EXCLUDED.is_active, \
                 updated_by = EXCLUDED.updated_by, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskActivationOverride>(&query)
            .bind(task_key)
            .bind(is_active)
            .bind(updated_by)
            .fetch_one(pool)
            .await
    }
}
