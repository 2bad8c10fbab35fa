//! Repository for the `profile_snapshots` table.

use sqlx::PgPool;
use oneshot_core::types::DbId;

use crate::models::profile_snapshot::StoredSnapshot;

/// Column list for `profile_snapshots` queries.
const COLUMNS: &str = "user_id, snapshot_json, created_at, updated_at";

/// Stores the latest profile snapshot per user.
pub struct ProfileSnapshotRepo;

impl ProfileSnapshotRepo {
    /// Fetch a user's stored snapshot, if any.
    pub async fn find(pool: &PgPool, user_id: DbId) -> Result<Option<StoredSnapshot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profile_snapshots WHERE user_id = $1");
        sqlx::query_as::<_, StoredSnapshot>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Replace a user's snapshot with a new document.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        snapshot_json: &serde_json::Value,
    ) -> Result<StoredSnapshot, sqlx::Error> {
        let query = format!(
            "INSERT INTO profile_snapshots (user_id, snapshot_json) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 snapshot_json = EXCLUDED.snapshot_json, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoredSnapshot>(&query)
            .bind(user_id)
            .bind(snapshot_json)
            .fetch_one(pool)
            .await
    }
}
