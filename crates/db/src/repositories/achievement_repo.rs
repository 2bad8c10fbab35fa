//! Repository for the `user_achievements` table.

use std::collections::BTreeSet;

use sqlx::PgPool;
use oneshot_core::types::DbId;

use crate::models::achievement::UserAchievement;

/// Column list for `user_achievements` queries.
const COLUMNS: &str = "id, user_id, achievement_key, task_key, awarded_at";

/// Records one-time achievement awards.
pub struct AchievementRepo;

impl AchievementRepo {
    /// Award achievements to a user.
    ///
    /// Keys the user already holds are skipped by the
    /// `uq_user_achievements_user_key` constraint. Returns only the rows
    /// that were actually inserted, so a repeated call returns nothing.
    pub async fn award(
        pool: &PgPool,
        user_id: DbId,
        task_key: &str,
        achievement_keys: &[String],
    ) -> Result<Vec<UserAchievement>, sqlx::Error> {
        if achievement_keys.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "INSERT INTO user_achievements (user_id, achievement_key, task_key) \
             SELECT $1, key, $2 FROM UNNEST($3::text[]) AS key \
             ON CONFLICT ON CONSTRAINT uq_user_achievements_user_key DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let awarded = sqlx::query_as::<_, UserAchievement>(&query)
            .bind(user_id)
            .bind(task_key)
            .bind(achievement_keys)
            .fetch_all(pool)
            .await?;

        if !awarded.is_empty() {
            tracing::info!(user_id, task_key, count = awarded.len(), "Achievements awarded");
        }
        Ok(awarded)
    }

    /// All achievements a user holds, oldest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserAchievement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_achievements \
             WHERE user_id = $1 ORDER BY awarded_at, id"
        );
        sqlx::query_as::<_, UserAchievement>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// The set of achievement keys a user holds.
    pub async fn awarded_keys(pool: &PgPool, user_id: DbId) -> Result<BTreeSet<String>, sqlx::Error> {
        let keys: Vec<(String,)> =
            sqlx::query_as("SELECT achievement_key FROM user_achievements WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await?;
        Ok(keys.into_iter().map(|(k,)| k).collect())
    }
}
