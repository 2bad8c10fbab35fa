//! Handlers for awarded achievements.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use oneshot_core::types::Timestamp;
use oneshot_db::repositories::AchievementRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// An awarded achievement joined with its catalog definition.
#[derive(Debug, Serialize)]
pub struct AwardedAchievement {
    pub achievement_key: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub task_key: String,
    pub awarded_at: Timestamp,
}

// ---------------------------------------------------------------------------
// GET /user/achievements
// ---------------------------------------------------------------------------

/// List the caller's achievements, oldest first. Awards whose definition
/// has since been removed from the catalog are still listed, titled by key.
pub async fn list_achievements(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let catalog = state.catalog.current();
    let rows = AchievementRepo::list_for_user(&state.pool, auth.user_id).await?;

    let data: Vec<AwardedAchievement> = rows
        .into_iter()
        .map(|row| {
            let definition = catalog
                .achievements()
                .iter()
                .find(|a| a.key == row.achievement_key);
            AwardedAchievement {
                title: definition.map_or_else(|| row.achievement_key.clone(), |a| a.title.clone()),
                description: definition.map(|a| a.description.clone()).unwrap_or_default(),
                icon: definition.map(|a| a.icon.clone()).unwrap_or_default(),
                achievement_key: row.achievement_key,
                task_key: row.task_key,
                awarded_at: row.awarded_at,
            }
        })
        .collect();

    Ok(Json(DataResponse { data }))
}
