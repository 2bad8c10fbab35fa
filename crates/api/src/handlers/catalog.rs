//! Handlers for reading the served task catalog.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use oneshot_core::journey::achievements::Achievement;
use oneshot_core::journey::catalog::TaskDefinition;
use oneshot_core::journey::ranking;
use oneshot_core::journey::seasonal::SeasonalEvent;
use oneshot_db::repositories::ProfileSnapshotRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Serialized form of the validated catalog.
#[derive(Debug, Serialize)]
pub struct CatalogView {
    /// Tasks in dependency order.
    pub tasks: Vec<TaskDefinition>,
    pub seasonal_events: Vec<SeasonalEvent>,
    pub achievements: Vec<Achievement>,
}

// ---------------------------------------------------------------------------
// GET /catalog
// ---------------------------------------------------------------------------

pub async fn get_catalog(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let catalog = state.catalog.current();

    Ok(Json(DataResponse {
        data: CatalogView {
            tasks: catalog.tasks().to_vec(),
            seasonal_events: catalog.seasonal_events().values().cloned().collect(),
            achievements: catalog.achievements().to_vec(),
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /catalog/seasonal/active
// ---------------------------------------------------------------------------

/// Seasonal events active today for the caller's stored sport and role.
pub async fn active_seasonal_events(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let catalog = state.catalog.current();
    let snapshot = ProfileSnapshotRepo::find(&state.pool, auth.user_id)
        .await?
        .map(|s| s.snapshot())
        .unwrap_or_default();

    let today = Utc::now().date_naive();
    let events: Vec<SeasonalEvent> = ranking::active_seasonal_events(&catalog, &snapshot, today)
        .into_iter()
        .cloned()
        .collect();

    tracing::debug!(user_id = auth.user_id, count = events.len(), "Listed active seasonal events");

    Ok(Json(DataResponse { data: events }))
}
