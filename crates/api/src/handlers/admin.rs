//! Catalog administration handlers. All require the `admin` role.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use oneshot_db::models::task_activation::SetTaskActivation;
use oneshot_db::repositories::TaskActivationRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// PUT /admin/catalog/tasks/{key}/active
// ---------------------------------------------------------------------------

/// Activate or deactivate a task without reloading the catalog.
///
/// The toggle is persisted first so it survives a restart, then the served
/// catalog is swapped. Toggles run one at a time. Evaluations already in
/// flight finish against the previous catalog.
pub async fn set_task_active(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<SetTaskActivation>,
) -> AppResult<impl IntoResponse> {
    let _toggle = state.catalog.lock_toggles().await;
    state.catalog.current().require_task(&key)?;

    let record = TaskActivationRepo::set(&state.pool, &key, input.is_active, admin.user_id).await?;
    state.catalog.set_activation(&key, input.is_active)?;

    tracing::info!(
        task_key = %key,
        is_active = input.is_active,
        admin_id = admin.user_id,
        "Task activation changed"
    );

    Ok(Json(DataResponse { data: record }))
}
