//! Route definitions for catalog administration.

use axum::routing::put;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin/catalog`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// PUT    /tasks/{key}/active   -> set_task_active
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/tasks/{key}/active", put(admin::set_task_active))
}
