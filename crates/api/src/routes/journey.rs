//! Route definitions for the user's recruiting journey.
//!
//! Mounted at `/user/journey` by `api_routes()`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::journey;
use crate::state::AppState;

/// Routes mounted at `/user/journey`.
///
/// ```text
/// GET    /                       -> get_journey
/// PUT    /snapshot               -> put_snapshot
/// GET    /visibility             -> get_visibility
/// GET    /notifications          -> get_notifications
/// POST   /tasks/{key}/complete   -> complete_task
/// POST   /tasks/{key}/dismiss    -> dismiss_task
/// POST   /tasks/{key}/restore    -> restore_task
/// POST   /tasks/{key}/shown      -> mark_task_shown
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(journey::get_journey))
        .route("/snapshot", put(journey::put_snapshot))
        .route("/visibility", get(journey::get_visibility))
        .route("/notifications", get(journey::get_notifications))
        .route("/tasks/{key}/complete", post(journey::complete_task))
        .route("/tasks/{key}/dismiss", post(journey::dismiss_task))
        .route("/tasks/{key}/restore", post(journey::restore_task))
        .route("/tasks/{key}/shown", post(journey::mark_task_shown))
}
