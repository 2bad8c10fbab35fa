pub mod achievements;
pub mod admin;
pub mod catalog;
pub mod health;
pub mod journey;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /catalog                                  validated catalog
/// /catalog/seasonal/active                  seasonal events active today
///
/// /user/journey                             evaluated + ranked journey
/// /user/journey/snapshot                    store profile snapshot (PUT)
/// /user/journey/visibility                  profile sharing gate
/// /user/journey/notifications               due notification plan
/// /user/journey/tasks/{key}/complete        complete (POST)
/// /user/journey/tasks/{key}/dismiss         dismiss (POST)
/// /user/journey/tasks/{key}/restore         undo dismissal (POST)
/// /user/journey/tasks/{key}/shown           record display (POST)
///
/// /user/achievements                        awarded achievements
///
/// /admin/catalog/tasks/{key}/active         toggle is_active (PUT, admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/catalog", catalog::router())
        .nest("/user/journey", journey::router())
        .nest("/user/achievements", achievements::router())
        .nest("/admin/catalog", admin::router())
}
