//! Route definitions for the `/catalog` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Routes mounted at `/catalog`.
///
/// ```text
/// GET    /                  -> get_catalog
/// GET    /seasonal/active   -> active_seasonal_events
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::get_catalog))
        .route("/seasonal/active", get(catalog::active_seasonal_events))
}
