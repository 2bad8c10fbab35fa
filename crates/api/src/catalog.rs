//! Startup catalog loading.
//!
//! The catalog comes from `CATALOG_PATH` or the embedded default, then has
//! persisted admin activation toggles applied on top.

use oneshot_core::journey::catalog::{Catalog, CatalogError};
use oneshot_db::models::task_activation::TaskActivationOverride;

use crate::config::JourneyConfig;

/// Load and validate the configured catalog.
pub fn load_configured(config: &JourneyConfig) -> Result<Catalog, CatalogError> {
    let catalog = match &config.catalog_path {
        Some(path) => {
            let catalog = Catalog::from_path(path)?;
            tracing::info!(path = %path.display(), "Loaded catalog from file");
            catalog
        }
        None => Catalog::builtin()?,
    };

    tracing::info!(
        tasks = catalog.tasks().len(),
        seasonal_events = catalog.seasonal_events().len(),
        achievements = catalog.achievements().len(),
        "Catalog validated"
    );
    Ok(catalog)
}

/// Apply persisted activation overrides. Overrides naming a task the
/// catalog no longer has are logged and skipped.
pub fn apply_overrides(catalog: Catalog, overrides: &[TaskActivationOverride]) -> Catalog {
    overrides
        .iter()
        .fold(catalog, |catalog, o| match catalog.with_activation(&o.task_key, o.is_active) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(task_key = %o.task_key, error = %err, "Skipping activation override");
                catalog
            }
        })
}
