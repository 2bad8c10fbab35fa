use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, MutexGuard};

use oneshot_core::journey::catalog::{Catalog, CatalogError};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: oneshot_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The catalog currently being served.
    pub catalog: CatalogHandle,
}

/// Swappable reference to the validated catalog.
///
/// Readers take an `Arc` snapshot and evaluate against it without holding
/// the lock. Activation toggles build a new catalog and swap it in.
#[derive(Clone)]
pub struct CatalogHandle {
    served: Arc<RwLock<Arc<Catalog>>>,
    toggles: Arc<Mutex<()>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            served: Arc::new(RwLock::new(Arc::new(catalog))),
            toggles: Arc::new(Mutex::new(())),
        }
    }

    /// The catalog in effect right now.
    pub fn current(&self) -> Arc<Catalog> {
        let guard = self.served.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replace the served catalog with one where `key` has the given
    /// `is_active` flag. Requests already in flight keep their snapshot.
    pub fn set_activation(&self, key: &str, is_active: bool) -> Result<Arc<Catalog>, CatalogError> {
        let mut guard = self.served.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(guard.with_activation(key, is_active)?);
        *guard = Arc::clone(&next);
        Ok(next)
    }

    /// Hold while persisting an activation override and swapping it in, so
    /// the stored row and the served catalog agree on the last toggle.
    pub async fn lock_toggles(&self) -> MutexGuard<'_, ()> {
        self.toggles.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_swaps_catalog_without_touching_existing_snapshots() {
        let handle = CatalogHandle::new(Catalog::builtin().unwrap());
        let before = handle.current();

        let after = handle.set_activation("write_bio", false).unwrap();
        assert!(before.task("write_bio").unwrap().is_active);
        assert!(!after.task("write_bio").unwrap().is_active);
        assert!(!handle.current().task("write_bio").unwrap().is_active);
    }

    #[test]
    fn unknown_task_leaves_catalog_unchanged() {
        let handle = CatalogHandle::new(Catalog::builtin().unwrap());
        let before = handle.current();
        assert!(handle.set_activation("no_such_task", false).is_err());
        assert!(Arc::ptr_eq(&before, &handle.current()));
    }

    #[tokio::test]
    async fn toggles_are_exclusive_across_clones() {
        let handle = CatalogHandle::new(Catalog::builtin().unwrap());
        let other = handle.clone();

        let guard = handle.lock_toggles().await;
        assert!(other.toggles.try_lock().is_err());
        drop(guard);
        assert!(other.toggles.try_lock().is_ok());
    }
}
