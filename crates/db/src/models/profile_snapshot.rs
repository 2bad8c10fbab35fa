//! Stored profile snapshot model.

use serde::Serialize;
use sqlx::FromRow;
use oneshot_core::journey::snapshot::UserProfileSnapshot;
use oneshot_core::types::{DbId, Timestamp};

/// A row from the `profile_snapshots` table.
///
/// `snapshot_json` is the raw document the profile service sent. It is kept
/// verbatim and parsed leniently on read.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredSnapshot {
    pub user_id: DbId,
    pub snapshot_json: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StoredSnapshot {
    pub fn snapshot(&self) -> UserProfileSnapshot {
        UserProfileSnapshot::from_value(&self.snapshot_json)
    }
}
