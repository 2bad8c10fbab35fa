//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod achievement_repo;
pub mod profile_snapshot_repo;
pub mod task_activation_repo;
pub mod task_state_repo;

pub use achievement_repo::AchievementRepo;
pub use profile_snapshot_repo::ProfileSnapshotRepo;
pub use task_activation_repo::TaskActivationRepo;
pub use task_state_repo::TaskStateRepo;
