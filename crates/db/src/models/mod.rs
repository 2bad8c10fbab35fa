//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row, plus any write DTOs the repositories accept.

pub mod achievement;
pub mod profile_snapshot;
pub mod task_activation;
pub mod task_state;
