//! Recruiting journey engine.
//!
//! - [`catalog`] -- task definitions and load-time validation.
//! - [`snapshot`] -- the profile snapshot supplied by the profile service.
//! - [`triggers`] -- trigger predicates and their evaluation.
//! - [`seasonal`] -- recurring recruiting-calendar windows.
//! - [`evaluator`] -- decides which tasks are triggered and which block sharing.
//! - [`ranking`] -- priority ranking, templates, and notification cadence.
//! - [`task_state`] -- per-user task lifecycle.
//! - [`achievements`] -- one-time badges awarded on task completion.

pub mod achievements;
pub mod catalog;
pub mod evaluator;
pub mod ranking;
pub mod seasonal;
pub mod snapshot;
pub mod task_state;
pub mod triggers;
