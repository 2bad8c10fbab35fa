//! Per-user task state and its transition rules.
//!
//! The whole [`TaskStateMap`] for a user is persisted as one document and
//! updated with a single read-modify-write, so every function here takes the
//! map by mutable reference and leaves persistence to the caller.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::evaluator::Evaluation;
use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_LOCKED: &str = "locked";
pub const STATUS_UNLOCKED: &str = "unlocked";
pub const STATUS_TRIGGERED: &str = "triggered";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_DISMISSED: &str = "dismissed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// At least one dependency is not completed.
    Locked,
    /// Dependencies completed, trigger predicate currently false.
    Unlocked,
    /// Dependencies completed and trigger predicate true.
    Triggered,
    Completed,
    Dismissed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => STATUS_LOCKED,
            Self::Unlocked => STATUS_UNLOCKED,
            Self::Triggered => STATUS_TRIGGERED,
            Self::Completed => STATUS_COMPLETED,
            Self::Dismissed => STATUS_DISMISSED,
        }
    }

    /// Returns the set of statuses reachable from `self`.
    ///
    /// Completed is terminal.
    pub fn valid_transitions(&self) -> &'static [TaskStatus] {
        use TaskStatus::*;
        match self {
            Locked => &[Unlocked, Triggered],
            Unlocked => &[Locked, Triggered, Completed, Dismissed],
            Triggered => &[Locked, Unlocked, Completed, Dismissed],
            Dismissed => &[Unlocked, Completed],
            Completed => &[],
        }
    }

    pub fn can_transition(&self, to: TaskStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Whether evaluation may change this status.
    pub fn is_user_resolved(&self) -> bool {
        matches!(self, Self::Completed | Self::Dismissed)
    }
}

/// Validate a transition, returning an error message for invalid ones.
pub fn validate_transition(from: TaskStatus, to: TaskStatus) -> Result<(), String> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(format!(
            "Invalid task transition: {} -> {}",
            from.as_str(),
            to.as_str()
        ))
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// State of one task for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    pub status: TaskStatus,
    #[serde(default)]
    pub triggered_at: Option<Timestamp>,
    #[serde(default)]
    pub last_shown_at: Option<Timestamp>,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    #[serde(default)]
    pub dismissed_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl TaskState {
    fn new(status: TaskStatus, now: Timestamp) -> Self {
        Self {
            status,
            triggered_at: None,
            last_shown_at: None,
            completed_at: None,
            dismissed_at: None,
            updated_at: now,
        }
    }
}

/// All task states for one user, keyed by task key.
pub type TaskStateMap = BTreeMap<String, TaskState>;

/// Completed and dismissed task sets, the part of task state the evaluator
/// reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProgress {
    pub completed: BTreeSet<String>,
    pub dismissed: BTreeSet<String>,
}

impl UserProgress {
    pub fn from_states(states: &TaskStateMap) -> Self {
        let mut progress = Self::default();
        for (key, state) in states {
            match state.status {
                TaskStatus::Completed => {
                    progress.completed.insert(key.clone());
                }
                TaskStatus::Dismissed => {
                    progress.dismissed.insert(key.clone());
                }
                _ => {}
            }
        }
        progress
    }
}

/// Result of a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    AlreadyCompleted,
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

fn status_of(states: &TaskStateMap, key: &str) -> TaskStatus {
    states.get(key).map_or(TaskStatus::Locked, |s| s.status)
}

fn unknown_task(key: &str) -> CoreError {
    CoreError::UnknownKey {
        entity: "task",
        key: key.to_string(),
    }
}

/// Bring evaluator-owned statuses in line with a fresh evaluation.
///
/// Completed and dismissed tasks are left alone. A task entering
/// `triggered` gets `triggered_at` stamped; a task leaving it has both
/// `triggered_at` and `last_shown_at` cleared so a later re-trigger is
/// treated as new. Returns the keys that became triggered.
pub fn sync_with_evaluation(
    states: &mut TaskStateMap,
    evaluation: &Evaluation,
    now: Timestamp,
) -> Vec<String> {
    let mut newly_triggered = Vec::new();

    for task in &evaluation.tasks {
        if task.status.is_user_resolved() {
            continue;
        }
        let target = task.status;

        match states.get_mut(&task.key) {
            Some(state) if state.status.is_user_resolved() => {}
            Some(state) if state.status == target => {}
            Some(state) => {
                if target == TaskStatus::Triggered {
                    state.triggered_at = Some(now);
                    newly_triggered.push(task.key.clone());
                } else {
                    state.triggered_at = None;
                    state.last_shown_at = None;
                }
                state.status = target;
                state.updated_at = now;
            }
            None => {
                let mut state = TaskState::new(target, now);
                if target == TaskStatus::Triggered {
                    state.triggered_at = Some(now);
                    newly_triggered.push(task.key.clone());
                }
                states.insert(task.key.clone(), state);
            }
        }
    }

    newly_triggered
}

/// Mark a task completed.
///
/// All dependencies must already be completed. Completing a completed task
/// is a no-op reported as [`CompletionOutcome::AlreadyCompleted`].
pub fn complete(
    states: &mut TaskStateMap,
    catalog: &Catalog,
    key: &str,
    now: Timestamp,
) -> Result<CompletionOutcome, CoreError> {
    let task = catalog.task(key).ok_or_else(|| unknown_task(key))?;

    if status_of(states, key) == TaskStatus::Completed {
        return Ok(CompletionOutcome::AlreadyCompleted);
    }

    let unmet: Vec<&str> = task
        .dependencies
        .iter()
        .filter(|dep| status_of(states, dep) != TaskStatus::Completed)
        .map(String::as_str)
        .collect();
    if !unmet.is_empty() {
        return Err(CoreError::Conflict(format!(
            "Task '{key}' cannot be completed before: {}",
            unmet.join(", ")
        )));
    }

    let state = states
        .entry(key.to_string())
        .or_insert_with(|| TaskState::new(TaskStatus::Unlocked, now));
    state.status = TaskStatus::Completed;
    state.completed_at = Some(now);
    state.updated_at = now;
    Ok(CompletionOutcome::Completed)
}

/// Dismiss an available task. Tasks that block sharing cannot be dismissed.
pub fn dismiss(
    states: &mut TaskStateMap,
    catalog: &Catalog,
    key: &str,
    now: Timestamp,
) -> Result<(), CoreError> {
    let task = catalog.task(key).ok_or_else(|| unknown_task(key))?;
    if task.blocks_sharing {
        return Err(CoreError::Validation(format!(
            "Task '{key}' blocks profile sharing and cannot be dismissed"
        )));
    }

    let from = status_of(states, key);
    validate_transition(from, TaskStatus::Dismissed).map_err(CoreError::Conflict)?;

    if let Some(state) = states.get_mut(key) {
        state.status = TaskStatus::Dismissed;
        state.dismissed_at = Some(now);
        state.updated_at = now;
    }
    Ok(())
}

/// Undo a dismissal. The next evaluation decides whether it re-triggers.
pub fn restore(
    states: &mut TaskStateMap,
    catalog: &Catalog,
    key: &str,
    now: Timestamp,
) -> Result<(), CoreError> {
    catalog.task(key).ok_or_else(|| unknown_task(key))?;

    let from = status_of(states, key);
    if from != TaskStatus::Dismissed {
        return Err(CoreError::Conflict(format!(
            "Task '{key}' is {} and cannot be restored",
            from.as_str()
        )));
    }

    if let Some(state) = states.get_mut(key) {
        state.status = TaskStatus::Unlocked;
        state.dismissed_at = None;
        state.triggered_at = None;
        state.last_shown_at = None;
        state.updated_at = now;
    }
    Ok(())
}

/// Record that a triggered task was surfaced to the user.
pub fn mark_shown(
    states: &mut TaskStateMap,
    catalog: &Catalog,
    key: &str,
    now: Timestamp,
) -> Result<(), CoreError> {
    catalog.task(key).ok_or_else(|| unknown_task(key))?;

    match states.get_mut(key) {
        Some(state) if state.status == TaskStatus::Triggered => {
            state.last_shown_at = Some(now);
            state.updated_at = now;
            Ok(())
        }
        _ => Err(CoreError::Conflict(format!(
            "Task '{key}' is not currently triggered"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
