//! One-time achievement badges.
//!
//! The tracker is pure: it compares the user's completed tasks against each
//! achievement's criteria and returns the keys that are satisfied but not
//! yet awarded. Persisting the award is the caller's job; the `user_achievements`
//! unique constraint makes a repeated insert a no-op.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::catalog::{Catalog, CatalogError};

/// Condition under which an achievement is awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AchievementCriteria {
    /// Awarded on the first completed task of any kind.
    FirstTask,
    /// Awarded when a specific task is completed.
    TaskCompleted { task: String },
    /// Awarded once `count` tasks have been completed.
    TasksCompleted { count: u32 },
    /// Awarded once every listed task has been completed.
    AllOf { tasks: Vec<String> },
}

impl AchievementCriteria {
    /// Whether the criteria hold for a completed-task set.
    pub fn is_satisfied(&self, completed: &BTreeSet<String>) -> bool {
        match self {
            Self::FirstTask => !completed.is_empty(),
            Self::TaskCompleted { task } => completed.contains(task),
            Self::TasksCompleted { count } => completed.len() >= *count as usize,
            Self::AllOf { tasks } => tasks.iter().all(|t| completed.contains(t)),
        }
    }

    /// Task keys this criteria names.
    pub fn referenced_tasks(&self) -> &[String] {
        match self {
            Self::TaskCompleted { task } => std::slice::from_ref(task),
            Self::AllOf { tasks } => tasks,
            Self::FirstTask | Self::TasksCompleted { .. } => &[],
        }
    }
}

/// An achievement definition from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Achievement {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub icon: String,
    pub criteria: AchievementCriteria,
}

/// Decides which achievements a task completion unlocks.
pub struct AchievementTracker;

impl AchievementTracker {
    /// Achievements newly earned by completing `task_key`.
    ///
    /// `completed` is the user's completed-task set; `task_key` is added to
    /// it if the caller has not already done so. Anything in `awarded` is
    /// skipped, so calling this again after recording the result returns an
    /// empty list.
    pub fn on_task_completed(
        catalog: &Catalog,
        completed: &BTreeSet<String>,
        awarded: &BTreeSet<String>,
        task_key: &str,
    ) -> Result<Vec<String>, CatalogError> {
        catalog.require_task(task_key)?;

        let mut completed = completed.clone();
        completed.insert(task_key.to_string());

        Ok(catalog
            .achievements()
            .iter()
            .filter(|a| !awarded.contains(&a.key))
            .filter(|a| a.criteria.is_satisfied(&completed))
            .map(|a| a.key.clone())
            .collect())
    }
}
