//! Eligibility evaluator -- pure logic, no database access.
//!
//! Given a profile snapshot and the user's completed/dismissed tasks,
//! decides which catalog tasks are locked, unlocked, or triggered, and
//! whether any triggered task blocks the profile from being shared.

use chrono::NaiveDate;
use serde::Serialize;

use super::catalog::Catalog;
use super::snapshot::UserProfileSnapshot;
use super::task_state::{TaskStatus, UserProgress};
use super::triggers::{evaluate_all, TriggerContext};

/// Evaluation result for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluatedTask {
    pub key: String,
    pub status: TaskStatus,
    pub dependencies_met: bool,
    pub triggered: bool,
    pub blocking: bool,
}

/// Evaluation result for one user on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub evaluated_on: NaiveDate,
    /// Active, applicable tasks in catalog dependency order.
    pub tasks: Vec<EvaluatedTask>,
    /// True while any triggered task blocks sharing.
    pub blocking: bool,
    pub blocking_tasks: Vec<String>,
}

/// Input for the profile-visibility gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharingVisibility {
    pub can_share: bool,
    pub blocking_tasks: Vec<String>,
}

impl Evaluation {
    pub fn triggered(&self) -> impl Iterator<Item = &EvaluatedTask> {
        self.tasks.iter().filter(|t| t.triggered)
    }

    pub fn task(&self, key: &str) -> Option<&EvaluatedTask> {
        self.tasks.iter().find(|t| t.key == key)
    }

    pub fn visibility(&self) -> SharingVisibility {
        SharingVisibility {
            can_share: !self.blocking,
            blocking_tasks: self.blocking_tasks.clone(),
        }
    }
}

/// Evaluate every active task that applies to the snapshot's sport/role.
///
/// A task is triggered iff all dependencies are completed, its predicate
/// holds, and the user has neither completed nor dismissed it.
pub fn evaluate(
    snapshot: &UserProfileSnapshot,
    progress: &UserProgress,
    catalog: &Catalog,
    today: NaiveDate,
) -> Evaluation {
    let ctx = TriggerContext {
        snapshot,
        today,
        seasonal_events: catalog.seasonal_events(),
    };

    let tasks: Vec<EvaluatedTask> = catalog
        .tasks()
        .iter()
        .filter(|task| task.is_active && task.applies_to(snapshot))
        .map(|task| {
            let dependencies_met = task
                .dependencies
                .iter()
                .all(|dep| progress.completed.contains(dep));
            let completed = progress.completed.contains(&task.key);
            let dismissed = progress.dismissed.contains(&task.key);

            let triggered = dependencies_met
                && !completed
                && !dismissed
                && evaluate_all(&task.triggers, &ctx);

            let status = if completed {
                TaskStatus::Completed
            } else if dismissed {
                TaskStatus::Dismissed
            } else if !dependencies_met {
                TaskStatus::Locked
            } else if triggered {
                TaskStatus::Triggered
            } else {
                TaskStatus::Unlocked
            };

            EvaluatedTask {
                key: task.key.clone(),
                status,
                dependencies_met,
                triggered,
                blocking: triggered && task.blocks_sharing,
            }
        })
        .collect();

    let blocking_tasks: Vec<String> = tasks
        .iter()
        .filter(|t| t.blocking)
        .map(|t| t.key.clone())
        .collect();

    Evaluation {
        evaluated_on: today,
        blocking: !blocking_tasks.is_empty(),
        blocking_tasks,
        tasks,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn snapshot(raw: serde_json::Value) -> UserProfileSnapshot {
        UserProfileSnapshot::from_value(&raw)
    }

    fn progress(completed: &[&str]) -> UserProgress {
        UserProgress {
            completed: completed.iter().map(|s| s.to_string()).collect(),
            dismissed: Default::default(),
        }
    }

    fn builtin() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn basic_profile_example_is_triggered_and_blocking() {
        let s = snapshot(json!({
            "completion_pct": 20,
            "missing_fields": ["graduation_year", "position"]
        }));
        let evaluation = evaluate(&s, &progress(&[]), &builtin(), today());
        let basics = evaluation.task("complete_basic_profile").unwrap();
        assert!(basics.triggered);
        assert!(basics.blocking);
        assert!(evaluation.blocking);
        assert!(!evaluation.visibility().can_share);
    }

    #[test]
    fn empty_snapshot_blocks_sharing() {
        for raw in [
            json!({}),
            json!({ "completion_pct": 5 }),
            json!({ "graduation_year": "soon", "fields": { "position": 7 } }),
        ] {
            let evaluation = evaluate(&snapshot(raw), &progress(&[]), &builtin(), today());
            assert!(evaluation.task("complete_basic_profile").unwrap().triggered);
            assert!(!evaluation.visibility().can_share);
        }
    }

    #[test]
    fn filled_profile_can_share() {
        let s = snapshot(json!({
            "graduation_year": 2027,
            "fields": {
                "position": "Striker",
                "high_school_name": "Lincoln",
                "email": "striker@example.com",
                "phone": "555-0100"
            }
        }));
        let evaluation = evaluate(&s, &progress(&[]), &builtin(), today());
        assert!(evaluation.visibility().can_share);
    }

    #[test]
    fn dependent_task_waits_for_dependency() {
        // Photo is missing, but the parent task is not completed yet.
        let s = snapshot(json!({
            "missing_fields": ["graduation_year", "profile_photo"]
        }));
        let evaluation = evaluate(&s, &progress(&[]), &builtin(), today());
        let photo = evaluation.task("add_profile_photo").unwrap();
        assert!(!photo.dependencies_met);
        assert!(!photo.triggered);
        assert_eq!(photo.status, TaskStatus::Locked);

        let evaluation = evaluate(&s, &progress(&["complete_basic_profile"]), &builtin(), today());
        let photo = evaluation.task("add_profile_photo").unwrap();
        assert!(photo.triggered);
    }

    #[test]
    fn blocking_clears_after_completion() {
        let s = snapshot(json!({ "missing_fields": ["position"] }));
        let before = evaluate(&s, &progress(&[]), &builtin(), today());
        assert!(before.blocking_tasks.contains(&"complete_basic_profile".to_string()));

        let after = evaluate(&s, &progress(&["complete_basic_profile"]), &builtin(), today());
        assert!(!after.blocking_tasks.contains(&"complete_basic_profile".to_string()));
        let basics = after.task("complete_basic_profile").unwrap();
        assert_eq!(basics.status, TaskStatus::Completed);
        assert!(!basics.blocking);
    }

    #[test]
    fn every_blocking_task_sets_the_aggregate_flag() {
        let catalog = builtin();
        let s = snapshot(json!({
            "missing_fields": ["graduation_year", "position", "email", "phone"]
        }));
        let evaluation = evaluate(&s, &progress(&[]), &catalog, today());
        for task in evaluation.triggered() {
            if catalog.task(&task.key).unwrap().blocks_sharing {
                assert!(task.blocking);
                assert!(evaluation.blocking);
            }
        }
    }

    fn custom_catalog() -> Catalog {
        let doc = json!({
            "tasks": [
                { "key": "always", "title": "Always", "category": "planning",
                  "priority": "low", "estimated_time_minutes": 1 },
                { "key": "paused", "title": "Paused", "category": "planning",
                  "priority": "low", "estimated_time_minutes": 1, "is_active": false },
                { "key": "parents_only", "title": "Parents", "category": "planning",
                  "priority": "low", "estimated_time_minutes": 1, "roles": ["parent"] },
                { "key": "football_only", "title": "Football", "category": "planning",
                  "priority": "low", "estimated_time_minutes": 1, "sports": ["football"] }
            ]
        });
        Catalog::from_json_str(&doc.to_string()).unwrap()
    }

    #[test]
    fn task_without_triggers_is_always_eligible() {
        let evaluation = evaluate(
            &UserProfileSnapshot::default(),
            &progress(&[]),
            &custom_catalog(),
            today(),
        );
        assert!(evaluation.task("always").unwrap().triggered);
    }

    #[test]
    fn inactive_and_inapplicable_tasks_are_skipped() {
        let s = snapshot(json!({ "role": "athlete", "sport": "soccer" }));
        let evaluation = evaluate(&s, &progress(&[]), &custom_catalog(), today());
        assert!(evaluation.task("paused").is_none());
        assert!(evaluation.task("parents_only").is_none());
        assert!(evaluation.task("football_only").is_none());

        let parent = snapshot(json!({ "role": "parent", "sport": "Football" }));
        let evaluation = evaluate(&parent, &progress(&[]), &custom_catalog(), today());
        assert!(evaluation.task("parents_only").is_some());
        assert!(evaluation.task("football_only").is_some());
    }

    #[test]
    fn dismissed_tasks_are_not_triggered() {
        let mut p = progress(&[]);
        p.dismissed.insert("always".to_string());
        let evaluation = evaluate(&UserProfileSnapshot::default(), &p, &custom_catalog(), today());
        let always = evaluation.task("always").unwrap();
        assert!(!always.triggered);
        assert_eq!(always.status, TaskStatus::Dismissed);
    }

    #[test]
    fn evaluation_is_pure() {
        let s = snapshot(json!({ "missing_fields": ["position"], "completion_pct": 30 }));
        let a = evaluate(&s, &progress(&[]), &builtin(), today());
        let b = evaluate(&s, &progress(&[]), &builtin(), today());
        assert_eq!(a, b);
    }
}
