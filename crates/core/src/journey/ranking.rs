//! Priority ranking and notification template selection.
//!
//! Configuration-driven ordering of triggered tasks: there is no queue and
//! no concurrency here, only a sort and a few cadence rules.

use std::cmp::Ordering;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::catalog::{Catalog, Priority};
use super::evaluator::EvaluatedTask;
use super::seasonal::SeasonalEvent;
use super::snapshot::UserProfileSnapshot;
use super::task_state::{TaskState, TaskStateMap};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

pub const TEMPLATE_NUDGE: &str = "nudge";
pub const TEMPLATE_SEASONAL: &str = "seasonal";
pub const TEMPLATE_CRITICAL: &str = "critical";
pub const TEMPLATE_ACHIEVEMENT: &str = "achievement";
pub const TEMPLATE_REMINDER: &str = "reminder";

/// Notification template handed to the dispatch service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    Nudge,
    Seasonal,
    Critical,
    Achievement,
    Reminder,
}

impl NotificationTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nudge => TEMPLATE_NUDGE,
            Self::Seasonal => TEMPLATE_SEASONAL,
            Self::Critical => TEMPLATE_CRITICAL,
            Self::Achievement => TEMPLATE_ACHIEVEMENT,
            Self::Reminder => TEMPLATE_REMINDER,
        }
    }
}

// ---------------------------------------------------------------------------
// Cadence policy
// ---------------------------------------------------------------------------

/// Defaults for [`CadencePolicy`].
pub const DEFAULT_REMINDER_AFTER_DAYS: i64 = 3;
pub const DEFAULT_MIN_NOTIFICATION_INTERVAL_HOURS: i64 = 24;
pub const DEFAULT_MAX_NOTIFICATIONS_PER_RUN: usize = 3;

/// Notification cadence rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadencePolicy {
    /// A triggered task untouched this long uses the reminder template.
    pub reminder_after: Duration,
    /// Minimum gap between two notifications for the same task.
    pub min_interval: Duration,
    /// Upper bound on notifications returned by one plan.
    pub max_per_run: usize,
}

impl Default for CadencePolicy {
    fn default() -> Self {
        Self {
            reminder_after: Duration::days(DEFAULT_REMINDER_AFTER_DAYS),
            min_interval: Duration::hours(DEFAULT_MIN_NOTIFICATION_INTERVAL_HOURS),
            max_per_run: DEFAULT_MAX_NOTIFICATIONS_PER_RUN,
        }
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// A triggered task with its computed score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTask {
    pub key: String,
    pub title: String,
    pub priority: Priority,
    pub score: u32,
    pub blocking: bool,
    /// Whether a peak-month or seasonal-event boost contributed to `score`.
    pub seasonal_boost: bool,
    pub estimated_time_minutes: u32,
}

/// A ranked task annotated with the template to use and whether it is due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledTask {
    #[serde(flatten)]
    pub task: RankedTask,
    pub template: NotificationTemplate,
    pub due: bool,
}

/// Seasonal events whose window contains `today` and whose audience
/// includes the snapshot.
pub fn active_seasonal_events<'a>(
    catalog: &'a Catalog,
    snapshot: &UserProfileSnapshot,
    today: NaiveDate,
) -> Vec<&'a SeasonalEvent> {
    catalog
        .seasonal_events()
        .values()
        .filter(|event| event.is_active_on(today) && event.applies_to(snapshot))
        .collect()
}

/// Rank triggered tasks.
///
/// Blocking tasks come first regardless of score; then higher score; then
/// quicker tasks; then key for a stable order. Non-triggered entries and
/// keys the catalog does not know are ignored.
pub fn rank<'a>(
    triggered: impl IntoIterator<Item = &'a EvaluatedTask>,
    catalog: &Catalog,
    active_events: &[&SeasonalEvent],
    today: NaiveDate,
) -> Vec<RankedTask> {
    let month = today.month();

    let mut ranked: Vec<RankedTask> = triggered
        .into_iter()
        .filter(|t| t.triggered)
        .filter_map(|evaluated| {
            let task = catalog.task(&evaluated.key)?;

            let peak_boost = task
                .seasonal_relevance
                .as_ref()
                .filter(|r| r.is_peak(month))
                .map_or(0, |r| r.urgency_boost);

            let event_boost: u32 = task
                .seasonal_event_keys()
                .filter_map(|key| active_events.iter().find(|e| e.key == key))
                .map(|e| e.priority_boost)
                .sum();

            Some(RankedTask {
                key: task.key.clone(),
                title: task.title.clone(),
                priority: task.priority,
                score: task.priority.base_score() + peak_boost + event_boost,
                blocking: evaluated.blocking,
                seasonal_boost: peak_boost + event_boost > 0,
                estimated_time_minutes: task.estimated_time_minutes,
            })
        })
        .collect();

    ranked.sort_by(compare_ranked);
    ranked
}

fn compare_ranked(a: &RankedTask, b: &RankedTask) -> Ordering {
    b.blocking
        .cmp(&a.blocking)
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| a.estimated_time_minutes.cmp(&b.estimated_time_minutes))
        .then_with(|| a.key.cmp(&b.key))
}

// ---------------------------------------------------------------------------
// Templates and cadence
// ---------------------------------------------------------------------------

/// Pick the notification template for a ranked task.
///
/// Order of precedence: a never-shown blocking task is `critical`; a task
/// untouched for `reminder_after` is a `reminder`; a boosted task is
/// `seasonal`; everything else is a `nudge`.
pub fn select_template(
    task: &RankedTask,
    state: Option<&TaskState>,
    policy: &CadencePolicy,
    now: Timestamp,
) -> NotificationTemplate {
    let last_shown = state.and_then(|s| s.last_shown_at);

    if task.blocking && last_shown.is_none() {
        return NotificationTemplate::Critical;
    }

    let untouched_since = last_shown.or_else(|| state.and_then(|s| s.triggered_at));
    if untouched_since.is_some_and(|since| now - since >= policy.reminder_after) {
        return NotificationTemplate::Reminder;
    }

    if task.seasonal_boost {
        NotificationTemplate::Seasonal
    } else {
        NotificationTemplate::Nudge
    }
}

/// Whether enough time has passed since the task was last surfaced.
pub fn is_due(state: Option<&TaskState>, policy: &CadencePolicy, now: Timestamp) -> bool {
    match state.and_then(|s| s.last_shown_at) {
        None => true,
        Some(shown) => now - shown >= policy.min_interval,
    }
}

/// Annotate ranked tasks with template and due flag, preserving rank order.
pub fn schedule(
    ranked: Vec<RankedTask>,
    states: &TaskStateMap,
    policy: &CadencePolicy,
    now: Timestamp,
) -> Vec<ScheduledTask> {
    ranked
        .into_iter()
        .map(|task| {
            let state = states.get(&task.key);
            ScheduledTask {
                template: select_template(&task, state, policy, now),
                due: is_due(state, policy, now),
                task,
            }
        })
        .collect()
}

/// The due subset of a schedule, capped at `max_per_run`.
pub fn notification_plan(scheduled: &[ScheduledTask], policy: &CadencePolicy) -> Vec<ScheduledTask> {
    scheduled
        .iter()
        .filter(|s| s.due)
        .take(policy.max_per_run)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
