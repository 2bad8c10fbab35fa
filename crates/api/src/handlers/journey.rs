//! Handlers for the user's recruiting journey.
//!
//! Every request follows the same flow: load the stored snapshot and task
//! states, evaluate against the current catalog, bring task states in line
//! with the evaluation, apply the requested change, and persist task states
//! once if anything changed.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use oneshot_core::error::CoreError;
use oneshot_core::journey::achievements::AchievementTracker;
use oneshot_core::journey::catalog::Catalog;
use oneshot_core::journey::evaluator::{self, EvaluatedTask, Evaluation, SharingVisibility};
use oneshot_core::journey::ranking::{self, CadencePolicy, NotificationTemplate, ScheduledTask};
use oneshot_core::journey::snapshot::UserProfileSnapshot;
use oneshot_core::journey::task_state::{self, CompletionOutcome, TaskStateMap, UserProgress};
use oneshot_core::types::{DbId, Timestamp};
use oneshot_db::repositories::{AchievementRepo, ProfileSnapshotRepo, TaskStateRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// The user's evaluated journey.
#[derive(Debug, Serialize)]
pub struct JourneyResponse {
    pub evaluated_on: NaiveDate,
    pub can_share: bool,
    pub blocking_tasks: Vec<String>,
    /// Every applicable task with its status, in dependency order.
    pub tasks: Vec<EvaluatedTask>,
    /// Triggered tasks in priority order with their notification template.
    pub ranked: Vec<ScheduledTask>,
    /// Tasks that became triggered during this evaluation.
    pub newly_triggered: Vec<String>,
}

/// An achievement announcement produced by a task completion.
#[derive(Debug, Serialize)]
pub struct AchievementNotice {
    pub achievement_key: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub template: NotificationTemplate,
}

/// Result of `POST /tasks/{key}/complete`.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub task_key: String,
    /// False when the task was already completed and nothing changed.
    pub newly_completed: bool,
    pub achievements: Vec<AchievementNotice>,
    pub journey: JourneyResponse,
}

// ---------------------------------------------------------------------------
// Shared flow
// ---------------------------------------------------------------------------

/// One evaluation pass for one user.
struct JourneyRun {
    user_id: DbId,
    now: Timestamp,
    catalog: Arc<Catalog>,
    snapshot: UserProfileSnapshot,
    states: TaskStateMap,
    evaluation: Evaluation,
    newly_triggered: Vec<String>,
    dirty: bool,
}

impl JourneyRun {
    /// Load everything for `user_id` and evaluate it.
    async fn load(state: &AppState, user_id: DbId) -> AppResult<Self> {
        let snapshot = ProfileSnapshotRepo::find(&state.pool, user_id)
            .await?
            .map(|s| s.snapshot())
            .unwrap_or_default();
        let states = TaskStateRepo::load(&state.pool, user_id).await?;

        let catalog = state.catalog.current();
        let now = Utc::now();
        let progress = UserProgress::from_states(&states);
        let evaluation = evaluator::evaluate(&snapshot, &progress, &catalog, now.date_naive());

        let mut run = Self {
            user_id,
            now,
            catalog,
            snapshot,
            states,
            evaluation,
            newly_triggered: Vec::new(),
            dirty: false,
        };
        run.sync();
        Ok(run)
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Re-run the evaluator against the current task states.
    fn reevaluate(&mut self) {
        let progress = UserProgress::from_states(&self.states);
        self.evaluation = evaluator::evaluate(&self.snapshot, &progress, &self.catalog, self.today());
        self.sync();
    }

    /// Bring task states in line with the latest evaluation.
    fn sync(&mut self) {
        let before = self.states.clone();
        let newly = task_state::sync_with_evaluation(&mut self.states, &self.evaluation, self.now);
        self.newly_triggered.extend(newly);
        if self.states != before {
            self.dirty = true;
        }
    }

    /// Apply a state mutation, then re-evaluate so dependents unlock and
    /// the blocking flag reflects the change.
    fn apply(
        &mut self,
        change: impl FnOnce(&mut TaskStateMap, &Catalog, Timestamp) -> Result<(), CoreError>,
    ) -> AppResult<()> {
        change(&mut self.states, &*self.catalog, self.now)?;
        self.dirty = true;
        self.reevaluate();
        Ok(())
    }

    /// Persist task states if this run changed them.
    async fn save(&mut self, state: &AppState) -> AppResult<()> {
        if self.dirty {
            TaskStateRepo::save(&state.pool, self.user_id, &self.states).await?;
            self.dirty = false;
        }
        if !self.newly_triggered.is_empty() {
            tracing::info!(
                user_id = self.user_id,
                tasks = ?self.newly_triggered,
                "Tasks triggered"
            );
        }
        Ok(())
    }

    fn schedule(&self, policy: &CadencePolicy) -> Vec<ScheduledTask> {
        let active_events = ranking::active_seasonal_events(&self.catalog, &self.snapshot, self.today());
        let ranked = ranking::rank(
            self.evaluation.triggered(),
            &self.catalog,
            &active_events,
            self.today(),
        );
        ranking::schedule(ranked, &self.states, policy, self.now)
    }

    fn into_journey(self, policy: &CadencePolicy) -> JourneyResponse {
        let ranked = self.schedule(policy);
        let SharingVisibility {
            can_share,
            blocking_tasks,
        } = self.evaluation.visibility();

        JourneyResponse {
            evaluated_on: self.evaluation.evaluated_on,
            can_share,
            blocking_tasks,
            tasks: self.evaluation.tasks,
            ranked,
            newly_triggered: self.newly_triggered,
        }
    }
}

/// Load, evaluate, apply `change`, persist, and return the journey.
async fn mutate_and_respond(
    state: &AppState,
    user_id: DbId,
    key: &str,
    action: &'static str,
    change: impl FnOnce(&mut TaskStateMap, &Catalog, Timestamp) -> Result<(), CoreError>,
) -> AppResult<JourneyResponse> {
    let mut run = JourneyRun::load(state, user_id).await?;
    run.apply(change)?;
    run.save(state).await?;

    tracing::info!(user_id, task_key = %key, action, "Task state changed");

    Ok(run.into_journey(&state.config.journey.cadence))
}

// ---------------------------------------------------------------------------
// PUT /user/journey/snapshot
// ---------------------------------------------------------------------------

/// Store the caller's profile snapshot and return the re-evaluated journey.
///
/// The document is stored verbatim. Fields that are malformed are treated
/// as absent during evaluation rather than rejected.
pub async fn put_snapshot(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<impl IntoResponse> {
    if !body.is_object() {
        return Err(AppError::BadRequest(
            "Profile snapshot must be a JSON object".into(),
        ));
    }

    ProfileSnapshotRepo::upsert(&state.pool, auth.user_id, &body).await?;
    tracing::debug!(user_id = auth.user_id, "Profile snapshot stored");

    let mut run = JourneyRun::load(&state, auth.user_id).await?;
    run.save(&state).await?;

    Ok(Json(DataResponse {
        data: run.into_journey(&state.config.journey.cadence),
    }))
}

// ---------------------------------------------------------------------------
// GET /user/journey
// ---------------------------------------------------------------------------

pub async fn get_journey(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut run = JourneyRun::load(&state, auth.user_id).await?;
    run.save(&state).await?;

    Ok(Json(DataResponse {
        data: run.into_journey(&state.config.journey.cadence),
    }))
}

// ---------------------------------------------------------------------------
// GET /user/journey/visibility
// ---------------------------------------------------------------------------

/// Whether the caller's profile may be shared, and what blocks it.
pub async fn get_visibility(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut run = JourneyRun::load(&state, auth.user_id).await?;
    run.save(&state).await?;

    Ok(Json(DataResponse {
        data: run.evaluation.visibility(),
    }))
}

// ---------------------------------------------------------------------------
// GET /user/journey/notifications
// ---------------------------------------------------------------------------

/// Tasks due for a notification now, in rank order, capped per run.
pub async fn get_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let policy = &state.config.journey.cadence;
    let mut run = JourneyRun::load(&state, auth.user_id).await?;
    run.save(&state).await?;

    let plan = ranking::notification_plan(&run.schedule(policy), policy);
    tracing::debug!(user_id = auth.user_id, count = plan.len(), "Built notification plan");

    Ok(Json(DataResponse { data: plan }))
}

// ---------------------------------------------------------------------------
// POST /user/journey/tasks/{key}/complete
// ---------------------------------------------------------------------------

/// Complete a task and award any achievements it unlocks.
///
/// Completing an already completed task succeeds and only awards what an
/// earlier completion earned but failed to record.
pub async fn complete_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    let mut run = JourneyRun::load(&state, auth.user_id).await?;
    let completed_before = UserProgress::from_states(&run.states).completed;

    let outcome = task_state::complete(&mut run.states, &run.catalog, &key, run.now)?;
    let newly_completed = outcome == CompletionOutcome::Completed;
    if newly_completed {
        run.dirty = true;
        run.reevaluate();
    }
    run.save(&state).await?;

    // Runs on repeat completions too. The insert skips keys already held.
    let held = AchievementRepo::awarded_keys(&state.pool, auth.user_id).await?;
    let earned = AchievementTracker::on_task_completed(&run.catalog, &completed_before, &held, &key)?;
    let inserted = AchievementRepo::award(&state.pool, auth.user_id, &key, &earned).await?;

    // Announce in catalog order. Keys a concurrent request inserted first are skipped.
    let achievements: Vec<AchievementNotice> = run
        .catalog
        .achievements()
        .iter()
        .filter(|a| inserted.iter().any(|row| row.achievement_key == a.key))
        .map(|a| AchievementNotice {
            achievement_key: a.key.clone(),
            title: a.title.clone(),
            description: a.description.clone(),
            icon: a.icon.clone(),
            template: NotificationTemplate::Achievement,
        })
        .collect();

    if newly_completed {
        tracing::info!(
            user_id = auth.user_id,
            task_key = %key,
            achievements = achievements.len(),
            "Task completed"
        );
    } else {
        tracing::debug!(
            user_id = auth.user_id,
            task_key = %key,
            achievements = achievements.len(),
            "Task already completed"
        );
    }

    Ok(Json(DataResponse {
        data: CompletionResponse {
            task_key: key,
            newly_completed,
            achievements,
            journey: run.into_journey(&state.config.journey.cadence),
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /user/journey/tasks/{key}/dismiss
// ---------------------------------------------------------------------------

/// Dismiss a task. Tasks that block profile sharing are rejected.
pub async fn dismiss_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    let journey = mutate_and_respond(&state, auth.user_id, &key, "dismiss", |states, catalog, now| {
        task_state::dismiss(states, catalog, &key, now)
    })
    .await?;

    Ok(Json(DataResponse { data: journey }))
}

// ---------------------------------------------------------------------------
// POST /user/journey/tasks/{key}/restore
// ---------------------------------------------------------------------------

/// Undo a dismissal.
pub async fn restore_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    let journey = mutate_and_respond(&state, auth.user_id, &key, "restore", |states, catalog, now| {
        task_state::restore(states, catalog, &key, now)
    })
    .await?;

    Ok(Json(DataResponse { data: journey }))
}

// ---------------------------------------------------------------------------
// POST /user/journey/tasks/{key}/shown
// ---------------------------------------------------------------------------

/// Record that a triggered task was shown, restarting its cadence window.
pub async fn mark_task_shown(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    let journey = mutate_and_respond(&state, auth.user_id, &key, "shown", |states, catalog, now| {
        task_state::mark_shown(states, catalog, &key, now)
    })
    .await?;

    Ok(Json(DataResponse { data: journey }))
}
