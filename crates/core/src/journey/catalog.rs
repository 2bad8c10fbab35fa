//! Task catalog: definitions, loading, and load-time graph validation.
//!
//! A [`Catalog`] can only be obtained through validation, so every value the
//! evaluator sees has resolvable dependencies, no cycles, parsed predicates,
//! and known seasonal event references. Catalogs are immutable; activation
//! toggles produce a new catalog value.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::achievements::{Achievement, AchievementCriteria};
use super::seasonal::SeasonalEvent;
use super::snapshot::{ProfileRole, UserProfileSnapshot};
use super::triggers::{parse_triggers, TriggerPredicate, VALID_PREDICATE_KINDS};

/// Catalog shipped with the binary, used when no `CATALOG_PATH` is set.
const BUILTIN_CATALOG: &str = include_str!("../../catalog/default_catalog.json");

const KEY_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(KEY_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Catalog integrity errors. All are fatal at load time.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog is not valid JSON: {0}")]
    Malformed(String),

    #[error("Failed to read catalog file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid {entity} key '{key}': must match {KEY_PATTERN}")]
    InvalidKey { entity: &'static str, key: String },

    #[error("Duplicate {entity} key '{key}'")]
    DuplicateKey { entity: &'static str, key: String },

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    DanglingDependency { task: String, dependency: String },

    #[error("Task '{task}' depends on itself")]
    SelfDependency { task: String },

    #[error("Dependency cycle detected involving task '{task}'")]
    DependencyCycle { task: String },

    #[error(
        "Task '{task}' uses unknown trigger kind '{kind}'. Must be one of: {}",
        VALID_PREDICATE_KINDS.join(", ")
    )]
    UnknownPredicate { task: String, kind: String },

    #[error("Task '{task}' has an invalid '{kind}' trigger: {message}")]
    InvalidPredicate {
        task: String,
        kind: String,
        message: String,
    },

    #[error("Task '{task}' references unknown seasonal event '{event}'")]
    UnknownSeasonalEvent { task: String, event: String },

    #[error("Seasonal event '{event}' has an invalid window: {message}")]
    InvalidDate { event: String, message: String },

    #[error("Task '{task}' has invalid seasonal relevance: {message}")]
    InvalidSeasonalRelevance { task: String, message: String },

    #[error("Task '{task}' has invalid version 0; versions start at 1")]
    InvalidVersion { task: String },

    #[error("Achievement '{achievement}' references unknown task '{task}'")]
    UnknownAchievementTask { achievement: String, task: String },

    #[error("Achievement '{achievement}' has invalid criteria: {message}")]
    InvalidAchievementCriteria {
        achievement: String,
        message: String,
    },

    #[error("Unknown task '{task}'")]
    UnknownTask { task: String },
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

pub const PRIORITY_CRITICAL: &str = "critical";
pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_MEDIUM: &str = "medium";
pub const PRIORITY_LOW: &str = "low";

/// Authored urgency of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Base ranking score: critical=4 down to low=1.
    pub fn base_score(&self) -> u32 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => PRIORITY_CRITICAL,
            Self::High => PRIORITY_HIGH,
            Self::Medium => PRIORITY_MEDIUM,
            Self::Low => PRIORITY_LOW,
        }
    }
}

/// Grouping used by the UI and by `all_of` achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Profile,
    Media,
    Academic,
    Outreach,
    Planning,
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Months in which a task is especially relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeasonalRelevance {
    pub peak_months: Vec<u32>,
    pub urgency_boost: u32,
}

impl SeasonalRelevance {
    pub fn is_peak(&self, month: u32) -> bool {
        self.peak_months.contains(&month)
    }
}

/// A validated task definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDefinition {
    pub key: String,
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub priority: Priority,
    pub dependencies: BTreeSet<String>,
    pub triggers: Vec<TriggerPredicate>,
    pub blocks_sharing: bool,
    pub sports: Vec<String>,
    pub roles: Vec<ProfileRole>,
    pub seasonal_relevance: Option<SeasonalRelevance>,
    pub estimated_time_minutes: u32,
    pub version: u32,
    pub is_active: bool,
}

impl TaskDefinition {
    /// Whether the task targets the snapshot's sport and role.
    pub fn applies_to(&self, snapshot: &UserProfileSnapshot) -> bool {
        snapshot.matches_audience(&self.sports, &self.roles)
    }

    /// Seasonal event keys named by this task's `seasonal` trigger.
    pub fn seasonal_event_keys(&self) -> impl Iterator<Item = &str> {
        self.triggers
            .iter()
            .flat_map(|t| t.seasonal_event_keys())
            .map(String::as_str)
    }
}

/// A task as authored in the catalog file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskRecord {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: TaskCategory,
    pub priority: Priority,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub triggers: Option<Map<String, Value>>,
    #[serde(default)]
    pub blocks_sharing: bool,
    #[serde(default)]
    pub sports: Vec<String>,
    #[serde(default)]
    pub roles: Vec<ProfileRole>,
    #[serde(default)]
    pub seasonal_relevance: Option<SeasonalRelevance>,
    pub estimated_time_minutes: u32,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_version() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

/// Top-level shape of a catalog file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDocument {
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub seasonal_events: Vec<SeasonalEvent>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A validated, immutable task catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Tasks in dependency order: every task appears after its dependencies.
    tasks: Vec<TaskDefinition>,
    index: HashMap<String, usize>,
    seasonal_events: BTreeMap<String, SeasonalEvent>,
    achievements: Vec<Achievement>,
}

impl Catalog {
    /// The embedded default recruiting catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    /// Load and validate a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse and validate a catalog from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument =
            serde_json::from_str(raw).map_err(|e| CatalogError::Malformed(e.to_string()))?;
        Self::from_document(doc)
    }

    /// Validate an already-deserialized catalog document.
    pub fn from_document(doc: CatalogDocument) -> Result<Self, CatalogError> {
        let seasonal_events = validate_events(doc.seasonal_events)?;

        let mut keys = BTreeSet::new();
        for record in &doc.tasks {
            validate_key("task", &record.key)?;
            if !keys.insert(record.key.clone()) {
                return Err(CatalogError::DuplicateKey {
                    entity: "task",
                    key: record.key.clone(),
                });
            }
        }

        let mut definitions = Vec::with_capacity(doc.tasks.len());
        for record in doc.tasks {
            definitions.push(build_task(record, &keys, &seasonal_events)?);
        }

        let tasks = dependency_order(definitions)?;
        validate_achievements(&doc.achievements, &keys)?;

        let index = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.key.clone(), i))
            .collect();

        Ok(Self {
            tasks,
            index,
            seasonal_events,
            achievements: doc.achievements,
        })
    }

    /// All tasks in dependency order.
    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    pub fn task(&self, key: &str) -> Option<&TaskDefinition> {
        self.index.get(key).map(|&i| &self.tasks[i])
    }

    /// Look up a task, returning a named error for unknown keys.
    pub fn require_task(&self, key: &str) -> Result<&TaskDefinition, CatalogError> {
        self.task(key).ok_or_else(|| CatalogError::UnknownTask {
            task: key.to_string(),
        })
    }

    pub fn seasonal_events(&self) -> &BTreeMap<String, SeasonalEvent> {
        &self.seasonal_events
    }

    pub fn seasonal_event(&self, key: &str) -> Option<&SeasonalEvent> {
        self.seasonal_events.get(key)
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    /// A copy of this catalog with one task's `is_active` flag changed.
    pub fn with_activation(&self, key: &str, is_active: bool) -> Result<Self, CatalogError> {
        let &i = self.index.get(key).ok_or_else(|| CatalogError::UnknownTask {
            task: key.to_string(),
        })?;
        let mut next = self.clone();
        next.tasks[i].is_active = is_active;
        Ok(next)
    }
}

fn validate_key(entity: &'static str, key: &str) -> Result<(), CatalogError> {
    if KEY_RE.is_match(key) {
        Ok(())
    } else {
        Err(CatalogError::InvalidKey {
            entity,
            key: key.to_string(),
        })
    }
}

fn validate_events(
    events: Vec<SeasonalEvent>,
) -> Result<BTreeMap<String, SeasonalEvent>, CatalogError> {
    let mut by_key = BTreeMap::new();
    for event in events {
        validate_key("seasonal event", &event.key)?;
        event.validate()?;
        if by_key.contains_key(&event.key) {
            return Err(CatalogError::DuplicateKey {
                entity: "seasonal event",
                key: event.key,
            });
        }
        by_key.insert(event.key.clone(), event);
    }
    Ok(by_key)
}

fn build_task(
    record: TaskRecord,
    keys: &BTreeSet<String>,
    events: &BTreeMap<String, SeasonalEvent>,
) -> Result<TaskDefinition, CatalogError> {
    if record.version == 0 {
        return Err(CatalogError::InvalidVersion { task: record.key });
    }

    let mut dependencies = BTreeSet::new();
    for dependency in record.dependencies {
        if dependency == record.key {
            return Err(CatalogError::SelfDependency { task: record.key });
        }
        if !keys.contains(&dependency) {
            return Err(CatalogError::DanglingDependency {
                task: record.key,
                dependency,
            });
        }
        dependencies.insert(dependency);
    }

    let triggers = parse_triggers(&record.key, record.triggers.as_ref())?;
    for event in triggers.iter().flat_map(|t| t.seasonal_event_keys()) {
        if !events.contains_key(event) {
            return Err(CatalogError::UnknownSeasonalEvent {
                task: record.key.clone(),
                event: event.clone(),
            });
        }
    }

    if let Some(relevance) = &record.seasonal_relevance {
        if relevance.peak_months.is_empty() {
            return Err(CatalogError::InvalidSeasonalRelevance {
                task: record.key.clone(),
                message: "peak_months must not be empty".to_string(),
            });
        }
        if let Some(bad) = relevance.peak_months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(CatalogError::InvalidSeasonalRelevance {
                task: record.key.clone(),
                message: format!("peak month {bad} is out of range 1-12"),
            });
        }
    }

    Ok(TaskDefinition {
        key: record.key,
        title: record.title,
        description: record.description,
        category: record.category,
        priority: record.priority,
        dependencies,
        triggers,
        blocks_sharing: record.blocks_sharing,
        sports: record.sports,
        roles: record.roles,
        seasonal_relevance: record.seasonal_relevance,
        estimated_time_minutes: record.estimated_time_minutes,
        version: record.version,
        is_active: record.is_active,
    })
}

/// Topologically sort tasks so dependencies precede dependents, failing on
/// the first cycle found.
fn dependency_order(tasks: Vec<TaskDefinition>) -> Result<Vec<TaskDefinition>, CatalogError> {
    let order: Vec<String> = {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for task in &tasks {
            graph.add_node(task.key.as_str());
        }
        for task in &tasks {
            for dependency in &task.dependencies {
                graph.add_edge(dependency.as_str(), task.key.as_str(), ());
            }
        }
        toposort(&graph, None)
            .map_err(|cycle| CatalogError::DependencyCycle {
                task: cycle.node_id().to_string(),
            })?
            .into_iter()
            .map(str::to_string)
            .collect()
    };

    let mut by_key: HashMap<String, TaskDefinition> =
        tasks.into_iter().map(|t| (t.key.clone(), t)).collect();
    Ok(order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect())
}

fn validate_achievements(
    achievements: &[Achievement],
    task_keys: &BTreeSet<String>,
) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for achievement in achievements {
        validate_key("achievement", &achievement.key)?;
        if !seen.insert(achievement.key.as_str()) {
            return Err(CatalogError::DuplicateKey {
                entity: "achievement",
                key: achievement.key.clone(),
            });
        }

        let invalid = |message: &str| CatalogError::InvalidAchievementCriteria {
            achievement: achievement.key.clone(),
            message: message.to_string(),
        };
        match &achievement.criteria {
            AchievementCriteria::TasksCompleted { count } if *count == 0 => {
                return Err(invalid("count must be at least 1"));
            }
            AchievementCriteria::AllOf { tasks } if tasks.is_empty() => {
                return Err(invalid("all_of requires at least one task"));
            }
            _ => {}
        }

        for task in achievement.criteria.referenced_tasks() {
            if !task_keys.contains(task) {
                return Err(CatalogError::UnknownAchievementTask {
                    achievement: achievement.key.clone(),
                    task: task.clone(),
                });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
