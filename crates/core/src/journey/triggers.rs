//! Trigger predicates -- pure logic, no database access.
//!
//! A task's `triggers` object is authored as a map of predicate kind to
//! payload. At load time each entry is parsed into a [`TriggerPredicate`]
//! variant; unknown kinds and malformed payloads are catalog errors. At
//! evaluation time all predicates of a task are combined with logical AND,
//! and an empty set always evaluates true.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::CatalogError;
use super::seasonal::SeasonalEvent;
use super::snapshot::{EngagementLevel, ProfileRole, UserProfileSnapshot};

// ---------------------------------------------------------------------------
// Predicate kinds
// ---------------------------------------------------------------------------

pub const PREDICATE_FIELD_MISSING: &str = "field_missing";
pub const PREDICATE_PROFILE_COMPLETION: &str = "profile_completion";
pub const PREDICATE_GRADUATION_PROXIMITY: &str = "graduation_proximity";
pub const PREDICATE_ROLE: &str = "role";
pub const PREDICATE_SEASONAL: &str = "seasonal";
pub const PREDICATE_ENGAGEMENT: &str = "engagement";

/// All recognised predicate kinds.
pub const VALID_PREDICATE_KINDS: &[&str] = &[
    PREDICATE_FIELD_MISSING,
    PREDICATE_PROFILE_COMPLETION,
    PREDICATE_GRADUATION_PROXIMITY,
    PREDICATE_ROLE,
    PREDICATE_SEASONAL,
    PREDICATE_ENGAGEMENT,
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Comparison operator for numeric thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    LessThan,
    GreaterThan,
}

impl Comparison {
    fn holds(self, actual: f64, threshold: f64) -> bool {
        match self {
            Self::LessThan => actual < threshold,
            Self::GreaterThan => actual > threshold,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompletionPayload {
    operator: Comparison,
    value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProximityPayload {
    within_years: i32,
}

/// One parsed trigger condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerPredicate {
    /// Any of the named profile fields is missing.
    FieldMissing { fields: Vec<String> },
    /// Completion percentage compared against a threshold.
    ProfileCompletion { operator: Comparison, value: f64 },
    /// Graduation is between 0 and `within_years` calendar years away.
    GraduationProximity { within_years: i32 },
    /// The profile role is one of the listed roles.
    Role { roles: Vec<ProfileRole> },
    /// Today falls inside at least one of the named seasonal windows.
    Seasonal { events: Vec<String> },
    /// The engagement level is one of the listed levels.
    Engagement { levels: Vec<EngagementLevel> },
}

/// Everything a predicate may read.
#[derive(Debug, Clone, Copy)]
pub struct TriggerContext<'a> {
    pub snapshot: &'a UserProfileSnapshot,
    pub today: NaiveDate,
    pub seasonal_events: &'a BTreeMap<String, SeasonalEvent>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl TriggerPredicate {
    /// Parse one `kind: payload` entry of a task's triggers object.
    pub fn parse(task: &str, kind: &str, payload: &Value) -> Result<Self, CatalogError> {
        let predicate = match kind {
            PREDICATE_FIELD_MISSING => Self::FieldMissing {
                fields: non_empty_list(task, kind, payload)?,
            },
            PREDICATE_PROFILE_COMPLETION => {
                let parsed: CompletionPayload = decode(task, kind, payload)?;
                if !(0.0..=100.0).contains(&parsed.value) {
                    return Err(invalid(task, kind, "value must be between 0 and 100"));
                }
                Self::ProfileCompletion {
                    operator: parsed.operator,
                    value: parsed.value,
                }
            }
            PREDICATE_GRADUATION_PROXIMITY => {
                let parsed: ProximityPayload = decode(task, kind, payload)?;
                if parsed.within_years < 0 {
                    return Err(invalid(task, kind, "within_years must not be negative"));
                }
                Self::GraduationProximity {
                    within_years: parsed.within_years,
                }
            }
            PREDICATE_ROLE => Self::Role {
                roles: non_empty_list(task, kind, payload)?,
            },
            PREDICATE_SEASONAL => Self::Seasonal {
                events: non_empty_list(task, kind, payload)?,
            },
            PREDICATE_ENGAGEMENT => Self::Engagement {
                levels: non_empty_list(task, kind, payload)?,
            },
            _ => {
                return Err(CatalogError::UnknownPredicate {
                    task: task.to_string(),
                    kind: kind.to_string(),
                })
            }
        };
        Ok(predicate)
    }

    /// The authored key for this predicate kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FieldMissing { .. } => PREDICATE_FIELD_MISSING,
            Self::ProfileCompletion { .. } => PREDICATE_PROFILE_COMPLETION,
            Self::GraduationProximity { .. } => PREDICATE_GRADUATION_PROXIMITY,
            Self::Role { .. } => PREDICATE_ROLE,
            Self::Seasonal { .. } => PREDICATE_SEASONAL,
            Self::Engagement { .. } => PREDICATE_ENGAGEMENT,
        }
    }

    /// Evaluate against a snapshot. Absent snapshot values make every
    /// predicate other than `field_missing` false.
    pub fn evaluate(&self, ctx: &TriggerContext<'_>) -> bool {
        let snapshot = ctx.snapshot;
        match self {
            Self::FieldMissing { fields } => fields.iter().any(|f| snapshot.is_field_missing(f)),
            Self::ProfileCompletion { operator, value } => snapshot
                .completion_pct
                .is_some_and(|pct| operator.holds(pct, *value)),
            Self::GraduationProximity { within_years } => snapshot
                .years_until_graduation(ctx.today)
                .is_some_and(|years| (0..=*within_years).contains(&years)),
            Self::Role { roles } => snapshot.role.is_some_and(|role| roles.contains(&role)),
            Self::Seasonal { events } => events.iter().any(|key| {
                ctx.seasonal_events
                    .get(key)
                    .is_some_and(|event| event.is_active_on(ctx.today))
            }),
            Self::Engagement { levels } => snapshot
                .engagement_level
                .is_some_and(|level| levels.contains(&level)),
        }
    }

    /// Seasonal event keys this predicate references.
    pub fn seasonal_event_keys(&self) -> &[String] {
        match self {
            Self::Seasonal { events } => events,
            _ => &[],
        }
    }
}

/// Parse a raw triggers object. `None` and `{}` both produce an empty list.
/// Output is ordered by kind name so evaluation order is stable.
pub fn parse_triggers(
    task: &str,
    raw: Option<&Map<String, Value>>,
) -> Result<Vec<TriggerPredicate>, CatalogError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let mut entries: Vec<(&String, &Value)> = raw.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(kind, payload)| TriggerPredicate::parse(task, kind, payload))
        .collect()
}

/// Logical AND across all predicates; an empty slice is always true.
pub fn evaluate_all(predicates: &[TriggerPredicate], ctx: &TriggerContext<'_>) -> bool {
    predicates.iter().all(|p| p.evaluate(ctx))
}

fn invalid(task: &str, kind: &str, message: impl Into<String>) -> CatalogError {
    CatalogError::InvalidPredicate {
        task: task.to_string(),
        kind: kind.to_string(),
        message: message.into(),
    }
}

fn decode<T: DeserializeOwned>(task: &str, kind: &str, payload: &Value) -> Result<T, CatalogError> {
    serde_json::from_value(payload.clone()).map_err(|e| invalid(task, kind, e.to_string()))
}

fn non_empty_list<T: DeserializeOwned>(
    task: &str,
    kind: &str,
    payload: &Value,
) -> Result<Vec<T>, CatalogError> {
    let items: Vec<T> = decode(task, kind, payload)?;
    if items.is_empty() {
        return Err(invalid(task, kind, "list must not be empty"));
    }
    Ok(items)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
