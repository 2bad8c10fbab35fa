//! Read-only view of a user's profile as seen by the journey engine.
//!
//! Snapshots are produced by the profile subsystem and pushed to us as
//! loose JSON. Parsing never fails: a field with the wrong type, an
//! out-of-range number, or an unrecognised enum string is treated as
//! absent, which the predicates then read as "missing". A field the
//! snapshot does not mention at all is missing too.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const ROLE_ATHLETE: &str = "athlete";
pub const ROLE_PARENT: &str = "parent";
pub const ROLE_COACH: &str = "coach";
pub const ROLE_RECRUITER: &str = "recruiter";

/// All valid profile role strings.
pub const VALID_PROFILE_ROLES: &[&str] = &[ROLE_ATHLETE, ROLE_PARENT, ROLE_COACH, ROLE_RECRUITER];

pub const ENGAGEMENT_LOW: &str = "low";
pub const ENGAGEMENT_MEDIUM: &str = "medium";
pub const ENGAGEMENT_HIGH: &str = "high";

/// All valid engagement level strings.
pub const VALID_ENGAGEMENT_LEVELS: &[&str] = &[ENGAGEMENT_LOW, ENGAGEMENT_MEDIUM, ENGAGEMENT_HIGH];

/// Top-level snapshot keys with a typed meaning. Any other top-level key is
/// read as a profile field value.
const RESERVED_KEYS: &[&str] = &[
    "missing_fields",
    "completion_pct",
    "graduation_year",
    "role",
    "sport",
    "engagement_level",
    "fields",
];

/// Graduation years outside this range are treated as malformed.
const MIN_GRADUATION_YEAR: i64 = 1900;
const MAX_GRADUATION_YEAR: i64 = 2200;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Recruiting role of the profile owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Athlete,
    Parent,
    Coach,
    Recruiter,
}

impl ProfileRole {
    /// Convert from a stored string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            ROLE_ATHLETE => Ok(Self::Athlete),
            ROLE_PARENT => Ok(Self::Parent),
            ROLE_COACH => Ok(Self::Coach),
            ROLE_RECRUITER => Ok(Self::Recruiter),
            _ => Err(format!(
                "Invalid profile role '{s}'. Must be one of: {}",
                VALID_PROFILE_ROLES.join(", ")
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Athlete => ROLE_ATHLETE,
            Self::Parent => ROLE_PARENT,
            Self::Coach => ROLE_COACH,
            Self::Recruiter => ROLE_RECRUITER,
        }
    }
}

/// Recent engagement bucket computed by the profile subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    Low,
    Medium,
    High,
}

impl EngagementLevel {
    /// Convert from a stored string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            ENGAGEMENT_LOW => Ok(Self::Low),
            ENGAGEMENT_MEDIUM => Ok(Self::Medium),
            ENGAGEMENT_HIGH => Ok(Self::High),
            _ => Err(format!(
                "Invalid engagement level '{s}'. Must be one of: {}",
                VALID_ENGAGEMENT_LEVELS.join(", ")
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => ENGAGEMENT_LOW,
            Self::Medium => ENGAGEMENT_MEDIUM,
            Self::High => ENGAGEMENT_HIGH,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The profile facts the evaluator reads. Never written by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct UserProfileSnapshot {
    pub missing_fields: BTreeSet<String>,
    pub completion_pct: Option<f64>,
    pub graduation_year: Option<i32>,
    pub role: Option<ProfileRole>,
    pub sport: Option<String>,
    pub engagement_level: Option<EngagementLevel>,
    /// Raw profile field values, keyed by field name. Holds the `fields`
    /// object merged over any untyped top-level keys.
    pub fields: Map<String, Value>,
}

impl From<Value> for UserProfileSnapshot {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

impl UserProfileSnapshot {
    /// Leniently parse a snapshot from JSON. Non-object input yields an
    /// empty snapshot.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let missing_fields = obj
            .get("missing_fields")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let completion_pct = obj
            .get("completion_pct")
            .and_then(Value::as_f64)
            .filter(|pct| pct.is_finite() && (0.0..=100.0).contains(pct));

        let graduation_year = obj
            .get("graduation_year")
            .and_then(Value::as_i64)
            .filter(|y| (MIN_GRADUATION_YEAR..=MAX_GRADUATION_YEAR).contains(y))
            .and_then(|y| i32::try_from(y).ok());

        let role = obj
            .get("role")
            .and_then(Value::as_str)
            .and_then(|s| ProfileRole::from_str_value(s).ok());

        let sport = obj
            .get("sport")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let engagement_level = obj
            .get("engagement_level")
            .and_then(Value::as_str)
            .and_then(|s| EngagementLevel::from_str_value(s).ok());

        let mut fields: Map<String, Value> = obj
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if let Some(nested) = obj.get("fields").and_then(Value::as_object) {
            fields.extend(nested.iter().map(|(key, value)| (key.clone(), value.clone())));
        }

        Self {
            missing_fields,
            completion_pct,
            graduation_year,
            role,
            sport,
            engagement_level,
            fields,
        }
    }

    /// A field is missing if the profile subsystem listed it as such, or if
    /// it has no usable value. Typed keys are judged by their parsed value,
    /// so a malformed `graduation_year` is missing. Every other name is
    /// missing when absent from `fields` or blank there.
    pub fn is_field_missing(&self, name: &str) -> bool {
        if self.missing_fields.contains(name) {
            return true;
        }
        match name {
            "completion_pct" => self.completion_pct.is_none(),
            "graduation_year" => self.graduation_year.is_none(),
            "role" => self.role.is_none(),
            "sport" => self.sport.is_none(),
            "engagement_level" => self.engagement_level.is_none(),
            _ => self.fields.get(name).map_or(true, is_blank),
        }
    }

    /// Whole years between `today` and the graduation year, or `None` if
    /// the graduation year is unknown. Negative once the user has graduated.
    pub fn years_until_graduation(&self, today: NaiveDate) -> Option<i32> {
        self.graduation_year.map(|year| year - today.year())
    }

    /// Whether the snapshot falls within a sport/role audience filter.
    ///
    /// Empty filters match everyone. A non-empty filter never matches a
    /// snapshot whose corresponding value is absent.
    pub fn matches_audience(&self, sports: &[String], roles: &[ProfileRole]) -> bool {
        let sport_ok = sports.is_empty()
            || self
                .sport
                .as_deref()
                .is_some_and(|s| sports.iter().any(|candidate| candidate.eq_ignore_ascii_case(s)));
        let role_ok = roles.is_empty() || self.role.is_some_and(|r| roles.contains(&r));
        sport_ok && role_ok
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
