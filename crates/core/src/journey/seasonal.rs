//! Seasonal recruiting calendar.
//!
//! A [`SeasonalEvent`] is a month/day window that repeats every year, e.g.
//! a signing period or camp season. Windows are inclusive at both ends and
//! may wrap across the year boundary (Dec 1 – Feb 28).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::catalog::CatalogError;
use super::snapshot::{ProfileRole, UserProfileSnapshot};

/// A calendar day without a year. Ordered by month, then day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    /// Build a validated month/day. February accepts day 29 so leap-day
    /// windows can be authored; in other years the window simply ends a
    /// day early.
    pub fn new(month: u32, day: u32) -> Result<Self, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("month {month} is out of range 1-12"));
        }
        let max_day = days_in_month(month);
        if !(1..=max_day).contains(&day) {
            return Err(format!("day {day} is out of range 1-{max_day} for month {month}"));
        }
        Ok(Self { month, day })
    }

    /// The month/day of a concrete date.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

fn days_in_month(month: u32) -> u32 {
    match month {
        2 => 29,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Inclusive window membership with year wraparound.
///
/// When `start <= end` the window is a plain range. When `start > end` the
/// window covers `start..=Dec 31` and `Jan 1..=end`.
pub fn window_contains(start: MonthDay, end: MonthDay, date: MonthDay) -> bool {
    if start <= end {
        start <= date && date <= end
    } else {
        date >= start || date <= end
    }
}

/// A named calendar window that boosts task relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeasonalEvent {
    pub key: String,
    pub name: String,
    pub start_month: u32,
    pub start_day: u32,
    pub end_month: u32,
    pub end_day: u32,
    /// Applicable sports. Empty means all sports.
    #[serde(default)]
    pub sports: Vec<String>,
    /// Applicable profile roles. Empty means all roles.
    #[serde(default)]
    pub roles: Vec<ProfileRole>,
    /// Added to the score of tasks whose seasonal trigger names this event.
    #[serde(default)]
    pub priority_boost: u32,
    /// Whether the window opening should be announced to users.
    #[serde(default)]
    pub notify: bool,
}

impl SeasonalEvent {
    /// Validate the window bounds.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |message: String| CatalogError::InvalidDate {
            event: self.key.clone(),
            message,
        };
        MonthDay::new(self.start_month, self.start_day).map_err(invalid)?;
        MonthDay::new(self.end_month, self.end_day).map_err(invalid)?;
        Ok(())
    }

    pub fn start(&self) -> MonthDay {
        MonthDay {
            month: self.start_month,
            day: self.start_day,
        }
    }

    pub fn end(&self) -> MonthDay {
        MonthDay {
            month: self.end_month,
            day: self.end_day,
        }
    }

    /// Whether `date` falls inside this event's window (any year).
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        window_contains(self.start(), self.end(), MonthDay::of(date))
    }

    /// Whether the event targets the snapshot's sport and role.
    pub fn applies_to(&self, snapshot: &UserProfileSnapshot) -> bool {
        snapshot.matches_audience(&self.sports, &self.roles)
    }
}
