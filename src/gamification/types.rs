//! Gamification data types
//!
//! Catalog definitions are static data; runtime unlock state is a side
//! table keyed by item id, persisted as a version-tagged JSON blob.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::types::Metric;

/// Version tag carried by the persisted state blob
pub const STATE_SCHEMA_VERSION: &str = "vitalog.state.v1";

/// Badge grouping shown in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Streak,
    Consistency,
    Improvement,
    Milestone,
    Special,
}

/// Declarative unlock rules; the evaluator is generic over these.
///
/// Thresholds live here as data so each catalog row is unit-testable on
/// its own.
#[derive(Debug, Clone, Copy)]
pub enum UnlockRule {
    /// Current streak (consecutive days ending today) reaches `days`
    CurrentStreak { days: u32 },
    /// At least `required` distinct entry dates within the trailing
    /// `days`-day window
    WindowCoverage { days: u32, required: u32 },
    /// Total entry count reaches `count`
    TotalEntries { count: u32 },
    /// Trailing-7-day average of `metric` shifted by at least `min_shift`
    /// versus the previous 7 days; `decrease` flips the required direction
    AverageShift {
        metric: Metric,
        min_shift: f64,
        decrease: bool,
    },
    /// At least `days` entries with a wake time at or before
    /// `minutes` past midnight
    WakeBefore { minutes: i32, days: u32 },
    /// At least `days` entries with a bedtime past midnight (start time
    /// earlier than `before_minutes` past midnight)
    BedAfterMidnight { before_minutes: i32, days: u32 },
    /// A run of `days` consecutive dates with fully completed entries
    CompleteRun { days: u32 },
    /// All-history average of `metric` crosses `threshold` with at least
    /// `min_entries` recorded; `at_most` inverts the comparison
    MetricAverage {
        metric: Metric,
        threshold: f64,
        at_most: bool,
        min_entries: u32,
    },
}

/// Static badge definition (catalog row)
#[derive(Debug, Clone, Copy)]
pub struct BadgeDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: BadgeCategory,
    pub max_progress: f64,
    pub rule: UnlockRule,
}

/// Static achievement definition (catalog row)
#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub max_progress: f64,
    pub rule: UnlockRule,
}

/// Badge with runtime unlock state, as surfaced to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: BadgeCategory,
    /// Progress toward unlock, clamped to [0, max_progress]
    pub progress: f64,
    pub max_progress: f64,
    pub is_unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Achievement with runtime unlock state, as surfaced to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub progress: f64,
    pub max_progress: f64,
    pub is_unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Kind discriminator for newly unlocked items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockKind {
    Badge,
    Achievement,
}

/// A freshly unlocked item, surfaced for notification handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedItem {
    pub kind: UnlockKind,
    pub id: String,
    pub title: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Persisted unlock state for one catalog item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemState {
    pub progress: f64,
    pub is_unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Full persisted gamification state (side table keyed by item id).
///
/// Read in full, mutated in memory, written back in full on every
/// evaluation; the caller serializes concurrent evaluations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationState {
    pub schema_version: String,
    #[serde(default)]
    pub badges: BTreeMap<String, ItemState>,
    #[serde(default)]
    pub achievements: BTreeMap<String, ItemState>,
}

impl Default for GamificationState {
    fn default() -> Self {
        Self::new()
    }
}

impl GamificationState {
    pub fn new() -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION.to_string(),
            badges: BTreeMap::new(),
            achievements: BTreeMap::new(),
        }
    }

    /// Load state from JSON, rejecting unknown schema versions.
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        let state: GamificationState = serde_json::from_str(json)?;
        if state.schema_version != STATE_SCHEMA_VERSION {
            return Err(AnalyticsError::UnsupportedStateVersion(
                state.schema_version,
            ));
        }
        Ok(state)
    }

    /// Serialize state to JSON.
    pub fn to_json(&self) -> Result<String, AnalyticsError> {
        serde_json::to_string(self).map_err(AnalyticsError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_json_round_trip() {
        let mut state = GamificationState::new();
        state.badges.insert(
            "streak_3".to_string(),
            ItemState {
                progress: 2.0,
                is_unlocked: false,
                unlocked_at: None,
            },
        );

        let json = state.to_json().unwrap();
        let loaded = GamificationState::from_json(&json).unwrap();
        assert_eq!(loaded.schema_version, STATE_SCHEMA_VERSION);
        assert!((loaded.badges["streak_3"].progress - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_state_rejects_unknown_version() {
        let json = r#"{"schema_version": "vitalog.state.v9", "badges": {}, "achievements": {}}"#;
        assert!(GamificationState::from_json(json).is_err());
    }
}
