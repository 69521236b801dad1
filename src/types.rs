//! Core types for the Vitalog analytics engine
//!
//! This module defines the data structures that flow through each analysis
//! stage: daily journal entries, derived statistics, correlation results,
//! metric trends, insights, alerts, and the assembled report envelope.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::gamification::{Achievement, Badge, UnlockedItem};

/// Sleep portion of a daily entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepLog {
    /// Bedtime as local wall-clock time ("HH:MM")
    pub start_time: String,
    /// Wake time as local wall-clock time ("HH:MM")
    pub end_time: String,
    /// Duration in hours, derived from start/end and rounded to 2 decimals.
    /// Always recomputed from the time strings, never edited directly.
    pub duration_hours: f64,
    /// Self-reported sleep quality (1-10)
    pub quality_score: f64,
}

/// Mood portion of a daily entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodLog {
    /// Self-reported mood (1-10)
    pub mood_score: f64,
    /// Self-reported stress (1-10)
    pub stress_score: f64,
    /// Free-text journal for the day
    #[serde(default)]
    pub journal_entry: String,
    /// Reference to a recorded voice note, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_note_path: Option<String>,
}

/// Symptom severities for a daily entry (0 = not present)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymptomLog {
    /// GI flare severity (0-10)
    #[serde(default)]
    pub gi_flare: f64,
    /// Skin flare severity (0-10)
    #[serde(default)]
    pub skin_flare: f64,
    /// Migraine severity (0-10)
    #[serde(default)]
    pub migraine: f64,
}

/// One day's combined sleep/mood/symptom record.
///
/// Entries are unique by `date` within a journal; an update is a full replace
/// of the record for that date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEntry {
    /// Calendar date key ("YYYY-MM-DD"); sorting key and uniqueness key
    pub date: String,
    pub sleep: SleepLog,
    pub mood: MoodLog,
    #[serde(default)]
    pub symptoms: SymptomLog,
}

impl HealthEntry {
    /// Build an entry, deriving `duration_hours` from the sleep time strings.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: impl Into<String>,
        sleep_start: impl Into<String>,
        sleep_end: impl Into<String>,
        quality_score: f64,
        mood_score: f64,
        stress_score: f64,
        journal_entry: impl Into<String>,
        voice_note_path: Option<String>,
        symptoms: SymptomLog,
    ) -> Self {
        let start_time = sleep_start.into();
        let end_time = sleep_end.into();
        let duration_hours = crate::stats::sleep_duration_hours(&start_time, &end_time);

        Self {
            date: date.into(),
            sleep: SleepLog {
                start_time,
                end_time,
                duration_hours,
                quality_score,
            },
            mood: MoodLog {
                mood_score,
                stress_score,
                journal_entry: journal_entry.into(),
                voice_note_path,
            },
            symptoms,
        }
    }

    /// Parse the date key; `None` if malformed.
    pub fn date_key(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    /// Composite wellness score: (mood + sleep quality + (10 - stress)) / 3
    pub fn wellness_score(&self) -> f64 {
        (self.mood.mood_score + self.sleep.quality_score + (10.0 - self.mood.stress_score)) / 3.0
    }

    /// A fully completed entry has all core scores recorded and journal text.
    pub fn is_complete(&self) -> bool {
        self.sleep.quality_score > 0.0
            && self.mood.mood_score > 0.0
            && self.mood.stress_score > 0.0
            && !self.mood.journal_entry.trim().is_empty()
    }

    /// Validate field formats and score ranges.
    ///
    /// The analytics core never calls this on its own input; it backs the
    /// journal loader and the `vita validate` command.
    pub fn validate(&self) -> Result<(), crate::error::ValidationError> {
        use crate::error::ValidationError;

        if self.date_key().is_none() {
            return Err(ValidationError::InvalidDate(self.date.clone()));
        }
        if crate::stats::parse_clock_minutes(&self.sleep.start_time).is_none() {
            return Err(ValidationError::InvalidTime(self.sleep.start_time.clone()));
        }
        if crate::stats::parse_clock_minutes(&self.sleep.end_time).is_none() {
            return Err(ValidationError::InvalidTime(self.sleep.end_time.clone()));
        }
        for (field, value, min, max) in [
            ("sleep.quality_score", self.sleep.quality_score, 1.0, 10.0),
            ("mood.mood_score", self.mood.mood_score, 1.0, 10.0),
            ("mood.stress_score", self.mood.stress_score, 1.0, 10.0),
            ("symptoms.gi_flare", self.symptoms.gi_flare, 0.0, 10.0),
            ("symptoms.skin_flare", self.symptoms.skin_flare, 0.0, 10.0),
            ("symptoms.migraine", self.symptoms.migraine, 0.0, 10.0),
        ] {
            if !(min..=max).contains(&value) || value.is_nan() {
                return Err(ValidationError::ScoreOutOfRange {
                    field: field.to_string(),
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Tracked daily metrics, used generically by correlation and trend analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SleepDuration,
    SleepQuality,
    Mood,
    Stress,
    GiFlare,
    SkinFlare,
    Migraine,
}

/// All tracked metrics, in reporting order
pub const ALL_METRICS: [Metric; 7] = [
    Metric::SleepDuration,
    Metric::SleepQuality,
    Metric::Mood,
    Metric::Stress,
    Metric::GiFlare,
    Metric::SkinFlare,
    Metric::Migraine,
];

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::SleepDuration => "sleep_duration",
            Metric::SleepQuality => "sleep_quality",
            Metric::Mood => "mood",
            Metric::Stress => "stress",
            Metric::GiFlare => "gi_flare",
            Metric::SkinFlare => "skin_flare",
            Metric::Migraine => "migraine",
        }
    }

    /// Human label for descriptions and insight text
    pub fn label(&self) -> &'static str {
        match self {
            Metric::SleepDuration => "sleep duration",
            Metric::SleepQuality => "sleep quality",
            Metric::Mood => "mood",
            Metric::Stress => "stress",
            Metric::GiFlare => "GI flare",
            Metric::SkinFlare => "skin flare",
            Metric::Migraine => "migraine",
        }
    }

    /// Extract this metric's value from an entry
    pub fn value_of(&self, entry: &HealthEntry) -> f64 {
        match self {
            Metric::SleepDuration => entry.sleep.duration_hours,
            Metric::SleepQuality => entry.sleep.quality_score,
            Metric::Mood => entry.mood.mood_score,
            Metric::Stress => entry.mood.stress_score,
            Metric::GiFlare => entry.symptoms.gi_flare,
            Metric::SkinFlare => entry.symptoms.skin_flare,
            Metric::Migraine => entry.symptoms.migraine,
        }
    }
}

/// Direction of the composite wellness trend across two halves of the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

/// Derived statistics over the full entry history.
///
/// Ephemeral: recomputed on demand from the entry list, cached only for
/// display. Never persisted as a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Average sleep duration in hours (entries with a recorded duration)
    pub average_sleep_hours: f64,
    /// Average sleep quality (1-10)
    pub average_sleep_quality: f64,
    /// Average mood (1-10)
    pub average_mood: f64,
    /// Average stress (1-10)
    pub average_stress: f64,
    /// Average GI flare severity over days it was recorded
    pub average_gi_flare: f64,
    /// Average skin flare severity over days it was recorded
    pub average_skin_flare: f64,
    /// Average migraine severity over days it was recorded
    pub average_migraine: f64,
    /// Consecutive days with an entry, counted backward from today
    pub current_streak: u32,
    /// Longest consecutive-day run anywhere in the history
    pub longest_streak: u32,
    /// Composite wellness trend (first half vs second half of the history)
    pub improvement_trend: TrendDirection,
    /// Trailing 7-day mood average, if any entries fall in the window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_baseline_7d: Option<f64>,
    /// Trailing 7-day sleep duration average, if any entries fall in the window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_baseline_7d: Option<f64>,
    /// Experience points: 10 per entry
    pub experience: u32,
    /// Level: floor(experience / 100) + 1
    pub level: u32,
    /// Experience required to reach the next level
    pub next_level_experience: u32,
}

/// Correlation strength bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    /// Bucket by |r|: >=0.7 strong, >=0.5 moderate, else weak
    pub fn from_r(r: f64) -> Self {
        let abs = r.abs();
        if abs >= 0.7 {
            CorrelationStrength::Strong
        } else if abs >= 0.5 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationStrength::Strong => "strong",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Weak => "weak",
        }
    }
}

/// Sign of a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationDirection {
    Positive,
    Negative,
}

impl CorrelationDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationDirection::Positive => "positive",
            CorrelationDirection::Negative => "negative",
        }
    }
}

/// Pairwise Pearson correlation between two tracked metrics.
///
/// `p_value` is a bucket looked up from fixed critical values, not a real
/// hypothesis test; callers must not treat it as rigorous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub metric_a: Metric,
    pub metric_b: Metric,
    /// Pearson r in [-1, 1]
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub direction: CorrelationDirection,
    /// Approximate significance bucket: 0.01, 0.05, 0.10, or 0.20
    pub p_value: f64,
    /// Number of paired observations
    pub sample_size: usize,
    /// Human-readable description of the relationship
    pub description: String,
    /// Actionable recommendation derived from the relationship
    pub recommendation: String,
}

/// Direction of a single metric's trend over the trailing window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricTrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl MetricTrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricTrendDirection::Increasing => "increasing",
            MetricTrendDirection::Decreasing => "decreasing",
            MetricTrendDirection::Stable => "stable",
        }
    }
}

/// Linear-regression trend for one metric over a trailing day window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricTrend {
    pub metric: Metric,
    /// Least-squares slope per day over index positions
    pub slope: f64,
    /// slope / mean(values) * 100
    pub change_rate: f64,
    pub direction: MetricTrendDirection,
    /// Mean of the windowed values
    pub mean: f64,
    /// Number of observations in the window
    pub sample_size: usize,
    /// Trailing window length in days
    pub window_days: u32,
}

/// Insight priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    High,
    Medium,
    Low,
}

/// A generated, prioritized, human-readable observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Stable rule identifier (e.g. "short_sleep", "trend_mood_increasing")
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: InsightPriority,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

/// Daily alert codes raised from the latest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowSleep,
    HighStress,
    CombinedRisk,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LowSleep => "low_sleep",
            AlertKind::HighStress => "high_stress",
            AlertKind::CombinedRisk => "combined_risk",
        }
    }
}

/// Rule-based alert raised from the most recent entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete analytics report assembled by the pipeline.
///
/// The report is the engine's only output surface: UI collaborators render it
/// directly, and the FFI/CLI layers serialize it as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Report schema version tag
    pub schema_version: String,
    pub producer: ReportProducer,
    /// When the report was computed (RFC 3339, UTC)
    pub generated_at: String,
    /// Date the report is anchored on ("today" for streaks and windows)
    pub as_of: String,
    pub entry_count: usize,
    pub stats: DerivedStats,
    pub correlations: Vec<CorrelationResult>,
    pub trends: Vec<MetricTrend>,
    pub insights: Vec<Insight>,
    pub alerts: Vec<Alert>,
    pub badges: Vec<Badge>,
    pub achievements: Vec<Achievement>,
    /// Items that unlocked during this evaluation, for notification surfacing
    pub newly_unlocked: Vec<UnlockedItem>,
}
