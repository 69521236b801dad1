//! Pipeline orchestration
//!
//! This module provides the public API for the Vitalog engine. Each call
//! recomputes every result from the full entry snapshot:
//!
//! entries → StatisticsAggregator → {CorrelationAnalyzer, BadgeEvaluator}
//! → InsightGenerator → AnalyticsReport
//!
//! The only state carried between calls is the gamification unlock table,
//! owned by [`JournalAnalytics`] and persisted through a
//! [`KeyValueStore`](crate::store::KeyValueStore) collaborator.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::alerts::daily_alerts;
use crate::correlation::{CorrelationAnalyzer, DEFAULT_TREND_WINDOW_DAYS};
use crate::error::AnalyticsError;
use crate::gamification::{BadgeEvaluator, GamificationState};
use crate::insights::InsightGenerator;
use crate::stats::StatisticsAggregator;
use crate::store::{dedupe_by_date, KeyValueStore, GAMIFICATION_STATE_KEY};
use crate::types::{AnalyticsReport, HealthEntry, ReportProducer};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Report schema version tag
pub const REPORT_SCHEMA_VERSION: &str = "vitalog.report.v1";

/// One-shot analysis of a JSON array of entries.
///
/// Starts from a fresh gamification state; hosts that persist unlock
/// state should use [`JournalAnalytics`] instead. `today` anchors streaks
/// and trailing windows and defaults to the current UTC date.
pub fn report_from_json(entries_json: &str, today: Option<&str>) -> Result<String, AnalyticsError> {
    let entries: Vec<HealthEntry> = serde_json::from_str(entries_json)?;
    let today = resolve_today(today)?;

    let mut processor = JournalAnalytics::new();
    let report = processor.process_at(&entries, today, Utc::now());
    serde_json::to_string(&report).map_err(AnalyticsError::from)
}

fn resolve_today(today: Option<&str>) -> Result<NaiveDate, AnalyticsError> {
    match today {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            AnalyticsError::InvalidEntry(crate::error::ValidationError::InvalidDate(s.to_string()))
        }),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Stateful analytics processor owning the gamification unlock table.
///
/// This is the composition root for the engine's services: construct one
/// per journal, feed it entry snapshots, and persist its state between
/// runs with [`save_state`](Self::save_state) /
/// [`load_state`](Self::load_state).
pub struct JournalAnalytics {
    state: GamificationState,
    instance_id: String,
    trend_window_days: u32,
}

impl Default for JournalAnalytics {
    fn default() -> Self {
        Self::new()
    }
}

impl JournalAnalytics {
    /// Create a processor with a fresh unlock state
    pub fn new() -> Self {
        Self {
            state: GamificationState::new(),
            instance_id: Uuid::new_v4().to_string(),
            trend_window_days: DEFAULT_TREND_WINDOW_DAYS,
        }
    }

    /// Create a processor with a specific trend window
    pub fn with_trend_window(window_days: u32) -> Self {
        Self {
            trend_window_days: window_days,
            ..Self::new()
        }
    }

    /// Load gamification state from JSON
    pub fn load_state(&mut self, json: &str) -> Result<(), AnalyticsError> {
        self.state = GamificationState::from_json(json)?;
        Ok(())
    }

    /// Serialize gamification state to JSON
    pub fn save_state(&self) -> Result<String, AnalyticsError> {
        self.state.to_json()
    }

    /// Analyze a snapshot anchored on the current UTC date
    pub fn process(&mut self, entries: &[HealthEntry]) -> AnalyticsReport {
        let now = Utc::now();
        self.process_at(entries, now.date_naive(), now)
    }

    /// Analyze a snapshot with explicit time anchors.
    ///
    /// `today` drives streaks and trailing windows; `now` stamps report
    /// generation and fresh unlocks. Duplicate dates in the snapshot are
    /// collapsed to the latest record before analysis.
    pub fn process_at(
        &mut self,
        entries: &[HealthEntry],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> AnalyticsReport {
        let entries = dedupe_by_date(entries.to_vec());

        let stats = StatisticsAggregator::aggregate(&entries, today);
        let correlations = CorrelationAnalyzer::analyze(&entries);
        let trends = CorrelationAnalyzer::analyze_trends(&entries, today, self.trend_window_days);
        let insights = InsightGenerator::generate(&entries, &stats, &correlations, &trends);
        let alerts = daily_alerts(&entries);
        let outcome = BadgeEvaluator::evaluate(&mut self.state, &entries, today, now);

        debug!(
            entries = entries.len(),
            correlations = correlations.len(),
            insights = insights.len(),
            newly_unlocked = outcome.newly_unlocked.len(),
            "analysis pass complete"
        );

        AnalyticsReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            generated_at: now.to_rfc3339(),
            as_of: today.to_string(),
            entry_count: entries.len(),
            stats,
            correlations,
            trends,
            insights,
            alerts,
            badges: outcome.badges,
            achievements: outcome.achievements,
            newly_unlocked: outcome.newly_unlocked,
        }
    }

    /// Full read-modify-write cycle against a key-value store.
    ///
    /// Reads the persisted state blob (if any), runs the analysis, and
    /// writes the updated blob back. Last writer wins; the caller
    /// serializes concurrent evaluations.
    pub fn process_with_store(
        &mut self,
        store: &mut dyn KeyValueStore,
        entries: &[HealthEntry],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        if let Some(json) = store.get(GAMIFICATION_STATE_KEY)? {
            self.state = GamificationState::from_json(&json)?;
        }

        let report = self.process_at(entries, today, now);

        store.set(GAMIFICATION_STATE_KEY, self.state.to_json()?)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{SymptomLog, TrendDirection};
    use chrono::TimeZone;

    fn make_entry(date: &str, mood: f64, quality: f64, stress: f64) -> HealthEntry {
        HealthEntry::new(
            date,
            "23:00",
            "07:00",
            quality,
            mood,
            stress,
            "journaled",
            None,
            SymptomLog::default(),
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn eval_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 21, 0, 0).unwrap()
    }

    /// 14 consecutive days with mood rising linearly 3 -> 9
    fn rising_mood_entries() -> Vec<HealthEntry> {
        (0..14)
            .map(|i| {
                let mood = 3.0 + 6.0 * (i as f64) / 13.0;
                make_entry(&format!("2025-06-{:02}", i + 1), mood, 7.0, 5.0)
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_rising_mood() {
        let mut processor = JournalAnalytics::new();
        let report = processor.process_at(&rising_mood_entries(), date("2025-06-14"), eval_time());

        assert_eq!(report.schema_version, REPORT_SCHEMA_VERSION);
        assert_eq!(report.entry_count, 14);
        assert_eq!(report.stats.improvement_trend, TrendDirection::Up);
        assert_eq!(report.stats.current_streak, 14);

        let mood_trend = report
            .trends
            .iter()
            .find(|t| t.metric == crate::types::Metric::Mood)
            .unwrap();
        assert_eq!(
            mood_trend.direction,
            crate::types::MetricTrendDirection::Increasing
        );

        // Two weeks of consecutive complete entries unlock several items
        assert!(report
            .newly_unlocked
            .iter()
            .any(|u| u.id == "streak_7"));
        assert!(report
            .newly_unlocked
            .iter()
            .any(|u| u.id == "first_entry"));
    }

    #[test]
    fn test_second_pass_reports_no_repeat_unlocks() {
        let entries = rising_mood_entries();
        let mut processor = JournalAnalytics::new();

        let first = processor.process_at(&entries, date("2025-06-14"), eval_time());
        assert!(!first.newly_unlocked.is_empty());

        let second = processor.process_at(&entries, date("2025-06-14"), eval_time());
        assert!(second.newly_unlocked.is_empty());
    }

    #[test]
    fn test_state_round_trip_preserves_unlocks() {
        let entries = rising_mood_entries();
        let mut processor = JournalAnalytics::new();
        processor.process_at(&entries, date("2025-06-14"), eval_time());

        let saved = processor.save_state().unwrap();

        let mut restored = JournalAnalytics::new();
        restored.load_state(&saved).unwrap();
        let report = restored.process_at(&entries, date("2025-06-14"), eval_time());
        assert!(report.newly_unlocked.is_empty());

        let streak = report.badges.iter().find(|b| b.id == "streak_7").unwrap();
        assert!(streak.is_unlocked);
        assert_eq!(streak.unlocked_at, Some(eval_time()));
    }

    #[test]
    fn test_process_with_store_read_modify_write() {
        let entries = rising_mood_entries();
        let mut store = MemoryStore::new();

        let mut processor = JournalAnalytics::new();
        let first = processor
            .process_with_store(&mut store, &entries, date("2025-06-14"), eval_time())
            .unwrap();
        assert!(!first.newly_unlocked.is_empty());
        assert!(store.get(GAMIFICATION_STATE_KEY).unwrap().is_some());

        // A different processor against the same store sees the unlocks
        let mut other = JournalAnalytics::new();
        let second = other
            .process_with_store(&mut store, &entries, date("2025-06-14"), eval_time())
            .unwrap();
        assert!(second.newly_unlocked.is_empty());
    }

    #[test]
    fn test_process_collapses_duplicate_dates() {
        let mut entries = rising_mood_entries();
        entries.push(make_entry("2025-06-14", 2.0, 7.0, 5.0));

        let mut processor = JournalAnalytics::new();
        let report = processor.process_at(&entries, date("2025-06-14"), eval_time());
        assert_eq!(report.entry_count, 14);
    }

    #[test]
    fn test_report_from_json() {
        let entries = rising_mood_entries();
        let json = serde_json::to_string(&entries).unwrap();

        let report_json = report_from_json(&json, Some("2025-06-14")).unwrap();
        let report: AnalyticsReport = serde_json::from_str(&report_json).unwrap();
        assert_eq!(report.entry_count, 14);
        assert_eq!(report.as_of, "2025-06-14");
        assert_eq!(report.producer.name, PRODUCER_NAME);
    }

    #[test]
    fn test_report_from_json_rejects_invalid_input() {
        assert!(report_from_json("not json", None).is_err());
        assert!(report_from_json("[]", Some("14-06-2025")).is_err());
    }

    #[test]
    fn test_empty_snapshot_degrades_to_neutral_report() {
        let mut processor = JournalAnalytics::new();
        let report = processor.process_at(&[], date("2025-06-14"), eval_time());

        assert_eq!(report.entry_count, 0);
        assert!(report.correlations.is_empty());
        assert!(report.trends.is_empty());
        assert!(report.alerts.is_empty());
        assert_eq!(report.insights.len(), 1);
        assert_eq!(report.insights[0].id, "need_more_data");
        assert_eq!(report.stats.level, 1);
    }
}
