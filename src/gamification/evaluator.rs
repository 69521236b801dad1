//! Badge and achievement evaluation
//!
//! The evaluator walks the static catalogs against the entry history and
//! the persisted unlock state. Evaluation is idempotent and monotonic:
//! unlocked items are skipped entirely, progress is clamped to
//! [0, max_progress], and `unlocked_at` is stamped exactly once.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;

use super::catalog::{ACHIEVEMENTS, BADGES};
use super::types::{
    Achievement, Badge, GamificationState, ItemState, UnlockKind, UnlockRule, UnlockedItem,
};
use crate::stats::{current_streak, parse_clock_minutes};
use crate::types::{HealthEntry, Metric};

/// Trailing/previous window length for improvement rules
const IMPROVEMENT_WINDOW_DAYS: i64 = 7;

/// Result of one evaluation pass
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    /// Full badge list with updated progress and unlock state
    pub badges: Vec<Badge>,
    /// Full achievement list with updated progress and unlock state
    pub achievements: Vec<Achievement>,
    /// Items that unlocked during this pass, for notification surfacing
    pub newly_unlocked: Vec<UnlockedItem>,
}

/// Evaluator for the badge and achievement catalogs
pub struct BadgeEvaluator;

impl BadgeEvaluator {
    /// Evaluate both catalogs, mutating `state` in place.
    ///
    /// `today` anchors streaks and trailing windows; `now` stamps any
    /// fresh unlocks.
    pub fn evaluate(
        state: &mut GamificationState,
        entries: &[HealthEntry],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> EvaluationOutcome {
        let mut newly_unlocked = Vec::new();

        let badges = BADGES
            .iter()
            .map(|def| {
                let item = state.badges.entry(def.id.to_string()).or_default();
                if update_item(item, &def.rule, def.max_progress, entries, today, now) {
                    newly_unlocked.push(UnlockedItem {
                        kind: UnlockKind::Badge,
                        id: def.id.to_string(),
                        title: def.title.to_string(),
                        unlocked_at: now,
                    });
                }
                Badge {
                    id: def.id.to_string(),
                    title: def.title.to_string(),
                    description: def.description.to_string(),
                    category: def.category,
                    progress: item.progress,
                    max_progress: def.max_progress,
                    is_unlocked: item.is_unlocked,
                    unlocked_at: item.unlocked_at,
                }
            })
            .collect();

        let achievements = ACHIEVEMENTS
            .iter()
            .map(|def| {
                let item = state.achievements.entry(def.id.to_string()).or_default();
                if update_item(item, &def.rule, def.max_progress, entries, today, now) {
                    newly_unlocked.push(UnlockedItem {
                        kind: UnlockKind::Achievement,
                        id: def.id.to_string(),
                        title: def.title.to_string(),
                        unlocked_at: now,
                    });
                }
                Achievement {
                    id: def.id.to_string(),
                    title: def.title.to_string(),
                    description: def.description.to_string(),
                    progress: item.progress,
                    max_progress: def.max_progress,
                    is_unlocked: item.is_unlocked,
                    unlocked_at: item.unlocked_at,
                }
            })
            .collect();

        EvaluationOutcome {
            badges,
            achievements,
            newly_unlocked,
        }
    }
}

/// Update one item's state; `true` when it freshly unlocked.
///
/// Already-unlocked items are never re-evaluated, re-locked, or
/// re-stamped.
fn update_item(
    item: &mut ItemState,
    rule: &UnlockRule,
    max_progress: f64,
    entries: &[HealthEntry],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> bool {
    if item.is_unlocked {
        return false;
    }

    let (progress, should_unlock) = evaluate_rule(rule, entries, today);
    item.progress = progress.clamp(0.0, max_progress);

    if should_unlock {
        item.progress = max_progress;
        item.is_unlocked = true;
        item.unlocked_at = Some(now);
        return true;
    }
    false
}

/// Evaluate a rule to (raw progress, should_unlock)
fn evaluate_rule(rule: &UnlockRule, entries: &[HealthEntry], today: NaiveDate) -> (f64, bool) {
    match *rule {
        UnlockRule::CurrentStreak { days } => {
            let streak = current_streak(entries, today);
            (streak as f64, streak >= days)
        }
        UnlockRule::WindowCoverage { days, required } => {
            let covered = window_coverage(entries, today, days);
            (covered as f64, covered >= required)
        }
        UnlockRule::TotalEntries { count } => {
            let total = entries.len();
            (total as f64, total as u32 >= count)
        }
        UnlockRule::AverageShift {
            metric,
            min_shift,
            decrease,
        } => match weekly_average_shift(entries, today, metric) {
            Some(shift) => {
                let delta = if decrease { -shift } else { shift };
                (delta.max(0.0), delta >= min_shift)
            }
            None => (0.0, false),
        },
        UnlockRule::WakeBefore { minutes, days } => {
            let count = entries
                .iter()
                .filter(|e| {
                    parse_clock_minutes(&e.sleep.end_time)
                        .map(|m| m <= minutes)
                        .unwrap_or(false)
                })
                .count() as u32;
            (count as f64, count >= days)
        }
        UnlockRule::BedAfterMidnight {
            before_minutes,
            days,
        } => {
            let count = entries
                .iter()
                .filter(|e| {
                    parse_clock_minutes(&e.sleep.start_time)
                        .map(|m| m < before_minutes)
                        .unwrap_or(false)
                })
                .count() as u32;
            (count as f64, count >= days)
        }
        UnlockRule::CompleteRun { days } => {
            let run = longest_complete_run(entries);
            (run as f64, run >= days)
        }
        UnlockRule::MetricAverage {
            metric,
            threshold,
            at_most,
            min_entries,
        } => {
            let values: Vec<f64> = entries
                .iter()
                .map(|e| metric.value_of(e))
                .filter(|v| *v > 0.0)
                .collect();
            if values.is_empty() {
                return (0.0, false);
            }
            let average = values.iter().sum::<f64>() / values.len() as f64;
            let enough = values.len() as u32 >= min_entries;

            if at_most {
                // Score scales run 0-10; progress grows as the average falls
                ((10.0 - average).max(0.0), enough && average <= threshold)
            } else {
                (average, enough && average >= threshold)
            }
        }
    }
}

/// Distinct entry dates within the trailing `days`-day window
fn window_coverage(entries: &[HealthEntry], today: NaiveDate, days: u32) -> u32 {
    let window_start = today - Duration::days(days as i64 - 1);
    let dates: HashSet<NaiveDate> = entries
        .iter()
        .filter_map(|e| e.date_key())
        .filter(|d| *d >= window_start && *d <= today)
        .collect();
    dates.len() as u32
}

/// Trailing-7-day average minus the previous-7-day average for a metric.
///
/// `None` unless both windows have at least one recorded value.
fn weekly_average_shift(entries: &[HealthEntry], today: NaiveDate, metric: Metric) -> Option<f64> {
    let recent_start = today - Duration::days(IMPROVEMENT_WINDOW_DAYS - 1);
    let previous_start = recent_start - Duration::days(IMPROVEMENT_WINDOW_DAYS);
    let previous_end = recent_start - Duration::days(1);

    let window_average = |start: NaiveDate, end: NaiveDate| -> Option<f64> {
        let values: Vec<f64> = entries
            .iter()
            .filter(|e| {
                e.date_key()
                    .map(|d| d >= start && d <= end)
                    .unwrap_or(false)
            })
            .map(|e| metric.value_of(e))
            .filter(|v| *v > 0.0)
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    let recent = window_average(recent_start, today)?;
    let previous = window_average(previous_start, previous_end)?;
    Some(recent - previous)
}

/// Longest run of consecutive dates whose entries are fully completed
fn longest_complete_run(entries: &[HealthEntry]) -> u32 {
    let mut dates: Vec<NaiveDate> = entries
        .iter()
        .filter(|e| e.is_complete())
        .filter_map(|e| e.date_key())
        .collect();
    dates.sort();
    dates.dedup();

    if dates.is_empty() {
        return 0;
    }

    let mut longest = 1u32;
    let mut run = 1u32;
    for window in dates.windows(2) {
        if (window[1] - window[0]).num_days() == 1 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymptomLog;
    use chrono::TimeZone;

    fn make_entry(date: &str, mood: f64, quality: f64, stress: f64, journal: &str) -> HealthEntry {
        HealthEntry::new(
            date,
            "23:00",
            "07:00",
            quality,
            mood,
            stress,
            journal,
            None,
            SymptomLog::default(),
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn eval_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 20, 0, 0).unwrap()
    }

    fn find_badge<'a>(outcome: &'a EvaluationOutcome, id: &str) -> &'a Badge {
        outcome.badges.iter().find(|b| b.id == id).unwrap()
    }

    fn find_achievement<'a>(outcome: &'a EvaluationOutcome, id: &str) -> &'a Achievement {
        outcome.achievements.iter().find(|a| a.id == id).unwrap()
    }

    #[test]
    fn test_first_entry_achievement_unlocks() {
        let entries = vec![make_entry("2025-06-10", 6.0, 7.0, 4.0, "day one")];
        let mut state = GamificationState::new();

        let outcome =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-10"), eval_time());
        let first = find_achievement(&outcome, "first_entry");
        assert!(first.is_unlocked);
        assert_eq!(first.unlocked_at, Some(eval_time()));
        assert!(outcome
            .newly_unlocked
            .iter()
            .any(|u| u.id == "first_entry" && u.kind == UnlockKind::Achievement));
    }

    #[test]
    fn test_streak_badge_progress_and_unlock() {
        // 5 consecutive days ending today
        let entries: Vec<HealthEntry> = (6..=10)
            .map(|d| make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, ""))
            .collect();
        let mut state = GamificationState::new();

        let outcome =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-10"), eval_time());

        let three = find_badge(&outcome, "streak_3");
        assert!(three.is_unlocked);
        assert!((three.progress - 3.0).abs() < f64::EPSILON);

        let seven = find_badge(&outcome, "streak_7");
        assert!(!seven.is_unlocked);
        assert!((seven.progress - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unlock_is_monotonic_and_stamp_is_stable() {
        let entries: Vec<HealthEntry> = (8..=10)
            .map(|d| make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, ""))
            .collect();
        let mut state = GamificationState::new();

        let first_pass =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-10"), eval_time());
        assert!(find_badge(&first_pass, "streak_3").is_unlocked);

        // Re-run later with no data at all: unlock must survive untouched
        let later = Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap();
        let second_pass = BadgeEvaluator::evaluate(&mut state, &[], date("2025-07-01"), later);

        let badge = find_badge(&second_pass, "streak_3");
        assert!(badge.is_unlocked);
        assert_eq!(badge.unlocked_at, Some(eval_time()));
        assert!(second_pass
            .newly_unlocked
            .iter()
            .all(|u| u.id != "streak_3"));
    }

    #[test]
    fn test_improvement_is_direction_sensitive() {
        // Stress falls from 8 to 6 between the two weeks; mood unchanged
        let mut entries = Vec::new();
        for d in 0..7 {
            let day = date("2025-05-28") + Duration::days(d);
            entries.push(make_entry(&day.to_string(), 6.0, 7.0, 8.0, ""));
        }
        for d in 0..7 {
            let day = date("2025-06-04") + Duration::days(d);
            entries.push(make_entry(&day.to_string(), 6.0, 7.0, 6.0, ""));
        }
        let mut state = GamificationState::new();

        let outcome =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-10"), eval_time());

        let stress_drop = find_badge(&outcome, "stress_drop");
        assert!(stress_drop.is_unlocked);

        // Mood did not move, and a stress *decrease* must not unlock the
        // mood badge
        let mood_lift = find_badge(&outcome, "mood_lift");
        assert!(!mood_lift.is_unlocked);
        assert!(mood_lift.progress.abs() < f64::EPSILON);
    }

    #[test]
    fn test_improvement_rejects_wrong_direction() {
        // Stress rises from 4 to 7: no Cooling Off badge
        let mut entries = Vec::new();
        for d in 0..7 {
            let day = date("2025-05-28") + Duration::days(d);
            entries.push(make_entry(&day.to_string(), 6.0, 7.0, 4.0, ""));
        }
        for d in 0..7 {
            let day = date("2025-06-04") + Duration::days(d);
            entries.push(make_entry(&day.to_string(), 6.0, 7.0, 7.0, ""));
        }
        let mut state = GamificationState::new();

        let outcome =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-10"), eval_time());
        let stress_drop = find_badge(&outcome, "stress_drop");
        assert!(!stress_drop.is_unlocked);
        assert!(stress_drop.progress.abs() < f64::EPSILON);
    }

    #[test]
    fn test_early_bird_counts_wake_times() {
        let entries: Vec<HealthEntry> = (1..=7)
            .map(|d| {
                let mut entry = make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, "");
                entry.sleep.start_time = "22:00".to_string();
                entry.sleep.end_time = "06:00".to_string();
                entry
            })
            .collect();
        let mut state = GamificationState::new();

        let outcome =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-07"), eval_time());
        assert!(find_badge(&outcome, "early_bird").is_unlocked);
    }

    #[test]
    fn test_night_owl_counts_late_bedtimes() {
        let entries: Vec<HealthEntry> = (1..=7)
            .map(|d| {
                let mut entry = make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, "");
                entry.sleep.start_time = "00:45".to_string();
                entry.sleep.end_time = "08:00".to_string();
                entry
            })
            .collect();
        let mut state = GamificationState::new();

        let outcome =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-07"), eval_time());
        assert!(find_badge(&outcome, "night_owl").is_unlocked);
        // A 22:00 bedtime in the same data would not have counted
        assert!(!find_badge(&outcome, "early_bird").is_unlocked);
    }

    #[test]
    fn test_perfectionist_requires_consecutive_complete_entries() {
        // 6 complete days, a gap, then 1 more: run of 6
        let mut entries: Vec<HealthEntry> = (1..=6)
            .map(|d| make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, "journaled"))
            .collect();
        entries.push(make_entry("2025-06-08", 6.0, 7.0, 4.0, "journaled"));
        let mut state = GamificationState::new();

        let outcome =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-08"), eval_time());
        let badge = find_badge(&outcome, "perfectionist");
        assert!(!badge.is_unlocked);
        assert!((badge.progress - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_perfectionist_ignores_incomplete_entries() {
        // 7 consecutive days but one has no journal text: run breaks
        let entries: Vec<HealthEntry> = (1..=7)
            .map(|d| {
                let journal = if d == 4 { "" } else { "journaled" };
                make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, journal)
            })
            .collect();
        let mut state = GamificationState::new();

        let outcome =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-07"), eval_time());
        assert!(!find_badge(&outcome, "perfectionist").is_unlocked);
    }

    #[test]
    fn test_metric_average_achievements() {
        let entries: Vec<HealthEntry> = (1..=7)
            .map(|d| make_entry(&format!("2025-06-{d:02}"), 8.5, 7.0, 2.0, ""))
            .collect();
        let mut state = GamificationState::new();

        let outcome =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-07"), eval_time());
        assert!(find_achievement(&outcome, "good_vibes").is_unlocked);
        assert!(find_achievement(&outcome, "zen_mind").is_unlocked);
        // 23:00-07:00 gives 8 hours, right on the threshold
        assert!(find_achievement(&outcome, "well_rested").is_unlocked);
    }

    #[test]
    fn test_consistency_badge_covers_window() {
        let entries: Vec<HealthEntry> = (4..=10)
            .map(|d| make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, ""))
            .collect();
        let mut state = GamificationState::new();

        let outcome =
            BadgeEvaluator::evaluate(&mut state, &entries, date("2025-06-10"), eval_time());
        assert!(find_badge(&outcome, "consistency_7").is_unlocked);
        let month = find_badge(&outcome, "consistency_30");
        assert!(!month.is_unlocked);
        assert!((month.progress - 7.0).abs() < f64::EPSILON);
    }
}
