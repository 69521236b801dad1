//! Statistics aggregation
//!
//! This module derives descriptive statistics from the journal history:
//! - Sleep duration from wall-clock times (overnight wrap handled)
//! - Per-metric averages over recorded days
//! - Current and longest entry streaks
//! - Composite wellness trend across history halves
//! - Level and experience from total entry count

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};

use crate::types::{DerivedStats, HealthEntry, Metric, TrendDirection};

/// Minimum history length for the wellness trend classification
pub const MIN_TREND_ENTRIES: usize = 14;

/// Relative shift between history halves that counts as a trend
pub const TREND_SHIFT_PCT: f64 = 0.05;

/// Upper bound on the backward walk when counting the current streak
pub const MAX_STREAK_LOOKBACK_DAYS: usize = 365;

/// Trailing window for the mood/sleep display baselines
pub const BASELINE_WINDOW_DAYS: i64 = 7;

/// Experience awarded per journal entry
pub const XP_PER_ENTRY: u32 = 10;

/// Experience span of one level
pub const XP_PER_LEVEL: u32 = 100;

/// Aggregator for computing derived statistics
pub struct StatisticsAggregator;

impl StatisticsAggregator {
    /// Compute derived statistics from the full entry history.
    ///
    /// Entry order is irrelevant; sorting happens internally where it
    /// matters. `today` anchors the current streak and trailing windows.
    pub fn aggregate(entries: &[HealthEntry], today: NaiveDate) -> DerivedStats {
        let total_entries = entries.len();
        let experience = total_entries as u32 * XP_PER_ENTRY;
        let level = experience / XP_PER_LEVEL + 1;

        DerivedStats {
            total_entries,
            average_sleep_hours: metric_average(entries, Metric::SleepDuration),
            average_sleep_quality: metric_average(entries, Metric::SleepQuality),
            average_mood: metric_average(entries, Metric::Mood),
            average_stress: metric_average(entries, Metric::Stress),
            average_gi_flare: metric_average(entries, Metric::GiFlare),
            average_skin_flare: metric_average(entries, Metric::SkinFlare),
            average_migraine: metric_average(entries, Metric::Migraine),
            current_streak: current_streak(entries, today),
            longest_streak: longest_streak(entries),
            improvement_trend: improvement_trend(entries),
            mood_baseline_7d: trailing_average(entries, Metric::Mood, today, BASELINE_WINDOW_DAYS),
            sleep_baseline_7d: trailing_average(
                entries,
                Metric::SleepDuration,
                today,
                BASELINE_WINDOW_DAYS,
            ),
            experience,
            level,
            next_level_experience: level * XP_PER_LEVEL,
        }
    }
}

/// Parse "HH:MM" to minutes since midnight; `None` if malformed.
pub fn parse_clock_minutes(time: &str) -> Option<i32> {
    let (hours, minutes) = time.split_once(':')?;
    let hours: i32 = hours.trim().parse().ok()?;
    let minutes: i32 = minutes.trim().parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Sleep duration in hours from wall-clock start/end times.
///
/// An end before the start wraps past midnight (overnight sleep). Malformed
/// time strings yield 0.0 rather than an error. Rounded to 2 decimals.
pub fn sleep_duration_hours(start: &str, end: &str) -> f64 {
    let (Some(start_min), Some(end_min)) = (parse_clock_minutes(start), parse_clock_minutes(end))
    else {
        return 0.0;
    };

    let mut span = end_min - start_min;
    if span < 0 {
        span += 24 * 60;
    }
    round2(span as f64 / 60.0)
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean of a metric over entries where it was recorded (> 0).
///
/// No qualifying entries yield 0.0, never NaN.
pub fn metric_average(entries: &[HealthEntry], metric: Metric) -> f64 {
    let values: Vec<f64> = entries
        .iter()
        .map(|e| metric.value_of(e))
        .filter(|v| *v > 0.0)
        .collect();

    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Consecutive days with an entry, walking backward from `today`.
///
/// Stops at the first calendar day without an entry; bounded at
/// [`MAX_STREAK_LOOKBACK_DAYS`] iterations.
pub fn current_streak(entries: &[HealthEntry], today: NaiveDate) -> u32 {
    let dates: HashSet<NaiveDate> = entries.iter().filter_map(|e| e.date_key()).collect();

    let mut streak = 0u32;
    let mut day = today;
    for _ in 0..MAX_STREAK_LOOKBACK_DAYS {
        if !dates.contains(&day) {
            break;
        }
        streak += 1;
        day = day - Duration::days(1);
    }
    streak
}

/// Longest run of day-over-day consecutive entry dates anywhere in history
pub fn longest_streak(entries: &[HealthEntry]) -> u32 {
    let mut dates: Vec<NaiveDate> = entries.iter().filter_map(|e| e.date_key()).collect();
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

/// Composite wellness trend: compare mean wellness of the first and second
/// halves of the chronologically sorted history.
///
/// Fewer than [`MIN_TREND_ENTRIES`] entries classify as `Stable`.
pub fn improvement_trend(entries: &[HealthEntry]) -> TrendDirection {
    if entries.len() < MIN_TREND_ENTRIES {
        return TrendDirection::Stable;
    }

    let mut sorted: Vec<&HealthEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));

    let scores: Vec<f64> = sorted.iter().map(|e| e.wellness_score()).collect();
    let mid = scores.len() / 2;
    let first_mean = scores[..mid].iter().sum::<f64>() / mid as f64;
    let second_mean = scores[mid..].iter().sum::<f64>() / (scores.len() - mid) as f64;

    if first_mean <= 0.0 {
        return TrendDirection::Stable;
    }

    let change = (second_mean - first_mean) / first_mean;
    if change > TREND_SHIFT_PCT {
        TrendDirection::Up
    } else if change < -TREND_SHIFT_PCT {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    }
}

/// Mean of a metric over entries dated within the trailing `days` window
/// ending at `today`, counting only recorded (> 0) values.
pub fn trailing_average(
    entries: &[HealthEntry],
    metric: Metric,
    today: NaiveDate,
    days: i64,
) -> Option<f64> {
    let window_start = today - Duration::days(days - 1);

    let values: Vec<f64> = entries
        .iter()
        .filter(|e| {
            e.date_key()
                .map(|d| d >= window_start && d <= today)
                .unwrap_or(false)
        })
        .map(|e| metric.value_of(e))
        .filter(|v| *v > 0.0)
        .collect();

    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Trailing moving average with a minimum period of one observation.
///
/// Element `i` is the mean of the last `window` values up to and including
/// `i`; shorter prefixes average what is available.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![0.0; values.len()];
    }

    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Population standard deviation; empty input yields 0.0
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
