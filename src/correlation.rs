//! Correlation and trend analysis
//!
//! This module computes pairwise Pearson correlations between tracked
//! metrics and per-metric linear-regression trends over a trailing window.
//!
//! Significance is a bucket lookup against fixed critical values, not a
//! hypothesis test; the buckets exist for display ordering only.

use chrono::{Duration, NaiveDate};

use crate::types::{
    CorrelationDirection, CorrelationResult, CorrelationStrength, HealthEntry, Metric,
    MetricTrend, MetricTrendDirection, ALL_METRICS,
};

/// Minimum entries before any correlation is computed
pub const MIN_CORRELATION_ENTRIES: usize = 3;

/// Only correlations with |r| above this threshold are reported
pub const REPORT_THRESHOLD: f64 = 0.2;

/// Default trailing window for per-metric trends
pub const DEFAULT_TREND_WINDOW_DAYS: u32 = 30;

/// Change rate below this percentage classifies a trend as stable
pub const TREND_STABLE_PCT: f64 = 5.0;

/// Analyzer for metric correlations and trends
pub struct CorrelationAnalyzer;

impl CorrelationAnalyzer {
    /// Compute pairwise correlations across all tracked metrics.
    ///
    /// Fewer than [`MIN_CORRELATION_ENTRIES`] entries yield no results.
    /// Pairs are computed over entries where both metrics are recorded
    /// (> 0), filtered to |r| > [`REPORT_THRESHOLD`], and sorted by
    /// descending |r|.
    pub fn analyze(entries: &[HealthEntry]) -> Vec<CorrelationResult> {
        if entries.len() < MIN_CORRELATION_ENTRIES {
            return Vec::new();
        }

        let mut results = Vec::new();

        for (i, &metric_a) in ALL_METRICS.iter().enumerate() {
            for &metric_b in &ALL_METRICS[i + 1..] {
                if let Some(result) = correlate_pair(entries, metric_a, metric_b) {
                    if result.coefficient.abs() > REPORT_THRESHOLD {
                        results.push(result);
                    }
                }
            }
        }

        results.sort_by(|a, b| {
            b.coefficient
                .abs()
                .partial_cmp(&a.coefficient.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }

    /// Compute trends for every tracked metric over the trailing window.
    pub fn analyze_trends(
        entries: &[HealthEntry],
        today: NaiveDate,
        window_days: u32,
    ) -> Vec<MetricTrend> {
        ALL_METRICS
            .iter()
            .filter_map(|&metric| metric_trend(entries, metric, today, window_days))
            .collect()
    }
}

/// Pearson correlation coefficient over paired arrays.
///
/// Mismatched lengths, short inputs, or a zero denominator (constant
/// series) yield 0.0, never NaN.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }

    let n = xs.len() as f64;
    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
    let sum_x2: f64 = xs.iter().map(|x| x * x).sum();
    let sum_y2: f64 = ys.iter().map(|y| y * y).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    (numerator / denominator).clamp(-1.0, 1.0)
}

/// Map (r, n) to an approximate p-value bucket via a t-statistic against
/// fixed critical values: 2.576 -> 0.01, 1.96 -> 0.05, 1.645 -> 0.10,
/// else 0.20.
pub fn significance_bucket(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 0.20;
    }

    let r2 = r * r;
    if r2 >= 1.0 {
        return 0.01;
    }

    let t = r.abs() * ((n as f64 - 2.0) / (1.0 - r2)).sqrt();
    if t >= 2.576 {
        0.01
    } else if t >= 1.96 {
        0.05
    } else if t >= 1.645 {
        0.10
    } else {
        0.20
    }
}

/// Correlate one metric pair over entries where both values are recorded
fn correlate_pair(
    entries: &[HealthEntry],
    metric_a: Metric,
    metric_b: Metric,
) -> Option<CorrelationResult> {
    let pairs: Vec<(f64, f64)> = entries
        .iter()
        .map(|e| (metric_a.value_of(e), metric_b.value_of(e)))
        .filter(|(a, b)| *a > 0.0 && *b > 0.0)
        .collect();

    if pairs.len() < MIN_CORRELATION_ENTRIES {
        return None;
    }

    let xs: Vec<f64> = pairs.iter().map(|(a, _)| *a).collect();
    let ys: Vec<f64> = pairs.iter().map(|(_, b)| *b).collect();
    let r = pearson(&xs, &ys);

    let direction = if r >= 0.0 {
        CorrelationDirection::Positive
    } else {
        CorrelationDirection::Negative
    };
    let strength = CorrelationStrength::from_r(r);

    Some(CorrelationResult {
        metric_a,
        metric_b,
        coefficient: r,
        strength,
        direction,
        p_value: significance_bucket(r, pairs.len()),
        sample_size: pairs.len(),
        description: describe_correlation(metric_a, metric_b, r, strength, direction, pairs.len()),
        recommendation: recommend_for_pair(metric_a, metric_b, direction),
    })
}

fn describe_correlation(
    metric_a: Metric,
    metric_b: Metric,
    r: f64,
    strength: CorrelationStrength,
    direction: CorrelationDirection,
    n: usize,
) -> String {
    format!(
        "{} {} relationship between {} and {} (r = {:.2}, n = {})",
        capitalize(strength.as_str()),
        direction.as_str(),
        metric_a.label(),
        metric_b.label(),
        r,
        n
    )
}

/// Recommendation table keyed by metric pair and direction.
///
/// Curated text for the pairs users actually act on; a generic fallback
/// covers the rest.
fn recommend_for_pair(
    metric_a: Metric,
    metric_b: Metric,
    direction: CorrelationDirection,
) -> String {
    use CorrelationDirection::{Negative, Positive};
    use Metric::*;

    // Normalize pair order so the table only needs one arm per pair
    let (a, b) = if (metric_a as usize) <= (metric_b as usize) {
        (metric_a, metric_b)
    } else {
        (metric_b, metric_a)
    };

    let text = match (a, b, direction) {
        (SleepDuration, Mood, Positive) => {
            "Longer nights line up with better mood days. Protect your sleep window."
        }
        (SleepQuality, Mood, Positive) => {
            "Better-rated sleep tracks with better mood. A consistent wind-down routine may help both."
        }
        (SleepDuration, Stress, Negative) | (SleepQuality, Stress, Negative) => {
            "Short or poor sleep shows up as higher stress. Prioritize rest on demanding days."
        }
        (Mood, Stress, Negative) => {
            "High-stress days track with lower mood. Plan recovery time after stressful stretches."
        }
        (Stress, GiFlare, Positive) => {
            "Stress and GI flares move together. A wind-down practice on stressful days may reduce flares."
        }
        (Stress, Migraine, Positive) | (Stress, SkinFlare, Positive) => {
            "Stress tracks with this symptom. Watch for it after high-stress days."
        }
        (SleepDuration, GiFlare, Negative)
        | (SleepDuration, Migraine, Negative)
        | (SleepQuality, Migraine, Negative) => {
            "Shorter or worse sleep lines up with this symptom. Guard your sleep when it flares."
        }
        (_, _, Positive) => "These metrics rise and fall together. Worth watching over the next few weeks.",
        (_, _, Negative) => "These metrics move in opposite directions. Worth watching over the next few weeks.",
    };
    text.to_string()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Linear-regression trend for one metric over the trailing window.
///
/// Values are regressed against index positions 0..n-1 of the
/// chronologically sorted window; fewer than 3 observations yield `None`.
pub fn metric_trend(
    entries: &[HealthEntry],
    metric: Metric,
    today: NaiveDate,
    window_days: u32,
) -> Option<MetricTrend> {
    let window_start = today - Duration::days(window_days as i64 - 1);

    let mut windowed: Vec<&HealthEntry> = entries
        .iter()
        .filter(|e| {
            e.date_key()
                .map(|d| d >= window_start && d <= today)
                .unwrap_or(false)
        })
        .collect();

    if windowed.len() < MIN_CORRELATION_ENTRIES {
        return None;
    }
    windowed.sort_by(|a, b| a.date.cmp(&b.date));

    let values: Vec<f64> = windowed.iter().map(|e| metric.value_of(e)).collect();
    let slope = linear_slope(&values);
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    let change_rate = if mean == 0.0 {
        0.0
    } else {
        slope / mean * 100.0
    };

    let direction = if change_rate.abs() < TREND_STABLE_PCT {
        MetricTrendDirection::Stable
    } else if change_rate > 0.0 {
        MetricTrendDirection::Increasing
    } else {
        MetricTrendDirection::Decreasing
    };

    Some(MetricTrend {
        metric,
        slope,
        change_rate,
        direction,
        mean,
        sample_size: values.len(),
        window_days,
    })
}

/// Least-squares slope over index positions 0..n-1
fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }

    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, v)| i as f64 * v).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}
