//! Insight generation
//!
//! Rule-based: fixed threshold checks over aggregated statistics, plus
//! insights lifted from correlation and trend results. Thresholds and
//! recommendation strings are data; the evaluation order never changes.

use crate::correlation::pearson;
use crate::stats::std_dev;
use crate::types::{
    CorrelationResult, CorrelationStrength, DerivedStats, HealthEntry, Insight, InsightPriority,
    Metric, MetricTrend, MetricTrendDirection,
};

/// Minimum history length before real insights are generated
pub const MIN_INSIGHT_ENTRIES: usize = 7;

/// Average sleep below this raises the short-sleep insight (hours)
pub const SHORT_SLEEP_HOURS: f64 = 6.5;

/// Latest mood this far below the 7-day average raises the mood-dip insight
pub const MOOD_DROP_THRESHOLD: f64 = 1.5;

/// Average stress above this raises the high-stress insight
pub const HIGH_STRESS_AVERAGE: f64 = 7.0;

/// Sleep-duration standard deviation above this flags an irregular schedule
pub const IRREGULAR_SLEEP_STD_DEV: f64 = 1.5;

/// A night under this many hours counts toward sleep debt
pub const SLEEP_DEBT_HOURS: f64 = 6.0;

/// Share of short nights that raises the sleep-debt insight
pub const SLEEP_DEBT_RATIO: f64 = 0.30;

/// Quality/duration correlation below this flags a mismatch
pub const QUALITY_MISMATCH_R: f64 = 0.3;

/// Correlations with |r| above this become insights
pub const CORRELATION_INSIGHT_R: f64 = 0.3;

/// Metric trends with |change rate| above this become insights (percent)
pub const TREND_INSIGHT_PCT: f64 = 10.0;

/// Generator for prioritized, human-readable insights
pub struct InsightGenerator;

impl InsightGenerator {
    /// Generate insights from entries and precomputed analysis results.
    ///
    /// Fewer than [`MIN_INSIGHT_ENTRIES`] entries yield exactly one
    /// "need more data" insight. Output is sorted by descending
    /// confidence; ties keep insertion order.
    pub fn generate(
        entries: &[HealthEntry],
        stats: &DerivedStats,
        correlations: &[CorrelationResult],
        trends: &[MetricTrend],
    ) -> Vec<Insight> {
        if entries.len() < MIN_INSIGHT_ENTRIES {
            return vec![need_more_data(entries.len())];
        }

        let mut insights = Vec::new();

        insights.extend(check_short_sleep(stats));
        insights.extend(check_mood_dip(entries, stats));
        insights.extend(check_high_stress(stats));
        insights.extend(check_irregular_schedule(entries));
        insights.extend(check_sleep_debt(entries));
        insights.extend(check_quality_mismatch(entries));

        for correlation in correlations {
            if correlation.coefficient.abs() > CORRELATION_INSIGHT_R {
                insights.push(correlation_insight(correlation));
            }
        }

        for trend in trends {
            if trend.change_rate.abs() > TREND_INSIGHT_PCT {
                insights.push(trend_insight(trend));
            }
        }

        // Stable sort: ties keep insertion order
        insights.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        insights
    }
}

fn need_more_data(entry_count: usize) -> Insight {
    Insight {
        id: "need_more_data".to_string(),
        title: "Keep logging to unlock insights".to_string(),
        description: format!(
            "You have {} of the {} daily entries needed before patterns become visible.",
            entry_count, MIN_INSIGHT_ENTRIES
        ),
        priority: InsightPriority::Medium,
        confidence: 1.0,
        recommendations: vec![
            "Log your sleep, mood, and symptoms once a day".to_string(),
            "Insights unlock after a week of entries".to_string(),
        ],
    }
}

fn check_short_sleep(stats: &DerivedStats) -> Option<Insight> {
    if stats.average_sleep_hours <= 0.0 || stats.average_sleep_hours >= SHORT_SLEEP_HOURS {
        return None;
    }
    Some(Insight {
        id: "short_sleep".to_string(),
        title: "You're averaging short nights".to_string(),
        description: format!(
            "Your average sleep is {:.1} hours, below the {:.1}-hour mark most adults need.",
            stats.average_sleep_hours, SHORT_SLEEP_HOURS
        ),
        priority: InsightPriority::High,
        confidence: 0.9,
        recommendations: vec![
            "Move your bedtime 30 minutes earlier this week".to_string(),
            "Aim for 7-9 hours in bed".to_string(),
            "Keep screens out of the last half hour before sleep".to_string(),
        ],
    })
}

fn check_mood_dip(entries: &[HealthEntry], stats: &DerivedStats) -> Option<Insight> {
    let baseline = stats.mood_baseline_7d?;
    let latest = entries.iter().max_by(|a, b| a.date.cmp(&b.date))?;
    let latest_mood = latest.mood.mood_score;

    if latest_mood <= 0.0 || baseline - latest_mood <= MOOD_DROP_THRESHOLD {
        return None;
    }
    Some(Insight {
        id: "mood_dip".to_string(),
        title: "Your mood dipped below its recent average".to_string(),
        description: format!(
            "Yesterday's mood ({:.1}) is {:.1} points under your 7-day average of {:.1}.",
            latest_mood,
            baseline - latest_mood,
            baseline
        ),
        priority: InsightPriority::High,
        confidence: 0.75,
        recommendations: vec![
            "Plan something restorative today".to_string(),
            "Check whether sleep or stress changed in the last few days".to_string(),
        ],
    })
}

fn check_high_stress(stats: &DerivedStats) -> Option<Insight> {
    if stats.average_stress <= HIGH_STRESS_AVERAGE {
        return None;
    }
    Some(Insight {
        id: "high_stress".to_string(),
        title: "Stress has been running high".to_string(),
        description: format!(
            "Your average stress is {:.1}/10 across your logged days.",
            stats.average_stress
        ),
        priority: InsightPriority::High,
        confidence: 0.85,
        recommendations: vec![
            "Schedule one deliberate recovery block per day".to_string(),
            "Short breathing exercises measurably lower acute stress".to_string(),
        ],
    })
}

fn check_irregular_schedule(entries: &[HealthEntry]) -> Option<Insight> {
    let durations: Vec<f64> = entries
        .iter()
        .map(|e| e.sleep.duration_hours)
        .filter(|d| *d > 0.0)
        .collect();
    if durations.is_empty() {
        return None;
    }

    let spread = std_dev(&durations);
    if spread <= IRREGULAR_SLEEP_STD_DEV {
        return None;
    }
    Some(Insight {
        id: "irregular_schedule".to_string(),
        title: "Your sleep schedule is irregular".to_string(),
        description: format!(
            "Night-to-night sleep varies by {:.1} hours on average.",
            spread
        ),
        priority: InsightPriority::Medium,
        confidence: 0.7,
        recommendations: vec![
            "Pick a fixed wake time, even on weekends".to_string(),
            "Consistency improves sleep quality more than total hours".to_string(),
        ],
    })
}

fn check_sleep_debt(entries: &[HealthEntry]) -> Option<Insight> {
    let durations: Vec<f64> = entries
        .iter()
        .map(|e| e.sleep.duration_hours)
        .filter(|d| *d > 0.0)
        .collect();
    if durations.is_empty() {
        return None;
    }

    let short_nights = durations.iter().filter(|d| **d < SLEEP_DEBT_HOURS).count();
    let ratio = short_nights as f64 / durations.len() as f64;
    if ratio <= SLEEP_DEBT_RATIO {
        return None;
    }
    Some(Insight {
        id: "sleep_debt".to_string(),
        title: "You're building sleep debt".to_string(),
        description: format!(
            "{:.0}% of your nights were under {:.0} hours.",
            ratio * 100.0,
            SLEEP_DEBT_HOURS
        ),
        priority: InsightPriority::Medium,
        confidence: 0.8,
        recommendations: vec![
            "Recover with earlier nights rather than weekend lie-ins".to_string(),
            "Watch for mood and symptom knock-on effects this week".to_string(),
        ],
    })
}

fn check_quality_mismatch(entries: &[HealthEntry]) -> Option<Insight> {
    let pairs: Vec<(f64, f64)> = entries
        .iter()
        .map(|e| (e.sleep.quality_score, e.sleep.duration_hours))
        .filter(|(q, d)| *q > 0.0 && *d > 0.0)
        .collect();
    if pairs.len() < MIN_INSIGHT_ENTRIES {
        return None;
    }

    let qualities: Vec<f64> = pairs.iter().map(|(q, _)| *q).collect();
    let durations: Vec<f64> = pairs.iter().map(|(_, d)| *d).collect();
    let r = pearson(&qualities, &durations);
    if r >= QUALITY_MISMATCH_R {
        return None;
    }
    Some(Insight {
        id: "quality_mismatch".to_string(),
        title: "More sleep isn't translating into better rest".to_string(),
        description: format!(
            "Sleep quality barely tracks time in bed (r = {:.2}); something else drives how rested you feel.",
            r
        ),
        priority: InsightPriority::Medium,
        confidence: 0.6,
        recommendations: vec![
            "Look at evening routine, caffeine timing, and room temperature".to_string(),
            "Quality often responds to schedule regularity before duration".to_string(),
        ],
    })
}

fn correlation_insight(correlation: &CorrelationResult) -> Insight {
    let priority = match correlation.strength {
        CorrelationStrength::Strong => InsightPriority::High,
        _ => InsightPriority::Medium,
    };
    Insight {
        id: format!(
            "correlation_{}_{}",
            correlation.metric_a.as_str(),
            correlation.metric_b.as_str()
        ),
        title: format!(
            "Pattern: {} and {}",
            correlation.metric_a.label(),
            correlation.metric_b.label()
        ),
        description: correlation.description.clone(),
        priority,
        confidence: correlation.coefficient.abs().clamp(0.0, 1.0),
        recommendations: vec![correlation.recommendation.clone()],
    }
}

fn trend_insight(trend: &MetricTrend) -> Insight {
    let direction_word = match trend.direction {
        MetricTrendDirection::Increasing => "rising",
        MetricTrendDirection::Decreasing => "falling",
        MetricTrendDirection::Stable => "steady",
    };
    Insight {
        id: format!(
            "trend_{}_{}",
            trend.metric.as_str(),
            trend.direction.as_str()
        ),
        title: format!("{} is {}", capitalize(trend.metric.label()), direction_word),
        description: format!(
            "Your {} changed about {:.0}% per day relative to its average over the last {} days.",
            trend.metric.label(),
            trend.change_rate.abs(),
            trend.window_days
        ),
        priority: InsightPriority::Medium,
        confidence: 0.65,
        recommendations: vec![trend_recommendation(trend.metric, trend.direction).to_string()],
    }
}

/// Static recommendation lookup keyed by (metric, direction)
fn trend_recommendation(metric: Metric, direction: MetricTrendDirection) -> &'static str {
    use Metric::*;
    use MetricTrendDirection::*;

    match (metric, direction) {
        (Mood, Increasing) => "Whatever changed recently is working for your mood. Keep it going.",
        (Mood, Decreasing) => "Mood has been sliding. Revisit sleep and stress from the past week.",
        (Stress, Increasing) => "Stress is climbing. Build in recovery time before it compounds.",
        (Stress, Decreasing) => "Stress is easing off. Note what you changed so you can repeat it.",
        (SleepDuration, Increasing) => "Sleep time is growing. Hold this schedule steady.",
        (SleepDuration, Decreasing) => "Sleep time is shrinking. Protect your bedtime this week.",
        (SleepQuality, Increasing) => "Sleep quality is improving. Your current routine is paying off.",
        (SleepQuality, Decreasing) => {
            "Sleep quality is dropping. Check evening habits and schedule regularity."
        }
        (GiFlare | SkinFlare | Migraine, Increasing) => {
            "This symptom is trending up. Consider reviewing recent triggers with your clinician."
        }
        (GiFlare | SkinFlare | Migraine, Decreasing) => {
            "This symptom is trending down. Whatever you're doing, keep it up."
        }
        (_, Stable) => "No meaningful change over the window.",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationAnalyzer;
    use crate::stats::StatisticsAggregator;
    use crate::types::SymptomLog;
    use chrono::NaiveDate;

    fn make_entry(date: &str, mood: f64, quality: f64, stress: f64, duration: f64) -> HealthEntry {
        let total_minutes = (duration * 60.0).round() as i64;
        HealthEntry::new(
            date,
            "00:00",
            format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60),
            quality,
            mood,
            stress,
            "",
            None,
            SymptomLog::default(),
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn generate_for(entries: &[HealthEntry], today: NaiveDate) -> Vec<Insight> {
        let stats = StatisticsAggregator::aggregate(entries, today);
        let correlations = CorrelationAnalyzer::analyze(entries);
        let trends = CorrelationAnalyzer::analyze_trends(entries, today, 30);
        InsightGenerator::generate(entries, &stats, &correlations, &trends)
    }

    #[test]
    fn test_fewer_than_seven_entries_yields_need_more_data_only() {
        let entries: Vec<HealthEntry> = (1..=6)
            .map(|d| make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, 8.0))
            .collect();

        let insights = generate_for(&entries, date("2025-06-06"));
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "need_more_data");
    }

    #[test]
    fn test_short_sleep_insight() {
        let entries: Vec<HealthEntry> = (1..=10)
            .map(|d| make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, 5.5))
            .collect();

        let insights = generate_for(&entries, date("2025-06-10"));
        let insight = insights.iter().find(|i| i.id == "short_sleep").unwrap();
        assert_eq!(insight.priority, InsightPriority::High);
        assert!(!insight.recommendations.is_empty());
    }

    #[test]
    fn test_high_stress_insight() {
        let entries: Vec<HealthEntry> = (1..=10)
            .map(|d| make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 8.0, 7.5))
            .collect();

        let insights = generate_for(&entries, date("2025-06-10"));
        assert!(insights.iter().any(|i| i.id == "high_stress"));
    }

    #[test]
    fn test_sleep_debt_insight() {
        // 4 of 10 nights under 6 hours: 40% > 30%
        let entries: Vec<HealthEntry> = (1..=10)
            .map(|d| {
                let duration = if d <= 4 { 5.0 } else { 7.5 };
                make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, duration)
            })
            .collect();

        let insights = generate_for(&entries, date("2025-06-10"));
        assert!(insights.iter().any(|i| i.id == "sleep_debt"));
    }

    #[test]
    fn test_irregular_schedule_insight() {
        let entries: Vec<HealthEntry> = (1..=10)
            .map(|d| {
                let duration = if d % 2 == 0 { 4.5 } else { 9.5 };
                make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 4.0, duration)
            })
            .collect();

        let insights = generate_for(&entries, date("2025-06-10"));
        assert!(insights.iter().any(|i| i.id == "irregular_schedule"));
    }

    #[test]
    fn test_mood_dip_insight() {
        let mut entries: Vec<HealthEntry> = (1..=9)
            .map(|d| make_entry(&format!("2025-06-{d:02}"), 8.0, 7.0, 4.0, 7.5))
            .collect();
        entries.push(make_entry("2025-06-10", 3.0, 7.0, 4.0, 7.5));

        let insights = generate_for(&entries, date("2025-06-10"));
        assert!(insights.iter().any(|i| i.id == "mood_dip"));
    }

    #[test]
    fn test_correlation_insight_uses_result_fields() {
        // Mood follows duration exactly across 14 days
        let entries: Vec<HealthEntry> = (0..14)
            .map(|i| {
                let duration = 6.0 + 0.2 * i as f64;
                make_entry(
                    &format!("2025-06-{:02}", i + 1),
                    duration - 2.0,
                    7.0,
                    5.0,
                    duration,
                )
            })
            .collect();

        let insights = generate_for(&entries, date("2025-06-14"));
        let insight = insights
            .iter()
            .find(|i| i.id == "correlation_sleep_duration_mood")
            .expect("correlation insight should be emitted");
        assert!(insight.confidence > 0.9);
        assert_eq!(insight.recommendations.len(), 1);
    }

    #[test]
    fn test_trend_insight_from_steep_mood_rise() {
        let entries: Vec<HealthEntry> = (0..14)
            .map(|i| {
                let mood = 1.0 + 9.0 * (i as f64) / 13.0;
                make_entry(&format!("2025-06-{:02}", i + 1), mood, 7.0, 5.0, 8.0)
            })
            .collect();

        let insights = generate_for(&entries, date("2025-06-14"));
        let insight = insights
            .iter()
            .find(|i| i.id == "trend_mood_increasing")
            .expect("trend insight should be emitted");
        assert!(insight.description.contains("mood"));
        assert!(!insight.recommendations[0].is_empty());
    }

    #[test]
    fn test_insights_sorted_by_confidence() {
        let entries: Vec<HealthEntry> = (1..=10)
            .map(|d| make_entry(&format!("2025-06-{d:02}"), 6.0, 7.0, 8.0, 5.5))
            .collect();

        let insights = generate_for(&entries, date("2025-06-10"));
        assert!(insights.len() >= 2);
        for window in insights.windows(2) {
            assert!(window[0].confidence >= window[1].confidence);
        }
    }
}
