//! Badge and achievement catalogs
//!
//! Pure data: every unlock threshold lives here, separate from the
//! evaluation logic. The three special badges are evaluated from the sleep
//! schedule and entry completeness already present in the data model.

use super::types::{AchievementDef, BadgeCategory, BadgeDef, UnlockRule};
use crate::types::Metric;

/// Wake time cutoff for Early Bird: 06:30 as minutes past midnight
const EARLY_BIRD_WAKE_MINUTES: i32 = 6 * 60 + 30;

/// Bedtime window for Night Owl: any start between 00:00 and 04:00
const NIGHT_OWL_BEFORE_MINUTES: i32 = 4 * 60;

/// The badge catalog
pub const BADGES: [BadgeDef; 15] = [
    BadgeDef {
        id: "streak_3",
        title: "Three in a Row",
        description: "Log entries on 3 consecutive days",
        category: BadgeCategory::Streak,
        max_progress: 3.0,
        rule: UnlockRule::CurrentStreak { days: 3 },
    },
    BadgeDef {
        id: "streak_7",
        title: "One Full Week",
        description: "Log entries on 7 consecutive days",
        category: BadgeCategory::Streak,
        max_progress: 7.0,
        rule: UnlockRule::CurrentStreak { days: 7 },
    },
    BadgeDef {
        id: "streak_30",
        title: "Thirty Days Strong",
        description: "Log entries on 30 consecutive days",
        category: BadgeCategory::Streak,
        max_progress: 30.0,
        rule: UnlockRule::CurrentStreak { days: 30 },
    },
    BadgeDef {
        id: "streak_100",
        title: "Century Streak",
        description: "Log entries on 100 consecutive days",
        category: BadgeCategory::Streak,
        max_progress: 100.0,
        rule: UnlockRule::CurrentStreak { days: 100 },
    },
    BadgeDef {
        id: "consistency_7",
        title: "Steady Week",
        description: "Cover every day of the last week",
        category: BadgeCategory::Consistency,
        max_progress: 7.0,
        rule: UnlockRule::WindowCoverage {
            days: 7,
            required: 7,
        },
    },
    BadgeDef {
        id: "consistency_30",
        title: "Steady Month",
        description: "Cover every day of the last 30",
        category: BadgeCategory::Consistency,
        max_progress: 30.0,
        rule: UnlockRule::WindowCoverage {
            days: 30,
            required: 30,
        },
    },
    BadgeDef {
        id: "mood_lift",
        title: "Mood on the Rise",
        description: "Raise your weekly mood average by 2 points",
        category: BadgeCategory::Improvement,
        max_progress: 2.0,
        rule: UnlockRule::AverageShift {
            metric: Metric::Mood,
            min_shift: 2.0,
            decrease: false,
        },
    },
    BadgeDef {
        id: "sleep_upgrade",
        title: "Sleeping Better",
        description: "Raise your weekly sleep quality average by 2 points",
        category: BadgeCategory::Improvement,
        max_progress: 2.0,
        rule: UnlockRule::AverageShift {
            metric: Metric::SleepQuality,
            min_shift: 2.0,
            decrease: false,
        },
    },
    BadgeDef {
        id: "stress_drop",
        title: "Cooling Off",
        description: "Lower your weekly stress average by 2 points",
        category: BadgeCategory::Improvement,
        max_progress: 2.0,
        rule: UnlockRule::AverageShift {
            metric: Metric::Stress,
            min_shift: 2.0,
            decrease: true,
        },
    },
    BadgeDef {
        id: "entries_50",
        title: "Fifty Entries",
        description: "Log 50 entries in total",
        category: BadgeCategory::Milestone,
        max_progress: 50.0,
        rule: UnlockRule::TotalEntries { count: 50 },
    },
    BadgeDef {
        id: "entries_100",
        title: "Hundred Entries",
        description: "Log 100 entries in total",
        category: BadgeCategory::Milestone,
        max_progress: 100.0,
        rule: UnlockRule::TotalEntries { count: 100 },
    },
    BadgeDef {
        id: "entries_365",
        title: "A Year of Entries",
        description: "Log 365 entries in total",
        category: BadgeCategory::Milestone,
        max_progress: 365.0,
        rule: UnlockRule::TotalEntries { count: 365 },
    },
    BadgeDef {
        id: "early_bird",
        title: "Early Bird",
        description: "Wake by 06:30 on 7 logged days",
        category: BadgeCategory::Special,
        max_progress: 7.0,
        rule: UnlockRule::WakeBefore {
            minutes: EARLY_BIRD_WAKE_MINUTES,
            days: 7,
        },
    },
    BadgeDef {
        id: "night_owl",
        title: "Night Owl",
        description: "Go to bed past midnight on 7 logged days",
        category: BadgeCategory::Special,
        max_progress: 7.0,
        rule: UnlockRule::BedAfterMidnight {
            before_minutes: NIGHT_OWL_BEFORE_MINUTES,
            days: 7,
        },
    },
    BadgeDef {
        id: "perfectionist",
        title: "Perfectionist",
        description: "Complete every field for 7 days straight",
        category: BadgeCategory::Special,
        max_progress: 7.0,
        rule: UnlockRule::CompleteRun { days: 7 },
    },
];

/// The achievement catalog
pub const ACHIEVEMENTS: [AchievementDef; 8] = [
    AchievementDef {
        id: "first_entry",
        title: "First Entry",
        description: "Log your first day",
        max_progress: 1.0,
        rule: UnlockRule::TotalEntries { count: 1 },
    },
    AchievementDef {
        id: "full_week",
        title: "Full Week",
        description: "Log every day of the last week",
        max_progress: 7.0,
        rule: UnlockRule::WindowCoverage {
            days: 7,
            required: 7,
        },
    },
    AchievementDef {
        id: "full_month",
        title: "Full Month",
        description: "Log 28 of the last 30 days",
        max_progress: 28.0,
        rule: UnlockRule::WindowCoverage {
            days: 30,
            required: 28,
        },
    },
    AchievementDef {
        id: "well_rested",
        title: "Well Rested",
        description: "Keep your average sleep at 8 hours or more",
        max_progress: 8.0,
        rule: UnlockRule::MetricAverage {
            metric: Metric::SleepDuration,
            threshold: 8.0,
            at_most: false,
            min_entries: 7,
        },
    },
    AchievementDef {
        id: "good_vibes",
        title: "Good Vibes",
        description: "Keep your average mood at 8 or more",
        max_progress: 8.0,
        rule: UnlockRule::MetricAverage {
            metric: Metric::Mood,
            threshold: 8.0,
            at_most: false,
            min_entries: 7,
        },
    },
    AchievementDef {
        id: "zen_mind",
        title: "Zen Mind",
        description: "Keep your average stress at 3 or less",
        max_progress: 7.0,
        rule: UnlockRule::MetricAverage {
            metric: Metric::Stress,
            threshold: 3.0,
            at_most: true,
            min_entries: 7,
        },
    },
    AchievementDef {
        id: "entries_25",
        title: "Getting Into It",
        description: "Log 25 entries in total",
        max_progress: 25.0,
        rule: UnlockRule::TotalEntries { count: 25 },
    },
    AchievementDef {
        id: "entries_200",
        title: "Two Hundred Club",
        description: "Log 200 entries in total",
        max_progress: 200.0,
        rule: UnlockRule::TotalEntries { count: 200 },
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_badge_ids_are_unique() {
        let ids: HashSet<&str> = BADGES.iter().map(|b| b.id).collect();
        assert_eq!(ids.len(), BADGES.len());
    }

    #[test]
    fn test_achievement_ids_are_unique() {
        let ids: HashSet<&str> = ACHIEVEMENTS.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), ACHIEVEMENTS.len());
    }

    #[test]
    fn test_max_progress_is_positive() {
        for badge in &BADGES {
            assert!(badge.max_progress > 0.0, "badge {}", badge.id);
        }
        for achievement in &ACHIEVEMENTS {
            assert!(achievement.max_progress > 0.0, "achievement {}", achievement.id);
        }
    }
}
