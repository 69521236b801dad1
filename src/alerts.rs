//! Daily alerts
//!
//! Rule-based checks over the most recent entry only. Alerts are
//! short-lived nudges distinct from insights, which look at the whole
//! history.

use crate::types::{Alert, AlertKind, HealthEntry};

/// A night under this many hours raises the low-sleep alert
pub const LOW_SLEEP_HOURS: f64 = 6.0;

/// Stress at or above this raises the high-stress alert
pub const HIGH_STRESS: f64 = 7.0;

/// Evaluate alert rules against the latest entry by date.
///
/// An empty history, or a latest entry with no recorded sleep and low
/// stress, yields no alerts.
pub fn daily_alerts(entries: &[HealthEntry]) -> Vec<Alert> {
    let Some(latest) = entries.iter().max_by(|a, b| a.date.cmp(&b.date)) else {
        return Vec::new();
    };

    let mut alerts = Vec::new();
    let sleep = latest.sleep.duration_hours;
    let stress = latest.mood.stress_score;

    let low_sleep = sleep > 0.0 && sleep < LOW_SLEEP_HOURS;
    let high_stress = stress >= HIGH_STRESS;

    if low_sleep {
        alerts.push(Alert {
            kind: AlertKind::LowSleep,
            message: format!("Low sleep ({sleep:.1}h)."),
        });
    }
    if high_stress {
        alerts.push(Alert {
            kind: AlertKind::HighStress,
            message: format!("High stress ({stress:.1}/10)."),
        });
    }
    if low_sleep && high_stress {
        alerts.push(Alert {
            kind: AlertKind::CombinedRisk,
            message: "Combined risk: low sleep + high stress.".to_string(),
        });
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymptomLog;

    fn make_entry(date: &str, stress: f64, start: &str, end: &str) -> HealthEntry {
        HealthEntry::new(date, start, end, 7.0, 6.0, stress, "", None, SymptomLog::default())
    }

    #[test]
    fn test_no_alerts_for_empty_history() {
        assert!(daily_alerts(&[]).is_empty());
    }

    #[test]
    fn test_low_sleep_alert() {
        let entries = vec![make_entry("2025-06-10", 4.0, "01:30", "06:30")];
        let alerts = daily_alerts(&entries);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowSleep);
    }

    #[test]
    fn test_combined_risk_alert() {
        let entries = vec![make_entry("2025-06-10", 8.0, "02:00", "06:30")];
        let alerts = daily_alerts(&entries);
        assert_eq!(alerts.len(), 3);
        assert!(alerts.iter().any(|a| a.kind == AlertKind::CombinedRisk));
    }

    #[test]
    fn test_alerts_use_latest_entry_only() {
        // Older entry is risky, latest is fine: nothing fires
        let entries = vec![
            make_entry("2025-06-09", 9.0, "03:00", "06:00"),
            make_entry("2025-06-10", 3.0, "23:00", "07:00"),
        ];
        assert!(daily_alerts(&entries).is_empty());
    }

    #[test]
    fn test_unrecorded_sleep_does_not_alert() {
        let mut entry = make_entry("2025-06-10", 3.0, "23:00", "07:00");
        entry.sleep.start_time = "unknown".to_string();
        entry.sleep.duration_hours = 0.0;
        assert!(daily_alerts(&[entry]).is_empty());
    }
}
