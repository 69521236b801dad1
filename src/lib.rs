//! Vitalog - On-device analytics engine for daily health journaling
//!
//! Vitalog turns a journal of daily sleep/mood/symptom entries into derived
//! statistics, metric correlations, trend classifications, rule-based
//! insights, daily alerts, and gamification unlocks. Every analysis pass
//! recomputes from the full entry snapshot:
//!
//! entries → statistics → {correlations, badges} → insights → report
//!
//! ## Modules
//!
//! - **Analytics core**: statistics, correlation/trend analysis, insight
//!   generation, daily alerts
//! - **Gamification**: declarative badge/achievement catalog with a
//!   monotonic unlock evaluator
//! - **Storage**: key-value state blob and NDJSON journal collaborators

pub mod alerts;
pub mod correlation;
pub mod error;
pub mod gamification;
pub mod insights;
pub mod pipeline;
pub mod stats;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::{AnalyticsError, ValidationError};
pub use pipeline::{report_from_json, JournalAnalytics, REPORT_SCHEMA_VERSION};

// Analytics exports
pub use alerts::daily_alerts;
pub use correlation::CorrelationAnalyzer;
pub use insights::InsightGenerator;
pub use stats::StatisticsAggregator;

// Data model exports
pub use types::{AnalyticsReport, DerivedStats, HealthEntry, Insight, Metric};

// Gamification exports
pub use gamification::{BadgeEvaluator, GamificationState};

// Storage exports
pub use store::{FileStore, JournalStore, KeyValueStore, MemoryStore};

/// Engine version embedded in every report
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "vitalog";
