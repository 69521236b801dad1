//! Gamification module
//!
//! Evaluates a static catalog of badges and achievements against the entry
//! history. The catalog is data (thresholds in `catalog`), the engine is
//! generic (`evaluator`), and unlock state is a persisted side table keyed
//! by item id (`types`).
//!
//! Unlocks are one-way: once `is_unlocked` is set, re-evaluation never
//! clears it or re-stamps `unlocked_at`.

pub mod catalog;
pub mod evaluator;
pub mod types;

pub use catalog::{ACHIEVEMENTS, BADGES};
pub use evaluator::{BadgeEvaluator, EvaluationOutcome};
pub use types::{
    Achievement, AchievementDef, Badge, BadgeCategory, BadgeDef, GamificationState, ItemState,
    UnlockKind, UnlockRule, UnlockedItem, STATE_SCHEMA_VERSION,
};
