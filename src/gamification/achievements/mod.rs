//! Achievements: static catalog plus per-user unlock state

mod definitions;
mod evaluator;

pub use definitions::{
    ACHIEVEMENTS, Achievement, AchievementId, AchievementSnapshot, UnlockCondition,
};
pub use evaluator::{AchievementEvaluator, UnlockedAchievement};
