//! Achievement catalog
//!
//! All achievements are defined here with their unlock conditions. The
//! catalog is static; unlock state lives in `user_achievements`.

use serde::{Deserialize, Serialize};

/// Unique identifier for each achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    // Reading milestones
    FirstChapter,
    SecondChapter,
    AvidReader,
    Bookworm,

    // Quiz milestones
    FirstQuiz,
    QuizEnthusiast,
    QuizMaster,

    // Point milestones
    HundredPoints,
    Scholar,
    Erudite,
}

impl AchievementId {
    /// Get the string ID for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstChapter => "first_chapter",
            Self::SecondChapter => "second_chapter",
            Self::AvidReader => "avid_reader",
            Self::Bookworm => "bookworm",
            Self::FirstQuiz => "first_quiz",
            Self::QuizEnthusiast => "quiz_enthusiast",
            Self::QuizMaster => "quiz_master",
            Self::HundredPoints => "hundred_points",
            Self::Scholar => "scholar",
            Self::Erudite => "erudite",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        ACHIEVEMENTS.iter().map(|a| a.id).find(|id| id.as_str() == s)
    }
}

/// Aggregate state an unlock condition is tested against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementSnapshot {
    pub completed_chapters: u32,
    pub total_points: i64,
    /// Distinct quizzes answered correctly at least once
    pub quizzes_completed: u32,
}

/// Machine-checkable unlock predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "threshold", rename_all = "snake_case")]
pub enum UnlockCondition {
    ChaptersCompleted(u32),
    QuizzesCompleted(u32),
    PointsReached(i64),
}

impl UnlockCondition {
    pub fn is_met(&self, snapshot: &AchievementSnapshot) -> bool {
        match *self {
            Self::ChaptersCompleted(n) => snapshot.completed_chapters >= n,
            Self::QuizzesCompleted(n) => snapshot.quizzes_completed >= n,
            Self::PointsReached(n) => snapshot.total_points >= n,
        }
    }
}

/// Achievement definition
#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub condition: UnlockCondition,
}

/// The catalog, in `AchievementId` declaration order
pub static ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: AchievementId::FirstChapter,
        name: "Primo Capitolo",
        description: "Completa il tuo primo capitolo",
        condition: UnlockCondition::ChaptersCompleted(1),
    },
    Achievement {
        id: AchievementId::SecondChapter,
        name: "Secondo Capitolo",
        description: "Completa due capitoli",
        condition: UnlockCondition::ChaptersCompleted(2),
    },
    Achievement {
        id: AchievementId::AvidReader,
        name: "Lettore Assiduo",
        description: "Completa cinque capitoli",
        condition: UnlockCondition::ChaptersCompleted(5),
    },
    Achievement {
        id: AchievementId::Bookworm,
        name: "Topo di Biblioteca",
        description: "Completa dieci capitoli",
        condition: UnlockCondition::ChaptersCompleted(10),
    },
    Achievement {
        id: AchievementId::FirstQuiz,
        name: "Prima Risposta",
        description: "Rispondi correttamente al primo quiz",
        condition: UnlockCondition::QuizzesCompleted(1),
    },
    Achievement {
        id: AchievementId::QuizEnthusiast,
        name: "Appassionato di Quiz",
        description: "Supera dieci quiz diversi",
        condition: UnlockCondition::QuizzesCompleted(10),
    },
    Achievement {
        id: AchievementId::QuizMaster,
        name: "Maestro dei Quiz",
        description: "Supera venticinque quiz diversi",
        condition: UnlockCondition::QuizzesCompleted(25),
    },
    Achievement {
        id: AchievementId::HundredPoints,
        name: "Cento Punti",
        description: "Guadagna 100 punti",
        condition: UnlockCondition::PointsReached(100),
    },
    Achievement {
        id: AchievementId::Scholar,
        name: "Studioso",
        description: "Guadagna 1000 punti",
        condition: UnlockCondition::PointsReached(1000),
    },
    Achievement {
        id: AchievementId::Erudite,
        name: "Erudito",
        description: "Guadagna 5000 punti",
        condition: UnlockCondition::PointsReached(5000),
    },
];

impl Achievement {
    /// Catalog entry for an id
    pub fn get(id: AchievementId) -> &'static Achievement {
        &ACHIEVEMENTS[id as usize]
    }

    /// Achievements whose condition holds for the snapshot
    pub fn satisfied_by(snapshot: &AchievementSnapshot) -> impl Iterator<Item = &'static Achievement> + '_ {
        ACHIEVEMENTS.iter().filter(move |a| a.condition.is_met(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_matches_id_order() {
        for (idx, achievement) in ACHIEVEMENTS.iter().enumerate() {
            assert_eq!(achievement.id as usize, idx, "{:?} out of order", achievement.id);
            assert_eq!(Achievement::get(achievement.id).id, achievement.id);
        }
    }

    #[test]
    fn test_id_roundtrip_and_uniqueness() {
        let mut seen = std::collections::HashSet::new();
        for achievement in ACHIEVEMENTS {
            let s = achievement.id.as_str();
            assert!(seen.insert(s), "duplicate id {s}");
            assert_eq!(AchievementId::parse(s), Some(achievement.id));
        }
        assert_eq!(AchievementId::parse("nope"), None);
    }

    #[test]
    fn test_conditions() {
        let snapshot = AchievementSnapshot {
            completed_chapters: 2,
            total_points: 120,
            quizzes_completed: 1,
        };
        let ids: Vec<_> = Achievement::satisfied_by(&snapshot).map(|a| a.id).collect();
        assert_eq!(
            ids,
            vec![
                AchievementId::FirstChapter,
                AchievementId::SecondChapter,
                AchievementId::FirstQuiz,
                AchievementId::HundredPoints,
            ]
        );

        assert_eq!(Achievement::satisfied_by(&AchievementSnapshot::default()).count(), 0);
    }
}
