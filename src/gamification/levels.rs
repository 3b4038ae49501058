//! Point thresholds and level labels
//!
//! The level of a reader is never stored independently: it is always the
//! image of the point total through [`LEVELS`].

use serde::Serialize;

/// Level definition
#[derive(Debug, Clone, Serialize)]
pub struct Level {
    pub rank: u32,
    pub points_required: i64,
    pub label: &'static str,
}

/// All level definitions (must be sorted by rank, thresholds strictly ascending)
pub static LEVELS: &[Level] = &[
    Level {
        rank: 1,
        points_required: 0,
        label: "Novizio",
    },
    Level {
        rank: 2,
        points_required: 500,
        label: "Apprendista",
    },
    Level {
        rank: 3,
        points_required: 1500,
        label: "Lettore",
    },
    Level {
        rank: 4,
        points_required: 3000,
        label: "Lettore Esperto",
    },
    Level {
        rank: 5,
        points_required: 6000,
        label: "Erudito",
    },
    Level {
        rank: 6,
        points_required: 10000,
        label: "Maestro",
    },
];

impl Level {
    /// Highest level whose threshold is <= points. Negative totals clamp to 0.
    pub fn for_points(points: i64) -> &'static Level {
        let points = points.max(0);
        LEVELS
            .iter()
            .rev()
            .find(|l| points >= l.points_required)
            .unwrap_or(&LEVELS[0])
    }

    /// The level after this one (None at max level)
    pub fn next(&self) -> Option<&'static Level> {
        LEVELS.iter().find(|l| l.rank == self.rank + 1)
    }

    /// Rank of a label, if it names a level
    pub fn rank_of(label: &str) -> Option<u32> {
        LEVELS.iter().find(|l| l.label == label).map(|l| l.rank)
    }

    pub fn max_rank() -> u32 {
        LEVELS.last().map(|l| l.rank).unwrap_or(1)
    }
}

/// Level label for a point total
pub fn level_for(points: i64) -> &'static str {
    Level::for_points(points).label
}

/// Level position of a reader, as shown on the dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLevel {
    pub total_points: i64,
    pub rank: u32,
    pub label: String,
    /// Points at which the current level starts
    pub current_level_points: i64,
    /// Points needed for the next level (None if max)
    pub next_level_points: Option<i64>,
}

impl PlayerLevel {
    pub fn new(total_points: i64) -> Self {
        let level = Level::for_points(total_points);
        Self {
            total_points: total_points.max(0),
            rank: level.rank,
            label: level.label.to_string(),
            current_level_points: level.points_required,
            next_level_points: level.next().map(|l| l.points_required),
        }
    }

    /// Progress towards the next level (0.0 - 1.0)
    pub fn progress_to_next(&self) -> f32 {
        match self.next_level_points {
            Some(next) => {
                let span = next - self.current_level_points;
                if span <= 0 {
                    1.0
                } else {
                    (self.total_points - self.current_level_points) as f32 / span as f32
                }
            }
            None => 1.0,
        }
    }

    /// Points still missing for the next level
    pub fn points_to_next(&self) -> Option<i64> {
        self.next_level_points.map(|next| next - self.total_points)
    }

    pub fn is_max_level(&self) -> bool {
        self.next_level_points.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_points() {
        assert_eq!(level_for(0), "Novizio");
        assert_eq!(level_for(10), "Novizio");
        assert_eq!(level_for(499), "Novizio");
        assert_eq!(level_for(500), "Apprendista");
        assert_eq!(level_for(1500), "Lettore");
        assert_eq!(level_for(10000), "Maestro");
        assert_eq!(level_for(i64::MAX), "Maestro");
    }

    #[test]
    fn test_negative_points_clamp_to_first_level() {
        assert_eq!(level_for(-1), "Novizio");
        assert_eq!(level_for(i64::MIN), "Novizio");
    }

    #[test]
    fn test_table_is_sorted() {
        assert_eq!(LEVELS[0].points_required, 0);
        for pair in LEVELS.windows(2) {
            assert_eq!(pair[1].rank, pair[0].rank + 1);
            assert!(pair[1].points_required > pair[0].points_required);
        }
        assert_eq!(Level::max_rank(), LEVELS.len() as u32);
    }

    #[test]
    fn test_level_is_monotonic() {
        let mut previous = Level::for_points(0).rank;
        for points in (0..12_000).step_by(7) {
            let rank = Level::for_points(points).rank;
            assert!(rank >= previous, "rank dropped at {points}");
            previous = rank;
        }
    }

    #[test]
    fn test_player_level_progress() {
        let level = PlayerLevel::new(750); // between 500 and 1500
        assert_eq!(level.label, "Apprendista");
        assert_eq!(level.points_to_next(), Some(750));
        assert!((level.progress_to_next() - 0.25).abs() < 0.01);

        let max = PlayerLevel::new(20_000);
        assert!(max.is_max_level());
        assert_eq!(max.progress_to_next(), 1.0);
    }

    #[test]
    fn test_rank_of() {
        assert_eq!(Level::rank_of("Novizio"), Some(1));
        assert_eq!(Level::rank_of("Maestro"), Some(6));
        assert_eq!(Level::rank_of("Unknown"), None);
    }
}
