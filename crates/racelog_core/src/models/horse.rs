//! Static per-horse attributes resolved once per race.

use serde::{Deserialize, Serialize};

use crate::constants::{
    POSITION_KEEP_COURSE_FACTOR_SLOPE, POSITION_KEEP_END_CLOSER_BAND,
    POSITION_KEEP_LATE_SURGER_BAND, POSITION_KEEP_PACE_CHASER_BAND,
};

/// Running style. Codes 1..=4 in source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Nige.
    FrontRunner,
    /// Senko.
    PaceChaser,
    /// Sashi.
    LateSurger,
    /// Oikomi.
    EndCloser,
}

impl Strategy {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Strategy::FrontRunner),
            2 => Some(Strategy::PaceChaser),
            3 => Some(Strategy::LateSurger),
            4 => Some(Strategy::EndCloser),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Strategy::FrontRunner => 1,
            Strategy::PaceChaser => 2,
            Strategy::LateSurger => 3,
            Strategy::EndCloser => 4,
        }
    }

    /// Target gap band behind the leader (meters) this strategy tries to
    /// hold during position keep, scaled by a course-length factor.
    /// Front runners hold the lead instead of a gap.
    pub fn position_keep_band(self, course_distance: f64) -> Option<(f64, f64)> {
        let factor = POSITION_KEEP_COURSE_FACTOR_SLOPE * (course_distance - 1000.0) + 1.0;
        match self {
            Strategy::FrontRunner => None,
            // The pace chaser band's near edge is a fixed 3m regardless of course length.
            Strategy::PaceChaser => {
                let (lo, hi) = POSITION_KEEP_PACE_CHASER_BAND;
                Some((lo, hi * factor))
            }
            Strategy::LateSurger => {
                let (lo, hi) = POSITION_KEEP_LATE_SURGER_BAND;
                Some((lo * factor, hi * factor))
            }
            Strategy::EndCloser => {
                let (lo, hi) = POSITION_KEEP_END_CLOSER_BAND;
                Some((lo * factor, hi * factor))
            }
        }
    }
}

/// The five raw stats of a horse.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatBlock {
    pub speed: f64,
    pub stamina: f64,
    pub power: f64,
    pub guts: f64,
    pub wisdom: f64,
}

/// Aggregate passive stat bonuses contributed by activated skills.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatBonuses {
    pub speed: f64,
    pub stamina: f64,
    pub power: f64,
    pub guts: f64,
    pub wisdom: f64,
}

impl StatBonuses {
    pub fn add(&mut self, other: &StatBonuses) {
        self.speed += other.speed;
        self.stamina += other.stamina;
        self.power += other.power;
        self.guts += other.guts;
        self.wisdom += other.wisdom;
    }
}

/// One recorded skill activation for a horse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillActivation {
    pub skill_id: u32,
    /// Activation timestamp in race seconds.
    pub time: f64,
    /// Raw duration ticks carried by the event stream, used when the skill
    /// definition has no base time.
    #[serde(default)]
    pub raw_duration_ticks: Option<i32>,
}

/// Static per-horse attributes. Populated by an adapter at the system
/// boundary; the engine never accepts untyped records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseProfile {
    /// Stable 0-based gate/post-position index, fixed for the whole race.
    /// Source data is 1-indexed (`frame_order`); the adapter converts.
    pub gate: usize,
    pub stats: StatBlock,
    pub strategy: Strategy,
    /// Per-distance-category aptitude rank, 1 (G) ..= 8 (S).
    pub distance_aptitude: u8,
    /// Mood/motivation code, 1 (awful) ..= 5 (great).
    pub mood: u8,
    /// Special front-runner variant triggered by a specific skill.
    pub is_oonige: bool,
    /// Activated skills with their activation timestamps.
    pub activations: Vec<SkillActivation>,
    /// Aggregate passive stat modifiers from the activated skills.
    pub passive_bonuses: StatBonuses,
    /// Recorded last-spurt start distance in meters, -1.0 when unset.
    pub last_spurt_start_distance: f64,
}

impl HorseProfile {
    /// Whether the horse is in last spurt at the given distance.
    pub fn in_last_spurt(&self, distance: f64) -> bool {
        self.last_spurt_start_distance > 0.0 && distance >= self.last_spurt_start_distance
    }

    /// Front runner for mode-eligibility purposes (true nige or oonige).
    pub fn is_front_runner(&self) -> bool {
        self.strategy == Strategy::FrontRunner || self.is_oonige
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_codes_round_trip() {
        for code in 1..=4u8 {
            let s = Strategy::from_code(code).unwrap();
            assert_eq!(s.code(), code);
        }
        assert!(Strategy::from_code(0).is_none());
        assert!(Strategy::from_code(5).is_none());
    }

    #[test]
    fn position_keep_band_scales_with_course_length() {
        // 1000m course: factor 1.0
        let (lo, hi) = Strategy::LateSurger.position_keep_band(1000.0).unwrap();
        assert!((lo - 6.5).abs() < 1e-9);
        assert!((hi - 7.0).abs() < 1e-9);

        // 2500m course: factor 2.2
        let (lo, hi) = Strategy::EndCloser.position_keep_band(2500.0).unwrap();
        assert!((lo - 7.5 * 2.2).abs() < 1e-9);
        assert!((hi - 8.0 * 2.2).abs() < 1e-9);

        assert!(Strategy::FrontRunner.position_keep_band(2000.0).is_none());
    }

    #[test]
    fn last_spurt_requires_valid_distance() {
        let mut profile = HorseProfile {
            gate: 0,
            stats: StatBlock::default(),
            strategy: Strategy::PaceChaser,
            distance_aptitude: 7,
            mood: 3,
            is_oonige: false,
            activations: vec![],
            passive_bonuses: StatBonuses::default(),
            last_spurt_start_distance: -1.0,
        };
        assert!(!profile.in_last_spurt(2000.0));

        profile.last_spurt_start_distance = 1600.0;
        assert!(!profile.in_last_spurt(1599.0));
        assert!(profile.in_last_spurt(1600.0));
    }

    #[test]
    fn oonige_counts_as_front_runner() {
        let mut profile = HorseProfile {
            gate: 0,
            stats: StatBlock::default(),
            strategy: Strategy::PaceChaser,
            distance_aptitude: 7,
            mood: 3,
            is_oonige: true,
            activations: vec![],
            passive_bonuses: StatBonuses::default(),
            last_spurt_start_distance: -1.0,
        };
        assert!(profile.is_front_runner());
        profile.is_oonige = false;
        assert!(!profile.is_front_runner());
    }
}
