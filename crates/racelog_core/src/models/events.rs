//! Analysis inputs and outputs: compete triggers, heuristic event
//! intervals, terminal outcomes.

use serde::{Deserialize, Serialize};

/// Kind of an upstream compete trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompeteKind {
    /// Competes (Speed).
    Dueling,
    /// Competes (Pos).
    SpotStruggle,
}

/// A single discrete trigger emitted once by the upstream simulation.
/// The engine's job is to expand this into a duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompeteEvent {
    /// Trigger timestamp in race seconds.
    pub time: f64,
    /// 0-based gate index of the affected horse.
    pub horse: usize,
    pub kind: CompeteKind,
}

/// Tag of an inferred event interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    PaceUp,
    SpeedUp,
    Overtake,
    PaceDown,
    DownhillMode,
    Dueling,
    SpotStruggle,
}

impl EventName {
    pub fn label(self) -> &'static str {
        match self {
            EventName::PaceUp => "Pace Up",
            EventName::SpeedUp => "Speed Up",
            EventName::Overtake => "Overtake",
            EventName::PaceDown => "Pace Down",
            EventName::DownhillMode => "Downhill Mode",
            EventName::Dueling => "Dueling",
            EventName::SpotStruggle => "Spot Struggle",
        }
    }

    /// Whether this tag belongs to the position-mode track (as opposed to
    /// the downhill track or a compete interval).
    pub fn is_position_mode(self) -> bool {
        matches!(
            self,
            EventName::PaceUp | EventName::SpeedUp | EventName::Overtake | EventName::PaceDown
        )
    }
}

/// An inferred event interval on a horse's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicEvent {
    /// Interval start in race seconds.
    pub time: f64,
    /// Interval length in seconds.
    pub duration: f64,
    pub name: EventName,
}

impl HeuristicEvent {
    #[inline]
    pub fn end(&self) -> f64 {
        self.time + self.duration
    }

    /// Half-open containment test: `[time, time + duration)`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.time && t < self.end()
    }
}

/// Terminal HP result for one horse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HpOutcome {
    /// HP hit zero strictly before the finish line.
    Died {
        /// Meters left to the finish when HP ran out.
        distance_before_finish: f64,
        /// Estimated HP the horse was short of.
        hp_deficit: f64,
        start_hp: f64,
    },
    Survived {
        hp_remaining: f64,
        start_hp: f64,
    },
}

impl HpOutcome {
    pub fn survived(&self) -> bool {
        matches!(self, HpOutcome::Survived { .. })
    }
}

/// End-of-race summary for one horse, used to populate result tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseSummary {
    /// 0-based gate index.
    pub gate: usize,
    /// Maximum buff-adjusted speed reached, m/s.
    pub max_adjusted_speed: f64,
    /// Deterministic last-spurt target speed, m/s.
    pub last_spurt_target_speed: f64,
    pub did_full_spurt: bool,
    pub is_late_start: bool,
    pub hp_outcome: HpOutcome,
    /// Cumulative inferred durations, seconds.
    pub dueling_secs: f64,
    pub downhill_secs: f64,
    pub pace_up_secs: f64,
    pub pace_down_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_containment_is_half_open() {
        let e = HeuristicEvent { time: 10.0, duration: 2.5, name: EventName::Dueling };
        assert!(!e.contains(9.99));
        assert!(e.contains(10.0));
        assert!(e.contains(12.49));
        assert!(!e.contains(12.5));
    }

    #[test]
    fn position_mode_tags() {
        assert!(EventName::PaceUp.is_position_mode());
        assert!(EventName::Overtake.is_position_mode());
        assert!(!EventName::DownhillMode.is_position_mode());
        assert!(!EventName::SpotStruggle.is_position_mode());
    }

    #[test]
    fn hp_outcome_serializes_tagged() {
        let died = HpOutcome::Died {
            distance_before_finish: 42.0,
            hp_deficit: 130.5,
            start_hp: 1200.0,
        };
        let json = serde_json::to_value(&died).unwrap();
        assert_eq!(json["type"], "died");
        assert!(!died.survived());

        let survived = HpOutcome::Survived { hp_remaining: 88.0, start_hp: 1200.0 };
        let json = serde_json::to_value(&survived).unwrap();
        assert_eq!(json["type"], "survived");
        assert!(survived.survived());
    }
}
