//! # Race Analysis Pipeline
//!
//! Reconstructs the semantic events of a recorded race from its raw frame
//! log: compete durations, behavioral-mode intervals, and terminal
//! per-horse outcomes. The pipeline is purely synchronous and stateless
//! across invocations; parallelism, when wanted, is per race.

pub mod compete;
pub mod modes;
pub mod outcome;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::models::{
    CompeteEvent, EventName, Frame, HeuristicEvent, HorseProfile, HorseSummary, SlopeProfile,
};
use crate::skills::SkillCatalog;
use crate::speed::{adjust_stat, last_spurt_target_speed};

/// Everything the engine needs to analyze one race, materialized up front.
/// All fields are read-only inputs; nothing in here is mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceTelemetry {
    /// Course length in meters.
    pub course_distance: f64,
    /// Time-ordered frame log with a fixed horse count per frame.
    pub frames: Vec<Frame>,
    /// One profile per gate, indexed like the per-frame slots.
    pub profiles: Vec<HorseProfile>,
    pub slopes: SlopeProfile,
    /// Discrete compete triggers from the upstream event stream.
    pub compete_events: Vec<CompeteEvent>,
}

impl RaceTelemetry {
    fn validate(&self) -> Result<()> {
        if self.frames.len() < 2 {
            return Err(AnalysisError::EmptyFrameLog { frames: self.frames.len() });
        }
        if self.course_distance <= 0.0 {
            return Err(AnalysisError::InvalidCourse { distance: self.course_distance });
        }
        let frame_width = self.frames[0].horses.len();
        if self.profiles.len() != frame_width {
            return Err(AnalysisError::HorseCountMismatch {
                profiles: self.profiles.len(),
                frame_width,
            });
        }
        // The wisdom variance band takes a log10; a non-positive adjusted
        // wisdom is a data fault, not something to propagate as NaN.
        for profile in &self.profiles {
            let wisdom =
                adjust_stat(profile.stats.wisdom, profile.mood, profile.passive_bonuses.wisdom);
            if wisdom <= 0.0 {
                return Err(AnalysisError::DataIntegrity {
                    gate: profile.gate,
                    reason: format!("non-positive adjusted wisdom {wisdom}"),
                });
            }
        }
        Ok(())
    }
}

/// Full analysis output for one race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceAnalysis {
    /// Per-gate event timelines, chronological by interval start.
    pub events: Vec<Vec<HeuristicEvent>>,
    /// Per-gate end-of-race summaries.
    pub summaries: Vec<HorseSummary>,
}

/// Runs the whole pipeline on one race: expand compete triggers, segment
/// behavioral modes, then derive outcomes. Deterministic for identical
/// inputs.
pub fn analyze_race(race: &RaceTelemetry, catalog: &SkillCatalog) -> Result<RaceAnalysis> {
    race.validate()?;

    let compete = compete::expand_compete_events(race, catalog);
    let mode_events = modes::segment_modes(race, catalog, &compete);

    let mut events = Vec::with_capacity(race.profiles.len());
    let mut summaries = Vec::with_capacity(race.profiles.len());

    for (gate, profile) in race.profiles.iter().enumerate() {
        let adjusted_guts =
            adjust_stat(profile.stats.guts, profile.mood, profile.passive_bonuses.guts);

        let max_adjusted =
            outcome::max_adjusted_speed(race, catalog, gate, &compete[gate], adjusted_guts);
        let ls_target = last_spurt_target_speed(profile, race.course_distance);

        let mut timeline: Vec<HeuristicEvent> = compete[gate]
            .iter()
            .chain(&mode_events[gate])
            .copied()
            .collect();
        timeline.sort_by(|a, b| a.time.total_cmp(&b.time));

        let total = |pred: fn(EventName) -> bool| -> f64 {
            timeline.iter().filter(|e| pred(e.name)).map(|e| e.duration).sum()
        };

        summaries.push(HorseSummary {
            gate,
            max_adjusted_speed: max_adjusted,
            last_spurt_target_speed: ls_target,
            did_full_spurt: outcome::did_full_spurt(
                profile,
                race.course_distance,
                max_adjusted,
                ls_target,
            ),
            is_late_start: outcome::is_late_start(race, gate),
            hp_outcome: outcome::hp_outcome(race, gate, adjusted_guts, max_adjusted, ls_target),
            dueling_secs: total(|n| n == EventName::Dueling),
            downhill_secs: total(|n| n == EventName::DownhillMode),
            pace_up_secs: total(|n| {
                matches!(n, EventName::PaceUp | EventName::SpeedUp | EventName::Overtake)
            }),
            pace_down_secs: total(|n| n == EventName::PaceDown),
        });
        events.push(timeline);
    }

    log::debug!(
        "analyzed race: {} horses, {} frames, {} compete triggers",
        race.profiles.len(),
        race.frames.len(),
        race.compete_events.len()
    );

    Ok(RaceAnalysis { events, summaries })
}

/// Analyzes a batch of independent races in parallel. Results keep the
/// input order.
pub fn analyze_races(races: &[RaceTelemetry], catalog: &SkillCatalog) -> Vec<Result<RaceAnalysis>> {
    races.par_iter().map(|race| analyze_race(race, catalog)).collect()
}

/// Sum of skill speed buffs active at `time` for a horse, each activation
/// window sized by the skill's race-proportional duration.
pub(crate) fn active_speed_buff_at(
    catalog: &SkillCatalog,
    profile: &HorseProfile,
    time: f64,
    course_distance: f64,
) -> f64 {
    profile
        .activations
        .iter()
        .filter(|act| {
            let duration =
                catalog.skill_duration_secs(act.skill_id, course_distance, act.raw_duration_ticks);
            time >= act.time && time < act.time + duration
        })
        .map(|act| catalog.active_speed_buff(act.skill_id))
        .sum()
}

/// Whether any interval with the given tag covers `time`.
pub(crate) fn interval_active(events: &[HeuristicEvent], time: f64, name: EventName) -> bool {
    events.iter().any(|e| e.name == name && e.contains(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CompeteKind, HorseFrame, StatBlock, StatBonuses, Strategy,
    };

    const COURSE: f64 = 2400.0;

    fn profile(gate: usize) -> HorseProfile {
        HorseProfile {
            gate,
            stats: StatBlock {
                speed: 1000.0,
                stamina: 900.0,
                power: 900.0,
                guts: 800.0,
                wisdom: 1000.0,
            },
            strategy: Strategy::PaceChaser,
            distance_aptitude: 7,
            mood: 3,
            is_oonige: false,
            activations: vec![],
            passive_bonuses: StatBonuses::default(),
            last_spurt_start_distance: -1.0,
        }
    }

    fn steady_race(frames: usize, speed: f64) -> RaceTelemetry {
        let frame_log = (0..frames)
            .map(|i| {
                let t = i as f64 * 0.5;
                Frame {
                    time: t,
                    horses: vec![Some(HorseFrame {
                        distance: speed * t,
                        speed_raw: (speed * 100.0).round() as u32,
                        hp: 1000.0 - t,
                        temptation_mode: 0,
                        block_front_horse_index: -1,
                    })],
                }
            })
            .collect();
        RaceTelemetry {
            course_distance: COURSE,
            frames: frame_log,
            profiles: vec![profile(0)],
            slopes: SlopeProfile::flat(),
            compete_events: vec![],
        }
    }

    #[test]
    fn rejects_short_frame_logs() {
        let mut race = steady_race(1, 20.0);
        race.frames.truncate(1);
        let err = analyze_race(&race, &SkillCatalog::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyFrameLog { frames: 1 }));
    }

    #[test]
    fn rejects_invalid_course_distance() {
        let mut race = steady_race(10, 20.0);
        race.course_distance = 0.0;
        let err = analyze_race(&race, &SkillCatalog::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidCourse { .. }));
    }

    #[test]
    fn rejects_profile_frame_width_mismatch() {
        let mut race = steady_race(10, 20.0);
        race.profiles.push(profile(1));
        let err = analyze_race(&race, &SkillCatalog::default()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::HorseCountMismatch { profiles: 2, frame_width: 1 }
        ));
    }

    #[test]
    fn rejects_non_positive_wisdom() {
        let mut race = steady_race(10, 20.0);
        race.profiles[0].stats.wisdom = 50.0;
        race.profiles[0].passive_bonuses.wisdom = -100.0;
        let err = analyze_race(&race, &SkillCatalog::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::DataIntegrity { gate: 0, .. }));
    }

    #[test]
    fn model_never_sees_raw_wire_speeds() {
        // Raw wire value 2000 means 20 m/s; every speed the analysis handles
        // must already be divided down.
        let race = steady_race(30, 20.0);
        for frame in &race.frames {
            let h = frame.horse(0).unwrap();
            assert_eq!(h.speed_raw, 2000);
            assert!(h.speed_mps() < 100.0);
        }
        let analysis = analyze_race(&race, &SkillCatalog::default()).unwrap();
        assert!(analysis.summaries[0].max_adjusted_speed < 100.0);
    }

    #[test]
    fn pipeline_is_idempotent() {
        let mut race = steady_race(60, 20.0);
        race.compete_events.push(CompeteEvent {
            time: 3.0,
            horse: 0,
            kind: CompeteKind::SpotStruggle,
        });
        let catalog = SkillCatalog::default();

        let first = analyze_race(&race, &catalog).unwrap();
        let second = analyze_race(&race, &catalog).unwrap();
        assert_eq!(first, second);

        let a = serde_json::to_vec(&first).unwrap();
        let b = serde_json::to_vec(&second).unwrap();
        assert_eq!(a, b, "outputs must be byte-identical across runs");
    }

    #[test]
    fn summary_durations_match_the_timeline() {
        let mut race = steady_race(60, 20.0);
        race.compete_events.push(CompeteEvent {
            time: 2.0,
            horse: 0,
            kind: CompeteKind::SpotStruggle,
        });
        let analysis = analyze_race(&race, &SkillCatalog::default()).unwrap();

        let summary = &analysis.summaries[0];
        let struggle_total: f64 = analysis.events[0]
            .iter()
            .filter(|e| e.name == EventName::SpotStruggle)
            .map(|e| e.duration)
            .sum();
        assert!(struggle_total > 0.0);
        // Spot Struggle is neither dueling nor a position mode.
        assert_eq!(summary.dueling_secs, 0.0);

        let pace_total: f64 = analysis.events[0]
            .iter()
            .filter(|e| e.name.is_position_mode() && e.name != EventName::PaceDown)
            .map(|e| e.duration)
            .sum();
        assert!((summary.pace_up_secs - pace_total).abs() < 1e-9);
    }

    #[test]
    fn timeline_is_sorted_by_start_time() {
        let mut race = steady_race(120, 20.0);
        race.compete_events.push(CompeteEvent {
            time: 10.0,
            horse: 0,
            kind: CompeteKind::SpotStruggle,
        });
        race.compete_events.push(CompeteEvent {
            time: 1.0,
            horse: 0,
            kind: CompeteKind::Dueling,
        });
        let analysis = analyze_race(&race, &SkillCatalog::default()).unwrap();
        for pair in analysis.events[0].windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
    }

    #[test]
    fn batch_analysis_preserves_order_and_results() {
        let a = steady_race(30, 20.0);
        let b = steady_race(30, 18.0);
        let catalog = SkillCatalog::default();

        let batch = analyze_races(&[a.clone(), b.clone()], &catalog);
        assert_eq!(batch.len(), 2);
        assert_eq!(*batch[0].as_ref().unwrap(), analyze_race(&a, &catalog).unwrap());
        assert_eq!(*batch[1].as_ref().unwrap(), analyze_race(&b, &catalog).unwrap());
    }
}
