//! # Outcome Estimators
//!
//! End-of-race summaries per horse: the maximum buff-adjusted speed
//! actually reached, whether the final sprint was executed in full, the
//! terminal HP outcome, and late-start detection.

use crate::constants::*;
use crate::models::{EventName, HeuristicEvent, HorseProfile, HpOutcome};
use crate::skills::{SkillCatalog, EFFECT_IGNORE_DECELERATION};
use crate::speed::{base_speed, downhill_mode_bonus, reference_hp_consumption};

use super::RaceTelemetry;

/// Maximum "true" speed: raw speed minus every active boost, scanned over
/// all frames. Frames that cannot yield a trustworthy sample are skipped:
/// while a type-28 (ignore-deceleration) skill is active and one frame
/// after it ends, during dueling plus a short tail, and whenever the local
/// acceleration indicates the horse is decelerating.
pub(crate) fn max_adjusted_speed(
    race: &RaceTelemetry,
    catalog: &SkillCatalog,
    gate: usize,
    compete: &[HeuristicEvent],
    adjusted_guts: f64,
) -> f64 {
    let profile = &race.profiles[gate];
    let mut max_adj: f64 = 0.0;
    let mut was_type28_active = false;
    let mut last_dueling_frame: Option<usize> = None;

    for (idx, frame) in race.frames.iter().enumerate() {
        let Some(h) = frame.horse(gate) else { continue };
        if h.distance > race.course_distance {
            continue;
        }
        let speed = h.speed_mps();
        if speed <= 0.0 {
            continue;
        }
        let time = frame.time;

        let mut buff = 0.0;
        let mut is_type28_active = false;
        for act in &profile.activations {
            let duration =
                catalog.skill_duration_secs(act.skill_id, race.course_distance, act.raw_duration_ticks);
            if time >= act.time && time < act.time + duration {
                buff += catalog.active_speed_buff(act.skill_id);
                if catalog.has_effect(act.skill_id, EFFECT_IGNORE_DECELERATION) {
                    is_type28_active = true;
                }
            }
        }

        // Skip the active window and the discontinuity frame right after it.
        let skip_type28 = is_type28_active || was_type28_active;
        was_type28_active = is_type28_active;
        if skip_type28 {
            continue;
        }

        let mut is_dueling_active = false;
        for e in compete {
            if !e.contains(time) {
                continue;
            }
            match e.name {
                EventName::SpotStruggle => {
                    buff += (SPOT_STRUGGLE_GUTS_BASE * adjusted_guts)
                        .powf(SPOT_STRUGGLE_GUTS_EXPONENT)
                        * SPOT_STRUGGLE_GUTS_SCALE;
                }
                EventName::Dueling => {
                    buff += (DUELING_GUTS_BASE * adjusted_guts).powf(DUELING_GUTS_EXPONENT)
                        * DUELING_GUTS_SCALE;
                    is_dueling_active = true;
                }
                _ => {}
            }
        }

        if is_dueling_active {
            last_dueling_frame = Some(idx);
        } else if last_dueling_frame
            .is_some_and(|last| idx - last <= DUELING_SKIP_LOOKAHEAD_FRAMES)
        {
            continue;
        }

        let slope = race.slopes.slope_at(h.distance);
        if slope < 0
            && (profile.in_last_spurt(h.distance)
                || downhill_mode_confirmed(race, gate, idx, speed))
        {
            buff += downhill_mode_bonus(slope);
        }

        if decelerating(race, gate, idx, speed, time) {
            continue;
        }

        max_adj = max_adj.max(speed - buff);
    }

    max_adj
}

/// Backward then forward local acceleration; either side below the skip
/// threshold disqualifies the frame (the forward side catches the moment a
/// buff drops before the speed has).
fn decelerating(race: &RaceTelemetry, gate: usize, idx: usize, speed: f64, time: f64) -> bool {
    if idx > 0 {
        if let Some(prev) = race.frames[idx - 1].horse(gate) {
            let dt = time - race.frames[idx - 1].time;
            if dt > 0.0 && (speed - prev.speed_mps()) / dt < DECELERATION_SKIP_THRESHOLD {
                return true;
            }
        }
    }
    if let Some(next_frame) = race.frames.get(idx + 1) {
        if let Some(next) = next_frame.horse(gate) {
            let dt = next_frame.time - time;
            if dt > 0.0 && (next.speed_mps() - speed) / dt < DECELERATION_SKIP_THRESHOLD {
                return true;
            }
        }
    }
    false
}

fn downhill_mode_confirmed(race: &RaceTelemetry, gate: usize, idx: usize, speed: f64) -> bool {
    let Some(next_frame) = race.frames.get(idx + 1) else { return false };
    let (Some(h), Some(n)) = (race.frames[idx].horse(gate), next_frame.horse(gate)) else {
        return false;
    };
    let dt = next_frame.time - race.frames[idx].time;
    if dt <= 0.0 {
        return false;
    }
    let rate = (h.hp - n.hp) / dt;
    let expected = reference_hp_consumption(speed, race.course_distance);
    expected > 0.0 && rate > 0.0 && rate < expected * DOWNHILL_HP_RATIO_THRESHOLD
}

/// Terminal HP outcome. A horse that hits exactly 0 HP strictly before the
/// finish (0.1m tolerance) died on course; the deficit estimate converts
/// the remaining distance into HP at the best known speed.
pub(crate) fn hp_outcome(
    race: &RaceTelemetry,
    gate: usize,
    adjusted_guts: f64,
    max_adjusted_speed: f64,
    last_spurt_target_speed: f64,
) -> HpOutcome {
    let start_hp = race.frames[0].horse(gate).map_or(0.0, |h| h.hp);

    let death = race
        .frames
        .iter()
        .find_map(|f| f.horse(gate).filter(|h| h.hp == 0.0));
    if let Some(h) = death {
        if h.distance < race.course_distance - FINISH_TOLERANCE_M {
            let distance_before_finish = race.course_distance - h.distance;
            let status_modifier =
                1.0 + HP_DEFICIT_GUTS_COEFF / (HP_DEFICIT_GUTS_BASE * adjusted_guts).sqrt();
            let current_speed = if max_adjusted_speed > 0.0 {
                max_adjusted_speed
            } else if last_spurt_target_speed > 0.0 {
                last_spurt_target_speed
            } else {
                HP_DEFICIT_FALLBACK_SPEED
            };

            let delta = current_speed - base_speed(race.course_distance) + HP_CONSUMPTION_SPEED_OFFSET;
            let hp_per_sec =
                HP_CONSUMPTION_SCALE * delta * delta / HP_CONSUMPTION_DIVISOR * status_modifier;
            let hp_deficit = distance_before_finish / current_speed * hp_per_sec;

            return HpOutcome::Died { distance_before_finish, hp_deficit, start_hp };
        }
    }

    let hp_remaining = race
        .frames
        .last()
        .and_then(|f| f.horse(gate))
        .map_or(0.0, |h| h.hp);
    HpOutcome::Survived { hp_remaining, start_hp }
}

/// Full spurt: the recorded spurt start must be valid, begin within 3m of
/// the late-phase boundary, and the horse must have actually reached its
/// deterministic spurt target (small slack allowed).
pub(crate) fn did_full_spurt(
    profile: &HorseProfile,
    course_distance: f64,
    max_adjusted_speed: f64,
    last_spurt_target_speed: f64,
) -> bool {
    let spurt_start = profile.last_spurt_start_distance;
    if spurt_start <= 0.0 {
        return false;
    }
    let delay = spurt_start - LATE_PHASE_START_FRACTION * course_distance;
    delay < FULL_SPURT_MAX_DELAY_M
        && max_adjusted_speed - last_spurt_target_speed >= -FULL_SPURT_SPEED_SLACK
}

/// A horse that shows no acceleration across the first frame pair missed
/// the gate.
pub(crate) fn is_late_start(race: &RaceTelemetry, gate: usize) -> bool {
    let (Some(f0), Some(f1)) = (race.frames.first(), race.frames.get(1)) else {
        return false;
    };
    let (Some(h0), Some(h1)) = (f0.horse(gate), f1.horse(gate)) else {
        return false;
    };
    let dt = f1.time - f0.time;
    if dt <= 0.0 {
        return false;
    }
    (h1.speed_mps() - h0.speed_mps()) / dt < LATE_START_ACCEL_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Frame, HorseFrame, SkillActivation, SlopeProfile, StatBlock, StatBonuses, Strategy,
    };
    use crate::skills::{ConditionGroup, SkillDefinition, SkillEffect};
    use crate::speed::last_spurt_target_speed;

    const COURSE: f64 = 2400.0;

    fn profile() -> HorseProfile {
        HorseProfile {
            gate: 0,
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

    fn frames_from(speeds_hp: &[(f64, f64)]) -> Vec<Frame> {
        let mut distance = 0.0;
        speeds_hp
            .iter()
            .enumerate()
            .map(|(i, &(speed, hp))| {
                let f = Frame {
                    time: i as f64 * 0.5,
                    horses: vec![Some(HorseFrame {
                        distance,
                        speed_raw: (speed * 100.0).round() as u32,
                        hp,
                        temptation_mode: 0,
                        block_front_horse_index: -1,
                    })],
                };
                distance += speed * 0.5;
                f
            })
            .collect()
    }

    fn race(frames: Vec<Frame>) -> RaceTelemetry {
        RaceTelemetry {
            course_distance: COURSE,
            frames,
            profiles: vec![profile()],
            slopes: SlopeProfile::flat(),
            compete_events: vec![],
        }
    }

    #[test]
    fn max_adjusted_speed_ignores_decelerating_frames() {
        // A spike followed by a sharp decay: the spike's neighbors
        // decelerate and are skipped, leaving the plateau value.
        let r = race(frames_from(&[
            (18.0, 1000.0),
            (18.0, 990.0),
            (24.0, 980.0),
            (18.0, 970.0),
            (18.0, 960.0),
            (18.0, 950.0),
        ]));
        let got = max_adjusted_speed(&r, &SkillCatalog::default(), 0, &[], 800.0);
        // The 24.0 frame itself survives only its backward check; forward
        // deceleration disqualifies it.
        assert!((got - 18.0).abs() < 1e-9);
    }

    #[test]
    fn max_adjusted_speed_subtracts_compete_buffs() {
        let r = race(frames_from(&[(20.0, 1000.0); 10]));
        let duel = HeuristicEvent { time: 0.0, duration: 100.0, name: EventName::Dueling };
        let got = max_adjusted_speed(&r, &SkillCatalog::default(), 0, &[duel], 800.0);
        let bonus = (DUELING_GUTS_BASE * 800.0).powf(DUELING_GUTS_EXPONENT) * DUELING_GUTS_SCALE;
        assert!((got - (20.0 - bonus)).abs() < 1e-9);
    }

    #[test]
    fn frames_right_after_a_duel_are_skipped() {
        // Duel covers the first 4 frames (t < 2.0); the 2-frame tail after
        // it must not contribute, so the 25.0 spikes at t=2.0/2.5 are lost.
        let mut speeds = vec![(20.0, 1000.0); 4];
        speeds.extend([(25.0, 1000.0), (25.0, 1000.0)]);
        speeds.extend(vec![(21.0, 1000.0); 4]);
        let r = race(frames_from(&speeds));
        let duel = HeuristicEvent { time: 0.0, duration: 2.0, name: EventName::Dueling };
        let got = max_adjusted_speed(&r, &SkillCatalog::default(), 0, &[duel], 800.0);
        assert!((got - 21.0).abs() < 1e-9);
    }

    #[test]
    fn ignore_deceleration_window_hides_speed_spikes() {
        // A 30 m/s burst confined to a type-28 skill's active window
        // [1.0, 2.0) plus the frame right after it must not count.
        let mut r = race(frames_from(&[
            (20.0, 1000.0),
            (20.0, 1000.0),
            (30.0, 1000.0),
            (30.0, 1000.0),
            (30.0, 1000.0),
            (20.0, 1000.0),
            (20.0, 1000.0),
        ]));
        r.profiles[0].activations = vec![SkillActivation {
            skill_id: 100501,
            time: 1.0,
            raw_duration_ticks: Some(10_000),
        }];
        let skill = SkillDefinition {
            id: 100501,
            condition_groups: vec![ConditionGroup {
                effects: vec![SkillEffect {
                    effect_type: EFFECT_IGNORE_DECELERATION,
                    value: 0,
                }],
                base_time: 0,
            }],
            gene_version: None,
        };
        let catalog = SkillCatalog::new([skill]);

        let got = max_adjusted_speed(&r, &catalog, 0, &[], 800.0);
        assert!((got - 20.0).abs() < 1e-9);

        // Without the skill definition the t=1.0 spike frame (steady on both
        // sides within the burst) would set the maximum.
        let got = max_adjusted_speed(&r, &SkillCatalog::default(), 0, &[], 800.0);
        assert!((got - 30.0).abs() < 1e-9);
    }

    #[test]
    fn hp_outcome_death_before_finish() {
        let mut frames = frames_from(&[(20.0, 100.0); 10]);
        for f in frames.iter_mut().skip(5) {
            f.horses[0].as_mut().unwrap().hp = 0.0;
        }
        let r = race(frames);
        let ls_target = last_spurt_target_speed(&r.profiles[0], COURSE);
        let outcome = hp_outcome(&r, 0, 800.0, 21.0, ls_target);

        match outcome {
            HpOutcome::Died { distance_before_finish, hp_deficit, start_hp } => {
                // Death sample at t=2.5, distance 50.0.
                assert!((distance_before_finish - (COURSE - 50.0)).abs() < 1e-9);
                assert!((start_hp - 100.0).abs() < 1e-9);

                let status = 1.0 + 200.0 / (600.0f64 * 800.0).sqrt();
                let delta = 21.0 - 19.6 + 12.0;
                let per_sec = 20.0 * delta * delta / 144.0 * status;
                let expected = (COURSE - 50.0) / 21.0 * per_sec;
                assert!((hp_deficit - expected).abs() < 1e-6);
            }
            HpOutcome::Survived { .. } => panic!("expected death outcome"),
        }
    }

    #[test]
    fn hp_outcome_survived_reports_final_hp() {
        let r = race(frames_from(&[(20.0, 500.0), (20.0, 400.0), (20.0, 310.0)]));
        let outcome = hp_outcome(&r, 0, 800.0, 21.0, 20.0);
        assert_eq!(outcome, HpOutcome::Survived { hp_remaining: 310.0, start_hp: 500.0 });
        assert!(outcome.survived());
    }

    #[test]
    fn zero_hp_at_the_line_still_survives() {
        // Finishing with 0 HP inside the tolerance window is not a death.
        let mut frames = frames_from(&[(20.0, 10.0), (20.0, 5.0), (20.0, 0.0)]);
        frames[2].horses[0].as_mut().unwrap().distance = COURSE - 0.05;
        let r = race(frames);
        assert!(hp_outcome(&r, 0, 800.0, 21.0, 20.0).survived());
    }

    #[test]
    fn full_spurt_requires_valid_spurt_distance() {
        let mut p = profile();
        let ls = last_spurt_target_speed(&p, COURSE);

        assert!(!did_full_spurt(&p, COURSE, ls + 5.0, ls), "unset spurt distance");

        p.last_spurt_start_distance = COURSE * 2.0 / 3.0 + 1.0;
        assert!(did_full_spurt(&p, COURSE, ls + 0.1, ls));
        assert!(did_full_spurt(&p, COURSE, ls - 0.04, ls), "slack covers -0.05");
        assert!(!did_full_spurt(&p, COURSE, ls - 1.0, ls), "never reached target");

        p.last_spurt_start_distance = COURSE * 2.0 / 3.0 + 10.0;
        assert!(!did_full_spurt(&p, COURSE, ls + 5.0, ls), "spurt started too late");
    }

    #[test]
    fn late_start_from_flat_first_frame_pair() {
        let r = race(frames_from(&[(3.0, 1000.0), (3.0, 1000.0), (10.0, 1000.0)]));
        assert!(is_late_start(&r, 0));

        let r = race(frames_from(&[(3.0, 1000.0), (5.0, 1000.0), (10.0, 1000.0)]));
        assert!(!is_late_start(&r, 0));
    }
}
