//! # Mode Segmentation Engine
//!
//! Scans the full frame series once per race and emits labeled,
//! non-overlapping intervals per horse on two independent tracks:
//!
//! - the **position-mode track** (Pace Up / Speed Up / Overtake / Pace
//!   Down), active only before the position-keep end distance;
//! - the **downhill track** (Downhill Mode), evaluated everywhere.
//!
//! Each track is a small tagged-union state machine folded over frame
//! pairs. Hysteresis on the exit conditions keeps noisy, discretely-sampled
//! speed data from oscillating a mode open and closed every frame.

use crate::constants::*;
use crate::models::{EventName, HeuristicEvent, HorseProfile, Strategy};
use crate::skills::SkillCatalog;
use crate::speed::{
    compute_target_speed, downhill_mode_bonus, reference_hp_consumption, PaceMode,
    TargetSpeedParams,
};

use super::{active_speed_buff_at, interval_active, RaceTelemetry};

#[derive(Debug, Clone, Copy, Default)]
enum PositionMode {
    #[default]
    Idle,
    High {
        name: EventName,
        start: f64,
    },
    Low {
        start: f64,
    },
}

/// Per-horse fold state, one per track.
#[derive(Debug, Clone, Copy, Default)]
struct ModeTrackState {
    position: PositionMode,
    downhill_start: Option<f64>,
}

impl ModeTrackState {
    fn close_position(&mut self, time: f64, out: &mut Vec<HeuristicEvent>) {
        let (name, start) = match self.position {
            PositionMode::Idle => return,
            PositionMode::High { name, start } => (name, start),
            PositionMode::Low { start } => (EventName::PaceDown, start),
        };
        self.position = PositionMode::Idle;
        push_if_long_enough(out, start, time, name);
    }

    fn close_downhill(&mut self, time: f64, out: &mut Vec<HeuristicEvent>) {
        if let Some(start) = self.downhill_start.take() {
            push_if_long_enough(out, start, time, EventName::DownhillMode);
        }
    }
}

fn push_if_long_enough(out: &mut Vec<HeuristicEvent>, start: f64, end: f64, name: EventName) {
    let duration = end - start;
    if duration > MIN_EVENT_DURATION {
        out.push(HeuristicEvent { time: start, duration, name });
    }
}

/// The designated pacemaker is exempt from the early-pace-down rule. It
/// exists only when the field has no true front runner: the horse with the
/// most forward strategy, ties broken by gate number.
fn designated_pacemaker(profiles: &[HorseProfile]) -> Option<usize> {
    if profiles.iter().any(|p| p.is_front_runner()) {
        return None;
    }
    profiles
        .iter()
        .enumerate()
        .min_by_key(|(gate, p)| (p.strategy.code(), *gate))
        .map(|(gate, _)| gate)
}

fn pace_down_hp_ratio(strategy: Strategy, slope: i32) -> f64 {
    if slope < 0 {
        return DOWNHILL_HP_RATIO_PACE_DOWN;
    }
    match strategy {
        // Front runners never enter Pace Down; the band lookup filters them.
        Strategy::FrontRunner | Strategy::PaceChaser => PACE_DOWN_HP_RATIO_PACE_CHASER,
        Strategy::LateSurger => PACE_DOWN_HP_RATIO_LATE_SURGER,
        Strategy::EndCloser => PACE_DOWN_HP_RATIO_END_CLOSER,
    }
}

/// Segments behavioral modes for every horse. `compete` holds the already
/// expanded compete intervals per gate; they feed the dueling and struggle
/// flags of the target-speed model.
pub(crate) fn segment_modes(
    race: &RaceTelemetry,
    catalog: &SkillCatalog,
    compete: &[Vec<HeuristicEvent>],
) -> Vec<Vec<HeuristicEvent>> {
    let horses = race.profiles.len();
    let mut events = vec![Vec::new(); horses];
    let mut states = vec![ModeTrackState::default(); horses];

    let position_keep_end = POSITION_KEEP_END_FRACTION * race.course_distance;
    let pacemaker = designated_pacemaker(&race.profiles);

    for pair in race.frames.windows(2) {
        let (frame, next) = (&pair[0], &pair[1]);
        let time = frame.time;
        let dt = next.time - time;
        if dt <= 0.0 {
            continue;
        }
        let leader_distance = frame.leader_distance();

        for gate in 0..horses {
            let (Some(h), Some(h_next)) = (frame.horse(gate), next.horse(gate)) else {
                continue;
            };
            let profile = &race.profiles[gate];
            let state = &mut states[gate];

            let speed = h.speed_mps();
            let accel = (h_next.speed_mps() - speed) / dt;
            let hp_rate = (h.hp - h_next.hp) / dt;
            let slope = race.slopes.slope_at(h.distance);

            let mut params = TargetSpeedParams::for_profile(
                profile,
                race.course_distance,
                h.distance,
                slope,
            );
            params.active_speed_buff =
                active_speed_buff_at(catalog, profile, time, race.course_distance);
            params.is_spot_struggle = interval_active(&compete[gate], time, EventName::SpotStruggle);
            params.is_dueling = interval_active(&compete[gate], time, EventName::Dueling);
            params.is_rushed = h.is_rushed();
            params.rushed_type = h.rushed_type();

            let res = compute_target_speed(&params);

            // --- Downhill track, evaluated at all distances ---
            let expected = reference_hp_consumption(speed, race.course_distance);
            let in_downhill = if slope < 0 && expected > 0.0 && hp_rate > 0.0 {
                let ratio = hp_rate / expected;
                if ratio < DOWNHILL_HP_RATIO_STRONG {
                    true
                } else if ratio < DOWNHILL_HP_RATIO_THRESHOLD {
                    matches_downhill_target(&params, speed)
                } else {
                    false
                }
            } else {
                false
            };
            if in_downhill {
                state.downhill_start.get_or_insert(time);
            } else {
                state.close_downhill(time, &mut events[gate]);
            }

            // --- Position-mode track ---
            if h.distance >= position_keep_end {
                state.close_position(time, &mut events[gate]);
                continue;
            }

            let mut reference_max = res.max;

            // Uphill-exit protection: near the end of an uphill segment the
            // reference is widened to also satisfy the next segment's slope,
            // so legitimate acceleration into flat terrain is not flagged.
            if slope > 0 {
                if let Some(seg) = race.slopes.segment_at(h.distance) {
                    if seg.end() - h.distance < UPHILL_EXIT_PROTECTION_WINDOW_M {
                        let mut ahead = params.clone();
                        ahead.slope = race.slopes.slope_at(seg.end());
                        reference_max = reference_max.max(compute_target_speed(&ahead).max);
                    }
                }
            }

            // While Downhill Mode is open the bonus is part of legitimate
            // speed; fold it into the reference to avoid false Pace Up.
            if state.downhill_start.is_some() {
                reference_max += downhill_mode_bonus(slope);
            }

            let mut pd_params = params.clone();
            pd_params.pace_mode = PaceMode::PaceDown;
            let pace_down_target = compute_target_speed(&pd_params).base;

            let high_trigger = speed > reference_max * HIGH_MODE_ENTER_SPEED_RATIO
                || (speed > reference_max && accel > HIGH_MODE_ENTER_ACCEL);

            match state.position {
                PositionMode::High { .. } => {
                    if accel < HIGH_MODE_EXIT_ACCEL
                        && speed < reference_max * HIGH_MODE_EXIT_SPEED_RATIO
                    {
                        state.close_position(time, &mut events[gate]);
                    }
                }
                PositionMode::Low { .. } => {
                    let exit = (accel > LOW_MODE_EXIT_ACCEL
                        && speed > pace_down_target * LOW_MODE_EXIT_SPEED_RATIO)
                        || speed > pace_down_target * LOW_MODE_EXIT_SAFEGUARD_RATIO;
                    if exit {
                        state.close_position(time, &mut events[gate]);
                    }
                }
                PositionMode::Idle => {
                    if high_trigger {
                        let name = if profile.is_front_runner() {
                            if (h.distance - leader_distance).abs() < LEADER_DISTANCE_EPSILON {
                                EventName::SpeedUp
                            } else {
                                EventName::Overtake
                            }
                        } else {
                            EventName::PaceUp
                        };
                        state.position = PositionMode::High { name, start: time };
                    } else if !profile.is_front_runner()
                        && low_trigger(LowTriggerContext {
                            gate,
                            profile,
                            time,
                            speed,
                            accel,
                            hp_rate,
                            expected,
                            slope,
                            leader_gap: leader_distance - h.distance,
                            min_target: res.min,
                            pace_down_target,
                            course_distance: race.course_distance,
                            pacemaker,
                        })
                    {
                        state.position = PositionMode::Low { start: time };
                    }
                }
            }
        }
    }

    // Force-close everything still open at the final frame.
    let end_time = race.frames.last().map_or(0.0, |f| f.time);
    for (gate, state) in states.iter_mut().enumerate() {
        state.close_position(end_time, &mut events[gate]);
        state.close_downhill(end_time, &mut events[gate]);
    }

    events
}

struct LowTriggerContext<'a> {
    gate: usize,
    profile: &'a HorseProfile,
    time: f64,
    speed: f64,
    accel: f64,
    hp_rate: f64,
    expected: f64,
    slope: i32,
    leader_gap: f64,
    min_target: f64,
    pace_down_target: f64,
    course_distance: f64,
    pacemaker: Option<usize>,
}

fn low_trigger(ctx: LowTriggerContext<'_>) -> bool {
    // Right after the gate, speeds are still far below target for everyone;
    // only the simple rule applies, and the pacemaker is exempt.
    if ctx.time < EARLY_RACE_WINDOW_SECS {
        return ctx.pacemaker != Some(ctx.gate) && ctx.speed < ctx.min_target;
    }

    // Speed trigger.
    if (ctx.speed < ctx.min_target * LOW_MODE_ENTER_SPEED_RATIO
        || (ctx.speed < ctx.min_target && ctx.accel < 0.0))
        && ctx.accel <= LOW_MODE_ACCEL_CEILING
    {
        return true;
    }

    // HP trigger: throttling inside the position-keep band shows up as an
    // HP consumption rate well below the reference for the current speed.
    if let Some((lo, hi)) = ctx.profile.strategy.position_keep_band(ctx.course_distance) {
        if ctx.leader_gap >= lo
            && ctx.leader_gap <= hi
            && ctx.speed < ctx.pace_down_target * LOW_MODE_HP_SPEED_RATIO
            && ctx.expected > 0.0
            && ctx.hp_rate >= 0.0
        {
            let threshold = pace_down_hp_ratio(ctx.profile.strategy, ctx.slope);
            return ctx.hp_rate / ctx.expected < threshold;
        }
    }
    false
}

/// HP-ratio disambiguation for the 0.5..0.8 band: compares actual speed
/// against the three pace-mode targets with and without the downhill bonus
/// and judges Downhill Mode unless a flat target matches clearly better.
fn matches_downhill_target(params: &TargetSpeedParams, speed: f64) -> bool {
    let mut d_flat = f64::INFINITY;
    let mut d_down = f64::INFINITY;
    for mode in [PaceMode::Normal, PaceMode::PaceUp, PaceMode::PaceDown] {
        let mut candidate = params.clone();
        candidate.pace_mode = mode;
        candidate.in_downhill_mode = false;
        d_flat = d_flat.min((speed - compute_target_speed(&candidate).base).abs());
        candidate.in_downhill_mode = true;
        d_down = d_down.min((speed - compute_target_speed(&candidate).base).abs());
    }
    if d_down <= d_flat {
        return true;
    }
    // Flat wins only when it matches clearly and downhill does not come
    // close; otherwise the HP evidence carries the decision.
    !(d_flat < DOWNHILL_TIEBREAK_CLEAR && d_down > d_flat + DOWNHILL_TIEBREAK_MARGIN)
}
