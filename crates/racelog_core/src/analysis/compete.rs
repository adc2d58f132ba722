//! # Compete Duration Estimator
//!
//! The upstream simulation emits Dueling and Spot Struggle triggers as
//! single timestamps; the effect's true end is only observable indirectly
//! through speed decay once the boost is withdrawn. This module expands each
//! trigger into a `[time, time + duration)` interval by scanning forward
//! through the frame log.

use crate::constants::*;
use crate::models::{CompeteKind, EventName, HeuristicEvent};
use crate::speed::{compute_target_speed, downhill_mode_bonus, TargetSpeedParams};
use crate::skills::SkillCatalog;

use super::{active_speed_buff_at, RaceTelemetry};

/// Expands every compete trigger into a duration interval, grouped by gate.
/// Expanded intervals obey the same blip filter as every other emitted
/// event: anything at or below `MIN_EVENT_DURATION` is dropped, including
/// duels cut at their triggering frame by the early exit.
pub(crate) fn expand_compete_events(
    race: &RaceTelemetry,
    catalog: &SkillCatalog,
) -> Vec<Vec<HeuristicEvent>> {
    let mut events = vec![Vec::new(); race.profiles.len()];
    for trigger in &race.compete_events {
        if trigger.horse >= race.profiles.len() {
            log::warn!("compete trigger for unknown gate {}", trigger.horse);
            continue;
        }
        let expanded = match trigger.kind {
            CompeteKind::SpotStruggle => spot_struggle_event(race, trigger.horse, trigger.time),
            CompeteKind::Dueling => dueling_event(race, catalog, trigger.horse, trigger.time),
        };
        if let Some(event) = expanded {
            if event.duration > MIN_EVENT_DURATION {
                events[trigger.horse].push(event);
            }
        }
    }
    events
}

/// Spot Struggle lasts `sqrt(700 * guts) * 0.012` seconds but never past the
/// point the horse crosses 9/24 of the course. A trigger at or after that
/// crossing yields no event.
fn spot_struggle_event(race: &RaceTelemetry, gate: usize, start: f64) -> Option<HeuristicEvent> {
    let guts = race.profiles[gate].stats.guts;
    let guts_duration =
        (SPOT_STRUGGLE_DURATION_GUTS_BASE * guts).sqrt() * SPOT_STRUGGLE_DURATION_SCALE;

    let threshold = SPOT_STRUGGLE_DISTANCE_FRACTION * race.course_distance;
    let threshold_time = race
        .frames
        .iter()
        .find(|f| f.horse(gate).is_some_and(|h| h.distance >= threshold))
        .map(|f| f.time)
        .unwrap_or_else(|| race.frames.last().map_or(0.0, |f| f.time));

    if start >= threshold_time {
        return None;
    }
    Some(HeuristicEvent {
        time: start,
        duration: guts_duration.min(threshold_time - start),
        name: EventName::SpotStruggle,
    })
}

/// A duel runs from its trigger until HP first drops below 5% of starting
/// HP, unless an early exit is detected first: the horse falls measurably
/// short of its dueling target while no longer accelerating, and a forward
/// lookahead confirms its speed never recovers to the non-dueling target.
fn dueling_event(
    race: &RaceTelemetry,
    catalog: &SkillCatalog,
    gate: usize,
    start: f64,
) -> Option<HeuristicEvent> {
    let last = race.frames.len() - 1;
    let start_hp = race.frames[0].horse(gate).map_or(0.0, |h| h.hp);
    let hp_threshold = start_hp * DUEL_HP_END_FRACTION;

    let start_index = race
        .frames
        .iter()
        .position(|f| f.time >= start)
        .unwrap_or(last);
    let hp_end_index = (start_index..race.frames.len())
        .find(|&i| race.frames[i].horse(gate).is_some_and(|h| h.hp < hp_threshold))
        .unwrap_or(last);

    let mut end_time = race.frames[hp_end_index].time;

    for i in start_index..hp_end_index {
        let Some(h) = race.frames[i].horse(gate) else { continue };
        let time = race.frames[i].time;
        let speed = h.speed_mps();

        let slope = race.slopes.slope_at(h.distance);
        let uphill_next = race.frames.get(i + 1).is_some_and(|f| {
            f.horse(gate).is_some_and(|n| race.slopes.slope_at(n.distance) > 0)
        });
        if slope > 0 || uphill_next {
            continue;
        }

        let target = target_at(race, catalog, gate, i, true);
        if target <= speed + DUEL_EARLY_EXIT_SPEED_GAP {
            continue;
        }
        if forward_accel(race, gate, i) >= DUEL_EARLY_EXIT_ACCEL_CEILING {
            continue;
        }
        if confirm_early_exit(race, catalog, gate, i, hp_end_index) {
            end_time = time;
            break;
        }
    }

    Some(HeuristicEvent {
        time: start,
        duration: (end_time - start).max(0.0),
        name: EventName::Dueling,
    })
}

/// The early exit holds only if the horse's actual speed never climbs back
/// above the non-dueling target (plus any downhill bonus and a small slack)
/// before the duel would otherwise end.
fn confirm_early_exit(
    race: &RaceTelemetry,
    catalog: &SkillCatalog,
    gate: usize,
    from: usize,
    until: usize,
) -> bool {
    for j in from..=until {
        let Some(h) = race.frames[j].horse(gate) else { continue };
        let slope = race.slopes.slope_at(h.distance);
        let mut allowed = target_at(race, catalog, gate, j, false) + DUEL_LOOKAHEAD_SPEED_SLACK;
        if slope < 0 {
            allowed += downhill_mode_bonus(slope);
        }
        if h.speed_mps() > allowed {
            return false;
        }
    }
    true
}

/// Base target speed for a horse at a given frame index.
fn target_at(
    race: &RaceTelemetry,
    catalog: &SkillCatalog,
    gate: usize,
    index: usize,
    is_dueling: bool,
) -> f64 {
    let profile = &race.profiles[gate];
    let frame = &race.frames[index];
    // The caller guarantees the sample exists at `index`.
    let Some(h) = frame.horse(gate) else { return 0.0 };

    let slope = race.slopes.slope_at(h.distance);
    let mut params =
        TargetSpeedParams::for_profile(profile, race.course_distance, h.distance, slope);
    params.active_speed_buff = active_speed_buff_at(catalog, profile, frame.time, race.course_distance);
    params.is_dueling = is_dueling;
    compute_target_speed(&params).base
}

fn forward_accel(race: &RaceTelemetry, gate: usize, index: usize) -> f64 {
    let Some(next) = race.frames.get(index + 1) else { return 0.0 };
    let (Some(h), Some(n)) = (race.frames[index].horse(gate), next.horse(gate)) else {
        return 0.0;
    };
    let dt = next.time - race.frames[index].time;
    if dt <= 0.0 {
        return 0.0;
    }
    (n.speed_mps() - h.speed_mps()) / dt
}
