//! # Target Speed Model
//!
//! Given a horse's stats, strategy, track phase, slope, and contextual
//! flags, computes the `{min, max, base}` expected speed band in m/s.
//!
//! The band is deterministic given identical inputs. In last spurt the
//! model returns a degenerate band (`min == max == base`): last-spurt speed
//! carries no wisdom variance.
//!
//! Callers must guard against non-positive adjusted wisdom before invoking
//! the model; the pipeline treats it as a data-quality fault.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::models::{HorseProfile, StatBlock, StatBonuses, Strategy};

/// Race phase by current distance fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacePhase {
    Early,
    Mid,
    Late,
}

pub fn race_phase(current_distance: f64, course_distance: f64) -> RacePhase {
    if current_distance >= course_distance * LATE_PHASE_START_FRACTION {
        RacePhase::Late
    } else if current_distance >= course_distance * EARLY_PHASE_END_FRACTION {
        RacePhase::Mid
    } else {
        RacePhase::Early
    }
}

/// Position-keep pace mode feeding the mode speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaceMode {
    #[default]
    Normal,
    /// Pace Up / Speed Up share a multiplier.
    PaceUp,
    Overtake,
    PaceDown,
}

impl PaceMode {
    fn multiplier(self) -> f64 {
        match self {
            PaceMode::Normal => 1.0,
            PaceMode::PaceUp => PACE_UP_MULTIPLIER,
            PaceMode::Overtake => OVERTAKE_MULTIPLIER,
            PaceMode::PaceDown => PACE_DOWN_MULTIPLIER,
        }
    }
}

// [Early, Mid, Late] coefficients per running style.
const NIGE_COEFFS: [f64; 3] = [1.0, 0.98, 0.962];
const SENKO_COEFFS: [f64; 3] = [0.978, 0.991, 0.975];
const SASHI_COEFFS: [f64; 3] = [0.938, 0.998, 0.994];
const OIKOMI_COEFFS: [f64; 3] = [0.931, 1.0, 1.0];
const OONIGE_COEFFS: [f64; 3] = [1.063, 0.962, 0.95];

fn strategy_phase_coeffs(strategy: Strategy, is_oonige: bool) -> &'static [f64; 3] {
    if is_oonige {
        return &OONIGE_COEFFS;
    }
    match strategy {
        Strategy::FrontRunner => &NIGE_COEFFS,
        Strategy::PaceChaser => &SENKO_COEFFS,
        Strategy::LateSurger => &SASHI_COEFFS,
        Strategy::EndCloser => &OIKOMI_COEFFS,
    }
}

// Aptitude rank 1 (G) ..= 8 (S).
const APTITUDE_MODIFIERS: [f64; 8] = [0.1, 0.2, 0.4, 0.6, 0.8, 0.9, 1.0, 1.05];

fn aptitude_modifier(rank: u8) -> f64 {
    match rank {
        1..=8 => APTITUDE_MODIFIERS[rank as usize - 1],
        _ => 1.0,
    }
}

// Mood code 1 (awful) ..= 5 (great).
const MOOD_MODIFIERS: [f64; 5] = [0.96, 0.98, 1.0, 1.02, 1.04];

fn mood_modifier(mood: u8) -> f64 {
    match mood {
        1..=5 => MOOD_MODIFIERS[mood as usize - 1],
        _ => 1.0,
    }
}

/// Mood- and bonus-adjusted stat. Excess above the cap is halved before the
/// mood modifier applies.
pub fn adjust_stat(stat: f64, mood: u8, bonus: f64) -> f64 {
    let capped = if stat > STAT_CAP {
        STAT_CAP + (stat - STAT_CAP) / 2.0
    } else {
        stat
    };
    capped * mood_modifier(mood) + bonus
}

/// Course base speed in m/s.
pub fn base_speed(course_distance: f64) -> f64 {
    BASE_SPEED_CONSTANT - (course_distance - BASE_SPEED_COURSE_OFFSET) / BASE_SPEED_COURSE_SCALE
}

/// Distance category 1..=4 (sprint / mile / medium / long).
pub fn distance_category(distance: f64) -> usize {
    if distance <= 1400.0 {
        1
    } else if distance <= 1800.0 {
        2
    } else if distance <= 2400.0 {
        3
    } else {
        4
    }
}

/// Reference HP consumption per second at a given speed.
pub fn reference_hp_consumption(speed: f64, course_distance: f64) -> f64 {
    let delta = (speed - base_speed(course_distance) + HP_CONSUMPTION_SPEED_OFFSET).max(0.0);
    HP_CONSUMPTION_SCALE * delta * delta / HP_CONSUMPTION_DIVISOR
}

/// Downhill Mode speed bonus for a raw slope value.
pub fn downhill_mode_bonus(slope: i32) -> f64 {
    DOWNHILL_BONUS_BASE + (slope as f64).abs() / DOWNHILL_BONUS_DIVISOR
}

/// Inputs to [`compute_target_speed`].
#[derive(Debug, Clone)]
pub struct TargetSpeedParams {
    pub course_distance: f64,
    pub current_distance: f64,
    pub stats: StatBlock,
    pub strategy: Strategy,
    /// Distance-aptitude rank 1..=8.
    pub distance_aptitude: u8,
    /// Mood code 1..=5.
    pub mood: u8,
    pub is_oonige: bool,
    pub in_last_spurt: bool,
    /// Raw slope at the current distance (1/10000 grade).
    pub slope: i32,
    pub passive_bonuses: StatBonuses,
    /// Sum of currently-active skill speed buffs, m/s.
    pub active_speed_buff: f64,
    /// Sum of currently-active speed debuffs, m/s.
    pub active_speed_debuff: f64,
    pub is_dueling: bool,
    pub is_spot_struggle: bool,
    pub is_rushed: bool,
    /// 2 for the boosted rushed variant.
    pub rushed_type: u8,
    pub pace_mode: PaceMode,
    pub in_downhill_mode: bool,
}

impl TargetSpeedParams {
    /// Baseline params for a horse at a point on the course, all contextual
    /// flags off.
    pub fn for_profile(
        profile: &HorseProfile,
        course_distance: f64,
        current_distance: f64,
        slope: i32,
    ) -> Self {
        Self {
            course_distance,
            current_distance,
            stats: profile.stats,
            strategy: profile.strategy,
            distance_aptitude: profile.distance_aptitude,
            mood: profile.mood,
            is_oonige: profile.is_oonige,
            in_last_spurt: profile.in_last_spurt(current_distance),
            slope,
            passive_bonuses: profile.passive_bonuses,
            active_speed_buff: 0.0,
            active_speed_debuff: 0.0,
            is_dueling: false,
            is_spot_struggle: false,
            is_rushed: false,
            rushed_type: 0,
            pace_mode: PaceMode::Normal,
            in_downhill_mode: false,
        }
    }
}

/// Expected speed band, m/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBand {
    pub min: f64,
    pub max: f64,
    pub base: f64,
}

/// Computes the expected speed band for a horse in a given context.
pub fn compute_target_speed(p: &TargetSpeedParams) -> SpeedBand {
    let adj_speed = adjust_stat(p.stats.speed, p.mood, p.passive_bonuses.speed);
    let adj_wisdom = adjust_stat(p.stats.wisdom, p.mood, p.passive_bonuses.wisdom);
    let adj_power = adjust_stat(p.stats.power, p.mood, p.passive_bonuses.power);
    let adj_guts = adjust_stat(p.stats.guts, p.mood, p.passive_bonuses.guts);
    debug_assert!(adj_wisdom > 0.0, "non-positive wisdom must be rejected upstream");

    let base = base_speed(p.course_distance);
    let coeffs = strategy_phase_coeffs(p.strategy, p.is_oonige);
    let phase = race_phase(p.current_distance, p.course_distance);

    let phase_coeff = match phase {
        RacePhase::Early => coeffs[0],
        RacePhase::Mid => coeffs[1],
        RacePhase::Late => coeffs[2],
    };
    let mut target = base * phase_coeff;

    let speed_term = (SPEED_TERM_COEFF * adj_speed).sqrt()
        * aptitude_modifier(p.distance_aptitude)
        * SPEED_TERM_SCALE;

    if phase == RacePhase::Late {
        target += speed_term;
    }
    if p.in_last_spurt {
        let late_base = base * coeffs[2] + speed_term;
        let guts_term = (GUTS_TERM_BASE * adj_guts).powf(GUTS_TERM_EXPONENT) * GUTS_TERM_SCALE;
        target =
            (late_base + LAST_SPURT_BASE_RATIO * base) * LAST_SPURT_MULTIPLIER + speed_term + guts_term;
    }
    if p.slope > 0 {
        let grade = p.slope as f64 / SLOPE_SCALE;
        target -= grade * SLOPE_PENALTY_COEFF / adj_power;
    }

    let mut mode_multiplier = p.pace_mode.multiplier();
    if p.is_rushed && p.rushed_type == 2 {
        mode_multiplier *= RUSHED_BOOST_MULTIPLIER;
    }
    target *= mode_multiplier;

    if p.in_downhill_mode {
        target += downhill_mode_bonus(p.slope);
    }

    target += p.active_speed_buff;
    target -= p.active_speed_debuff;

    if p.is_spot_struggle {
        target +=
            (SPOT_STRUGGLE_GUTS_BASE * adj_guts).powf(SPOT_STRUGGLE_GUTS_EXPONENT) * SPOT_STRUGGLE_GUTS_SCALE;
    }
    if p.is_dueling {
        target += (DUELING_GUTS_BASE * adj_guts).powf(DUELING_GUTS_EXPONENT) * DUELING_GUTS_SCALE;
    }

    // Last-spurt speed is deterministic; no wisdom variance applies.
    if p.in_last_spurt {
        return SpeedBand { min: target, max: target, base: target };
    }

    let max_pct = (adj_wisdom / WISDOM_VARIANCE_DIVISOR) * (adj_wisdom * WISDOM_LOG_SCALE).log10();
    let min_pct = max_pct - WISDOM_MIN_PCT_OFFSET;

    SpeedBand {
        min: target + base * (min_pct / 100.0),
        max: target + base * (max_pct / 100.0),
        base: target,
    }
}

/// Deterministic last-spurt target speed for a horse, evaluated at the
/// finish on flat ground.
pub fn last_spurt_target_speed(profile: &HorseProfile, course_distance: f64) -> f64 {
    let mut params =
        TargetSpeedParams::for_profile(profile, course_distance, course_distance, 0);
    params.in_last_spurt = true;
    compute_target_speed(&params).base
}
