//! # Physical Constants Table
//!
//! Named coefficients for the race physics model and the heuristic
//! thresholds of the analysis engine. Everything tunable lives here;
//! the rest of the crate never hardcodes these values.
//!
//! Values change only with model recalibration. The heuristic thresholds
//! (mode segmentation, duel early-exit, downhill tie-break) are empirically
//! tuned against recorded replays, not derived analytically.

// --- Base target speed ---
// baseSpeed = BASE_SPEED_CONSTANT - (courseDistance - BASE_SPEED_COURSE_OFFSET) / BASE_SPEED_COURSE_SCALE
pub const BASE_SPEED_CONSTANT: f64 = 20.0;
pub const BASE_SPEED_COURSE_OFFSET: f64 = 2000.0;
pub const BASE_SPEED_COURSE_SCALE: f64 = 1000.0;

/// Stat cap: the excess above this is halved before the mood modifier.
pub const STAT_CAP: f64 = 1200.0;

// Late-phase speed term: sqrt(SPEED_TERM_COEFF * adjustedSpeed) * aptitudeModifier * SPEED_TERM_SCALE
pub const SPEED_TERM_COEFF: f64 = 500.0;
pub const SPEED_TERM_SCALE: f64 = 0.002;

// Last spurt guts term: (GUTS_TERM_BASE * guts)^GUTS_TERM_EXPONENT * GUTS_TERM_SCALE
pub const GUTS_TERM_BASE: f64 = 450.0;
pub const GUTS_TERM_EXPONENT: f64 = 0.597;
pub const GUTS_TERM_SCALE: f64 = 0.0001;

// Last spurt speed: (lateBase + LAST_SPURT_BASE_RATIO * baseSpeed) * LAST_SPURT_MULTIPLIER + speedTerm + gutsTerm
pub const LAST_SPURT_MULTIPLIER: f64 = 1.05;
pub const LAST_SPURT_BASE_RATIO: f64 = 0.01;

// Wisdom target-speed variance band
pub const WISDOM_VARIANCE_DIVISOR: f64 = 5500.0;
pub const WISDOM_LOG_SCALE: f64 = 0.1;
pub const WISDOM_MIN_PCT_OFFSET: f64 = 0.65;

/// Race phase boundaries as fractions of the course distance.
pub const EARLY_PHASE_END_FRACTION: f64 = 0.2;
pub const LATE_PHASE_START_FRACTION: f64 = 2.0 / 3.0;

// --- HP consumption ---
// reference = HP_CONSUMPTION_SCALE * max(0, speed - baseSpeed + HP_CONSUMPTION_SPEED_OFFSET)^2 / HP_CONSUMPTION_DIVISOR
pub const HP_CONSUMPTION_SCALE: f64 = 20.0;
pub const HP_CONSUMPTION_SPEED_OFFSET: f64 = 12.0;
pub const HP_CONSUMPTION_DIVISOR: f64 = 144.0;

// --- Slope ---
/// Raw slope units per grade fraction (slope 10000 = 1.0 grade, i.e. 100%).
pub const SLOPE_SCALE: f64 = 10000.0;
/// Uphill speed penalty: (slope / SLOPE_SCALE * SLOPE_PENALTY_COEFF) / adjustedPower
pub const SLOPE_PENALTY_COEFF: f64 = 200.0;

// Downhill Mode speed bonus: DOWNHILL_BONUS_BASE + |slope| / DOWNHILL_BONUS_DIVISOR
pub const DOWNHILL_BONUS_BASE: f64 = 0.3;
/// Slope -10000 (1% grade) yields a +0.1 m/s bonus.
pub const DOWNHILL_BONUS_DIVISOR: f64 = 100_000.0;

// HP consumption ratios (actual / reference) used to detect Downhill Mode
/// Below this the horse is likely in Downhill Mode (disambiguation applies).
pub const DOWNHILL_HP_RATIO_THRESHOLD: f64 = 0.8;
/// Below this the horse is unambiguously in Downhill Mode.
pub const DOWNHILL_HP_RATIO_STRONG: f64 = 0.5;
/// Downhill + pace down confirmation threshold.
pub const DOWNHILL_HP_RATIO_PACE_DOWN: f64 = 0.3;

// Downhill disambiguation tie-break: "normal" wins over a downhill candidate
// only when it matches clearly and the downhill candidate does not.
pub const DOWNHILL_TIEBREAK_CLEAR: f64 = 0.2;
pub const DOWNHILL_TIEBREAK_MARGIN: f64 = 0.2;

// --- Position keep ---
/// Position keep ends at 10/24 of the course distance.
pub const POSITION_KEEP_END_FRACTION: f64 = 10.0 / 24.0;

// Position keep mode speed multipliers
pub const PACE_UP_MULTIPLIER: f64 = 1.04;
pub const OVERTAKE_MULTIPLIER: f64 = 1.05;
pub const PACE_DOWN_MULTIPLIER: f64 = 0.915;
/// Rushed (Boost) is applied multiplicatively alongside the mode multiplier.
pub const RUSHED_BOOST_MULTIPLIER: f64 = 1.04;

// Position-keep target band behind the leader, in meters, scaled by
// POSITION_KEEP_COURSE_FACTOR_SLOPE * (courseDistance - 1000) + 1.0.
pub const POSITION_KEEP_COURSE_FACTOR_SLOPE: f64 = 0.0008;
pub const POSITION_KEEP_PACE_CHASER_BAND: (f64, f64) = (3.0, 5.0);
pub const POSITION_KEEP_LATE_SURGER_BAND: (f64, f64) = (6.5, 7.0);
pub const POSITION_KEEP_END_CLOSER_BAND: (f64, f64) = (7.5, 8.0);

// --- Mode segmentation thresholds ---
/// Events shorter than this are discarded as sampling blips (seconds).
pub const MIN_EVENT_DURATION: f64 = 0.1;

pub const HIGH_MODE_ENTER_SPEED_RATIO: f64 = 1.02;
pub const HIGH_MODE_ENTER_ACCEL: f64 = 0.2;
pub const HIGH_MODE_EXIT_ACCEL: f64 = -0.2;
pub const HIGH_MODE_EXIT_SPEED_RATIO: f64 = 1.005;

pub const LOW_MODE_ENTER_SPEED_RATIO: f64 = 0.98;
pub const LOW_MODE_ACCEL_CEILING: f64 = 0.2;
/// HP-based pace-down trigger: speed must sit below paceDownTarget * this.
pub const LOW_MODE_HP_SPEED_RATIO: f64 = 1.06;
pub const LOW_MODE_EXIT_ACCEL: f64 = 0.2;
pub const LOW_MODE_EXIT_SPEED_RATIO: f64 = 1.02;
/// Stuck-state safeguard: exit Pace Down whenever speed climbs above
/// paceDownTarget * this, regardless of acceleration.
pub const LOW_MODE_EXIT_SAFEGUARD_RATIO: f64 = 1.06;

// Flat-ground pace-down HP-ratio thresholds per strategy (calibration
// parameters; on a descent DOWNHILL_HP_RATIO_PACE_DOWN applies instead).
pub const PACE_DOWN_HP_RATIO_PACE_CHASER: f64 = 0.88;
pub const PACE_DOWN_HP_RATIO_LATE_SURGER: f64 = 0.92;
pub const PACE_DOWN_HP_RATIO_END_CLOSER: f64 = 0.95;

/// The simpler early-pace-down rule applies during the first seconds of a race.
pub const EARLY_RACE_WINDOW_SECS: f64 = 2.0;

/// Uphill-exit protection: within this many meters of an uphill segment's
/// end, the reference max is widened with the next segment's slope.
pub const UPHILL_EXIT_PROTECTION_WINDOW_M: f64 = 25.0;

/// A horse within this distance of the farthest horse counts as the leader.
pub const LEADER_DISTANCE_EPSILON: f64 = 0.05;

// --- Compete events ---
// Spot Struggle duration: sqrt(SPOT_STRUGGLE_DURATION_GUTS_BASE * guts) * SPOT_STRUGGLE_DURATION_SCALE
pub const SPOT_STRUGGLE_DURATION_GUTS_BASE: f64 = 700.0;
pub const SPOT_STRUGGLE_DURATION_SCALE: f64 = 0.012;
/// Spot Struggle never extends past this fraction of the course distance.
pub const SPOT_STRUGGLE_DISTANCE_FRACTION: f64 = 9.0 / 24.0;

/// A duel ends once HP drops below this fraction of the starting HP.
pub const DUEL_HP_END_FRACTION: f64 = 0.05;
pub const DUEL_EARLY_EXIT_SPEED_GAP: f64 = 0.2;
pub const DUEL_EARLY_EXIT_ACCEL_CEILING: f64 = 0.1;
pub const DUEL_LOOKAHEAD_SPEED_SLACK: f64 = 0.05;

// Guts bonus speed formulas: (BASE * adjustedGuts)^EXPONENT * SCALE
pub const SPOT_STRUGGLE_GUTS_BASE: f64 = 500.0;
pub const SPOT_STRUGGLE_GUTS_EXPONENT: f64 = 0.6;
pub const SPOT_STRUGGLE_GUTS_SCALE: f64 = 0.0001;
pub const DUELING_GUTS_BASE: f64 = 200.0;
pub const DUELING_GUTS_EXPONENT: f64 = 0.708;
pub const DUELING_GUTS_SCALE: f64 = 0.0001;

// --- Skill timing ---
/// Converts a skill's raw base time to a race-proportional duration:
/// (baseTime / SKILL_TIME_SCALE) * (courseDistance / 1000).
pub const SKILL_TIME_SCALE: f64 = 10000.0;
/// Fallback duration (seconds) when a skill carries no base time.
pub const DEFAULT_SKILL_DURATION_SECS: f64 = 2.0;

// --- Outcome estimation ---
/// Frames with a local deceleration below this are skipped in the
/// max-adjusted-speed scan.
pub const DECELERATION_SKIP_THRESHOLD: f64 = -0.05;
/// Frames this close after a dueling window are still skipped.
pub const DUELING_SKIP_LOOKAHEAD_FRAMES: usize = 2;

/// Full spurt: last-spurt start must be within this many meters of the
/// late-phase boundary.
pub const FULL_SPURT_MAX_DELAY_M: f64 = 3.0;
pub const FULL_SPURT_SPEED_SLACK: f64 = 0.05;

/// Deaths within this many meters of the finish line count as finished.
pub const FINISH_TOLERANCE_M: f64 = 0.1;

// HP deficit status modifier: 1 + HP_DEFICIT_GUTS_COEFF / sqrt(HP_DEFICIT_GUTS_BASE * guts)
pub const HP_DEFICIT_GUTS_BASE: f64 = 600.0;
pub const HP_DEFICIT_GUTS_COEFF: f64 = 200.0;
/// Fallback speed for the deficit estimate when nothing better is known.
pub const HP_DEFICIT_FALLBACK_SPEED: f64 = 20.0;

/// First-frame acceleration below this marks a late start.
pub const LATE_START_ACCEL_EPSILON: f64 = 1e-4;

// --- Special ids and modes ---
/// The skill whose activation marks the oonige front-runner variant.
pub const OONIGE_SKILL_ID: u32 = 202051;
/// The temptation mode value carrying the rushed speed boost.
pub const TEMPTATION_MODE_RUSH_BOOST: i8 = 4;
