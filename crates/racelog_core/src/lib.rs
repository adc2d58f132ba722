//! # racelog_core
//!
//! Deterministic race telemetry analysis engine for recorded race
//! simulations. From a raw per-frame physics log it reconstructs the
//! semantic events a viewer cares about: pacing up or down, dueling a
//! rival, riding a downhill speed bonus, struggling for position, and
//! whether the final sprint was executed in full.
//!
//! The engine replays and annotates a pre-computed trajectory; it never
//! simulates. All inputs are materialized in memory up front and every
//! derivation is deterministic, so analyses parallelize per race with no
//! shared mutable state.
//!
//! Entry point: build a [`RaceTelemetry`] and a [`SkillCatalog`], then call
//! [`analyze_race`] (or [`analyze_races`] for a batch).

pub mod analysis;
pub mod constants;
pub mod error;
pub mod models;
pub mod skills;
pub mod speed;

pub use analysis::{analyze_race, analyze_races, RaceAnalysis, RaceTelemetry};
pub use error::{AnalysisError, Result};
pub use models::{
    CompeteEvent, CompeteKind, EventName, Frame, HeuristicEvent, HorseFrame, HorseProfile,
    HorseSummary, HpOutcome, SkillActivation, SlopeProfile, StatBlock, StatBonuses, Strategy,
    TrackSlopeSegment,
};
pub use skills::{SkillCatalog, SkillDefinition};
pub use speed::{compute_target_speed, SpeedBand, TargetSpeedParams};

/// Crate version, for embedding in exported analysis payloads.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
