//! Data model: frames, horse profiles, track slopes, analysis events.
//!
//! All entities here are read-only views over an immutable frame log;
//! the engine derives everything fresh per analysis request.

pub mod events;
pub mod frame;
pub mod horse;
pub mod track;

pub use events::{CompeteEvent, CompeteKind, EventName, HeuristicEvent, HorseSummary, HpOutcome};
pub use frame::{Frame, HorseFrame};
pub use horse::{HorseProfile, SkillActivation, StatBlock, StatBonuses, Strategy};
pub use track::{SlopeProfile, TrackSlopeSegment};
