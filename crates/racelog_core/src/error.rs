use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("frame log too short: {frames} frames (need at least 2)")]
    EmptyFrameLog { frames: usize },

    #[error("invalid course distance: {distance}")]
    InvalidCourse { distance: f64 },

    #[error("horse count mismatch: {profiles} profiles, {frame_width} per-frame slots")]
    HorseCountMismatch { profiles: usize, frame_width: usize },

    #[error("data integrity fault for horse {gate}: {reason}")]
    DataIntegrity { gate: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
