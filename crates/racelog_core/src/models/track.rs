//! Piecewise-constant track elevation profile.

use serde::{Deserialize, Serialize};

use crate::constants::SLOPE_SCALE;

/// One elevation segment. Positive slope = uphill, negative = downhill,
/// in units of 1/10000 grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSlopeSegment {
    /// Segment start in meters from the gate.
    pub start: f64,
    /// Segment length in meters.
    pub length: f64,
    /// Signed raw slope, scale 1/10000.
    pub slope: i32,
}

impl TrackSlopeSegment {
    #[inline]
    pub fn end(&self) -> f64 {
        self.start + self.length
    }

    #[inline]
    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.start && distance < self.end()
    }

    /// Grade as a fraction (raw slope / 10000).
    #[inline]
    pub fn grade(&self) -> f64 {
        self.slope as f64 / SLOPE_SCALE
    }
}

/// Zero or more slope segments for a course. Distances outside all segments
/// have slope 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlopeProfile {
    segments: Vec<TrackSlopeSegment>,
}

impl SlopeProfile {
    pub fn new(mut segments: Vec<TrackSlopeSegment>) -> Self {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { segments }
    }

    pub fn flat() -> Self {
        Self::default()
    }

    pub fn segment_at(&self, distance: f64) -> Option<&TrackSlopeSegment> {
        self.segments.iter().find(|s| s.contains(distance))
    }

    /// Raw slope at a distance, 0 outside all segments.
    pub fn slope_at(&self, distance: f64) -> i32 {
        self.segment_at(distance).map_or(0, |s| s.slope)
    }
}
