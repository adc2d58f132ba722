//! Per-frame telemetry samples.
//!
//! Frames are produced externally at a near-fixed cadence and are immutable
//! once loaded; the engine only reads them, indexed by sequence position.

use serde::{Deserialize, Serialize};

use crate::constants::TEMPTATION_MODE_RUSH_BOOST;

/// Per-horse per-frame snapshot.
///
/// `speed_raw` is stored x100, exactly as it appears on the wire; consume it
/// through [`HorseFrame::speed_mps`] only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorseFrame {
    /// Distance from the gate in meters. Monotonically non-decreasing along
    /// a horse's own sequence.
    pub distance: f64,
    /// Speed x100 (raw wire value).
    pub speed_raw: u32,
    /// Remaining HP in integer units.
    pub hp: f64,
    /// Temptation (rushed) mode, 0 = none.
    pub temptation_mode: i8,
    /// Index of the blocking horse, -1 if unblocked.
    pub block_front_horse_index: i8,
}

impl HorseFrame {
    /// Speed in m/s. The only sanctioned way to read the speed field.
    #[inline]
    pub fn speed_mps(&self) -> f64 {
        self.speed_raw as f64 / 100.0
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.block_front_horse_index >= 0
    }

    #[inline]
    pub fn is_rushed(&self) -> bool {
        self.temptation_mode > 0
    }

    /// Rushed variant: 2 for the boosted temptation mode, 1 for the rest,
    /// 0 when not rushed.
    pub fn rushed_type(&self) -> u8 {
        if self.temptation_mode == TEMPTATION_MODE_RUSH_BOOST {
            2
        } else if self.temptation_mode > 0 {
            1
        } else {
            0
        }
    }
}

/// A timestamped sample containing one slot per competing horse.
///
/// A `None` slot marks a missing per-horse sample; scans skip it rather than
/// aborting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Elapsed race time in seconds.
    pub time: f64,
    pub horses: Vec<Option<HorseFrame>>,
}

impl Frame {
    pub fn horse(&self, idx: usize) -> Option<&HorseFrame> {
        self.horses.get(idx).and_then(|h| h.as_ref())
    }

    /// Distance of the farthest horse in this frame.
    pub fn leader_distance(&self) -> f64 {
        self.horses
            .iter()
            .flatten()
            .map(|h| h.distance)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_horse(distance: f64, speed_raw: u32) -> HorseFrame {
        HorseFrame {
            distance,
            speed_raw,
            hp: 1000.0,
            temptation_mode: 0,
            block_front_horse_index: -1,
        }
    }

    #[test]
    fn speed_is_divided_by_100_before_use() {
        // The wire stores speed x100; the accessor must undo that.
        let h = make_horse(0.0, 1734);
        assert!((h.speed_mps() - 17.34).abs() < 1e-9);
        assert!(h.speed_mps() < 100.0, "raw x100 value leaked through");
    }

    #[test]
    fn rushed_type_variants() {
        let mut h = make_horse(0.0, 1500);
        assert_eq!(h.rushed_type(), 0);
        h.temptation_mode = 1;
        assert_eq!(h.rushed_type(), 1);
        h.temptation_mode = TEMPTATION_MODE_RUSH_BOOST;
        assert_eq!(h.rushed_type(), 2);
    }

    #[test]
    fn leader_distance_skips_missing_samples() {
        let frame = Frame {
            time: 1.0,
            horses: vec![Some(make_horse(120.0, 1500)), None, Some(make_horse(131.5, 1600))],
        };
        assert!((frame.leader_distance() - 131.5).abs() < 1e-9);
        assert!(frame.horse(1).is_none());
        assert!(frame.horse(2).is_some());
    }

    #[test]
    fn blocked_flag() {
        let mut h = make_horse(0.0, 1500);
        assert!(!h.is_blocked());
        h.block_front_horse_index = 3;
        assert!(h.is_blocked());
    }
}
