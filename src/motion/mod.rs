// src/motion/mod.rs - Move timing shared by linear and arc moves
pub mod arc;
pub mod linear;

pub use arc::{ArcDirection, ArcError, ArcMove, ARC_SEGMENTS};
pub use linear::LinearMove;

use thiserror::Error;

use crate::machine::Point3;

/// Multiplier applied to every `distance / feedrate` time. Models the
/// acceleration overhead that a constant-feedrate estimate misses.
pub const CALIBRATION_FACTOR: f64 = 1.32;

/// Feedrate for `G0` when no F word has been seen yet (mm/min).
pub const RAPID_FALLBACK_FEEDRATE: f64 = 1000.0;

/// Feedrate for `G1`/`G2`/`G3` when no F word has been seen yet (mm/min).
pub const FEED_FALLBACK_FEEDRATE: f64 = 100.0;

/// Why a motion command was not executed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    #[error(transparent)]
    Arc(#[from] ArcError),
    #[error("move to {target:?} leaves the representable range")]
    NonFiniteTarget { target: Point3 },
}

/// Straight-line distance of a move, or an error if the target or the
/// distance overflowed.
pub fn checked_distance(start: Point3, target: Point3) -> Result<f64, MotionError> {
    let distance = start.distance_to(&target);
    if target.is_finite() && distance.is_finite() {
        Ok(distance)
    } else {
        Err(MotionError::NonFiniteTarget { target })
    }
}

/// Timing parameters for one estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    pub calibration_factor: f64,
    pub rapid_fallback: f64,
    pub feed_fallback: f64,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            calibration_factor: CALIBRATION_FACTOR,
            rapid_fallback: RAPID_FALLBACK_FEEDRATE,
            feed_fallback: FEED_FALLBACK_FEEDRATE,
        }
    }
}

impl MotionProfile {
    /// Explicit F on this line, else the carried feedrate, else the fallback.
    /// Non-positive values never win.
    pub fn effective_feedrate(&self, explicit: Option<f64>, carried: Option<f64>, rapid: bool) -> f64 {
        explicit
            .filter(|f| *f > 0.0)
            .or(carried.filter(|f| *f > 0.0))
            .unwrap_or(if rapid { self.rapid_fallback } else { self.feed_fallback })
    }

    /// Calibrated time in minutes for `distance` mm at `feedrate` mm/min.
    pub fn move_time(&self, distance: f64, feedrate: f64) -> f64 {
        if distance <= 0.0 {
            return 0.0;
        }
        distance / feedrate * self.calibration_factor
    }
}
