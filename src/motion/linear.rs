// src/motion/linear.rs - Rapid (G0) and linear (G1) moves
use crate::gcode::{Arguments, Axis};
use crate::machine::{MachineState, Point3};
use super::{checked_distance, MotionError, MotionProfile};

/// A planned straight move. Planning does not touch the machine state.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearMove {
    pub start: Point3,
    pub target: Point3,
    /// XYZ distance in mm; extrusion is excluded.
    pub distance: f64,
    pub feedrate: f64,
    /// Calibrated minutes.
    pub time: f64,
}

impl LinearMove {
    pub fn plan(
        state: &MachineState,
        args: &Arguments,
        rapid: bool,
        profile: &MotionProfile,
    ) -> Result<Self, MotionError> {
        let start = state.position;
        let target = state.resolve_target(args);
        let distance = checked_distance(start, target)?;
        let feedrate = profile.effective_feedrate(args.get(Axis::F), state.feedrate, rapid);
        let time = profile.move_time(distance, feedrate);
        Ok(Self { start, target, distance, feedrate, time })
    }
}
