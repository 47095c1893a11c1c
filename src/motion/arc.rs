//! Circular interpolation (`G2` / `G3`).
//!
//! The center comes either from an `R` word or from `I`/`J`/`K` offsets,
//! which are always taken relative to the arc start regardless of the
//! `G90.1`/`G91.1` mode. The arc is split into [`ARC_SEGMENTS`] points; every
//! segment is charged the straight start-to-end distance divided by the
//! segment count, not the true arc length.

use std::f64::consts::TAU;
use thiserror::Error;

use crate::gcode::{Arguments, Axis};
use crate::machine::{MachineState, Point3};
use super::{checked_distance, MotionError, MotionProfile};

/// Fixed number of segments per arc, independent of sweep or length.
pub const ARC_SEGMENTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcDirection {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArcError {
    #[error("arc radius {radius} cannot span a chord of {chord}")]
    RadiusTooSmall { radius: f64, chord: f64 },
}

/// Center of an R-format arc in the XY plane.
///
/// The center sits on the perpendicular bisector of the chord; clockwise arcs
/// take the right-hand side. A zero-length chord yields the start point.
pub fn center_from_radius(
    start: Point3,
    end: Point3,
    radius: f64,
    direction: ArcDirection,
) -> Result<Point3, ArcError> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let chord = (dx * dx + dy * dy).sqrt();
    if chord == 0.0 {
        return Ok(start);
    }

    let half_chord = chord / 2.0;
    if radius * radius < half_chord * half_chord {
        return Err(ArcError::RadiusTooSmall { radius, chord });
    }

    let mid_x = (start.x + end.x) / 2.0;
    let mid_y = (start.y + end.y) / 2.0;
    let mut offset = (radius * radius - half_chord * half_chord).sqrt();
    if direction == ArcDirection::Clockwise {
        offset = -offset;
    }
    Ok(Point3::new(
        mid_x + offset * (-dy / chord),
        mid_y + offset * (dx / chord),
        start.z,
    ))
}

/// Center of an I/J/K arc: offsets (default 0) added to the start point.
pub fn center_from_offsets(start: Point3, args: &Arguments) -> Point3 {
    start
        + Point3::new(
            args.get(Axis::I).unwrap_or(0.0),
            args.get(Axis::J).unwrap_or(0.0),
            args.get(Axis::K).unwrap_or(0.0),
        )
}

/// R takes precedence over I/J/K when both are present.
pub fn resolve_center(
    start: Point3,
    end: Point3,
    args: &Arguments,
    direction: ArcDirection,
) -> Result<Point3, ArcError> {
    match args.get(Axis::R) {
        Some(radius) => center_from_radius(start, end, radius, direction),
        None => Ok(center_from_offsets(start, args)),
    }
}

/// Start angle and signed sweep (radians) about `center`.
///
/// Clockwise sweeps are negative, counterclockwise positive; coincident
/// start and end angles make a full turn.
pub fn sweep(start: Point3, end: Point3, center: Point3, direction: ArcDirection) -> (f64, f64) {
    let start_angle = (start.y - center.y).atan2(start.x - center.x);
    let mut end_angle = (end.y - center.y).atan2(end.x - center.x);
    match direction {
        ArcDirection::Clockwise => {
            if end_angle >= start_angle {
                end_angle -= TAU;
            }
        }
        ArcDirection::CounterClockwise => {
            if end_angle <= start_angle {
                end_angle += TAU;
            }
        }
    }
    (start_angle, end_angle - start_angle)
}

/// The [`ARC_SEGMENTS`] segment end points, with Z interpolated linearly.
pub fn arc_points(start: Point3, end: Point3, center: Point3, direction: ArcDirection) -> Vec<Point3> {
    let (start_angle, total) = sweep(start, end, center, direction);
    let radius = (start.x - center.x).hypot(start.y - center.y);
    let step = total / ARC_SEGMENTS as f64;
    (1..=ARC_SEGMENTS)
        .map(|i| {
            let angle = start_angle + i as f64 * step;
            let t = i as f64 / ARC_SEGMENTS as f64;
            Point3::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
                start.z + (end.z - start.z) * t,
            )
        })
        .collect()
}

/// A planned arc. Planning does not touch the machine state.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcMove {
    pub start: Point3,
    pub target: Point3,
    pub center: Point3,
    pub direction: ArcDirection,
    pub points: Vec<Point3>,
    /// Chord distance / [`ARC_SEGMENTS`], charged once per segment.
    pub segment_distance: f64,
    pub segment_time: f64,
    pub feedrate: f64,
}

impl ArcMove {
    pub fn plan(
        state: &MachineState,
        args: &Arguments,
        direction: ArcDirection,
        profile: &MotionProfile,
    ) -> Result<Self, MotionError> {
        let start = state.position;
        let target = state.resolve_target(args);
        let chord = checked_distance(start, target)?;
        let center = resolve_center(start, target, args, direction)?;
        let points = arc_points(start, target, center, direction);

        let segment_distance = chord / ARC_SEGMENTS as f64;
        let feedrate = profile.effective_feedrate(args.get(Axis::F), state.feedrate, false);
        let segment_time = profile.move_time(segment_distance, feedrate);

        tracing::trace!(?center, segments = points.len(), "planned arc");
        Ok(Self {
            start,
            target,
            center,
            direction,
            points,
            segment_distance,
            segment_time,
            feedrate,
        })
    }

    /// Total distance charged for the arc.
    pub fn distance(&self) -> f64 {
        self.segment_distance * self.points.len() as f64
    }

    pub fn time(&self) -> f64 {
        self.segment_time * self.points.len() as f64
    }
}
