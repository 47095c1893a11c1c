// src/machine.rs - Simulated machine state and mode handling
use serde::Serialize;
use std::ops::{Add, Sub};

use crate::diagnostics::DiagnosticKind;
use crate::gcode::{Arguments, Axis, CommandKind};

/// A point or vector in machine space (millimeters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance_to(&self, other: &Point3) -> f64 {
        (*other - *self).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Point3 {
    type Output = Point3;
    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// How X/Y/Z/E words are interpreted (`G90` / `G91`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositioningMode {
    Absolute,
    Relative,
}

/// Arc-offset mode (`G90.1` / `G91.1`).
///
/// Tracked for bookkeeping only: I/J/K are always resolved relative to the
/// arc start point, whichever mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcOffsetMode {
    Absolute,
    Relative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineState {
    pub position: Point3,
    /// Extrusion axis. Tracked, never timed.
    pub extrusion: f64,
    /// `None` until the first F word on a motion line.
    pub feedrate: Option<f64>,
    pub spindle_speed: f64,
    pub tool: Option<u32>,
    pub positioning: PositioningMode,
    pub arc_offset_mode: ArcOffsetMode,
    /// Work offset added to absolute targets.
    pub offset: Point3,
    /// Last motion code seen (`G0`..`G3`).
    #[serde(skip)]
    pub motion_mode: Option<CommandKind>,
}

impl MachineState {
    pub fn new() -> Self {
        Self::with_offset(Point3::ORIGIN)
    }

    pub fn with_offset(offset: Point3) -> Self {
        Self {
            position: Point3::ORIGIN,
            extrusion: 0.0,
            feedrate: None,
            spindle_speed: 0.0,
            tool: None,
            positioning: PositioningMode::Absolute,
            arc_offset_mode: ArcOffsetMode::Relative,
            offset,
            motion_mode: None,
        }
    }

    /// Applies a mode command. Returns a diagnostic for requests that are
    /// accepted but not honoured. Non-mode kinds are ignored.
    pub fn apply_mode(&mut self, kind: CommandKind) -> Option<DiagnosticKind> {
        match kind {
            CommandKind::SetAbsolute => self.positioning = PositioningMode::Absolute,
            CommandKind::SetRelative => self.positioning = PositioningMode::Relative,
            CommandKind::SetArcOffsetAbsolute => self.arc_offset_mode = ArcOffsetMode::Absolute,
            CommandKind::SetArcOffsetRelative => self.arc_offset_mode = ArcOffsetMode::Relative,
            CommandKind::SetUnitsInch => return Some(DiagnosticKind::InchUnitsUnsupported),
            CommandKind::SetUnitsMM => {}
            CommandKind::ToolSelect(tool) => self.tool = Some(tool),
            _ => {}
        }
        None
    }

    /// Target of a move in the current positioning mode.
    ///
    /// Absolute: word + offset, omitted axes stay put. Relative: current +
    /// word, the offset is already part of the current position.
    pub fn resolve_target(&self, args: &Arguments) -> Point3 {
        let resolve = |current: f64, axis: Axis, offset: f64| match (self.positioning, args.get(axis)) {
            (_, None) => current,
            (PositioningMode::Absolute, Some(value)) => value + offset,
            (PositioningMode::Relative, Some(delta)) => current + delta,
        };
        Point3::new(
            resolve(self.position.x, Axis::X, self.offset.x),
            resolve(self.position.y, Axis::Y, self.offset.y),
            resolve(self.position.z, Axis::Z, self.offset.z),
        )
    }

    /// Commits a completed motion command: position, extrusion, spindle and
    /// any explicit feedrate.
    pub fn commit_move(&mut self, target: Point3, args: &Arguments) {
        self.position = target;
        self.commit_feedrate(args);
        if let Some(e) = args.get(Axis::E) {
            self.extrusion = match self.positioning {
                PositioningMode::Absolute => e,
                PositioningMode::Relative => self.extrusion + e,
            };
        }
        if let Some(s) = args.get(Axis::S) {
            self.spindle_speed = s;
        }
    }

    /// Stores a positive F word. Also used for rejected moves.
    pub fn commit_feedrate(&mut self, args: &Arguments) {
        if let Some(feedrate) = args.get(Axis::F).filter(|f| *f > 0.0) {
            self.feedrate = Some(feedrate);
        }
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(Axis, f64)]) -> Arguments {
        let mut args = Arguments::new();
        for (axis, value) in pairs {
            args.set(*axis, *value);
        }
        args
    }

    #[test]
    fn test_default_state() {
        let state = MachineState::new();
        assert_eq!(state.position, Point3::ORIGIN);
        assert_eq!(state.feedrate, None);
        assert_eq!(state.tool, None);
        assert_eq!(state.positioning, PositioningMode::Absolute);
        assert_eq!(state.arc_offset_mode, ArcOffsetMode::Relative);
    }

    #[test]
    fn test_states_do_not_share_offsets() {
        let mut a = MachineState::new();
        let b = MachineState::new();
        a.offset.x = 5.0;
        assert_eq!(b.offset, Point3::ORIGIN);
    }

    #[test]
    fn test_absolute_target_applies_offset() {
        let state = MachineState::with_offset(Point3::new(1.0, 2.0, 3.0));
        let target = state.resolve_target(&args(&[(Axis::X, 10.0)]));
        assert_eq!(target, Point3::new(11.0, 0.0, 0.0));
    }

    #[test]
    fn test_relative_target_does_not_reapply_offset() {
        let mut state = MachineState::with_offset(Point3::new(1.0, 0.0, 0.0));
        state.apply_mode(CommandKind::SetRelative);
        state.position = Point3::new(4.0, 0.0, 0.0);
        let target = state.resolve_target(&args(&[(Axis::X, 5.0)]));
        assert_eq!(target.x, 9.0);
    }

    #[test]
    fn test_mode_toggles() {
        let mut state = MachineState::new();
        assert_eq!(state.apply_mode(CommandKind::SetRelative), None);
        assert_eq!(state.positioning, PositioningMode::Relative);
        state.apply_mode(CommandKind::SetAbsolute);
        assert_eq!(state.positioning, PositioningMode::Absolute);
        state.apply_mode(CommandKind::SetArcOffsetAbsolute);
        assert_eq!(state.arc_offset_mode, ArcOffsetMode::Absolute);
        state.apply_mode(CommandKind::SetArcOffsetRelative);
        assert_eq!(state.arc_offset_mode, ArcOffsetMode::Relative);
    }

    #[test]
    fn test_inch_mode_is_diagnosed_not_converted() {
        let mut state = MachineState::new();
        let before = state.clone();
        assert_eq!(state.apply_mode(CommandKind::SetUnitsInch), Some(DiagnosticKind::InchUnitsUnsupported));
        assert_eq!(state.apply_mode(CommandKind::SetUnitsMM), None);
        assert_eq!(state, before);
    }

    #[test]
    fn test_commit_tracks_extrusion_and_spindle() {
        let mut state = MachineState::new();
        state.commit_move(Point3::new(1.0, 0.0, 0.0), &args(&[(Axis::E, 2.0), (Axis::S, 12000.0), (Axis::F, 300.0)]));
        assert_eq!(state.extrusion, 2.0);
        assert_eq!(state.spindle_speed, 12000.0);
        assert_eq!(state.feedrate, Some(300.0));

        state.apply_mode(CommandKind::SetRelative);
        state.commit_move(Point3::new(2.0, 0.0, 0.0), &args(&[(Axis::E, 0.5), (Axis::F, 0.0)]));
        assert_eq!(state.extrusion, 2.5);
        // A non-positive F never replaces an established feedrate.
        assert_eq!(state.feedrate, Some(300.0));
    }

    #[test]
    fn test_commit_feedrate_only() {
        let mut state = MachineState::new();
        state.commit_feedrate(&args(&[(Axis::X, 50.0), (Axis::F, 250.0)]));
        assert_eq!(state.feedrate, Some(250.0));
        assert_eq!(state.position, Point3::ORIGIN);
    }

    #[test]
    fn test_tool_select_is_bookkeeping() {
        let mut state = MachineState::new();
        state.apply_mode(CommandKind::ToolSelect(3));
        assert_eq!(state.tool, Some(3));
    }
}
