//! Program fold: normalizes, tokenizes and executes every line against one
//! exclusively owned [`MachineState`] and [`Totals`] pair.

use serde::Serialize;

use crate::config::EstimatorConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::gcode::{parse_line, Arguments, Axis, Command, CommandKind};
use crate::machine::{MachineState, Point3};
use crate::motion::{ArcDirection, ArcError, ArcMove, LinearMove, MotionError, MotionProfile};

/// Running sums. Both only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    distance_mm: f64,
    time_minutes: f64,
}

impl Totals {
    pub fn distance(&self) -> f64 {
        self.distance_mm
    }

    pub fn time(&self) -> f64 {
        self.time_minutes
    }

    pub fn formatted(&self) -> String {
        format_duration(self.time_minutes)
    }

    fn add(&mut self, distance: f64, time: f64) {
        self.distance_mm += distance;
        self.time_minutes += time;
    }
}

/// Formats minutes as `HH:MM:SS`, truncating to whole seconds.
///
/// Hours are not wrapped at 24. Negative or non-finite input gives `00:00:00`.
pub fn format_duration(minutes: f64) -> String {
    let total_seconds = if minutes.is_finite() && minutes > 0.0 {
        (minutes * 60.0).floor() as u64
    } else {
        0
    };
    let hours = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Result of one estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateReport {
    pub time_minutes: f64,
    pub distance_mm: f64,
    /// `HH:MM:SS` of `time_minutes`.
    pub formatted: String,
    /// Dwell time seen in the program, whether or not it was counted.
    pub dwell_minutes: f64,
    pub dwell_included: bool,
    /// Every input line, blank and comment lines included.
    pub lines_processed: usize,
    pub moves: usize,
    pub final_position: Point3,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Estimator {
    config: EstimatorConfig,
    profile: MotionProfile,
    state: MachineState,
    totals: Totals,
    dwell_minutes: f64,
    lines: usize,
    moves: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        let profile = config.motion_profile();
        let state = MachineState::with_offset(config.offset());
        Self {
            config,
            profile,
            state,
            totals: Totals::default(),
            dwell_minutes: 0.0,
            lines: 0,
            moves: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Fresh machine state and totals. Required before estimating an
    /// unrelated program with the same estimator.
    pub fn reset(&mut self) {
        self.state = MachineState::with_offset(self.config.offset());
        self.totals = Totals::default();
        self.dwell_minutes = 0.0;
        self.lines = 0;
        self.moves = 0;
        self.diagnostics.clear();
    }

    /// Folds every line of `program` into the current state.
    pub fn run(&mut self, program: &str) {
        for line in program.lines() {
            self.process_line(line);
        }
        tracing::info!(
            "Estimated {} lines: {} ({:.2} mm, {} diagnostics)",
            self.lines,
            self.totals.formatted(),
            self.totals.distance(),
            self.diagnostics.len()
        );
    }

    /// Applies one raw input line. Nothing here can fail the parse.
    pub fn process_line(&mut self, raw: &str) {
        self.lines += 1;
        let line_no = self.lines;
        let parsed = parse_line(raw);
        for token in parsed.malformed {
            self.diagnose(
                line_no,
                DiagnosticKind::MalformedToken { letter: token.letter, text: token.text },
            );
        }
        let command = match (parsed.command, parsed.bare_args) {
            (Some(command), _) => Some(command),
            (None, Some(args)) => self.modal_command(line_no, args),
            (None, None) => None,
        };
        if let Some(command) = command {
            tracing::debug!(line = line_no, kind = ?command.kind, "executing command");
            self.execute(line_no, &command);
        }
    }

    pub fn report(&self) -> EstimateReport {
        EstimateReport {
            time_minutes: self.totals.time(),
            distance_mm: self.totals.distance(),
            formatted: self.totals.formatted(),
            dwell_minutes: self.dwell_minutes,
            dwell_included: self.config.include_dwell,
            lines_processed: self.lines,
            moves: self.moves,
            final_position: self.state.position,
            diagnostics: self.diagnostics.clone(),
        }
    }

    /// A bare axis line runs as the last motion code, if modal motion is on.
    fn modal_command(&self, line_no: usize, args: Arguments) -> Option<Command> {
        if !self.config.modal_motion || args.is_empty() {
            tracing::debug!(line = line_no, "ignoring line without command word");
            return None;
        }
        let kind = self.state.motion_mode?;
        Some(Command::with_args(kind, args))
    }

    fn execute(&mut self, line_no: usize, command: &Command) {
        if command.kind.is_motion() {
            self.state.motion_mode = Some(command.kind);
        }
        match command.kind {
            CommandKind::RapidMove => self.linear(line_no, command, true),
            CommandKind::LinearMove => self.linear(line_no, command, false),
            CommandKind::ArcCW => self.arc(line_no, command, ArcDirection::Clockwise),
            CommandKind::ArcCCW => self.arc(line_no, command, ArcDirection::CounterClockwise),
            CommandKind::Dwell => self.dwell(command),
            CommandKind::Other(code) => tracing::debug!(line = line_no, "ignoring {}", code),
            mode => {
                if let Some(kind) = self.state.apply_mode(mode) {
                    self.diagnose(line_no, kind);
                }
            }
        }
    }

    fn linear(&mut self, line_no: usize, command: &Command, rapid: bool) {
        match LinearMove::plan(&self.state, &command.args, rapid, &self.profile) {
            Ok(mv) => {
                self.totals.add(mv.distance, mv.time);
                self.state.commit_move(mv.target, &command.args);
                self.moves += 1;
            }
            Err(err) => self.reject(line_no, command, err),
        }
    }

    fn arc(&mut self, line_no: usize, command: &Command, direction: ArcDirection) {
        match ArcMove::plan(&self.state, &command.args, direction, &self.profile) {
            Ok(mv) => {
                for _ in &mv.points {
                    self.totals.add(mv.segment_distance, mv.segment_time);
                }
                self.state.commit_move(mv.target, &command.args);
                self.moves += 1;
            }
            Err(err) => self.reject(line_no, command, err),
        }
    }

    /// A rejected move leaves position and totals alone but keeps its F word.
    fn reject(&mut self, line_no: usize, command: &Command, err: MotionError) {
        self.state.commit_feedrate(&command.args);
        let kind = match err {
            MotionError::Arc(ArcError::RadiusTooSmall { radius, chord }) => {
                DiagnosticKind::DegenerateArc { radius, chord }
            }
            MotionError::NonFiniteTarget { .. } => DiagnosticKind::NonFiniteTarget,
        };
        self.diagnose(line_no, kind);
    }

    fn dwell(&mut self, command: &Command) {
        let seconds = command.args.get(Axis::P).unwrap_or(0.0).max(0.0);
        let minutes = seconds / 60.0;
        self.dwell_minutes += minutes;
        if self.config.include_dwell {
            self.totals.add(0.0, minutes);
        }
    }

    fn diagnose(&mut self, line_no: usize, kind: DiagnosticKind) {
        tracing::warn!("line {}: {}", line_no, kind);
        self.diagnostics.push(Diagnostic::new(line_no, kind));
    }
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

/// Estimates a whole program from a fresh state.
pub fn estimate_program(program: &str, config: &EstimatorConfig) -> EstimateReport {
    let mut estimator = Estimator::new(config.clone());
    estimator.run(program);
    estimator.report()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn run(program: &str) -> Estimator {
        let mut estimator = Estimator::default();
        estimator.run(program);
        estimator
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(0.132), "00:00:07");
        assert_eq!(format_duration(1.0), "00:01:00");
        assert_eq!(format_duration(61.5), "01:01:30");
        assert_eq!(format_duration(60.0 * 125.0), "125:00:00");
        assert_eq!(format_duration(-3.0), "00:00:00");
        assert_eq!(format_duration(f64::NAN), "00:00:00");
    }

    #[test]
    fn test_single_feed_move() {
        let est = run("G1 X10 F100");
        assert!((est.totals().distance() - 10.0).abs() < EPS);
        assert!((est.totals().time() - 0.132).abs() < EPS);
        assert_eq!(est.totals().formatted(), "00:00:07");
    }

    #[test]
    fn test_feedrate_carries_between_moves() {
        let est = run("G0 X10 F500\nG1 X20");
        assert_eq!(est.state().feedrate, Some(500.0));
        assert!((est.totals().time() - 20.0 / 500.0 * 1.32).abs() < EPS);
    }

    #[test]
    fn test_inch_mode_diagnostic() {
        let est = run("G20\nG1 X10 F100");
        assert_eq!(est.diagnostics(), &[Diagnostic::new(1, DiagnosticKind::InchUnitsUnsupported)]);
        assert!((est.totals().distance() - 10.0).abs() < EPS);
    }

    #[test]
    fn test_degenerate_arc_skips_move() {
        let est = run("G1 X0 Y0 F100\nG2 X10 Y0 R2\nG1 X5");
        assert_eq!(est.diagnostics().len(), 1);
        assert_eq!(est.diagnostics()[0].line, 2);
        assert!(matches!(est.diagnostics()[0].kind, DiagnosticKind::DegenerateArc { .. }));
        // The arc did not move the machine; the next move starts from the origin.
        assert!((est.totals().distance() - 5.0).abs() < EPS);
        assert_eq!(est.state().position, Point3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_degenerate_arc_keeps_its_feedrate() {
        let est = run("G1 X0 Y0 F100\nG2 X10 Y0 R2 F400\nG1 X5");
        assert_eq!(est.state().feedrate, Some(400.0));
        assert!((est.totals().time() - 5.0 / 400.0 * 1.32).abs() < EPS);
    }

    #[test]
    fn test_motion_mode_tracks_last_motion_code() {
        let est = run("G0 X1\nG4 P1\nM3 S100");
        assert_eq!(est.state().motion_mode, Some(CommandKind::RapidMove));
        let est = run("G0 X1\nG2 X3 I1");
        assert_eq!(est.state().motion_mode, Some(CommandKind::ArcCW));
        assert_eq!(run("G90\nT2").state().motion_mode, None);
    }

    #[test]
    fn test_bare_axis_lines_ignored_by_default() {
        let est = run("G1 F150\nX20 Y10\nX20 Y20");
        assert_eq!(est.totals(), Totals::default());
        assert_eq!(est.state().position, Point3::ORIGIN);
        assert_eq!(est.report().moves, 1);
    }

    #[test]
    fn test_bare_axis_lines_follow_modal_code() {
        let config = EstimatorConfig { modal_motion: true, ..EstimatorConfig::default() };
        let mut est = Estimator::new(config);
        est.run("G1 F150\nX20\nX20 Y10\nG0 Z5\nX0 Y0");
        assert_eq!(est.state().position, Point3::new(0.0, 0.0, 5.0));
        let feed = 30.0 / 150.0 * 1.32;
        let rapid = (5.0 + 500f64.sqrt()) / 150.0 * 1.32;
        assert!((est.totals().distance() - (35.0 + 500f64.sqrt())).abs() < EPS);
        assert!((est.totals().time() - (feed + rapid)).abs() < EPS);
        assert_eq!(est.report().moves, 5);
    }

    #[test]
    fn test_bare_axis_line_before_any_motion_code() {
        let config = EstimatorConfig { modal_motion: true, ..EstimatorConfig::default() };
        let report = estimate_program("X10 Y10\nG21", &config);
        assert_eq!(report.moves, 0);
        assert_eq!(report.final_position, Point3::ORIGIN);
    }

    #[test]
    fn test_dwell_excluded_by_default() {
        let est = run("G4 P30\nG1 X10 F100");
        let report = est.report();
        assert!((report.time_minutes - 0.132).abs() < EPS);
        assert!((report.dwell_minutes - 0.5).abs() < EPS);
        assert!(!report.dwell_included);
    }

    #[test]
    fn test_dwell_included_when_enabled() {
        let config = EstimatorConfig { include_dwell: true, ..EstimatorConfig::default() };
        let report = estimate_program("G4 P30\nG1 X10 F100", &config);
        assert!((report.time_minutes - 0.632).abs() < EPS);
        assert!(report.dwell_included);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut est = run("G91\nG1 X10 F100\nG20");
        est.reset();
        assert_eq!(est.totals(), Totals::default());
        assert_eq!(est.state(), &MachineState::new());
        assert!(est.diagnostics().is_empty());
        assert_eq!(est.report().lines_processed, 0);
    }

    #[test]
    fn test_work_offset_from_config() {
        let config = EstimatorConfig { work_offset: [0.0, 0.0, 5.0], ..EstimatorConfig::default() };
        let report = estimate_program("G1 X3 Y4 Z0 F100", &config);
        assert_eq!(report.final_position, Point3::new(3.0, 4.0, 5.0));
        // From the origin to (3, 4, 5).
        assert!((report.distance_mm - 50f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn test_report_counts() {
        let report = run("; header\n\nG21\nG0 X1\nG1 X2\nM30\n").report();
        assert_eq!(report.lines_processed, 6);
        assert_eq!(report.moves, 2);
    }
}
