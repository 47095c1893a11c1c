// gcode-timer: execution time and path length estimates for G-code programs

pub mod config;
pub mod diagnostics;
pub mod estimator;
pub mod file_manager;
pub mod gcode;
pub mod machine;
pub mod motion;

pub use config::{load_config, Config, ConfigError, EstimatorConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use estimator::{estimate_program, format_duration, EstimateReport, Estimator, Totals};
pub use file_manager::{FileError, FileManager};
pub use machine::{MachineState, Point3};
pub use motion::CALIBRATION_FACTOR;
