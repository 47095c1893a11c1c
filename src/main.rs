// src/main.rs - Command line estimator
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::task::JoinSet;

use gcode_timer::{estimate_program, load_config, Config, EstimateReport, EstimatorConfig, FileManager};

/// Estimate run time and path length of G-code programs.
#[derive(Debug, Parser)]
#[command(name = "gcode-timer", version, about)]
struct Cli {
    /// G-code files, or directories containing them
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Add G4 dwell time to the estimate
    #[arg(long)]
    include_dwell: bool,

    /// Run bare axis lines with the last G0-G3 code
    #[arg(long)]
    modal_motion: bool,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    #[serde(flatten)]
    report: EstimateReport,
}

fn print_text(report: &FileReport) {
    println!("\n{}", report.file);
    println!("Estimated time: {}", report.report.formatted);
    println!("Total distance: {:.2} mm", report.report.distance_mm);
    println!("Lines processed: {}", report.report.lines_processed);
    if report.report.dwell_minutes > 0.0 && !report.report.dwell_included {
        println!(
            "Dwell not counted: {}",
            gcode_timer::format_duration(report.report.dwell_minutes)
        );
    }
    for diagnostic in &report.report.diagnostics {
        println!("  warning: {}", diagnostic);
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            tracing::info!("Loading configuration from: {}", path);
            load_config(&path).map_err(|e| {
                tracing::error!("Failed to load config from '{}': {}", path, e);
                Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
            })?
        }
        None => Config::default(),
    };
    if cli.include_dwell {
        config.estimator.include_dwell = true;
    }
    if cli.modal_motion {
        config.estimator.modal_motion = true;
    }

    let file_manager = FileManager::new();
    let paths = file_manager.expand_inputs(&cli.files).await?;

    // Each file gets its own estimator on a blocking task.
    let mut tasks = JoinSet::new();
    for (index, path) in paths.iter().cloned().enumerate() {
        let file_manager = file_manager.clone();
        let estimator_config: EstimatorConfig = config.estimator.clone();
        tasks.spawn(async move {
            let program = file_manager.read_gcode_file(&path).await?;
            let report = tokio::task::spawn_blocking(move || estimate_program(&program, &estimator_config))
                .await
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>)?;
            Ok::<_, Box<dyn std::error::Error + Send + Sync + 'static>>((index, report))
        });
    }

    let mut results: Vec<Option<EstimateReport>> = vec![None; paths.len()];
    let mut failed = false;
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok((index, report)) => results[index] = Some(report),
            Err(e) => {
                tracing::error!("{}", e);
                eprintln!("Error: {}", e);
                failed = true;
            }
        }
    }

    let reports: Vec<FileReport> = paths
        .iter()
        .zip(results)
        .filter_map(|(path, report)| {
            report.map(|report| FileReport { file: path.display().to_string(), report })
        })
        .collect();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_text(report);
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
