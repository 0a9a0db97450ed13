//! CLI Entry Point for thermo_daq
//!
//! Runs one acquisition session, exports it to CSV and prints a data summary.
//!
//! # Usage
//!
//! ```bash
//! thermo_daq run --duration 40 --threshold 35
//! thermo_daq run --config config/thermo_daq.toml --no-live --output run.csv
//! ```
//!
//! Ctrl-C stops the run early; whatever was acquired is still exported.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thermo_daq::acquisition::{run_for_duration, LiveStatus, RunControl, RunOptions};
use thermo_daq::config::{AppConfig, DEFAULT_CONFIG_PATH};
use thermo_daq::data::CsvExporter;
use thermo_daq::logging;
use thermo_daq::session::Session;
use tracing::{info, warn};

/// Alerts listed in the final summary.
const ALERTS_SHOWN: usize = 5;

#[derive(Parser)]
#[command(name = "thermo_daq")]
#[command(about = "Simulated temperature data acquisition and logging", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire for a fixed duration, then export to CSV
    Run {
        /// Configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Acquisition duration in seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Base temperature in °C
        #[arg(long)]
        base: Option<f64>,

        /// Alert threshold in °C
        #[arg(long)]
        threshold: Option<f64>,

        /// Sampling rate in Hz
        #[arg(long)]
        rate: Option<f64>,

        /// Seed for the simulated sensor
        #[arg(long)]
        seed: Option<u64>,

        /// Log progress every 10 samples instead of a status line per sample
        #[arg(long)]
        no_live: bool,

        /// Export destination (default: generated name in the output directory)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Log output format (pretty, compact, json)
        #[arg(long)]
        log_format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            duration,
            base,
            threshold,
            rate,
            seed,
            no_live,
            output,
            log_format,
        } => {
            let mut app = AppConfig::load_from(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            if let Some(d) = duration {
                app.run.duration_s = d;
            }
            if let Some(b) = base {
                app.acquisition.base_temperature_c = b;
            }
            if let Some(t) = threshold {
                app.acquisition.threshold_c = t;
            }
            if let Some(r) = rate {
                app.acquisition.sampling_rate_hz = r;
            }
            if seed.is_some() {
                app.acquisition.seed = seed;
            }
            if no_live {
                app.run.live_view = false;
            }
            if let Some(f) = log_format {
                app.application.log_format = f;
            }
            app.validate()?;
            logging::init_from_config(&app)?;
            run(app, output).await
        }
    }
}

async fn run(app: AppConfig, output: Option<PathBuf>) -> Result<()> {
    info!(name = %app.application.name, "Temperature data acquisition system");

    let mut session = Session::new(app.acquisition.clone())?;
    let control = RunControl::new();

    let ctrl_c = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Stop requested");
            ctrl_c.stop();
        }
    });

    let options = RunOptions::from_config(&app.run);
    let summary = run_for_duration(&mut session, &options, &control, &mut LiveStatus).await;

    let exporter = CsvExporter::from_config(&app.storage);
    let report = exporter.export(&session, output.as_deref())?;

    println!();
    println!("DATA SUMMARY");
    if let Some(stats) = session.statistics() {
        println!("Mean Temperature: {:.2}°C", stats.mean);
        println!("Std Deviation: {:.2}°C", stats.std_dev);
        println!("Min Temperature: {:.2}°C", stats.min);
        println!("Max Temperature: {:.2}°C", stats.max);
    }
    println!(
        "Data Quality: {}/{} valid samples ({:.1}%)",
        summary.valid, summary.samples, summary.data_quality_percent
    );

    if !session.alerts().is_empty() {
        println!("Alerts Triggered: {}", session.alerts().len());
        for alert in session.alerts().iter().take(ALERTS_SHOWN) {
            println!("  Sample {}: {}", alert.sample_index, alert.message);
        }
    }

    println!("CSV file saved: {}", report.path.display());
    Ok(())
}
