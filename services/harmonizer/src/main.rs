//! Harmonizer command line.
//!
//! ```text
//! harmonizer variables
//! harmonizer check   --variable sss
//! harmonizer prepare --variable s200mavg
//! harmonizer score   --variable sss --prediction a.json --target b.json
//! ```

use anyhow::{Context, Result};
use artifacts::ArtifactFile;
use calibration::MetricKind;
use clap::{Parser, Subcommand};
use harmonizer::{score_files, Harmonizer, HarmonizerConfig};
use ocean_common::{OceanMask, Variable};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "harmonizer")]
#[command(about = "Harmonize CMIP6 and ORAS5 ocean records for bias correction")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "HARMONIZER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported variables
    Variables,

    /// Report missing input files and create output directories
    Check {
        #[arg(short, long)]
        variable: Variable,
    },

    /// Remap, fill, calibrate and normalize every record of a variable
    Prepare {
        #[arg(short, long)]
        variable: Variable,
    },

    /// Masked loss between two filled artifacts
    Score {
        #[arg(short, long)]
        variable: Variable,

        #[arg(long)]
        prediction: PathBuf,

        #[arg(long)]
        target: PathBuf,

        /// mse, mae or rmse (default: from config)
        #[arg(long)]
        metric: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = HarmonizerConfig::resolve(args.config.as_deref())?;
    info!(
        data_dir = %config.data_dir.display(),
        output_dir = %config.output_dir.display(),
        "Loaded configuration"
    );

    match args.command {
        Command::Variables => {
            list_variables();
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { variable } => check(&config, variable),
        Command::Prepare { variable } => prepare(config, variable),
        Command::Score {
            variable,
            prediction,
            target,
            metric,
        } => score(&config, variable, &prediction, &target, metric.as_deref()),
    }
}

fn list_variables() {
    println!("Available variables for bias correction:");
    for (idx, variable) in Variable::ALL.iter().enumerate() {
        println!(
            "{}. {}: {} [{}]",
            idx + 1,
            variable.code(),
            variable.description(),
            variable.units()
        );
    }
}

fn check(config: &HarmonizerConfig, variable: Variable) -> Result<ExitCode> {
    let layout = config.layout();
    for dir in layout.ensure_output_dirs(variable)? {
        println!("Created directory: {}", dir.display());
    }

    let missing = layout.check_availability(
        variable,
        &config.model_sources(),
        config.training_period,
        config.climatology_period,
    );
    if missing.is_empty() {
        println!("All required data files for {} are available", variable.code().to_uppercase());
        return Ok(ExitCode::SUCCESS);
    }

    warn!(variable = %variable, missing = missing.len(), "Missing required data files");
    println!("Missing required data files:");
    for path in &missing {
        println!("  - {}", path.display());
    }
    Ok(ExitCode::FAILURE)
}

fn prepare(config: HarmonizerConfig, variable: Variable) -> Result<ExitCode> {
    let harmonizer = Harmonizer::new(config)?;
    let summary = harmonizer
        .prepare(variable)
        .with_context(|| format!("Failed to prepare {}", variable))?;

    println!("climatology: {}", summary.climatology_path.display());
    println!("reference:   {}", summary.reference_path.display());
    println!("norm params: {}", summary.norm_params_path.display());
    for outcome in &summary.records {
        match &outcome.result {
            Ok(record) => println!(
                "{}: {} ({} cells filled)",
                outcome.source,
                record.normalized_path.display(),
                record.cells_filled
            ),
            Err(e) => println!("{}: FAILED: {:#}", outcome.source, e),
        }
    }

    info!(
        variable = %variable,
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "Preparation finished"
    );
    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(failed = summary.failed(), "Some records failed");
        Ok(ExitCode::FAILURE)
    }
}

fn score(
    config: &HarmonizerConfig,
    variable: Variable,
    prediction: &Path,
    target: &Path,
    metric: Option<&str>,
) -> Result<ExitCode> {
    let metric = match metric {
        Some(name) => MetricKind::from_str(name)
            .with_context(|| format!("Unknown metric '{}', expected mse, mae or rmse", name))?,
        None => config.metric,
    };

    let target_has_mask = ArtifactFile::load(target)
        .map(|file| file.contains(artifacts::MASK_ARRAY))
        .unwrap_or(false);
    let fallback_mask = if target_has_mask {
        None
    } else {
        Some(variable_mask(config, variable)?)
    };

    let report = score_files(prediction, target, fallback_mask.as_ref(), metric)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

/// The variable's `mask1`: the configured mask file, else the climatology artifact.
fn variable_mask(config: &HarmonizerConfig, variable: Variable) -> Result<OceanMask> {
    let path = match &config.mask_file {
        Some(path) => path.clone(),
        None => config
            .layout()
            .climatology_path(variable, config.climatology_period),
    };
    let mask = ArtifactFile::load(&path)
        .and_then(|file| file.mask())
        .with_context(|| format!("Failed to read mask1 for {} from {:?}", variable, path))?;
    Ok(mask)
}
