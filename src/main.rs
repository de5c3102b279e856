//! Pose Windows CLI
//!
//! Builds windowed pose datasets from a directory of tracked videos.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pose_windows::{BuildReport, Config, DataType, JsonPoseSource, PoseDataModule, Stage, VERSION};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pose-windows")]
#[command(version = VERSION)]
#[command(about = "Windowed pose-sequence datasets for anomaly detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that build datasets.
#[derive(Args)]
struct BuildArgs {
    /// Directory whose subdirectories each hold one video's pose data
    #[arg(long, short)]
    data_dir: PathBuf,

    /// Config file (defaults to the user config location)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Processing stage (train, test or inference)
    #[arg(long, default_value = "inference")]
    stage: String,

    /// Keypoint representation (global, local or both); overrides the config
    #[arg(long)]
    data_type: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build datasets and print a summary
    Build {
        #[command(flatten)]
        args: BuildArgs,

        /// Write the build report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print one window as JSON
    Inspect {
        #[command(flatten)]
        args: BuildArgs,

        /// Dataset index (per directory for test/inference)
        #[arg(long, default_value = "0")]
        dataset: usize,

        /// Window index within the dataset
        #[arg(long, short)]
        index: usize,
    },

    /// Show configuration
    Config {
        /// Config file (defaults to the user config location)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Write the effective configuration back to the config file
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { args, report } => cmd_build(&args, report.as_deref()),
        Commands::Inspect {
            args,
            dataset,
            index,
        } => cmd_inspect(&args, dataset, index),
        Commands::Config { config, save } => cmd_config(config.as_deref(), save),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

fn build_module(args: &BuildArgs) -> Result<PoseDataModule> {
    let stage: Stage = args.stage.parse()?;
    let mut config = load_config(args.config.as_deref())?;
    if let Some(data_type) = &args.data_type {
        config.data_type = data_type.parse::<DataType>()?;
    }

    info!(
        data_dir = %args.data_dir.display(),
        stage = %stage,
        data_type = %config.data_type,
        seq_len = config.dataset.seq_len,
        "building datasets"
    );

    let source = JsonPoseSource::new();
    PoseDataModule::from_data_root(&args.data_dir, &source, config, stage)
        .with_context(|| format!("failed to build datasets from {:?}", args.data_dir))
}

fn cmd_build(args: &BuildArgs, report_path: Option<&Path>) -> Result<()> {
    println!("Pose Windows v{VERSION}");
    println!();

    let module = build_module(args)?;
    let report = BuildReport::from_module(&module);

    println!("{}", report.summary());

    if let Some(path) = report_path {
        report
            .save(path)
            .with_context(|| format!("failed to write report to {path:?}"))?;
        println!("Report written to {path:?}");
    }
    Ok(())
}

fn cmd_inspect(args: &BuildArgs, dataset: usize, index: usize) -> Result<()> {
    let module = build_module(args)?;
    let ds = module.datasets().get(dataset).with_context(|| {
        format!(
            "dataset {dataset} does not exist ({} built)",
            module.datasets().len()
        )
    })?;
    let sample = ds.get(index)?;

    let json = serde_json::json!({
        "source": ds.source(),
        "frame_num": sample.frame_num,
        "track_id": sample.track_id,
        "shape": sample.feature.shape(),
        "feature": sample.feature.iter().copied().collect::<Vec<f32>>(),
        "mask": sample.mask.iter().copied().collect::<Vec<f32>>(),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn cmd_config(path: Option<&Path>, save: bool) -> Result<()> {
    let config = load_config(path)?;
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(Config::config_path);

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {config_path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    if save {
        config.save_to(&config_path)?;
        println!();
        println!("Saved to {config_path:?}");
    }
    Ok(())
}
