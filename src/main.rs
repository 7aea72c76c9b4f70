use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, Config as LogConfig, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use tokio::runtime::Runtime;

mod cli;
mod cloud;
mod config;
mod constants;
mod models;
mod progress;
mod scanner;
mod uploader;

use cli::{Args, Commands};
use cloud::client::create_s3_client;
use cloud::s3::S3Store;
use config::{Config, LoggingConfig};
use uploader::task_runner::TaskRunner;

fn main() -> Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Handle subcommands
    if let Some(cmd) = &args.command {
        initialize_logging(args.verbose, &LoggingConfig::default())?;
        return handle_subcommand(cmd);
    }

    // Load configuration, apply CLI overrides, then bring up logging with
    // the configured level and optional log file.
    let mut config = Config::from_yaml_file(&args.config)?;
    apply_overrides(&mut config, &args);
    initialize_logging(args.verbose, &config.logging)?;
    config.validate()?;

    info!("Starting S3 upload run ({} tasks)", config.upload_tasks.len());

    let client = create_s3_client(&config.aws)?;
    let store = Arc::new(S3Store::new(client, &config.options));
    let runner = TaskRunner::new(store, &config);

    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
    let (successful, failed) = runtime.block_on(runner.run_all());

    info!(
        "Upload run finished: {} tasks successful, {} failed",
        successful, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Initialize logging with the configured level and optional log file
fn initialize_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        parse_level(&logging.level)
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = &logging.file {
        let file = File::create(path)
            .context(format!("Failed to create log file: {}", path.display()))?;
        loggers.push(WriteLogger::new(level, LogConfig::default(), file));
    }

    CombinedLogger::init(loggers).context("Failed to initialize logger")?;
    Ok(())
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Fold CLI overrides into the loaded configuration
fn apply_overrides(config: &mut Config, args: &Args) {
    if args.dry_run {
        config.options.dry_run = true;
    }
    if args.region.is_some() {
        config.aws.region = args.region.clone();
    }
    if args.profile.is_some() {
        config.aws.profile = args.profile.clone();
    }
}

/// Handle subcommands (init-config)
fn handle_subcommand(cmd: &Commands) -> Result<()> {
    match cmd {
        Commands::InitConfig { path } => {
            info!("Creating default configuration file at {}", path.display());
            Config::create_default_config_file(path)?;
            info!("Configuration created successfully");
            Ok(())
        }
    }
}
