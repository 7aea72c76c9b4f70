use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the rust-uploader tool.
///
/// The upload behavior itself is configuration-driven; the CLI only
/// selects the config file and offers a few overrides that are useful
/// when running ad hoc.
#[derive(Parser, Debug)]
#[clap(name = "rust-uploader", about = "Config-driven parallel S3 upload tool")]
pub struct Args {
    /// Path to configuration YAML file
    #[clap(short = 'c', long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Log intended transfers without calling S3
    #[clap(long)]
    pub dry_run: bool,

    /// AWS region override
    #[clap(long)]
    pub region: Option<String>,

    /// AWS profile override
    #[clap(long)]
    pub profile: Option<String>,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a default configuration file
    InitConfig {
        /// Path where the configuration file will be created
        #[clap(default_value = "config.yaml")]
        path: PathBuf,
    },
}
