//! # rust-uploader
//!
//! A configuration-driven, parallel S3 upload tool written in Rust.
//!
//! ## Overview
//!
//! rust-uploader reads an ordered list of upload tasks from a YAML file and
//! transfers the named files and directory trees to Amazon S3. Directory
//! tasks fan out to a bounded pool of concurrent workers, transient
//! failures are retried with exponential backoff, and per-file progress is
//! tracked while transfers are in flight.
//!
//! ## Features
//!
//! - **Task-based configuration**: declare sources, buckets, and keys in YAML
//! - **Parallel uploads**: bounded worker pool per directory task
//! - **Retry with backoff**: transient S3 failures retry up to a cap
//! - **Progress tracking**: per-file byte counters, throughput, and ETA
//! - **Exclusion rules**: shell-glob patterns prune files and whole subtrees
//! - **Multipart uploads**: large files transfer in concurrent parts
//! - **Credential flexibility**: default chain, named profile, or assumed role
//! - **Dry-run mode**: log intended transfers without touching the network
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use rust_uploader::cloud::{client::create_s3_client, s3::S3Store};
//! use rust_uploader::config::Config;
//! use rust_uploader::uploader::task_runner::TaskRunner;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_yaml_file(Path::new("config.yaml"))?;
//! config.validate()?;
//!
//! let client = create_s3_client(&config.aws)?;
//! let store = Arc::new(S3Store::new(client, &config.options));
//!
//! let runner = TaskRunner::new(store, &config);
//! let (successful, failed) = runner.run_all().await;
//! println!("{} tasks succeeded, {} failed", successful, failed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`models`]: Core data models (file entries, upload outcomes)
//! - [`scanner`]: Source expansion and exclusion rules
//! - [`progress`]: Per-file progress tracking and aggregation
//! - [`uploader`]: The upload orchestration engine
//! - [`cloud`]: Object store seam and the S3 implementation
//! - [`config`]: Configuration loading and validation
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models and structures used throughout the application
pub mod models;

/// Source expansion into transferable file entries
pub mod scanner;

/// Per-file progress tracking and aggregation
pub mod progress;

/// The upload orchestration engine
pub mod uploader;

/// Object storage integration (S3)
pub mod cloud;

/// Configuration management
pub mod config;

/// Application constants and configuration values
pub mod constants;
