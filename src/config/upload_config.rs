use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_RETRIES, DEFAULT_MULTIPART_CHUNK_SIZE,
    DEFAULT_MULTIPART_THRESHOLD, DEFAULT_PARALLEL_UPLOADS, DEFAULT_TIMEOUT_SECS,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            file: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssumeRoleConfig {
    pub role_arn: String,
    pub session_name: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default = "default_session_duration")]
    pub duration_seconds: u64,
}

impl AssumeRoleConfig {
    /// Validate the role fields against what STS will accept.
    pub fn validate(&self) -> Result<()> {
        let arn_pattern = Regex::new(r"^arn:aws:iam::[0-9]{12}:role/[a-zA-Z0-9+=,.@_-]+$")
            .context("Failed to compile role ARN pattern")?;
        if !arn_pattern.is_match(&self.role_arn) {
            bail!(
                "Invalid role_arn format: {}. Expected format: arn:aws:iam::ACCOUNT_ID:role/ROLE_NAME",
                self.role_arn
            );
        }

        let session_pattern = Regex::new(r"^[a-zA-Z0-9_.-]{2,64}$")
            .context("Failed to compile session name pattern")?;
        if !session_pattern.is_match(&self.session_name) {
            bail!(
                "Invalid session_name: {}. Must be 2-64 characters of [a-zA-Z0-9_.-]",
                self.session_name
            );
        }

        // STS accepts sessions between 15 minutes and 12 hours.
        if !(900..=43200).contains(&self.duration_seconds) {
            bail!(
                "Invalid duration_seconds: {}. Must be between 900 and 43200",
                self.duration_seconds
            );
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AwsConfig {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub assume_role: Option<AssumeRoleConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UploadOptions {
    /// Files larger than this go up as multipart uploads.
    #[serde(default = "default_multipart_threshold")]
    pub multipart_threshold: u64,
    /// Part size for multipart uploads.
    #[serde(default = "default_multipart_chunksize")]
    pub multipart_chunksize: usize,
    /// Concurrent parts per multipart upload.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Per-attempt transfer timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Concurrent file uploads within a directory task.
    #[serde(default = "default_parallel_uploads")]
    pub parallel_uploads: usize,
    #[serde(default = "default_true")]
    pub enable_progress: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        UploadOptions {
            multipart_threshold: default_multipart_threshold(),
            multipart_chunksize: default_multipart_chunksize(),
            max_concurrency: default_max_concurrency(),
            exclude_patterns: Vec::new(),
            dry_run: false,
            max_retries: default_max_retries(),
            timeout_seconds: default_timeout_seconds(),
            parallel_uploads: default_parallel_uploads(),
            enable_progress: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UploadTask {
    pub name: String,
    pub source: String,
    pub bucket: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Destination key, required when the source is a single file.
    #[serde(default)]
    pub s3_key: Option<String>,
    /// Destination key prefix, used when the source is a directory.
    #[serde(default)]
    pub s3_key_prefix: Option<String>,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub options: UploadOptions,
    #[serde(default)]
    pub upload_tasks: Vec<UploadTask>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            logging: LoggingConfig::default(),
            aws: AwsConfig::default(),
            options: UploadOptions::default(),
            upload_tasks: vec![UploadTask {
                name: "example".to_string(),
                source: "/var/log/app".to_string(),
                bucket: "my-bucket".to_string(),
                description: Some("Upload application logs".to_string()),
                enabled: false,
                s3_key: None,
                s3_key_prefix: Some("logs/".to_string()),
                recursive: true,
            }],
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml).context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Check the settings that would otherwise fail deep inside a run.
    ///
    /// Per-task required fields (bucket, s3_key) are deliberately NOT
    /// checked here; a malformed task fails at run time as one failed
    /// task without aborting its siblings.
    pub fn validate(&self) -> Result<()> {
        if let Some(assume_role) = &self.aws.assume_role {
            assume_role.validate()?;
        }
        if self.options.parallel_uploads == 0 {
            bail!("parallel_uploads must be at least 1");
        }
        if self.options.max_concurrency == 0 {
            bail!("max_concurrency must be at least 1");
        }
        Ok(())
    }

    /// Create a default configuration YAML file
    pub fn create_default_config_file(path: &Path) -> Result<()> {
        Config::default().save_to_yaml_file(path)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_duration() -> u64 {
    3600
}

fn default_multipart_threshold() -> u64 {
    DEFAULT_MULTIPART_THRESHOLD
}

fn default_multipart_chunksize() -> usize {
    DEFAULT_MULTIPART_CHUNK_SIZE
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_parallel_uploads() -> usize {
    DEFAULT_PARALLEL_UPLOADS
}

fn default_true() -> bool {
    true
}
