// Re-export all items from the submodules
mod upload_config;

pub use upload_config::{
    AssumeRoleConfig,
    AwsConfig,
    Config,
    LoggingConfig,
    UploadOptions,
    UploadTask,
};
