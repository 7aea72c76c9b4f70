//! Object-storage integration.
//!
//! The upload engine depends on a single seam, the [`store::ObjectStore`]
//! trait; [`s3::S3Store`] is the production implementation on top of
//! rusoto. Small files go up with a single PutObject request, large files
//! with a multipart upload whose parts transfer concurrently.
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rust_uploader::cloud::{client::create_s3_client, s3::S3Store};
//! use rust_uploader::config::{AwsConfig, UploadOptions};
//!
//! # fn example() -> anyhow::Result<()> {
//! let aws = AwsConfig {
//!     region: Some("us-east-1".to_string()),
//!     profile: None,
//!     assume_role: None,
//! };
//! let options = UploadOptions::default();
//! let store = S3Store::new(create_s3_client(&aws)?, &options);
//! # Ok(())
//! # }
//! ```

/// Object store trait seam and error taxonomy
pub mod store;

/// Amazon S3 implementation of the object store
pub mod s3;

/// S3/STS client construction and credential resolution
pub mod client;
