use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use rusoto_core::{HttpClient, Region};
use rusoto_credential::{AutoRefreshingProvider, ProfileProvider};
use rusoto_s3::S3Client;
use rusoto_sts::{StsAssumeRoleSessionCredentialsProvider, StsClient};

use crate::config::{AssumeRoleConfig, AwsConfig};

/// Parse a region name, falling back to the default region on bad input.
pub fn parse_region(region_name: Option<&str>) -> Region {
    match region_name {
        Some(name) => match name.parse::<Region>() {
            Ok(region) => region,
            Err(_) => {
                warn!("Invalid region '{}', using default", name);
                Region::default()
            }
        },
        None => Region::default(),
    }
}

/// Create an S3 client from the AWS connection settings.
///
/// Credential resolution order: assumed role (optionally bootstrapped from
/// a named profile), then named profile, then the default chain.
pub fn create_s3_client(aws: &AwsConfig) -> Result<Arc<S3Client>> {
    let region = parse_region(aws.region.as_deref());

    if let Some(assume_role) = &aws.assume_role {
        return create_assume_role_client(aws, assume_role, region);
    }

    let client = if let Some(profile_name) = &aws.profile {
        match ProfileProvider::new() {
            Ok(mut provider) => {
                provider.set_profile(profile_name);
                let http_client =
                    HttpClient::new().context("Failed to create HTTP client for S3")?;
                info!("S3 client created with profile '{}'", profile_name);
                S3Client::new_with(http_client, provider, region)
            }
            Err(e) => {
                warn!("Failed to create AWS profile provider: {}, using default", e);
                S3Client::new(region)
            }
        }
    } else {
        info!("S3 client created with default credentials");
        S3Client::new(region)
    };

    Ok(Arc::new(client))
}

fn create_assume_role_client(
    aws: &AwsConfig,
    assume_role: &AssumeRoleConfig,
    region: Region,
) -> Result<Arc<S3Client>> {
    let sts_client = if let Some(profile_name) = &aws.profile {
        let mut provider =
            ProfileProvider::new().context("Failed to create AWS profile provider")?;
        provider.set_profile(profile_name);
        let http_client = HttpClient::new().context("Failed to create HTTP client for STS")?;
        StsClient::new_with(http_client, provider, region.clone())
    } else {
        StsClient::new(region.clone())
    };

    let provider = StsAssumeRoleSessionCredentialsProvider::new(
        sts_client,
        assume_role.role_arn.clone(),
        assume_role.session_name.clone(),
        assume_role.external_id.clone(),
        Some(chrono::Duration::seconds(assume_role.duration_seconds as i64)),
        None,
        None,
    );
    let provider = AutoRefreshingProvider::new(provider)
        .context("Failed to create refreshing credentials provider")?;

    let http_client = HttpClient::new().context("Failed to create HTTP client for S3")?;
    info!("S3 client created with assumed role: {}", assume_role.role_arn);
    Ok(Arc::new(S3Client::new_with(http_client, provider, region)))
}
