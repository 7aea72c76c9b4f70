use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future;
use log::{debug, warn};
use rusoto_core::{ByteStream, RusotoError};
use rusoto_s3::{
    AbortMultipartUploadRequest, CompleteMultipartUploadRequest, CompletedMultipartUpload,
    CompletedPart, CreateMultipartUploadRequest, PutObjectRequest, S3Client, UploadPartRequest, S3,
};
use tokio::fs::File as AsyncFile;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::timeout;

use crate::cloud::store::{ObjectStore, ProgressFn, StoreError};
use crate::config::UploadOptions;
use crate::constants::S3_MIN_PART_SIZE;

/// S3-backed object store.
///
/// Files below the multipart threshold go up with a single PutObject;
/// larger files use a multipart upload with bounded part concurrency.
/// Progress callbacks fire once per uploaded part (or once per file for
/// the single-request path), so for multipart transfers they arrive from
/// multiple concurrent futures.
pub struct S3Store {
    client: Arc<S3Client>,
    multipart_threshold: u64,
    part_size: usize,
    part_concurrency: usize,
    attempt_timeout: Duration,
}

impl S3Store {
    pub fn new(client: Arc<S3Client>, options: &UploadOptions) -> Self {
        S3Store {
            client,
            multipart_threshold: options.multipart_threshold,
            part_size: options.multipart_chunksize.max(S3_MIN_PART_SIZE),
            part_concurrency: options.max_concurrency.clamp(1, num_cpus::get()),
            attempt_timeout: Duration::from_secs(options.timeout_seconds),
        }
    }

    async fn put_small(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        progress: Option<ProgressFn>,
    ) -> Result<(), StoreError> {
        let contents = tokio::fs::read(local_path)
            .await
            .map_err(|e| classify_io(local_path, e))?;
        let len = contents.len() as u64;

        let request = PutObjectRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: Some(ByteStream::from(contents)),
            ..Default::default()
        };

        self.client
            .put_object(request)
            .await
            .map_err(classify_rusoto)?;

        if let Some(progress) = progress {
            progress(len);
        }
        Ok(())
    }

    async fn put_multipart(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        file_size: u64,
        progress: Option<ProgressFn>,
    ) -> Result<(), StoreError> {
        let create_result = self
            .client
            .create_multipart_upload(CreateMultipartUploadRequest {
                bucket: bucket.to_string(),
                key: key.to_string(),
                ..Default::default()
            })
            .await
            .map_err(classify_rusoto)?;

        let upload_id = create_result
            .upload_id
            .ok_or_else(|| StoreError::Unexpected("no upload ID returned from S3".to_string()))?;

        let part_size = self.part_size as u64;
        let num_parts = (file_size + part_size - 1) / part_size;
        debug!(
            "Multipart upload {} for {}: {} parts of up to {} bytes",
            upload_id,
            local_path.display(),
            num_parts,
            part_size
        );

        let mut completed_parts = Vec::with_capacity(num_parts as usize);

        // Process parts in chunks so no more than part_concurrency parts
        // are in flight for this file at once.
        for chunk_start in (1..=num_parts).step_by(self.part_concurrency) {
            let chunk_end = std::cmp::min(chunk_start + self.part_concurrency as u64 - 1, num_parts);

            let mut chunk_futures = Vec::with_capacity((chunk_end - chunk_start + 1) as usize);
            for part_number in chunk_start..=chunk_end {
                let start_byte = (part_number - 1) * part_size;
                let end_byte = std::cmp::min(part_number * part_size, file_size);
                chunk_futures.push(self.upload_part(
                    local_path,
                    bucket,
                    key,
                    &upload_id,
                    part_number,
                    start_byte,
                    (end_byte - start_byte) as usize,
                    progress.clone(),
                ));
            }

            for result in future::join_all(chunk_futures).await {
                match result {
                    Ok(part) => completed_parts.push(part),
                    Err(e) => {
                        self.abort_upload(bucket, key, &upload_id).await;
                        return Err(e);
                    }
                }
            }
        }

        completed_parts.sort_by_key(|part| part.part_number.unwrap_or(0));

        self.client
            .complete_multipart_upload(CompleteMultipartUploadRequest {
                bucket: bucket.to_string(),
                key: key.to_string(),
                upload_id,
                multipart_upload: Some(CompletedMultipartUpload {
                    parts: Some(completed_parts),
                }),
                ..Default::default()
            })
            .await
            .map_err(classify_rusoto)?;

        debug!("Completed multipart upload for {}", local_path.display());
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn upload_part(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u64,
        start_byte: u64,
        part_len: usize,
        progress: Option<ProgressFn>,
    ) -> Result<CompletedPart, StoreError> {
        let mut file = AsyncFile::open(local_path)
            .await
            .map_err(|e| classify_io(local_path, e))?;
        file.seek(std::io::SeekFrom::Start(start_byte))
            .await
            .map_err(|e| classify_io(local_path, e))?;

        let mut buffer = vec![0u8; part_len];
        file.read_exact(&mut buffer)
            .await
            .map_err(|e| classify_io(local_path, e))?;

        let output = self
            .client
            .upload_part(UploadPartRequest {
                bucket: bucket.to_string(),
                key: key.to_string(),
                upload_id: upload_id.to_string(),
                part_number: part_number as i64,
                body: Some(ByteStream::from(buffer)),
                ..Default::default()
            })
            .await
            .map_err(classify_rusoto)?;

        let e_tag = output
            .e_tag
            .ok_or_else(|| StoreError::Unexpected("no ETag in upload part response".to_string()))?;

        if let Some(progress) = &progress {
            progress(part_len as u64);
        }

        Ok(CompletedPart {
            e_tag: Some(e_tag),
            part_number: Some(part_number as i64),
        })
    }

    async fn abort_upload(&self, bucket: &str, key: &str, upload_id: &str) {
        let abort = self
            .client
            .abort_multipart_upload(AbortMultipartUploadRequest {
                bucket: bucket.to_string(),
                key: key.to_string(),
                upload_id: upload_id.to_string(),
                ..Default::default()
            })
            .await;
        if let Err(e) = abort {
            warn!("Failed to abort multipart upload {}: {}", upload_id, e);
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        progress: Option<ProgressFn>,
    ) -> Result<(), StoreError> {
        let metadata = tokio::fs::metadata(local_path)
            .await
            .map_err(|e| classify_io(local_path, e))?;
        let file_size = metadata.len();

        debug!(
            "Uploading {} ({} bytes) to s3://{}/{}",
            local_path.display(),
            file_size,
            bucket,
            key
        );

        let transfer = async {
            if file_size > self.multipart_threshold {
                self.put_multipart(local_path, bucket, key, file_size, progress)
                    .await
            } else {
                self.put_small(local_path, bucket, key, progress).await
            }
        };

        match timeout(self.attempt_timeout, transfer).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Transient(format!(
                "upload of {} timed out after {}s",
                local_path.display(),
                self.attempt_timeout.as_secs()
            ))),
        }
    }
}

/// Map a local I/O failure into the store taxonomy.
fn classify_io(path: &Path, error: std::io::Error) -> StoreError {
    match error.kind() {
        std::io::ErrorKind::NotFound => StoreError::NotFound(path.display().to_string()),
        std::io::ErrorKind::PermissionDenied => {
            StoreError::PermissionDenied(path.display().to_string())
        }
        _ => StoreError::Unexpected(format!("{}: {}", path.display(), error)),
    }
}

/// Map a rusoto failure into the store taxonomy.
///
/// Dispatch and credential failures are worth retrying; for raw HTTP
/// responses the status code decides.
fn classify_rusoto<E: std::fmt::Display>(error: RusotoError<E>) -> StoreError {
    match error {
        RusotoError::HttpDispatch(e) => StoreError::Transient(e.to_string()),
        RusotoError::Credentials(e) => StoreError::Transient(e.to_string()),
        RusotoError::Unknown(response) => {
            classify_http_status(response.status.as_u16(), response.body_as_str())
        }
        RusotoError::Service(e) => StoreError::Unexpected(e.to_string()),
        RusotoError::Validation(msg) => StoreError::Unexpected(msg),
        RusotoError::ParseError(msg) => StoreError::Unexpected(msg),
        RusotoError::Blocking => StoreError::Unexpected("blocking call in async context".into()),
    }
}

fn classify_http_status(status: u16, body: &str) -> StoreError {
    match status {
        403 => StoreError::PermissionDenied(format!("HTTP 403: {}", body)),
        429 | 500..=599 => StoreError::Transient(format!("HTTP {}: {}", status, body)),
        _ => StoreError::Unexpected(format!("HTTP {}: {}", status, body)),
    }
}
