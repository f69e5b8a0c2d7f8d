// neo4jbackuptool/src/storage/s3_upload.rs
use async_trait::async_trait;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_sdk_s3 as s3;
use aws_smithy_types::byte_stream::Length;
use s3::primitives::ByteStream;
use s3::types::{CompletedMultipartUpload, CompletedPart};
use std::path::{Path, PathBuf};

use crate::errors::{AppError, Result};
use crate::storage::{
    remote_key, requires_multipart, split_destination, StorageBackend, PART_SIZE_BYTES,
};

/// Uploads to AWS S3. Credentials come from the shared-credentials file at
/// the configured path, or from the ambient provider chain (instance role,
/// env vars) when no path is given.
pub struct S3Backend {
    credentials_path: Option<PathBuf>,
}

impl S3Backend {
    pub fn new(credentials_path: Option<PathBuf>) -> Self {
        Self { credentials_path }
    }

    async fn client(&self) -> s3::Client {
        let mut loader = aws_config::defaults(s3::config::BehaviorVersion::latest());
        if let Some(path) = &self.credentials_path {
            let profile_files = ProfileFiles::builder()
                .with_file(ProfileFileKind::Credentials, path)
                .build();
            loader = loader.profile_files(profile_files);
        }
        let sdk_config = loader.load().await;
        s3::Client::new(&sdk_config)
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn name(&self) -> &'static str {
        "AWS S3"
    }

    async fn check_access(&self, destination: &str) -> Result<()> {
        let (bucket, prefix) = split_destination(destination);
        let client = self.client().await;

        client
            .head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .map_err(|e| {
                AppError::DestinationUnavailable(format!(
                    "S3 bucket for destination '{}' is not accessible: {}",
                    destination, e
                ))
            })?;

        if let Some(prefix) = prefix {
            let listed = client
                .list_objects_v2()
                .bucket(&bucket)
                .prefix(format!("{}/", prefix))
                .max_keys(1)
                .send()
                .await
                .map_err(|e| {
                    AppError::DestinationUnavailable(format!(
                        "Failed to list destination '{}': {}",
                        destination, e
                    ))
                })?;
            if listed.key_count().unwrap_or(0) == 0 {
                return Err(AppError::DestinationUnavailable(format!(
                    "Nothing exists under destination '{}'; check the sub-path",
                    destination
                )));
            }
        }

        println!("✓ Destination {} is accessible", destination);
        Ok(())
    }

    async fn upload_file(
        &self,
        file_name: &str,
        local_dir: &Path,
        destination: &str,
    ) -> Result<()> {
        let (bucket, prefix) = split_destination(destination);
        let key = remote_key(prefix.as_deref(), file_name);
        let file_path = local_dir.join(file_name);
        let size_bytes = std::fs::metadata(&file_path)
            .map_err(|e| {
                AppError::Upload(format!(
                    "Failed to stat upload source {}: {}",
                    file_path.display(),
                    e
                ))
            })?
            .len();

        let client = self.client().await;
        println!(
            "Uploading {} ({} bytes) to s3://{}/{}",
            file_path.display(),
            size_bytes,
            bucket,
            key
        );

        if requires_multipart(size_bytes) {
            upload_multipart(&client, &bucket, &key, &file_path, size_bytes).await?;
        } else {
            let body = ByteStream::from_path(&file_path).await.map_err(|e| {
                AppError::Upload(format!(
                    "Failed to open {} for upload: {}",
                    file_path.display(),
                    e
                ))
            })?;
            client
                .put_object()
                .bucket(&bucket)
                .key(&key)
                .body(body)
                .send()
                .await
                .map_err(|e| {
                    AppError::Upload(format!(
                        "Failed to upload {} to s3://{}/{}: {}",
                        file_path.display(),
                        bucket,
                        key,
                        e
                    ))
                })?;
        }

        println!("✅ Successfully uploaded {} to s3://{}/{}", file_name, bucket, key);
        Ok(())
    }
}

async fn upload_multipart(
    client: &s3::Client,
    bucket: &str,
    key: &str,
    file_path: &Path,
    size_bytes: u64,
) -> Result<()> {
    println!(
        "File is {} bytes, switching to multipart upload with {} byte parts",
        size_bytes, PART_SIZE_BYTES
    );

    let multipart = client
        .create_multipart_upload()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| {
            AppError::Upload(format!(
                "Failed to start multipart upload for s3://{}/{}: {}",
                bucket, key, e
            ))
        })?;
    let upload_id = multipart.upload_id().ok_or_else(|| {
        AppError::Upload(format!(
            "S3 did not return an upload id for s3://{}/{}",
            bucket, key
        ))
    })?;

    let mut completed_parts = Vec::new();
    let mut offset = 0u64;
    let mut part_number = 1i32;
    while offset < size_bytes {
        let part_len = PART_SIZE_BYTES.min(size_bytes - offset);
        let body = ByteStream::read_from()
            .path(file_path)
            .offset(offset)
            .length(Length::Exact(part_len))
            .build()
            .await
            .map_err(|e| {
                AppError::Upload(format!(
                    "Failed to read part {} of {}: {}",
                    part_number,
                    file_path.display(),
                    e
                ))
            })?;

        let uploaded = client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                AppError::Upload(format!(
                    "Failed to upload part {} to s3://{}/{}: {}",
                    part_number, bucket, key, e
                ))
            })?;

        completed_parts.push(
            CompletedPart::builder()
                .part_number(part_number)
                .set_e_tag(uploaded.e_tag().map(str::to_string))
                .build(),
        );

        offset += part_len;
        part_number += 1;
    }

    client
        .complete_multipart_upload()
        .bucket(bucket)
        .key(key)
        .upload_id(upload_id)
        .multipart_upload(
            CompletedMultipartUpload::builder()
                .set_parts(Some(completed_parts))
                .build(),
        )
        .send()
        .await
        .map_err(|e| {
            AppError::Upload(format!(
                "Failed to complete multipart upload for s3://{}/{}: {}",
                bucket, key, e
            ))
        })?;

    Ok(())
}
