// neo4jbackuptool/src/storage/mod.rs
pub(crate) mod azure_upload;
pub(crate) mod gcs_upload;
pub(crate) mod s3_upload;

use async_trait::async_trait;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload, WriteMultipart};
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::config::{CloudProvider, CloudTarget};
use crate::errors::{AppError, Result};

/// Files at or above this size are uploaded in parts; provider single-shot
/// upload APIs commonly reject objects above a few GiB.
pub const MULTIPART_THRESHOLD_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Fixed part size for chunked uploads.
pub const PART_SIZE_BYTES: u64 = 1024 * 1024 * 1024;

/// Narrow capability every cloud provider implementation satisfies.
/// Credential loading and destination quirks stay inside each backend.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Verifies the destination bucket/container (and, where the provider
    /// allows a cheap check, its sub-path) is reachable before any upload.
    async fn check_access(&self, destination: &str) -> Result<()>;

    /// Uploads `local_dir/file_name` to the destination, preserving any
    /// "/"-delimited sub-path prefix in the remote object key.
    async fn upload_file(&self, file_name: &str, local_dir: &Path, destination: &str)
        -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Resolves the configured provider to its backend implementation.
pub fn create_backend(target: &CloudTarget) -> Box<dyn StorageBackend> {
    match target.provider {
        CloudProvider::Aws => Box::new(s3_upload::S3Backend::new(target.credentials_path.clone())),
        CloudProvider::Azure => Box::new(azure_upload::AzureBackend::new(
            target.credentials_path.clone(),
        )),
        CloudProvider::Gcp => Box::new(gcs_upload::GcsBackend::new(
            target.credentials_path.clone(),
        )),
    }
}

/// Splits a destination into the bucket/container (everything before the
/// first '/') and an optional virtual sub-path prefix (the rest).
pub(crate) fn split_destination(destination: &str) -> (String, Option<String>) {
    match destination.split_once('/') {
        Some((bucket, rest)) => {
            let prefix = rest.trim_matches('/');
            if prefix.is_empty() {
                (bucket.to_string(), None)
            } else {
                (bucket.to_string(), Some(prefix.to_string()))
            }
        }
        None => (destination.to_string(), None),
    }
}

/// Remote object key for a file under the optional sub-path prefix.
pub(crate) fn remote_key(prefix: Option<&str>, file_name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}/{}", prefix, file_name),
        None => file_name.to_string(),
    }
}

pub(crate) fn requires_multipart(size_bytes: u64) -> bool {
    size_bytes >= MULTIPART_THRESHOLD_BYTES
}

/// Shared access check for the `object_store`-backed providers: one listing
/// call proves reachability, and a configured sub-path with nothing under
/// it is treated as a path mismatch.
pub(crate) async fn check_destination_listing(
    store: &dyn ObjectStore,
    destination: &str,
    prefix: Option<&str>,
) -> Result<()> {
    let list_prefix = prefix.map(ObjectPath::from);
    let listed = store
        .list_with_delimiter(list_prefix.as_ref())
        .await
        .map_err(|e| {
            AppError::DestinationUnavailable(format!(
                "Destination '{}' is not accessible: {}",
                destination, e
            ))
        })?;

    if prefix.is_some() && listed.objects.is_empty() && listed.common_prefixes.is_empty() {
        return Err(AppError::DestinationUnavailable(format!(
            "Nothing exists under destination '{}'; check the sub-path",
            destination
        )));
    }

    println!("✓ Destination {} is accessible", destination);
    Ok(())
}

/// Shared upload path for the `object_store`-backed providers: a single put
/// below the multipart threshold, fixed-size chunked writes at or above it.
pub(crate) async fn upload_via_object_store(
    store: &dyn ObjectStore,
    file_name: &str,
    local_dir: &Path,
    destination: &str,
) -> Result<()> {
    let (_, prefix) = split_destination(destination);
    let key = ObjectPath::from(remote_key(prefix.as_deref(), file_name).as_str());
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

    println!(
        "Uploading {} ({} bytes) to {} as {}",
        file_path.display(),
        size_bytes,
        destination,
        key
    );

    if requires_multipart(size_bytes) {
        println!(
            "File is {} bytes, switching to chunked upload with {} byte parts",
            size_bytes, PART_SIZE_BYTES
        );
        let upload = store.put_multipart(&key).await.map_err(|e| {
            AppError::Upload(format!("Failed to start chunked upload for '{}': {}", key, e))
        })?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, PART_SIZE_BYTES as usize);

        let mut file = tokio::fs::File::open(&file_path).await.map_err(|e| {
            AppError::Upload(format!("Failed to open {}: {}", file_path.display(), e))
        })?;
        let mut buf = vec![0u8; 8 * 1024 * 1024];
        loop {
            let read = file.read(&mut buf).await.map_err(|e| {
                AppError::Upload(format!("Failed to read {}: {}", file_path.display(), e))
            })?;
            if read == 0 {
                break;
            }
            writer.wait_for_capacity(4).await.map_err(|e| {
                AppError::Upload(format!("Chunked upload of '{}' failed: {}", key, e))
            })?;
            writer.write(&buf[..read]);
        }
        writer.finish().await.map_err(|e| {
            AppError::Upload(format!("Failed to finish chunked upload of '{}': {}", key, e))
        })?;
    } else {
        let bytes = tokio::fs::read(&file_path).await.map_err(|e| {
            AppError::Upload(format!("Failed to read {}: {}", file_path.display(), e))
        })?;
        store.put(&key, PutPayload::from(bytes)).await.map_err(|e| {
            AppError::Upload(format!(
                "Failed to upload {} to '{}': {}",
                file_path.display(),
                key,
                e
            ))
        })?;
    }

    println!("✅ Successfully uploaded {} to {}", file_name, destination);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_destination_bare_bucket() {
        assert_eq!(split_destination("backups"), ("backups".to_string(), None));
    }

    #[test]
    fn test_split_destination_with_sub_path() {
        assert_eq!(
            split_destination("backups/graph/daily"),
            ("backups".to_string(), Some("graph/daily".to_string()))
        );
    }

    #[test]
    fn test_split_destination_trailing_slash_is_no_prefix() {
        assert_eq!(split_destination("backups/"), ("backups".to_string(), None));
    }

    #[test]
    fn test_remote_key_round_trip() {
        let (bucket, prefix) = split_destination("bucket/sub/path");
        let key = remote_key(prefix.as_deref(), "neo4j-2024.backup.tar.gz");

        assert_eq!(bucket, "bucket");
        assert_eq!(key, "sub/path/neo4j-2024.backup.tar.gz");
    }

    #[test]
    fn test_remote_key_without_prefix() {
        assert_eq!(remote_key(None, "a.tar.gz"), "a.tar.gz");
    }

    #[test]
    fn test_requires_multipart_boundary() {
        assert!(!requires_multipart(MULTIPART_THRESHOLD_BYTES - 1));
        assert!(requires_multipart(MULTIPART_THRESHOLD_BYTES));
        assert!(requires_multipart(MULTIPART_THRESHOLD_BYTES + 1));
    }
}
