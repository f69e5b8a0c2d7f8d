// neo4jbackuptool/src/storage/gcs_upload.rs
use async_trait::async_trait;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use std::path::{Path, PathBuf};

use crate::errors::{AppError, Result};
use crate::storage::{
    check_destination_listing, split_destination, upload_via_object_store, StorageBackend,
};

/// Uploads to Google Cloud Storage. Credentials come from the service
/// account JSON file at the configured path, or from application-default
/// credentials when no path is given.
pub struct GcsBackend {
    credentials_path: Option<PathBuf>,
}

impl GcsBackend {
    pub fn new(credentials_path: Option<PathBuf>) -> Self {
        Self { credentials_path }
    }

    fn store(&self, bucket: &str) -> Result<GoogleCloudStorage> {
        let builder = match &self.credentials_path {
            Some(path) => GoogleCloudStorageBuilder::new()
                .with_service_account_path(path.to_string_lossy().as_ref()),
            None => GoogleCloudStorageBuilder::from_env(),
        };

        builder.with_bucket_name(bucket).build().map_err(|e| {
            AppError::DestinationUnavailable(format!(
                "Failed to initialise GCS client for bucket '{}': {}",
                bucket, e
            ))
        })
    }
}

#[async_trait]
impl StorageBackend for GcsBackend {
    fn name(&self) -> &'static str {
        "Google Cloud Storage"
    }

    async fn check_access(&self, destination: &str) -> Result<()> {
        let (bucket, prefix) = split_destination(destination);
        let store = self.store(&bucket)?;
        check_destination_listing(&store, destination, prefix.as_deref()).await
    }

    async fn upload_file(
        &self,
        file_name: &str,
        local_dir: &Path,
        destination: &str,
    ) -> Result<()> {
        let (bucket, _) = split_destination(destination);
        let store = self.store(&bucket)?;
        upload_via_object_store(&store, file_name, local_dir, destination).await
    }
}
