// neo4jbackuptool/src/storage/azure_upload.rs
use async_trait::async_trait;
use object_store::azure::{MicrosoftAzure, MicrosoftAzureBuilder};
use std::path::{Path, PathBuf};

use crate::errors::{AppError, Result};
use crate::storage::{
    check_destination_listing, split_destination, upload_via_object_store, StorageBackend,
};

/// Uploads to Azure Blob Storage. Credentials come from a two-key
/// properties file (`accountName=`, `accountKey=`) at the configured path,
/// or from the environment / managed identity when no path is given.
pub struct AzureBackend {
    credentials_path: Option<PathBuf>,
}

impl AzureBackend {
    pub fn new(credentials_path: Option<PathBuf>) -> Self {
        Self { credentials_path }
    }

    fn store(&self, container: &str) -> Result<MicrosoftAzure> {
        let builder = match &self.credentials_path {
            Some(path) => {
                let (account, key) = read_shared_key_file(path)?;
                MicrosoftAzureBuilder::new()
                    .with_account(account)
                    .with_access_key(key)
            }
            None => MicrosoftAzureBuilder::from_env(),
        };

        builder
            .with_container_name(container)
            .build()
            .map_err(|e| {
                AppError::DestinationUnavailable(format!(
                    "Failed to initialise Azure client for container '{}': {}",
                    container, e
                ))
            })
    }
}

fn read_shared_key_file(path: &Path) -> Result<(String, String)> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!(
            "Failed to read Azure credentials file {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut account = None;
    let mut key = None;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((name, value)) = line.split_once('=') {
            match name.trim() {
                "accountName" => account = Some(value.trim().to_string()),
                "accountKey" => key = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    match (account, key) {
        (Some(account), Some(key)) => Ok((account, key)),
        _ => Err(AppError::Config(format!(
            "Azure credentials file {} must contain accountName= and accountKey= lines",
            path.display()
        ))),
    }
}

#[async_trait]
impl StorageBackend for AzureBackend {
    fn name(&self) -> &'static str {
        "Azure Blob Storage"
    }

    async fn check_access(&self, destination: &str) -> Result<()> {
        let (container, prefix) = split_destination(destination);
        let store = self.store(&container)?;
        check_destination_listing(&store, destination, prefix.as_deref()).await
    }

    async fn upload_file(
        &self,
        file_name: &str,
        local_dir: &Path,
        destination: &str,
    ) -> Result<()> {
        let (container, _) = split_destination(destination);
        let store = self.store(&container)?;
        upload_via_object_store(&store, file_name, local_dir, destination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_shared_key_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "# storage account for backup archives")?;
        writeln!(file, "accountName = backupstore")?;
        writeln!(file, "accountKey = c2VjcmV0LWtleQ==")?;

        let (account, key) = read_shared_key_file(file.path())?;
        assert_eq!(account, "backupstore");
        assert_eq!(key, "c2VjcmV0LWtleQ==");
        Ok(())
    }

    #[test]
    fn test_read_shared_key_file_missing_key() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "accountName = backupstore")?;

        let result = read_shared_key_file(file.path());
        assert!(matches!(result, Err(AppError::Config(_))));
        Ok(())
    }
}
