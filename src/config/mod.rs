// neo4jbackuptool/src/config/mod.rs
use std::env;
use std::path::PathBuf;

use crate::errors::{AppError, Result};

/// Working directory shared by the backup tool, the packager and the
/// uploader. Matches the volume mount used by the job container.
pub const DEFAULT_BACKUP_DIR: &str = "/backups";
const DEFAULT_BACKUP_PORT: u16 = 6362;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudProvider {
    Aws,
    Azure,
    Gcp,
}

impl CloudProvider {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(CloudProvider::Aws),
            "azure" => Ok(CloudProvider::Azure),
            "gcp" => Ok(CloudProvider::Gcp),
            other => Err(AppError::Config(format!(
                "CLOUD_PROVIDER must be one of aws, azure, gcp; got '{}'",
                other
            ))),
        }
    }
}

/// Where the archives go. `destination` is the bucket or container name,
/// optionally followed by a "/"-delimited sub-path prefix.
#[derive(Debug, Clone)]
pub struct CloudTarget {
    pub provider: CloudProvider,
    pub destination: String,
    pub credentials_path: Option<PathBuf>,
}

/// Everything the backup tool invocation needs, fixed for the lifetime of
/// one job run.
#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub source_address: String,
    pub database_pattern: String,
    pub include_metadata: String,
    pub keep_failed: bool,
    pub parallel_recovery: bool,
    pub backup_type: String,
    pub page_cache: Option<String>,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct ConsistencyCheckConfig {
    pub enabled: bool,
    pub indexes: bool,
    pub graph: bool,
    pub counts: bool,
    pub property_owners: bool,
    pub threads: Option<u32>,
    pub max_off_heap_memory: Option<String>,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backup_dir: PathBuf,
    pub request: BackupRequest,
    pub consistency_check: ConsistencyCheckConfig,
    pub cloud_target: CloudTarget,
}

impl AppConfig {
    /// Assembles the whole job configuration from environment variables.
    pub fn load_from_env() -> Result<Self> {
        Ok(AppConfig {
            backup_dir: PathBuf::from(env_or("BACKUP_DIR", DEFAULT_BACKUP_DIR)),
            request: load_backup_request()?,
            consistency_check: load_consistency_check_config()?,
            cloud_target: load_cloud_target()?,
        })
    }
}

fn load_cloud_target() -> Result<CloudTarget> {
    let provider_name = env_required("CLOUD_PROVIDER")?;
    Ok(CloudTarget {
        provider: CloudProvider::from_name(&provider_name)?,
        destination: env_required("BUCKET_NAME")?,
        credentials_path: env_opt("CREDENTIAL_PATH").map(PathBuf::from),
    })
}

fn load_backup_request() -> Result<BackupRequest> {
    Ok(BackupRequest {
        source_address: resolve_source_address()?,
        database_pattern: env_required("DATABASE")?,
        include_metadata: env_or("INCLUDE_METADATA", "all"),
        keep_failed: env_bool("KEEP_FAILED", false)?,
        parallel_recovery: env_bool("PARALLEL_RECOVERY", false)?,
        backup_type: env_or("BACKUP_TYPE", "AUTO"),
        page_cache: env_opt("PAGE_CACHE"),
        verbose: env_bool("VERBOSE", false)?,
    })
}

fn load_consistency_check_config() -> Result<ConsistencyCheckConfig> {
    let threads = match env_opt("CONSISTENCY_CHECK_THREADS") {
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
            AppError::Config(format!(
                "CONSISTENCY_CHECK_THREADS must be a number, got '{}'",
                raw
            ))
        })?),
        None => None,
    };

    Ok(ConsistencyCheckConfig {
        enabled: env_bool("CONSISTENCY_CHECK_ENABLE", false)?,
        indexes: env_bool("CONSISTENCY_CHECK_INDEXES", true)?,
        graph: env_bool("CONSISTENCY_CHECK_GRAPH", true)?,
        counts: env_bool("CONSISTENCY_CHECK_COUNTS", true)?,
        property_owners: env_bool("CONSISTENCY_CHECK_PROPERTYOWNERS", false)?,
        threads,
        max_off_heap_memory: env_opt("CONSISTENCY_CHECK_MAXOFFHEAPMEMORY"),
        verbose: env_bool("CONSISTENCY_CHECK_VERBOSE", false)?,
    })
}

/// The backup endpoint is either given directly, or computed from the
/// Kubernetes service coordinates of the database.
fn resolve_source_address() -> Result<String> {
    if let Some(endpoint) = env_opt("DATABASE_BACKUP_ENDPOINT") {
        return Ok(endpoint);
    }

    let service = env_opt("DATABASE_SERVICE_NAME").ok_or_else(|| {
        AppError::Config(
            "Either DATABASE_BACKUP_ENDPOINT or DATABASE_SERVICE_NAME must be set".to_string(),
        )
    })?;
    let namespace = env_or("DATABASE_NAMESPACE", "default");
    let domain = env_or("DATABASE_CLUSTER_DOMAIN", "cluster.local");
    let port = match env_opt("DATABASE_BACKUP_PORT") {
        Some(raw) => raw.parse::<u16>().map_err(|_| {
            AppError::Config(format!(
                "DATABASE_BACKUP_PORT must be a port number, got '{}'",
                raw
            ))
        })?,
        None => DEFAULT_BACKUP_PORT,
    };

    Ok(compose_service_address(&service, &namespace, &domain, port))
}

/// Cluster-internal DNS name of the database backup service.
pub(crate) fn compose_service_address(
    service: &str,
    namespace: &str,
    domain: &str,
    port: u16,
) -> String {
    format!("{}.{}.svc.{}:{}", service, namespace, domain, port)
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_required(name: &str) -> Result<String> {
    env_opt(name).ok_or_else(|| AppError::Config(format!("{} must be set", name)))
}

fn env_bool(name: &str, default: bool) -> Result<bool> {
    match env_opt(name) {
        Some(raw) => parse_bool(name, &raw),
        None => Ok(default),
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AppError::Config(format!(
            "{} must be 'true' or 'false', got '{}'",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_name() -> anyhow::Result<()> {
        assert_eq!(CloudProvider::from_name("aws")?, CloudProvider::Aws);
        assert_eq!(CloudProvider::from_name("Azure")?, CloudProvider::Azure);
        assert_eq!(CloudProvider::from_name(" GCP ")?, CloudProvider::Gcp);
        Ok(())
    }

    #[test]
    fn test_provider_from_name_rejects_unknown() {
        let result = CloudProvider::from_name("digitalocean");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_parse_bool() -> anyhow::Result<()> {
        assert!(parse_bool("VERBOSE", "true")?);
        assert!(parse_bool("VERBOSE", "TRUE")?);
        assert!(!parse_bool("VERBOSE", "false")?);
        assert!(parse_bool("VERBOSE", "yes").is_err());
        Ok(())
    }

    #[test]
    fn test_compose_service_address() {
        let address = compose_service_address("graph-db-backup", "data", "cluster.local", 6362);
        assert_eq!(address, "graph-db-backup.data.svc.cluster.local:6362");
    }
}
