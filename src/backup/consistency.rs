// neo4jbackuptool/src/backup/consistency.rs
use anyhow::Context;
use std::path::Path;
use std::process::Command;

use crate::backup::ConsistencyReport;
use crate::config::ConsistencyCheckConfig;
use crate::errors::{AppError, Result};
use crate::utils::find_admin_executable;

/// Builds the argument list for `neo4j-admin database check`.
///
/// Each check scope is toggled independently; thread count and off-heap
/// memory are omitted when unset so the tool applies its own defaults.
pub fn build_check_args(
    config: &ConsistencyCheckConfig,
    database: &str,
    backup_dir: &Path,
    report_dir: &Path,
) -> Vec<String> {
    let mut args = vec![
        "database".to_string(),
        "check".to_string(),
        format!("--from-path={}", backup_dir.display()),
        format!("--report-path={}", report_dir.display()),
        format!("--check-indexes={}", config.indexes),
        format!("--check-graph={}", config.graph),
        format!("--check-counts={}", config.counts),
        format!("--check-property-owners={}", config.property_owners),
    ];

    if let Some(threads) = config.threads {
        args.push(format!("--threads={}", threads));
    }
    if let Some(max_off_heap) = &config.max_off_heap_memory {
        args.push(format!("--max-off-heap-memory={}", max_off_heap));
    }
    if config.verbose {
        args.push("--verbose".to_string());
    }

    args.push(database.to_string());
    args
}

/// Runs the consistency check for one backed-up database and returns where
/// its report was written.
pub fn check_consistency(
    config: &ConsistencyCheckConfig,
    artifact_name: &str,
    database: &str,
    backup_dir: &Path,
) -> Result<ConsistencyReport> {
    let admin_path = find_admin_executable()?;

    let report_dir = backup_dir.join(format!("{}.report", artifact_name));
    std::fs::create_dir_all(&report_dir)
        .with_context(|| format!("Failed to create report directory {}", report_dir.display()))?;

    println!(
        "🔍 Checking consistency of database {} (artifact '{}')",
        database, artifact_name
    );

    let output = Command::new(&admin_path)
        .args(build_check_args(config, database, backup_dir, &report_dir))
        .output()
        .map_err(|e| {
            AppError::ConsistencyCheck(format!(
                "failed to launch {}: {}",
                admin_path.display(),
                e
            ))
        })?;

    if !output.status.success() {
        return Err(AppError::ConsistencyCheck(format!(
            "neo4j-admin database check for {} failed with status: {}\nStdout: {}\nStderr: {}",
            database,
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    println!("✓ Consistency check passed for database {}", database);
    Ok(ConsistencyReport {
        artifact_name: artifact_name.to_string(),
        report_path: report_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> ConsistencyCheckConfig {
        ConsistencyCheckConfig {
            enabled: true,
            indexes: true,
            graph: true,
            counts: true,
            property_owners: false,
            threads: None,
            max_off_heap_memory: None,
            verbose: false,
        }
    }

    #[test]
    fn test_build_check_args_scope_toggles() {
        let mut cfg = config();
        cfg.graph = false;
        cfg.property_owners = true;
        let args = build_check_args(
            &cfg,
            "neo4j",
            &PathBuf::from("/backups"),
            &PathBuf::from("/backups/neo4j.report"),
        );

        assert!(args.contains(&"--check-indexes=true".to_string()));
        assert!(args.contains(&"--check-graph=false".to_string()));
        assert!(args.contains(&"--check-counts=true".to_string()));
        assert!(args.contains(&"--check-property-owners=true".to_string()));
    }

    #[test]
    fn test_build_check_args_optional_fields_omitted() {
        let args = build_check_args(
            &config(),
            "neo4j",
            &PathBuf::from("/backups"),
            &PathBuf::from("/backups/neo4j.report"),
        );

        assert!(!args.iter().any(|a| a.starts_with("--threads")));
        assert!(!args.iter().any(|a| a.starts_with("--max-off-heap-memory")));
        assert!(!args.contains(&"--verbose".to_string()));
    }

    #[test]
    fn test_build_check_args_database_is_last() {
        let mut cfg = config();
        cfg.threads = Some(4);
        cfg.max_off_heap_memory = Some("2G".to_string());
        let args = build_check_args(
            &cfg,
            "system",
            &PathBuf::from("/backups"),
            &PathBuf::from("/backups/system.report"),
        );

        assert!(args.contains(&"--threads=4".to_string()));
        assert!(args.contains(&"--max-off-heap-memory=2G".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("system"));
    }
}
