// neo4jbackuptool/src/backup/admin_backup.rs
use anyhow::Context;
use std::path::Path;
use std::process::Command;
use walkdir::WalkDir;

use crate::backup::{tool_output, BackupArtifact};
use crate::config::BackupRequest;
use crate::errors::{AppError, Result};
use crate::utils::find_admin_executable;

/// Builds the argument list for `neo4j-admin database backup`.
///
/// One flag per request field; optional fields are omitted entirely when
/// absent. A comma-separated database pattern becomes separate trailing
/// positional arguments so the tool sees each pattern on its own. Wildcard
/// patterns (`*`/`?`) are passed through untouched; the tool does its own
/// expansion.
pub fn build_backup_args(request: &BackupRequest, backup_dir: &Path) -> Vec<String> {
    let mut args = vec![
        "database".to_string(),
        "backup".to_string(),
        format!("--from={}", request.source_address),
        format!("--to-path={}", backup_dir.display()),
        format!("--include-metadata={}", request.include_metadata),
        format!("--keep-failed={}", request.keep_failed),
        format!("--parallel-recovery={}", request.parallel_recovery),
        format!("--type={}", request.backup_type),
    ];

    if let Some(page_cache) = &request.page_cache {
        args.push(format!("--pagecache={}", page_cache));
    }
    if request.verbose {
        args.push("--verbose".to_string());
    }

    for pattern in request.database_pattern.split(',') {
        let pattern = pattern.trim();
        if !pattern.is_empty() {
            args.push(pattern.to_string());
        }
    }

    args
}

/// Runs the backup tool and derives the produced artifacts from its
/// completion output.
pub fn perform_backup(request: &BackupRequest, backup_dir: &Path) -> Result<Vec<BackupArtifact>> {
    let admin_path = find_admin_executable()?;
    println!("Found neo4j-admin executable at: {}", admin_path.display());

    println!(
        "🚀 Backing up pattern '{}' from {} into {}",
        request.database_pattern,
        request.source_address,
        backup_dir.display()
    );

    let output = Command::new(&admin_path)
        .args(build_backup_args(request, backup_dir))
        .output()
        .map_err(|e| {
            AppError::BackupExecution(format!(
                "failed to launch {}: {}",
                admin_path.display(),
                e
            ))
        })?;

    let combined = combine_streams(&output.stdout, &output.stderr);
    if !output.status.success() {
        return Err(AppError::BackupExecution(format!(
            "neo4j-admin database backup failed with status: {}\nOutput:\n{}",
            output.status, combined
        )));
    }

    let mut artifacts = Vec::new();
    for reported in tool_output::parse_artifact_names(&combined)? {
        let local_path = backup_dir.join(&reported.artifact_name);
        let size_bytes = directory_size(&local_path)?;
        println!(
            "✓ Artifact '{}' created for database {} ({} bytes)",
            reported.artifact_name, reported.database, size_bytes
        );
        artifacts.push(BackupArtifact {
            database: reported.database,
            local_path,
            size_bytes,
        });
    }

    Ok(artifacts)
}

/// Combined stdout + stderr, the way an operator would see it in a console.
fn combine_streams(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    let err = String::from_utf8_lossy(stderr);
    if !err.trim().is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&err);
    }
    combined
}

fn directory_size(path: &Path) -> Result<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(path) {
        let entry = entry
            .with_context(|| format!("Failed to walk artifact directory {}", path.display()))?;
        if entry.file_type().is_file() {
            total += entry
                .metadata()
                .with_context(|| format!("Failed to stat {}", entry.path().display()))?
                .len();
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request() -> BackupRequest {
        BackupRequest {
            source_address: "graph-db.data.svc.cluster.local:6362".to_string(),
            database_pattern: "neo4j".to_string(),
            include_metadata: "all".to_string(),
            keep_failed: false,
            parallel_recovery: false,
            backup_type: "AUTO".to_string(),
            page_cache: None,
            verbose: false,
        }
    }

    #[test]
    fn test_build_backup_args_is_deterministic() {
        let req = request();
        let dir = PathBuf::from("/backups");

        let first = build_backup_args(&req, &dir);
        let second = build_backup_args(&req, &dir);

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                "database",
                "backup",
                "--from=graph-db.data.svc.cluster.local:6362",
                "--to-path=/backups",
                "--include-metadata=all",
                "--keep-failed=false",
                "--parallel-recovery=false",
                "--type=AUTO",
                "neo4j",
            ]
        );
    }

    #[test]
    fn test_build_backup_args_optional_fields() {
        let mut req = request();
        req.page_cache = Some("4G".to_string());
        req.verbose = true;
        let args = build_backup_args(&req, &PathBuf::from("/backups"));

        assert!(args.contains(&"--pagecache=4G".to_string()));
        assert!(args.contains(&"--verbose".to_string()));

        req.page_cache = None;
        req.verbose = false;
        let args = build_backup_args(&req, &PathBuf::from("/backups"));

        assert!(!args.iter().any(|a| a.starts_with("--pagecache")));
        assert!(!args.contains(&"--verbose".to_string()));
    }

    #[test]
    fn test_comma_separated_pattern_becomes_separate_tokens() {
        let mut req = request();
        req.database_pattern = "neo4j,system".to_string();
        let args = build_backup_args(&req, &PathBuf::from("/backups"));

        let trailing: Vec<&String> = args.iter().rev().take(2).collect();
        assert_eq!(trailing[1], "neo4j");
        assert_eq!(trailing[0], "system");
        assert!(!args.contains(&"neo4j,system".to_string()));
    }

    #[test]
    fn test_wildcard_pattern_passes_through() {
        let mut req = request();
        req.database_pattern = "neo4j*".to_string();
        let args = build_backup_args(&req, &PathBuf::from("/backups"));

        assert_eq!(args.last().map(String::as_str), Some("neo4j*"));
    }

    #[test]
    fn test_combine_streams_appends_stderr() {
        let combined = combine_streams(b"backing up\n", b"warning: slow disk\n");
        assert_eq!(combined, "backing up\nwarning: slow disk\n");

        let stdout_only = combine_streams(b"backing up\n", b"  \n");
        assert_eq!(stdout_only, "backing up\n");
    }
}
