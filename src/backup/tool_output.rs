// neo4jbackuptool/src/backup/tool_output.rs
use anyhow::Context;
use regex::Regex;

use crate::errors::{AppError, Result};

// The admin tool prints one of these per database it actually processed.
const ARTIFACT_MARKER: &str = r"Finished artifact creation '([^']+)' for database '([^']+)'";

/// One completion marker from the backup tool's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedArtifact {
    pub artifact_name: String,
    pub database: String,
}

/// Extracts the artifact names the backup tool reported on completion, in
/// the order they appear in the output.
///
/// A run that exited zero without printing a single completion marker is an
/// ambiguous state, not a silent success, and fails here.
pub fn parse_artifact_names(output: &str) -> Result<Vec<ReportedArtifact>> {
    let marker = Regex::new(ARTIFACT_MARKER).context("invalid artifact marker pattern")?;

    let reported: Vec<ReportedArtifact> = marker
        .captures_iter(output)
        .map(|caps| ReportedArtifact {
            artifact_name: caps[1].to_string(),
            database: caps[2].to_string(),
        })
        .collect();

    if reported.is_empty() {
        return Err(AppError::ArtifactParsing(format!(
            "the backup tool exited successfully but no 'Finished artifact creation' line was found in its output:\n{}",
            output
        )));
    }

    Ok(reported)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trimmed from a real neo4j-admin run against a wildcard pattern.
    const WILDCARD_OUTPUT: &str = "\
2024-03-07 04:10:11.201+0000 INFO  [o.n.b.BackupClient] Connected to graph-db.data.svc.cluster.local:6362\n\
2024-03-07 04:10:54.883+0000 INFO  [o.n.b.BackupClient] Backing up database 'neo4j'...\n\
Finished artifact creation 'neo4j-2024-03-07T04-10-54' for database 'neo4j'\n\
2024-03-07 04:11:03.114+0000 INFO  [o.n.b.BackupClient] Backing up database 'system'...\n\
Finished artifact creation 'system-2024-03-07T04-11-03' for database 'system'\n";

    #[test]
    fn test_parse_extracts_every_marker_in_order() -> anyhow::Result<()> {
        let reported = parse_artifact_names(WILDCARD_OUTPUT)?;

        assert_eq!(reported.len(), 2);
        assert_eq!(reported[0].artifact_name, "neo4j-2024-03-07T04-10-54");
        assert_eq!(reported[0].database, "neo4j");
        assert_eq!(reported[1].artifact_name, "system-2024-03-07T04-11-03");
        assert_eq!(reported[1].database, "system");
        Ok(())
    }

    #[test]
    fn test_parse_single_database() -> anyhow::Result<()> {
        let output = "Finished artifact creation 'neo4j-2024-03-07T04-10-54' for database 'neo4j'\n";
        let reported = parse_artifact_names(output)?;

        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].database, "neo4j");
        Ok(())
    }

    #[test]
    fn test_parse_fails_on_zero_markers() {
        let output = "2024-03-07 04:10:11.201+0000 INFO  backup finished with no artifacts\n";
        let result = parse_artifact_names(output);

        assert!(matches!(result, Err(AppError::ArtifactParsing(_))));
    }

    #[test]
    fn test_parse_fails_on_empty_output() {
        assert!(matches!(
            parse_artifact_names(""),
            Err(AppError::ArtifactParsing(_))
        ));
    }
}
