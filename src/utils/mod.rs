pub mod setting;

use anyhow::Context;
use std::path::PathBuf;
use which::which;

use crate::errors::Result;

/// Finds the neo4j-admin executable in the system PATH.
pub fn find_admin_executable() -> Result<PathBuf> {
    Ok(which("neo4j-admin").context("neo4j-admin executable not found in PATH. Please ensure the Neo4j distribution is installed and its bin directory is in your PATH.")?)
}
