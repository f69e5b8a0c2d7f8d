//! Graph Database Backup Job
//!
//! One-shot batch process: backs up Neo4j databases via neo4j-admin,
//! packages the artifacts and ships them to cloud object storage.

// neo4jbackuptool/src/main.rs
mod backup;
mod config;
mod errors;
mod storage;
mod utils;

use std::process::ExitCode;

use config::AppConfig;
use errors::Result;

/// Main entry point for the backup job
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    match run_app().await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let app_config = AppConfig::load_from_env()?;
    backup::run_backup_flow(&app_config).await
}
