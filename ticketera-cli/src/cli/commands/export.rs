//! Export command handlers

use anyhow::{Context, Result};
use colored::*;
use sqlx::SqlitePool;

use crate::cli::ExportCommands;
use crate::config::Config;
use crate::sheets::export::{run_global_export, run_ticket_export};

pub async fn handle(pool: &SqlitePool, config: &Config, command: ExportCommands) -> Result<()> {
    let path = match command {
        ExportCommands::Global => run_global_export(pool, &config.export_dir)
            .await
            .context("Failed to export the catalog")?,
        ExportCommands::Tickets => run_ticket_export(pool, &config.export_dir)
            .await
            .context("Failed to export the ticket list")?,
    };
    println!("{} {}", "Exported to".green(), path.display());
    Ok(())
}
