//! Import command handlers

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::*;
use sqlx::SqlitePool;

use crate::cli::ImportCommands;
use crate::sheets::import::{ImportSummary, run_global_import, run_ticket_replace};

pub async fn handle(pool: &SqlitePool, command: ImportCommands) -> Result<()> {
    match command {
        ImportCommands::Global { file } => {
            let summary = consume(&file, run_global_import(pool, &file).await)?;
            report("Catalog imported", &summary);
        }
        ImportCommands::Tickets { file } => {
            let summary = consume(&file, run_ticket_replace(pool, &file).await)?;
            report("Tickets replaced", &summary);
        }
    }
    Ok(())
}

/// The workbook is a one-shot upload: remove it whether the import
/// succeeded or not, then surface the import's own result.
fn consume(
    file: &Path,
    outcome: crate::errors::Result<ImportSummary>,
) -> Result<ImportSummary> {
    if let Err(error) = fs::remove_file(file) {
        log::warn!("could not remove {}: {error}", file.display());
    }
    outcome.with_context(|| format!("Failed to import {}", file.display()))
}

fn report(title: &str, summary: &ImportSummary) {
    println!(
        "{}: {} created, {} updated, {} removed",
        title.green(),
        summary.created,
        summary.updated,
        summary.removed
    );
}
