//! Event ticketing back office
//!
//! Spreadsheets in, spreadsheets out, SQLite in the middle.

use anyhow::Result;
use clap::Parser;

mod auth;
mod cli;
mod config;
mod errors;
mod records;
mod services;
mod sheets;
mod storage;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Cli::parse();
    let config = Config::from_env()?;
    let pool = storage::sqlite::connect(&config.database_url).await?;

    cli::dispatch(args, &config, &pool).await
}
