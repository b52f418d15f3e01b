//! Command-line surface
//!
//! Every verb maps onto one service or import/export orchestrator; the
//! handlers own argument validation, transactions and console output.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use crate::config::Config;
use sqlx::SqlitePool;

#[derive(Parser, Debug)]
#[command(name = "ticketera", version, about = "Event ticketing back office")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load spreadsheets into the database
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },

    /// Write the database out as spreadsheets
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },

    /// Login, token refresh and password reset
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Tickets of the active event
    Tickets {
        #[command(subcommand)]
        command: TicketCommands,
    },

    /// Pricing tiers
    Batches {
        #[command(subcommand)]
        command: BatchCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ImportCommands {
    /// Replace the whole catalog from a workbook; the file is consumed
    Global {
        /// Workbook with Lugares, Eventos, Tandas, Entradas, Staff and
        /// Usuarios sheets
        file: PathBuf,
    },

    /// Replace the active event's tickets from a door-list workbook;
    /// the file is consumed
    Tickets {
        /// Workbook with Lista, Staff and Free sheets
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export the whole catalog to one workbook
    Global,

    /// Export the active event's door list to one workbook
    Tickets,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Authenticate and open a session
    Login {
        username: String,
        password: String,
    },

    /// Trade a refresh token for a fresh token pair
    Refresh {
        /// The refresh token issued at login
        token: String,
    },

    /// Close a user's session
    Logout {
        /// User id
        user: i64,
    },

    /// Set a new password using a reset token
    ResetPassword {
        /// The reset token issued at login
        token: String,
        password: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TicketCommands {
    /// List the active event's tickets with their people
    List,

    /// Sell one ticket for the active event
    Create {
        /// Person's name (the natural key; case does not matter)
        name: String,

        /// Pricing tier id
        #[arg(long)]
        batch: i64,

        /// Contact info for the person
        #[arg(long, default_value = "")]
        contact: String,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Update fields of one ticket
    Update {
        /// Ticket id
        id: i64,

        /// Move the ticket to another pricing tier
        #[arg(long)]
        batch: Option<i64>,

        #[arg(long)]
        notes: Option<String>,

        /// Override the stored price
        #[arg(long)]
        value: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum BatchCommands {
    /// List all pricing tiers
    List,
}

pub async fn dispatch(cli: Cli, config: &Config, pool: &SqlitePool) -> anyhow::Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Import { command } => commands::import::handle(pool, command).await,
        Commands::Export { command } => commands::export::handle(pool, config, command).await,
        Commands::Session { command } => commands::session::handle(pool, config, command).await,
        Commands::Tickets { command } => commands::tickets::handle(pool, command).await,
        Commands::Batches { command } => commands::batches::handle(pool, command).await,
    }
}
