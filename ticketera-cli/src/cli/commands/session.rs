//! Session command handlers

use anyhow::Result;
use colored::*;
use sqlx::SqlitePool;

use crate::cli::SessionCommands;
use crate::config::Config;
use crate::services::sessions::{self, LoginOutcome};
use crate::storage::sqlite::SqliteStore;

pub async fn handle(pool: &SqlitePool, config: &Config, command: SessionCommands) -> Result<()> {
    let mut tx = pool.begin().await?;
    let mut store = SqliteStore::new(&mut tx);

    match command {
        SessionCommands::Login { username, password } => {
            let outcome = sessions::login(&mut store, config, &username, &password).await?;
            print_outcome(outcome);
        }
        SessionCommands::Refresh { token } => {
            let outcome = sessions::refresh(&mut store, config, &token).await?;
            print_outcome(outcome);
        }
        SessionCommands::Logout { user } => {
            let removed = sessions::logout(&mut store, user).await?;
            if removed == 0 {
                println!("{}", "No open session for that user".yellow());
            } else {
                println!("{}", "Session closed".green());
            }
        }
        SessionCommands::ResetPassword { token, password } => {
            sessions::password_reset(&mut store, config, &token, &password).await?;
            println!("{}", "Password updated".green());
        }
    }

    tx.commit().await?;
    Ok(())
}

fn print_outcome(outcome: LoginOutcome) {
    match outcome {
        LoginOutcome::LoggedIn { tokens, user } => {
            println!("{}", "Logged in".green());
            println!("access token:  {}", tokens.access_token);
            println!("refresh token: {}", tokens.refresh_token);
            println!("{}", user.to_json(&["password"]));
        }
        LoginOutcome::ResetRequired { reset_token } => {
            println!("{}", "Password reset required".yellow());
            println!("reset token: {reset_token}");
        }
    }
}
