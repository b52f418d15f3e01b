//! Runtime configuration
//!
//! Everything comes from the environment (a `.env` file is honored),
//! collected once at startup.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::auth::hash;

const DEFAULT_DATABASE_URL: &str = "sqlite:ticketera.db";
const DEFAULT_EXPORT_DIR: &str = "static/exports";
/// 15 minutes
const DEFAULT_ACCESS_EXPIRATION: i64 = 900;
/// 30 days
const DEFAULT_REFRESH_EXPIRATION: i64 = 60 * 60 * 24 * 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub token_key: String,
    /// Access and reset token lifetime, in seconds
    pub access_expiration: i64,
    /// Refresh token lifetime, in seconds
    pub refresh_expiration: i64,
    pub hash_cost: u32,
    pub export_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            token_key: env::var("TOKEN_KEY").context("TOKEN_KEY is not set")?,
            access_expiration: env_number("TOKEN_ACCESS_EXPIRATION", DEFAULT_ACCESS_EXPIRATION)?,
            refresh_expiration: env_number("TOKEN_REFRESH_EXPIRATION", DEFAULT_REFRESH_EXPIRATION)?,
            hash_cost: env_number("HASH_COST", i64::from(hash::DEFAULT_COST))? as u32,
            export_dir: PathBuf::from(
                env::var("EXPORT_DIR").unwrap_or_else(|_| DEFAULT_EXPORT_DIR.to_string()),
            ),
        })
    }
}

fn env_number(name: &str, default: i64) -> Result<i64> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Fixture config for service tests; MIN_COST keeps bcrypt fast
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            token_key: "test-key".to_string(),
            access_expiration: 60,
            refresh_expiration: 3600,
            hash_cost: crate::auth::hash::MIN_COST,
            export_dir: PathBuf::from("exports"),
        }
    }
}
