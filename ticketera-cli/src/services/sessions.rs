//! Session management: login, refresh, logout, password reset
//!
//! One session row per user: issuing new tokens replaces whatever
//! session existed before. A user flagged `password_update` cannot log
//! in; they get a short-lived reset token instead.

use crate::auth::{TokenKind, hash, token};
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::storage::{Kind, Record, Store, field};

#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub enum LoginOutcome {
    LoggedIn {
        tokens: SessionTokens,
        /// The user record, password already stripped
        user: Record,
    },
    /// The account requires a password reset before it can log in
    ResetRequired { reset_token: String },
}

fn role_of(user: &Record) -> i64 {
    user.int("fk_role").unwrap_or(0)
}

fn strip_password(mut user: Record) -> Record {
    user.fields.retain(|(name, _)| name != "password");
    user
}

/// Issue a fresh access/refresh pair and rotate the user's session row
async fn issue(
    store: &mut dyn Store,
    config: &Config,
    fk_user: i64,
    fk_role: i64,
) -> Result<SessionTokens> {
    let access_token = token::generate(
        fk_user,
        fk_role,
        TokenKind::Access,
        &config.token_key,
        config.access_expiration,
    )?;
    let refresh_token = token::generate(
        fk_user,
        fk_role,
        TokenKind::Refresh,
        &config.token_key,
        config.refresh_expiration,
    )?;

    store
        .remove(Kind::Session, &[field("fk_user", fk_user)])
        .await?;
    store
        .create(
            Kind::Session,
            vec![
                field("fk_user", fk_user),
                field("refresh_token", refresh_token.as_str()),
            ],
        )
        .await?;

    Ok(SessionTokens {
        access_token,
        refresh_token,
    })
}

fn reset_outcome(config: &Config, user: &Record) -> Result<LoginOutcome> {
    let reset_token = token::generate(
        user.id,
        role_of(user),
        TokenKind::Reset,
        &config.token_key,
        config.access_expiration,
    )?;
    Ok(LoginOutcome::ResetRequired { reset_token })
}

pub async fn login(
    store: &mut dyn Store,
    config: &Config,
    username: &str,
    password: &str,
) -> Result<LoginOutcome> {
    if username.trim().is_empty() {
        return Err(Error::bad_request("the username field is required"));
    }
    if password.is_empty() {
        return Err(Error::bad_request("the password field is required"));
    }

    let user = store
        .find(Kind::User, &[field("username", username.to_lowercase())])
        .await?
        .ok_or_else(|| Error::bad_request("no user with this username"))?;

    let stored = user.str("password").ok_or(Error::CorruptRecord {
        kind: "user",
        id: user.id,
        field: "password",
    })?;
    if !hash::check(password, stored)? {
        return Err(Error::bad_request("incorrect password"));
    }

    if user.bool("password_update").unwrap_or(false) {
        return reset_outcome(config, &user);
    }

    let tokens = issue(store, config, user.id, role_of(&user)).await?;
    log::info!("user {} logged in", user.id);
    Ok(LoginOutcome::LoggedIn {
        tokens,
        user: strip_password(user),
    })
}

pub async fn refresh(
    store: &mut dyn Store,
    config: &Config,
    presented: &str,
) -> Result<LoginOutcome> {
    let claims = token::decode(presented, &config.token_key)?;
    if claims.kind != TokenKind::Refresh {
        return Err(Error::unauthorized("invalid token"));
    }

    let session = store
        .find(Kind::Session, &[field("fk_user", claims.fk_user)])
        .await?
        .ok_or_else(|| Error::unauthorized("invalid token"))?;
    if session.str("refresh_token") != Some(presented) {
        return Err(Error::unauthorized("invalid token"));
    }

    let user = store
        .find(Kind::User, &[field("id", claims.fk_user)])
        .await?
        .ok_or_else(|| Error::unauthorized("invalid token"))?;

    if user.bool("password_update").unwrap_or(false) {
        return reset_outcome(config, &user);
    }

    let tokens = issue(store, config, user.id, role_of(&user)).await?;
    Ok(LoginOutcome::LoggedIn {
        tokens,
        user: strip_password(user),
    })
}

/// Drop the user's session; their refresh token stops working
pub async fn logout(store: &mut dyn Store, fk_user: i64) -> Result<u64> {
    let removed = store
        .remove(Kind::Session, &[field("fk_user", fk_user)])
        .await?;
    log::info!("user {fk_user} logged out");
    Ok(removed)
}

pub async fn password_reset(
    store: &mut dyn Store,
    config: &Config,
    presented: &str,
    new_password: &str,
) -> Result<()> {
    let claims = token::decode(presented, &config.token_key)?;
    if claims.kind != TokenKind::Reset {
        return Err(Error::unauthorized("invalid token"));
    }
    if new_password.is_empty() {
        return Err(Error::bad_request("the password field is required"));
    }

    let hashed = hash::make(new_password, config.hash_cost)?;
    store
        .update(
            Kind::User,
            &[field("id", claims.fk_user)],
            vec![
                field("password", hashed),
                field("password_update", false),
            ],
        )
        .await?;
    log::info!("user {} reset their password", claims.fk_user);
    Ok(())
}
