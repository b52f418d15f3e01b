//! JWT issuing and validation
//!
//! Every token carries the user, their role and a kind discriminator
//! so a refresh or reset token can never pass where an access token is
//! required.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub fk_user: i64,
    pub fk_role: i64,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub exp: i64,
}

pub fn generate(
    fk_user: i64,
    fk_role: i64,
    kind: TokenKind,
    key: &str,
    ttl_seconds: i64,
) -> Result<String> {
    let claims = Claims {
        fk_user,
        fk_role,
        kind,
        exp: Utc::now().timestamp() + ttl_seconds,
    };
    Ok(jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )?)
}

/// Decode and validate a token. Any failure (bad signature, expiry,
/// garbage input) reads as an unauthorized request, not an internal
/// error.
pub fn decode(token: &str, key: &str) -> Result<Claims> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(key.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| Error::unauthorized("invalid token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "test-key";

    #[test]
    fn round_trip_keeps_claims() {
        let token = generate(7, 2, TokenKind::Access, KEY, 60).unwrap();
        let claims = decode(&token, KEY).unwrap();
        assert_eq!(claims.fk_user, 7);
        assert_eq!(claims.fk_role, 2);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn kinds_are_distinguishable() {
        let token = generate(7, 2, TokenKind::Refresh, KEY, 60).unwrap();
        let claims = decode(&token, KEY).unwrap();
        assert_ne!(claims.kind, TokenKind::Access);
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn wrong_key_is_unauthorized() {
        let token = generate(7, 2, TokenKind::Access, KEY, 60).unwrap();
        let err = decode(&token, "other-key").unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let token = generate(7, 2, TokenKind::Access, KEY, -120).unwrap();
        let err = decode(&token, KEY).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn garbage_is_unauthorized() {
        let err = decode("not-a-token", KEY).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
