//! JWT token generation and verification.
//!
//! Two HS256 token kinds: short-lived access tokens carrying minimal profile
//! claims, and long-lived refresh tokens carrying only the identity id.
//! Verification failures are reported without detail so callers cannot
//! distinguish malformed from expired from reused tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::Error;
use crate::models::Identity;

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 15 * 60;

/// Refresh token lifetime: 30 days.
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

/// Signing secrets for the two token kinds.
#[derive(Debug, Clone)]
pub struct TokenSecrets {
    pub access: String,
    pub refresh: String,
}

impl TokenSecrets {
    /// Resolve secrets from `ACCESS_TOKEN_SECRET` / `REFRESH_TOKEN_SECRET`
    /// (with `JWT_SECRET` as a fallback for both). When neither is set a
    /// random per-process secret is generated — sessions then do not
    /// survive a restart.
    pub fn from_env() -> Self {
        let fallback = std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());
        let resolve = |var: &str| {
            std::env::var(var)
                .ok()
                .filter(|s| !s.is_empty())
                .or_else(|| fallback.clone())
                .unwrap_or_else(|| {
                    warn!(var, "no token secret configured, generating ephemeral secret");
                    random_secret()
                })
        };
        Self {
            access: resolve("ACCESS_TOKEN_SECRET"),
            refresh: resolve("REFRESH_TOKEN_SECRET"),
        }
    }
}

fn random_secret() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Claims embedded in an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims embedded in a refresh token: identity id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Mint a signed access token for an identity (HS256, 15 min expiry).
pub fn generate_access_token(identity: &Identity, secret: &[u8]) -> Result<String, Error> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: identity.id,
        username: identity.username.clone(),
        email: identity.email.clone(),
        full_name: identity.full_name.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| Error::Internal(format!("jwt encode: {e}")))
}

/// Mint a signed refresh token (HS256, 30 day expiry, sub-only claims).
pub fn generate_refresh_token(identity_id: Uuid, secret: &[u8]) -> Result<String, Error> {
    let now = Utc::now();
    let claims = RefreshClaims {
        sub: identity_id,
        iat: now.timestamp(),
        exp: (now + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| Error::Internal(format!("jwt encode: {e}")))
}

/// Verify an access token, returning the claims on success.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Option<AccessClaims> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<AccessClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Verify a refresh token's signature and expiry, returning the identity id.
pub fn verify_refresh_token(token: &str, secret: &[u8]) -> Option<Uuid> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<RefreshClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            full_name: "Alice".into(),
            password_hash: String::new(),
            avatar_url: "https://blobs.test/avatar.png".into(),
            avatar_public_id: "avatar-1".into(),
            cover_image_url: None,
            cover_image_public_id: None,
            refresh_token_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let id = identity();
        let token = generate_access_token(&id, b"secret").unwrap();
        let claims = verify_access_token(&token, b"secret").unwrap();
        assert_eq!(claims.sub, id.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@x.com");
    }

    #[test]
    fn access_token_rejects_wrong_secret() {
        let token = generate_access_token(&identity(), b"secret").unwrap();
        assert!(verify_access_token(&token, b"other").is_none());
    }

    #[test]
    fn refresh_token_carries_only_the_subject() {
        let id = Uuid::new_v4();
        let token = generate_refresh_token(id, b"refresh-secret").unwrap();
        assert_eq!(verify_refresh_token(&token, b"refresh-secret"), Some(id));
        // An access-token secret must not verify it.
        assert!(verify_refresh_token(&token, b"secret").is_none());
    }

    #[test]
    fn access_and_refresh_tokens_are_not_interchangeable() {
        let id = identity();
        let refresh = generate_refresh_token(id.id, b"same").unwrap();
        // Refresh claims lack the profile fields of access claims.
        assert!(verify_access_token(&refresh, b"same").is_none());
    }
}
