//! Session/token lifecycle: authenticate, issue, rotate (single-use), revoke.
//!
//! Per session the states are `Anonymous → Authenticated → Refreshed* →
//! Revoked`. At most one refresh token is valid per identity at a time; its
//! SHA-256 digest is persisted on the identity row and rotation is a
//! compare-and-swap against that digest, so of N concurrent rotation
//! attempts exactly one succeeds and the rest fail with `InvalidToken`.

use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{info, warn};

use super::{jwt, password, queries};
use crate::error::Error;
use crate::models::{Identity, IdentityProfile};

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// SHA-256 hex digest of a refresh token for storage.
fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Mint a token pair for an identity and persist the refresh-token digest,
/// overwriting any prior value.
pub async fn issue_token_pair(
    pool: &PgPool,
    identity: &Identity,
    secrets: &jwt::TokenSecrets,
) -> Result<TokenPair, Error> {
    let access_token = jwt::generate_access_token(identity, secrets.access.as_bytes())?;
    let refresh_token = jwt::generate_refresh_token(identity.id, secrets.refresh.as_bytes())?;
    queries::store_refresh_token_hash(pool, identity.id, &hash_refresh_token(&refresh_token))
        .await?;
    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Authenticate by handle or email (case-insensitive) plus password.
///
/// Absent identity → `NotFound`; wrong password → `Unauthenticated`.
/// On success a fresh token pair is issued.
pub async fn authenticate(
    pool: &PgPool,
    identifier: &str,
    secret: &str,
    secrets: &jwt::TokenSecrets,
) -> Result<(IdentityProfile, TokenPair), Error> {
    let identity = queries::find_by_identifier(pool, identifier)
        .await?
        .ok_or_else(|| Error::NotFound("identity not found".into()))?;

    if !password::verify_password(secret, &identity.password_hash)? {
        return Err(Error::Unauthenticated);
    }

    let pair = issue_token_pair(pool, &identity, secrets).await?;
    info!(identity = %identity.id, "session authenticated");
    Ok((identity.into(), pair))
}

/// Exchange a refresh token for a new pair (single-use rotation).
///
/// Any verification failure — bad signature, expired, unknown identity,
/// digest mismatch — is reported as the same `InvalidToken`. A digest
/// mismatch on a structurally valid token is the reuse signal: the stored
/// digest is cleared and the session treated as compromised.
pub async fn rotate_refresh_token(
    pool: &PgPool,
    presented: &str,
    secrets: &jwt::TokenSecrets,
) -> Result<(IdentityProfile, TokenPair), Error> {
    let identity_id = jwt::verify_refresh_token(presented, secrets.refresh.as_bytes())
        .ok_or(Error::InvalidToken)?;

    let identity = queries::find_by_id(pool, identity_id)
        .await?
        .ok_or(Error::InvalidToken)?;

    let new_refresh = jwt::generate_refresh_token(identity.id, secrets.refresh.as_bytes())?;
    let swapped = queries::compare_and_swap_refresh_token_hash(
        pool,
        identity.id,
        &hash_refresh_token(presented),
        &hash_refresh_token(&new_refresh),
    )
    .await?;

    if !swapped {
        // Reuse or a concurrent rotation won the swap; either way this
        // presented token is dead and so is the stored one.
        warn!(identity = %identity.id, "refresh token mismatch, revoking session");
        queries::clear_refresh_token_hash(pool, identity.id).await?;
        return Err(Error::InvalidToken);
    }

    let access_token = jwt::generate_access_token(&identity, secrets.access.as_bytes())?;
    Ok((
        identity.into(),
        TokenPair {
            access_token,
            refresh_token: new_refresh,
        },
    ))
}

/// Revoke the identity's refresh token. Outstanding access tokens remain
/// valid until natural expiry.
pub async fn revoke(pool: &PgPool, identity_id: uuid::Uuid) -> Result<(), Error> {
    queries::clear_refresh_token_hash(pool, identity_id).await?;
    info!(identity = %identity_id, "session revoked");
    Ok(())
}

/// Change the password after verifying the old one. Existing access tokens
/// stay valid until they expire; only the credential changes.
pub async fn change_password(
    pool: &PgPool,
    identity_id: uuid::Uuid,
    old_password: &str,
    new_password: &str,
) -> Result<(), Error> {
    if new_password.trim().is_empty() {
        return Err(Error::Validation("new password is required".into()));
    }
    let identity = queries::find_by_id(pool, identity_id)
        .await?
        .ok_or_else(|| Error::NotFound("identity not found".into()))?;

    if !password::verify_password(old_password, &identity.password_hash)? {
        return Err(Error::Unauthenticated);
    }
    let new_hash = password::hash_password(new_password)?;
    queries::update_password_hash(pool, identity_id, &new_hash).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_token_digest_is_stable_hex() {
        let a = hash_refresh_token("token-value");
        let b = hash_refresh_token("token-value");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_tokens_hash_differently() {
        assert_ne!(hash_refresh_token("a"), hash_refresh_token("b"));
    }
}
