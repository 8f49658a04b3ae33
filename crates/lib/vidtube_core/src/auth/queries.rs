//! Identity store access.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Identity, IdentityProfile};

const IDENTITY_COLUMNS: &str = "id, username, email, full_name, password_hash, avatar_url, \
     avatar_public_id, cover_image_url, cover_image_public_id, refresh_token_hash, \
     created_at, updated_at";

/// Fetch an identity by handle or email, case-insensitively.
pub async fn find_by_identifier(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<Identity>, Error> {
    let row = sqlx::query_as::<_, Identity>(&format!(
        "SELECT {IDENTITY_COLUMNS} FROM identities \
         WHERE username = lower($1) OR email = lower($1)",
    ))
    .bind(identifier.trim())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Fetch an identity by id.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Identity>, Error> {
    let row = sqlx::query_as::<_, Identity>(&format!(
        "SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Check whether a handle or email is already registered (case-normalized).
pub async fn identifier_taken(pool: &PgPool, username: &str, email: &str) -> Result<bool, Error> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM identities WHERE username = lower($1) OR email = lower($2))",
    )
    .bind(username.trim())
    .bind(email.trim())
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Insert a new identity. Username and email are stored lower-cased; the
/// unique constraints surface as `Conflict`.
#[allow(clippy::too_many_arguments)]
pub async fn create_identity(
    pool: &PgPool,
    username: &str,
    email: &str,
    full_name: &str,
    password_hash: &str,
    avatar_url: &str,
    avatar_public_id: &str,
    cover_image_url: Option<&str>,
    cover_image_public_id: Option<&str>,
) -> Result<Identity, Error> {
    let row = sqlx::query_as::<_, Identity>(&format!(
        "INSERT INTO identities \
           (username, email, full_name, password_hash, avatar_url, avatar_public_id, \
            cover_image_url, cover_image_public_id) \
         VALUES (lower($1), lower($2), $3, $4, $5, $6, $7, $8) \
         RETURNING {IDENTITY_COLUMNS}",
    ))
    .bind(username.trim())
    .bind(email.trim())
    .bind(full_name.trim())
    .bind(password_hash)
    .bind(avatar_url)
    .bind(avatar_public_id)
    .bind(cover_image_url)
    .bind(cover_image_public_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Update full name and email, returning the public profile.
pub async fn update_account(
    pool: &PgPool,
    id: Uuid,
    full_name: &str,
    email: &str,
) -> Result<IdentityProfile, Error> {
    let row = sqlx::query_as::<_, IdentityProfile>(
        "UPDATE identities SET full_name = $2, email = lower($3), updated_at = now() \
         WHERE id = $1 \
         RETURNING id, username, email, full_name, avatar_url, cover_image_url, created_at",
    )
    .bind(id)
    .bind(full_name.trim())
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    row.ok_or_else(|| Error::NotFound("identity not found".into()))
}

/// Swap the avatar reference, returning the profile plus the replaced
/// provider id so the caller can delete the old blob.
pub async fn swap_avatar(
    pool: &PgPool,
    id: Uuid,
    url: &str,
    public_id: &str,
) -> Result<(IdentityProfile, Option<String>), Error> {
    swap_image(pool, id, url, public_id, "avatar_url", "avatar_public_id").await
}

/// Swap the cover image reference; same contract as [`swap_avatar`].
pub async fn swap_cover_image(
    pool: &PgPool,
    id: Uuid,
    url: &str,
    public_id: &str,
) -> Result<(IdentityProfile, Option<String>), Error> {
    swap_image(pool, id, url, public_id, "cover_image_url", "cover_image_public_id").await
}

async fn swap_image(
    pool: &PgPool,
    id: Uuid,
    url: &str,
    public_id: &str,
    url_col: &str,
    public_id_col: &str,
) -> Result<(IdentityProfile, Option<String>), Error> {
    // Column names come from the two callers above, never from input.
    let row = sqlx::query_as::<_, IdentityProfileWithOldId>(&format!(
        "UPDATE identities SET {url_col} = $2, {public_id_col} = $3, updated_at = now() \
         FROM (SELECT id AS prev_id, {public_id_col} AS old_public_id FROM identities WHERE id = $1) prev \
         WHERE identities.id = prev.prev_id \
         RETURNING identities.id, username, email, full_name, avatar_url, cover_image_url, \
                   identities.created_at, prev.old_public_id",
    ))
    .bind(id)
    .bind(url)
    .bind(public_id)
    .fetch_optional(pool)
    .await?;
    let row = row.ok_or_else(|| Error::NotFound("identity not found".into()))?;
    Ok((row.profile(), row.old_public_id))
}

#[derive(sqlx::FromRow)]
struct IdentityProfileWithOldId {
    id: Uuid,
    username: String,
    email: String,
    full_name: String,
    avatar_url: String,
    cover_image_url: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    old_public_id: Option<String>,
}

impl IdentityProfileWithOldId {
    fn profile(&self) -> IdentityProfile {
        IdentityProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            cover_image_url: self.cover_image_url.clone(),
            created_at: self.created_at,
        }
    }
}

/// Replace the stored password hash.
pub async fn update_password_hash(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), Error> {
    sqlx::query("UPDATE identities SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Overwrite the persisted refresh-token digest (issue path).
pub async fn store_refresh_token_hash(
    pool: &PgPool,
    id: Uuid,
    token_hash: &str,
) -> Result<(), Error> {
    sqlx::query("UPDATE identities SET refresh_token_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Atomically swap the refresh-token digest if and only if the stored value
/// matches the presented one. Returns whether the swap won; under concurrent
/// rotations exactly one caller sees `true`.
pub async fn compare_and_swap_refresh_token_hash(
    pool: &PgPool,
    id: Uuid,
    presented_hash: &str,
    new_hash: &str,
) -> Result<bool, Error> {
    let result = sqlx::query(
        "UPDATE identities SET refresh_token_hash = $3 \
         WHERE id = $1 AND refresh_token_hash = $2",
    )
    .bind(id)
    .bind(presented_hash)
    .bind(new_hash)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Clear the persisted refresh-token digest (logout / reuse detected).
pub async fn clear_refresh_token_hash(pool: &PgPool, id: Uuid) -> Result<(), Error> {
    sqlx::query("UPDATE identities SET refresh_token_hash = NULL WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
