//! Playlist mutations.
//!
//! Playlist entries carry no FK to videos; a deleted video leaves a
//! dangling reference that read views tolerate. Membership changes are
//! ownership-gated through the playlist row in the same statement.

use sqlx::PgPool;
use uuid::Uuid;

use crate::authz;
use crate::error::Error;
use crate::ids::uuidv7;
use crate::models::Playlist;

const PLAYLIST_COLUMNS: &str = "id, owner_id, name, description, created_at, updated_at";

async fn classify_denied(pool: &PgPool, playlist_id: Uuid, actor: Uuid) -> Error {
    match sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM playlists WHERE id = $1")
        .bind(playlist_id)
        .fetch_optional(pool)
        .await
    {
        Ok(Some(owner)) => authz::authorize_owner(owner, actor)
            .err()
            .unwrap_or_else(|| Error::NotFound("playlist not found".into())),
        Ok(None) => Error::NotFound("playlist not found".into()),
        Err(e) => e.into(),
    }
}

/// Create a playlist.
pub async fn create_playlist(
    pool: &PgPool,
    owner: Uuid,
    name: &str,
    description: &str,
) -> Result<Playlist, Error> {
    if name.trim().is_empty() || description.trim().is_empty() {
        return Err(Error::Validation("name and description are required".into()));
    }
    let row = sqlx::query_as::<_, Playlist>(&format!(
        "INSERT INTO playlists (id, owner_id, name, description) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {PLAYLIST_COLUMNS}",
    ))
    .bind(uuidv7())
    .bind(owner)
    .bind(name.trim())
    .bind(description.trim())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Rename / re-describe a playlist (ownership-gated).
pub async fn update_playlist(
    pool: &PgPool,
    playlist_id: Uuid,
    actor: Uuid,
    name: &str,
    description: &str,
) -> Result<Playlist, Error> {
    if name.trim().is_empty() || description.trim().is_empty() {
        return Err(Error::Validation("name and description are required".into()));
    }
    let row = sqlx::query_as::<_, Playlist>(&format!(
        "UPDATE playlists SET name = $3, description = $4, updated_at = now() \
         WHERE id = $1 AND owner_id = $2 \
         RETURNING {PLAYLIST_COLUMNS}",
    ))
    .bind(playlist_id)
    .bind(actor)
    .bind(name.trim())
    .bind(description.trim())
    .fetch_optional(pool)
    .await?;
    match row {
        Some(p) => Ok(p),
        None => Err(classify_denied(pool, playlist_id, actor).await),
    }
}

/// Delete a playlist (ownership-gated). Its entries cascade.
pub async fn delete_playlist(pool: &PgPool, playlist_id: Uuid, actor: Uuid) -> Result<(), Error> {
    let deleted = sqlx::query("DELETE FROM playlists WHERE id = $1 AND owner_id = $2")
        .bind(playlist_id)
        .bind(actor)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 1 {
        Ok(())
    } else {
        Err(classify_denied(pool, playlist_id, actor).await)
    }
}

/// Add a video to a playlist at the next position. Idempotent: re-adding an
/// existing entry changes nothing. The ownership check rides in the insert's
/// source query, so the whole operation is one atomic statement.
pub async fn add_video(
    pool: &PgPool,
    playlist_id: Uuid,
    video_id: Uuid,
    actor: Uuid,
) -> Result<(), Error> {
    let video_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1)")
            .bind(video_id)
            .fetch_one(pool)
            .await?;
    if !video_exists {
        return Err(Error::NotFound("video not found".into()));
    }

    let inserted = sqlx::query(
        "INSERT INTO playlist_videos (playlist_id, video_id, position) \
         SELECT p.id, $2, COALESCE( \
             (SELECT MAX(position) + 1 FROM playlist_videos WHERE playlist_id = p.id), 0) \
         FROM playlists p WHERE p.id = $1 AND p.owner_id = $3 \
         ON CONFLICT (playlist_id, video_id) DO NOTHING",
    )
    .bind(playlist_id)
    .bind(video_id)
    .bind(actor)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 1 {
        return Ok(());
    }
    // Zero rows: absent or foreign-owned playlist, or the entry already
    // exists. An owned playlist only reaches here via the conflict, which
    // is the idempotent success.
    match sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM playlists WHERE id = $1")
        .bind(playlist_id)
        .fetch_optional(pool)
        .await?
    {
        None => Err(Error::NotFound("playlist not found".into())),
        Some(owner) => {
            authz::authorize_owner(owner, actor)?;
            Ok(())
        }
    }
}

/// Remove a video from a playlist (ownership-gated through the playlist).
pub async fn remove_video(
    pool: &PgPool,
    playlist_id: Uuid,
    video_id: Uuid,
    actor: Uuid,
) -> Result<(), Error> {
    let removed = sqlx::query(
        "DELETE FROM playlist_videos pv USING playlists p \
         WHERE pv.playlist_id = p.id AND p.id = $1 AND p.owner_id = $3 \
           AND pv.video_id = $2",
    )
    .bind(playlist_id)
    .bind(video_id)
    .bind(actor)
    .execute(pool)
    .await?
    .rows_affected();
    if removed == 1 {
        return Ok(());
    }
    match sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM playlists WHERE id = $1")
        .bind(playlist_id)
        .fetch_optional(pool)
        .await?
    {
        None => Err(Error::NotFound("playlist not found".into())),
        Some(owner) => {
            authz::authorize_owner(owner, actor)?;
            Err(Error::NotFound("video not in playlist".into()))
        }
    }
}
