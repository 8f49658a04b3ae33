//! Playlist views.

use sqlx::PgPool;
use uuid::Uuid;

use super::videos::{VideoViewRow, VIDEO_VIEW_COLUMNS};
use crate::error::Error;
use crate::models::{OwnerProfile, Playlist, PlaylistView, VideoView};

#[derive(sqlx::FromRow)]
struct PlaylistHeadRow {
    id: Uuid,
    name: String,
    description: String,
    created_at: chrono::DateTime<chrono::Utc>,
    owner_id: Uuid,
    owner_username: String,
    owner_full_name: String,
    owner_avatar_url: String,
}

/// A playlist with owner profile and its videos in position order.
///
/// Entries referencing a deleted video are silently omitted (playlist
/// entries carry no FK to videos), and unpublished videos are hidden from
/// everyone but their owner.
pub async fn get_playlist(
    pool: &PgPool,
    playlist_id: Uuid,
    actor: Option<Uuid>,
) -> Result<PlaylistView, Error> {
    let head = sqlx::query_as::<_, PlaylistHeadRow>(
        "SELECT p.id, p.name, p.description, p.created_at, \
           i.id AS owner_id, i.username AS owner_username, \
           i.full_name AS owner_full_name, i.avatar_url AS owner_avatar_url \
         FROM playlists p JOIN identities i ON i.id = p.owner_id \
         WHERE p.id = $1",
    )
    .bind(playlist_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound("playlist not found".into()))?;

    // Concurrent adds can commit the same position; added_at and video_id
    // keep the ordering stable.
    let sql = format!(
        "SELECT {VIDEO_VIEW_COLUMNS} \
         FROM playlist_videos pv \
         JOIN videos v ON v.id = pv.video_id \
         JOIN identities i ON i.id = v.owner_id \
         WHERE pv.playlist_id = $2 AND (v.is_published OR v.owner_id = $1) \
         ORDER BY pv.position ASC, pv.added_at ASC, pv.video_id ASC",
    );
    let rows = sqlx::query_as::<_, VideoViewRow>(&sql)
        .bind(actor)
        .bind(playlist_id)
        .fetch_all(pool)
        .await?;

    Ok(PlaylistView {
        id: head.id,
        name: head.name,
        description: head.description,
        created_at: head.created_at,
        owner: OwnerProfile {
            id: head.owner_id,
            username: head.owner_username,
            full_name: head.owner_full_name,
            avatar_url: head.owner_avatar_url,
        },
        videos: rows.into_iter().map(VideoView::from).collect(),
    })
}

/// All playlists owned by an identity, newest first.
pub async fn user_playlists(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Playlist>, Error> {
    let rows = sqlx::query_as::<_, Playlist>(
        "SELECT id, owner_id, name, description, created_at, updated_at \
         FROM playlists WHERE owner_id = $1 \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
