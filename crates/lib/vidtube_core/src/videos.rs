//! Video mutations.
//!
//! Every ownership-gated mutation is a single conditional statement
//! (`WHERE id = $id AND owner_id = $actor`); when it affects no rows the
//! failure is classified afterwards as `NotFound` or `PermissionDenied`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::authz;
use crate::error::Error;
use crate::ids::uuidv7;
use crate::media::BlobRef;
use crate::models::Video;

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_url, video_public_id, \
     thumbnail_url, thumbnail_public_id, duration_secs, views, is_published, created_at, \
     updated_at";

/// Classify a zero-row conditional mutation: absent video vs foreign owner.
async fn classify_denied(pool: &PgPool, video_id: Uuid, actor: Uuid) -> Error {
    match sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(pool)
        .await
    {
        Ok(Some(owner)) => authz::authorize_owner(owner, actor)
            .err()
            .unwrap_or_else(|| Error::NotFound("video not found".into())),
        Ok(None) => Error::NotFound("video not found".into()),
        Err(e) => e.into(),
    }
}

/// Insert a new video record. Videos start unpublished.
pub async fn create_video(
    pool: &PgPool,
    owner: Uuid,
    title: &str,
    description: &str,
    video: &BlobRef,
    thumbnail: &BlobRef,
    duration_secs: f64,
) -> Result<Video, Error> {
    let row = sqlx::query_as::<_, Video>(&format!(
        "INSERT INTO videos \
           (id, owner_id, title, description, video_url, video_public_id, \
            thumbnail_url, thumbnail_public_id, duration_secs, is_published) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE) \
         RETURNING {VIDEO_COLUMNS}",
    ))
    .bind(uuidv7())
    .bind(owner)
    .bind(title.trim())
    .bind(description.trim())
    .bind(&video.url)
    .bind(&video.public_id)
    .bind(&thumbnail.url)
    .bind(&thumbnail.public_id)
    .bind(duration_secs)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Update title/description and optionally swap the thumbnail. Returns the
/// updated record plus the replaced thumbnail's provider id (for blob
/// cleanup) when a new one was supplied.
pub async fn update_video(
    pool: &PgPool,
    video_id: Uuid,
    actor: Uuid,
    title: &str,
    description: &str,
    new_thumbnail: Option<&BlobRef>,
) -> Result<(Video, Option<String>), Error> {
    let row = sqlx::query_as::<_, VideoWithOldThumbnail>(&format!(
        "UPDATE videos SET \
           title = $3, description = $4, \
           thumbnail_url = COALESCE($5, thumbnail_url), \
           thumbnail_public_id = COALESCE($6, thumbnail_public_id), \
           updated_at = now() \
         FROM (SELECT id AS prev_id, thumbnail_public_id AS old_thumbnail_public_id \
               FROM videos WHERE id = $1) prev \
         WHERE videos.id = prev.prev_id AND videos.owner_id = $2 \
         RETURNING {VIDEO_COLUMNS}, prev.old_thumbnail_public_id",
    ))
    .bind(video_id)
    .bind(actor)
    .bind(title.trim())
    .bind(description.trim())
    .bind(new_thumbnail.map(|t| t.url.as_str()))
    .bind(new_thumbnail.map(|t| t.public_id.as_str()))
    .fetch_optional(pool)
    .await?;

    match row {
        Some(r) => {
            let old = new_thumbnail.map(|_| r.old_thumbnail_public_id.clone());
            Ok((r.into_video(), old))
        }
        None => Err(classify_denied(pool, video_id, actor).await),
    }
}

#[derive(sqlx::FromRow)]
struct VideoWithOldThumbnail {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    video_url: String,
    video_public_id: String,
    thumbnail_url: String,
    thumbnail_public_id: String,
    duration_secs: f64,
    views: i64,
    is_published: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    old_thumbnail_public_id: String,
}

impl VideoWithOldThumbnail {
    fn into_video(self) -> Video {
        Video {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            video_url: self.video_url,
            video_public_id: self.video_public_id,
            thumbnail_url: self.thumbnail_url,
            thumbnail_public_id: self.thumbnail_public_id,
            duration_secs: self.duration_secs,
            views: self.views,
            is_published: self.is_published,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Delete a video (ownership-gated). Likes and comments cascade at the
/// store level; playlist entries and watch history keep their now-dangling
/// references. Returns the provider ids of the media blobs so
/// the caller can delete them.
pub async fn delete_video(
    pool: &PgPool,
    video_id: Uuid,
    actor: Uuid,
) -> Result<(String, String), Error> {
    let row = sqlx::query_as::<_, (String, String)>(
        "DELETE FROM videos WHERE id = $1 AND owner_id = $2 \
         RETURNING video_public_id, thumbnail_public_id",
    )
    .bind(video_id)
    .bind(actor)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(ids) => Ok(ids),
        None => Err(classify_denied(pool, video_id, actor).await),
    }
}

/// Flip the publication flag (ownership-gated), returning the new state.
pub async fn toggle_publish(pool: &PgPool, video_id: Uuid, actor: Uuid) -> Result<bool, Error> {
    let row = sqlx::query_scalar::<_, bool>(
        "UPDATE videos SET is_published = NOT is_published, updated_at = now() \
         WHERE id = $1 AND owner_id = $2 \
         RETURNING is_published",
    )
    .bind(video_id)
    .bind(actor)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(state) => Ok(state),
        None => Err(classify_denied(pool, video_id, actor).await),
    }
}

/// Record a view: bump the counter and, for an authenticated actor, move
/// the video to the front of their watch history.
pub async fn record_view(pool: &PgPool, video_id: Uuid, actor: Option<Uuid>) -> Result<(), Error> {
    sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
        .bind(video_id)
        .execute(pool)
        .await?;
    if let Some(actor) = actor {
        sqlx::query(
            "INSERT INTO watch_history (identity_id, video_id) VALUES ($1, $2) \
             ON CONFLICT (identity_id, video_id) DO UPDATE SET watched_at = now()",
        )
        .bind(actor)
        .bind(video_id)
        .execute(pool)
        .await?;
    }
    Ok(())
}
