//! Comment views: paginated comment lists per video.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::pipeline::{Page, PageRequest};
use crate::error::Error;
use crate::models::OwnerProfile;

/// A comment with joined owner profile and derived engagement fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerProfile,
    pub like_count: i64,
    pub is_liked: bool,
}

#[derive(sqlx::FromRow)]
struct CommentViewRow {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    owner_id: Uuid,
    owner_username: String,
    owner_full_name: String,
    owner_avatar_url: String,
    like_count: i64,
    is_liked: bool,
}

/// Paginated comments for a video, newest first. The video must exist.
pub async fn video_comments(
    pool: &PgPool,
    video_id: Uuid,
    request: PageRequest,
    actor: Option<Uuid>,
) -> Result<Page<CommentView>, Error> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1)")
        .bind(video_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(Error::NotFound("video not found".into()));
    }

    let total_items =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(pool)
            .await?;

    let rows = sqlx::query_as::<_, CommentViewRow>(
        "SELECT c.id, c.content, c.created_at, \
           i.id AS owner_id, i.username AS owner_username, \
           i.full_name AS owner_full_name, i.avatar_url AS owner_avatar_url, \
           (SELECT COUNT(*) FROM likes l WHERE l.comment_id = c.id) AS like_count, \
           EXISTS(SELECT 1 FROM likes l \
                  WHERE l.comment_id = c.id AND l.liked_by = $1) AS is_liked \
         FROM comments c \
         JOIN identities i ON i.id = c.owner_id \
         WHERE c.video_id = $2 \
         ORDER BY c.created_at DESC, c.id DESC \
         LIMIT $3 OFFSET $4",
    )
    .bind(actor)
    .bind(video_id)
    .bind(request.limit)
    .bind(request.offset())
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|r| CommentView {
            id: r.id,
            content: r.content,
            created_at: r.created_at,
            owner: OwnerProfile {
                id: r.owner_id,
                username: r.owner_username,
                full_name: r.owner_full_name,
                avatar_url: r.owner_avatar_url,
            },
            like_count: r.like_count,
            is_liked: r.is_liked,
        })
        .collect();

    Ok(Page::new(items, total_items, request))
}
