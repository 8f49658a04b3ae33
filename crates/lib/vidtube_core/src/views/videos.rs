//! Video views: public listing/search, single video, watch history, liked
//! videos.
//!
//! Every query here is read-only composition: filter, sort, join owner
//! profile, derive like counts and per-actor flags, paginate. The acting
//! identity is always bind parameter `$1` (NULL when anonymous) so derived
//! flags come back false for unauthenticated requests.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::pipeline::{order_by, Page, PageRequest, SortDirection, SortField};
use crate::error::Error;
use crate::models::{OwnerProfile, VideoView};

/// Enumerated filter stages for the video listing.
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    /// Keyword match against title and description.
    pub text: Option<String>,
    /// Restrict to a single owner (channel).
    pub owner: Option<Uuid>,
    /// Owner's own management view includes unpublished videos; every
    /// public view filters them out.
    pub include_unpublished: bool,
}

/// Flat row shape shared by all video views; mapped into the nested
/// [`VideoView`] wire shape.
#[derive(sqlx::FromRow)]
pub(super) struct VideoViewRow {
    id: Uuid,
    title: String,
    description: String,
    video_url: String,
    thumbnail_url: String,
    duration_secs: f64,
    views: i64,
    is_published: bool,
    created_at: DateTime<Utc>,
    owner_id: Uuid,
    owner_username: String,
    owner_full_name: String,
    owner_avatar_url: String,
    like_count: i64,
    is_liked: bool,
}

impl From<VideoViewRow> for VideoView {
    fn from(r: VideoViewRow) -> Self {
        VideoView {
            id: r.id,
            title: r.title,
            description: r.description,
            video_url: r.video_url,
            thumbnail_url: r.thumbnail_url,
            duration_secs: r.duration_secs,
            views: r.views,
            is_published: r.is_published,
            created_at: r.created_at,
            owner: OwnerProfile {
                id: r.owner_id,
                username: r.owner_username,
                full_name: r.owner_full_name,
                avatar_url: r.owner_avatar_url,
            },
            like_count: r.like_count,
            is_liked: r.is_liked,
        }
    }
}

/// Columns every video view selects; expects `videos v` joined to
/// `identities i` and the actor bound at `$1`.
pub(super) const VIDEO_VIEW_COLUMNS: &str = "v.id, v.title, v.description, v.video_url, v.thumbnail_url, \
     v.duration_secs, v.views, v.is_published, v.created_at, \
     i.id AS owner_id, i.username AS owner_username, i.full_name AS owner_full_name, \
     i.avatar_url AS owner_avatar_url, \
     (SELECT COUNT(*) FROM likes l WHERE l.video_id = v.id) AS like_count, \
     EXISTS(SELECT 1 FROM likes l WHERE l.video_id = v.id AND l.liked_by = $1) AS is_liked";

/// Paginated video listing: filter → sort → owner join → derive → paginate.
pub async fn list_videos(
    pool: &PgPool,
    filter: &VideoFilter,
    sort_field: SortField,
    sort_direction: SortDirection,
    request: PageRequest,
    actor: Option<Uuid>,
) -> Result<Page<VideoView>, Error> {
    let total_items = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM videos v \
         WHERE ($1::uuid IS NULL OR v.owner_id = $1) \
           AND ($2 OR v.is_published) \
           AND ($3::text IS NULL OR v.title ILIKE '%' || $3 || '%' \
                OR v.description ILIKE '%' || $3 || '%')",
    )
    .bind(filter.owner)
    .bind(filter.include_unpublished)
    .bind(filter.text.as_deref())
    .fetch_one(pool)
    .await?;

    let sql = format!(
        "SELECT {VIDEO_VIEW_COLUMNS} \
         FROM videos v JOIN identities i ON i.id = v.owner_id \
         WHERE ($2::uuid IS NULL OR v.owner_id = $2) \
           AND ($3 OR v.is_published) \
           AND ($4::text IS NULL OR v.title ILIKE '%' || $4 || '%' \
                OR v.description ILIKE '%' || $4 || '%') \
         {} LIMIT $5 OFFSET $6",
        order_by(sort_field, sort_direction),
    );
    let rows = sqlx::query_as::<_, VideoViewRow>(&sql)
        .bind(actor)
        .bind(filter.owner)
        .bind(filter.include_unpublished)
        .bind(filter.text.as_deref())
        .bind(request.limit)
        .bind(request.offset())
        .fetch_all(pool)
        .await?;

    Ok(Page::new(
        rows.into_iter().map(VideoView::from).collect(),
        total_items,
        request,
    ))
}

/// Single video with owner profile and per-actor flags. Unpublished videos
/// are visible only to their owner.
pub async fn get_video(
    pool: &PgPool,
    video_id: Uuid,
    actor: Option<Uuid>,
) -> Result<VideoView, Error> {
    let sql = format!(
        "SELECT {VIDEO_VIEW_COLUMNS} \
         FROM videos v JOIN identities i ON i.id = v.owner_id \
         WHERE v.id = $2 AND (v.is_published OR v.owner_id = $1)",
    );
    let row = sqlx::query_as::<_, VideoViewRow>(&sql)
        .bind(actor)
        .bind(video_id)
        .fetch_optional(pool)
        .await?;
    row.map(VideoView::from)
        .ok_or_else(|| Error::NotFound("video not found".into()))
}

/// The actor's watch history, most recently watched first. History entries
/// whose video has been deleted are silently omitted (inner join).
pub async fn watch_history(pool: &PgPool, actor: Uuid) -> Result<Vec<VideoView>, Error> {
    let sql = format!(
        "SELECT {VIDEO_VIEW_COLUMNS} \
         FROM watch_history h \
         JOIN videos v ON v.id = h.video_id \
         JOIN identities i ON i.id = v.owner_id \
         WHERE h.identity_id = $1 \
         ORDER BY h.watched_at DESC",
    );
    let rows = sqlx::query_as::<_, VideoViewRow>(&sql)
        .bind(actor)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(VideoView::from).collect())
}

/// Videos the actor has liked, newest like first.
pub async fn liked_videos(pool: &PgPool, actor: Uuid) -> Result<Vec<VideoView>, Error> {
    let sql = format!(
        "SELECT {VIDEO_VIEW_COLUMNS} \
         FROM likes lk \
         JOIN videos v ON v.id = lk.video_id \
         JOIN identities i ON i.id = v.owner_id \
         WHERE lk.liked_by = $1 \
         ORDER BY lk.created_at DESC, v.id DESC",
    );
    let rows = sqlx::query_as::<_, VideoViewRow>(&sql)
        .bind(actor)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(VideoView::from).collect())
}
