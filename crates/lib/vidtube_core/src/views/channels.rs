//! Channel views: profile with subscription-derived fields, subscriber
//! lists, and subscribed-channel lists with per-row latest video.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Error;
use crate::models::OwnerProfile;

/// Channel profile: identity fields plus subscription-derived counts and
/// the requesting actor's relationship flag.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub subscriber_count: i64,
    pub channels_subscribed_to_count: i64,
    /// Whether the requesting actor subscribes to this channel; false when
    /// anonymous. Computed per request, never cached.
    pub is_subscribed: bool,
}

/// One row of a channel's subscriber list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSubscriber {
    pub subscriber: OwnerProfile,
    /// The subscriber's own subscriber count (nested derivation, computed
    /// in per-row scope).
    pub subscriber_count: i64,
    /// Whether the channel subscribes back to this subscriber.
    pub is_subscribed_back: bool,
}

/// One row of an identity's subscribed-channels list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannel {
    pub channel: OwnerProfile,
    pub subscriber_count: i64,
    /// The channel's most recent published video, absent when it has none.
    pub latest_video: Option<LatestVideo>,
}

/// Latest-video projection nested inside [`SubscribedChannel`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVideo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_secs: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

/// Look up a channel profile by handle (case-insensitive). `actor` drives
/// the `is_subscribed` flag.
pub async fn channel_profile(
    pool: &PgPool,
    username: &str,
    actor: Option<Uuid>,
) -> Result<ChannelProfile, Error> {
    let row = sqlx::query_as::<_, ChannelProfile>(
        "SELECT i.id, i.username, i.full_name, i.email, i.avatar_url, i.cover_image_url, \
           (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = i.id) AS subscriber_count, \
           (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = i.id) \
               AS channels_subscribed_to_count, \
           EXISTS(SELECT 1 FROM subscriptions s \
                  WHERE s.channel_id = i.id AND s.subscriber_id = $1) AS is_subscribed \
         FROM identities i WHERE i.username = lower($2)",
    )
    .bind(actor)
    .bind(username.trim())
    .fetch_optional(pool)
    .await?;
    row.ok_or_else(|| Error::NotFound("channel not found".into()))
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    username: String,
    full_name: String,
    avatar_url: String,
    subscriber_count: i64,
    is_subscribed_back: bool,
}

/// The subscriber list of a channel, newest subscription first.
pub async fn channel_subscribers(
    pool: &PgPool,
    channel_id: Uuid,
) -> Result<Vec<ChannelSubscriber>, Error> {
    let rows = sqlx::query_as::<_, SubscriberRow>(
        "SELECT i.id, i.username, i.full_name, i.avatar_url, \
           (SELECT COUNT(*) FROM subscriptions s2 WHERE s2.channel_id = i.id) \
               AS subscriber_count, \
           EXISTS(SELECT 1 FROM subscriptions s3 \
                  WHERE s3.subscriber_id = $1 AND s3.channel_id = i.id) AS is_subscribed_back \
         FROM subscriptions s \
         JOIN identities i ON i.id = s.subscriber_id \
         WHERE s.channel_id = $1 \
         ORDER BY s.created_at DESC, s.id DESC",
    )
    .bind(channel_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| ChannelSubscriber {
            subscriber: OwnerProfile {
                id: r.id,
                username: r.username,
                full_name: r.full_name,
                avatar_url: r.avatar_url,
            },
            subscriber_count: r.subscriber_count,
            is_subscribed_back: r.is_subscribed_back,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct SubscribedChannelRow {
    id: Uuid,
    username: String,
    full_name: String,
    avatar_url: String,
    subscriber_count: i64,
    video_id: Option<Uuid>,
    video_title: Option<String>,
    video_description: Option<String>,
    video_url: Option<String>,
    thumbnail_url: Option<String>,
    duration_secs: Option<f64>,
    video_views: Option<i64>,
    video_created_at: Option<DateTime<Utc>>,
}

/// The channels an identity subscribes to, each with its latest published
/// video. The latest-video derivation runs inside the per-row lateral
/// scope, not globally.
pub async fn subscribed_channels(
    pool: &PgPool,
    subscriber_id: Uuid,
) -> Result<Vec<SubscribedChannel>, Error> {
    let rows = sqlx::query_as::<_, SubscribedChannelRow>(
        "SELECT i.id, i.username, i.full_name, i.avatar_url, \
           (SELECT COUNT(*) FROM subscriptions s2 WHERE s2.channel_id = i.id) \
               AS subscriber_count, \
           lv.id AS video_id, lv.title AS video_title, lv.description AS video_description, \
           lv.video_url, lv.thumbnail_url, lv.duration_secs, \
           lv.views AS video_views, lv.created_at AS video_created_at \
         FROM subscriptions s \
         JOIN identities i ON i.id = s.channel_id \
         LEFT JOIN LATERAL ( \
             SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url, \
                    v.duration_secs, v.views, v.created_at \
             FROM videos v \
             WHERE v.owner_id = i.id AND v.is_published \
             ORDER BY v.created_at DESC, v.id DESC LIMIT 1 \
         ) lv ON TRUE \
         WHERE s.subscriber_id = $1 \
         ORDER BY s.created_at DESC, s.id DESC",
    )
    .bind(subscriber_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| SubscribedChannel {
            channel: OwnerProfile {
                id: r.id,
                username: r.username,
                full_name: r.full_name,
                avatar_url: r.avatar_url,
            },
            subscriber_count: r.subscriber_count,
            latest_video: match (r.video_id, r.video_created_at) {
                (Some(id), Some(created_at)) => Some(LatestVideo {
                    id,
                    title: r.video_title.unwrap_or_default(),
                    description: r.video_description.unwrap_or_default(),
                    video_url: r.video_url.unwrap_or_default(),
                    thumbnail_url: r.thumbnail_url.unwrap_or_default(),
                    duration_secs: r.duration_secs.unwrap_or_default(),
                    views: r.video_views.unwrap_or_default(),
                    created_at,
                }),
                _ => None,
            },
        })
        .collect())
}
