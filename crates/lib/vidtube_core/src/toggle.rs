//! Idempotent presence toggles for join records (likes, subscriptions).
//!
//! The naive check-then-act toggle lets two concurrent requests both create
//! a row. Instead the create path is a single atomic insert-if-absent
//! guarded by the (actor, target) uniqueness constraint; when the insert
//! affects zero rows the record already existed and the deletion branch
//! runs. Either way the caller gets exactly one definitive final state.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Error;
use crate::ids::uuidv7;

/// Final state reported by a toggle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToggleOutcome {
    pub active: bool,
}

/// Toggle a like on a video.
pub async fn toggle_video_like(
    pool: &PgPool,
    actor: Uuid,
    video_id: Uuid,
) -> Result<ToggleOutcome, Error> {
    let inserted = sqlx::query(
        "INSERT INTO likes (id, liked_by, video_id) VALUES ($1, $2, $3) \
         ON CONFLICT (liked_by, video_id) WHERE video_id IS NOT NULL DO NOTHING",
    )
    .bind(uuidv7())
    .bind(actor)
    .bind(video_id)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 1 {
        return Ok(ToggleOutcome { active: true });
    }
    sqlx::query("DELETE FROM likes WHERE liked_by = $1 AND video_id = $2")
        .bind(actor)
        .bind(video_id)
        .execute(pool)
        .await?;
    Ok(ToggleOutcome { active: false })
}

/// Toggle a like on a comment.
pub async fn toggle_comment_like(
    pool: &PgPool,
    actor: Uuid,
    comment_id: Uuid,
) -> Result<ToggleOutcome, Error> {
    let inserted = sqlx::query(
        "INSERT INTO likes (id, liked_by, comment_id) VALUES ($1, $2, $3) \
         ON CONFLICT (liked_by, comment_id) WHERE comment_id IS NOT NULL DO NOTHING",
    )
    .bind(uuidv7())
    .bind(actor)
    .bind(comment_id)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 1 {
        return Ok(ToggleOutcome { active: true });
    }
    sqlx::query("DELETE FROM likes WHERE liked_by = $1 AND comment_id = $2")
        .bind(actor)
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(ToggleOutcome { active: false })
}

/// Toggle a subscription to a channel. Unique on (subscriber, channel);
/// subscribing to yourself is rejected.
pub async fn toggle_subscription(
    pool: &PgPool,
    subscriber: Uuid,
    channel: Uuid,
) -> Result<ToggleOutcome, Error> {
    if subscriber == channel {
        return Err(Error::Validation(
            "cannot subscribe to your own channel".into(),
        ));
    }
    let inserted = sqlx::query(
        "INSERT INTO subscriptions (id, subscriber_id, channel_id) VALUES ($1, $2, $3) \
         ON CONFLICT (subscriber_id, channel_id) DO NOTHING",
    )
    .bind(uuidv7())
    .bind(subscriber)
    .bind(channel)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 1 {
        return Ok(ToggleOutcome { active: true });
    }
    sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
        .bind(subscriber)
        .bind(channel)
        .execute(pool)
        .await?;
    Ok(ToggleOutcome { active: false })
}
