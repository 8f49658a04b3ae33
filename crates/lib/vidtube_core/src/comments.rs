//! Comment mutations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::authz;
use crate::error::Error;
use crate::ids::uuidv7;
use crate::models::Comment;

const COMMENT_COLUMNS: &str = "id, video_id, owner_id, content, created_at, updated_at";

async fn classify_denied(pool: &PgPool, comment_id: Uuid, actor: Uuid) -> Error {
    match sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(pool)
        .await
    {
        Ok(Some(owner)) => authz::authorize_owner(owner, actor)
            .err()
            .unwrap_or_else(|| Error::NotFound("comment not found".into())),
        Ok(None) => Error::NotFound("comment not found".into()),
        Err(e) => e.into(),
    }
}

/// Add a comment to a video. An absent video surfaces as `NotFound` via the
/// foreign-key constraint.
pub async fn create_comment(
    pool: &PgPool,
    video_id: Uuid,
    actor: Uuid,
    content: &str,
) -> Result<Comment, Error> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::Validation("content is required".into()));
    }
    let row = sqlx::query_as::<_, Comment>(&format!(
        "INSERT INTO comments (id, video_id, owner_id, content) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {COMMENT_COLUMNS}",
    ))
    .bind(uuidv7())
    .bind(video_id)
    .bind(actor)
    .bind(content)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Update a comment's content (ownership-gated).
pub async fn update_comment(
    pool: &PgPool,
    comment_id: Uuid,
    actor: Uuid,
    content: &str,
) -> Result<Comment, Error> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::Validation("content is required".into()));
    }
    let row = sqlx::query_as::<_, Comment>(&format!(
        "UPDATE comments SET content = $3, updated_at = now() \
         WHERE id = $1 AND owner_id = $2 \
         RETURNING {COMMENT_COLUMNS}",
    ))
    .bind(comment_id)
    .bind(actor)
    .bind(content)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(c) => Ok(c),
        None => Err(classify_denied(pool, comment_id, actor).await),
    }
}

/// Delete a comment (ownership-gated). Its likes cascade.
pub async fn delete_comment(pool: &PgPool, comment_id: Uuid, actor: Uuid) -> Result<(), Error> {
    let deleted = sqlx::query("DELETE FROM comments WHERE id = $1 AND owner_id = $2")
        .bind(comment_id)
        .bind(actor)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 1 {
        Ok(())
    } else {
        Err(classify_denied(pool, comment_id, actor).await)
    }
}
