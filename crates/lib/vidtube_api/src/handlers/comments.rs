//! Comment request handlers.

use axum::extract::{Path, State};
use axum::Extension;
use serde::Deserialize;
use serde_json::json;
use vidtube_core::comments as comment_store;
use vidtube_core::models::Comment;
use vidtube_core::views::comments::{video_comments, CommentView};
use vidtube_core::views::{Page, PageRequest};

use super::parse_id;
use crate::error::ApiResult;
use crate::extract::{Json, Query};
use crate::middleware::session::{CurrentIdentity, MaybeIdentity};
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CommentListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// `GET /api/v1/comments/{videoId}` — comments on a video, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(MaybeIdentity(claims)): Extension<MaybeIdentity>,
    Path(video_id): Path<String>,
    Query(params): Query<CommentListParams>,
) -> ApiResult<ApiResponse<Page<CommentView>>> {
    let video_id = parse_id(&video_id, "video")?;
    let page = video_comments(
        &state.pool,
        video_id,
        PageRequest::from_raw(params.page.as_deref(), params.limit.as_deref()),
        claims.map(|c| c.sub),
    )
    .await?;
    Ok(ApiResponse::ok(page, "Comments fetched successfully"))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// `POST /api/v1/comments/{videoId}` — add a comment to a video.
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(video_id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<ApiResponse<Comment>> {
    let video_id = parse_id(&video_id, "video")?;
    let comment =
        comment_store::create_comment(&state.pool, video_id, claims.sub, &body.content).await?;
    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

/// `PATCH /api/v1/comments/c/{id}` — edit a comment (ownership-gated).
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment_id = parse_id(&id, "comment")?;
    let comment =
        comment_store::update_comment(&state.pool, comment_id, claims.sub, &body.content).await?;
    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

/// `DELETE /api/v1/comments/c/{id}` — delete a comment (ownership-gated).
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let comment_id = parse_id(&id, "comment")?;
    comment_store::delete_comment(&state.pool, comment_id, claims.sub).await?;
    Ok(ApiResponse::ok(json!({}), "Comment deleted successfully"))
}
