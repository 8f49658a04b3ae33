//! Like toggle handlers.

use axum::extract::{Path, State};
use axum::Extension;
use vidtube_core::models::VideoView;
use vidtube_core::toggle::{toggle_comment_like, toggle_video_like, ToggleOutcome};
use vidtube_core::views::videos::liked_videos;

use super::parse_id;
use crate::error::ApiResult;
use crate::middleware::session::CurrentIdentity;
use crate::response::ApiResponse;
use crate::AppState;

/// `POST /api/v1/likes/toggle/v/{videoId}` — like or unlike a video.
pub async fn toggle_video(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(video_id): Path<String>,
) -> ApiResult<ApiResponse<ToggleOutcome>> {
    let video_id = parse_id(&video_id, "video")?;
    let outcome = toggle_video_like(&state.pool, claims.sub, video_id).await?;
    let message = if outcome.active {
        "Video liked"
    } else {
        "Video unliked"
    };
    Ok(ApiResponse::ok(outcome, message))
}

/// `POST /api/v1/likes/toggle/c/{commentId}` — like or unlike a comment.
pub async fn toggle_comment(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(comment_id): Path<String>,
) -> ApiResult<ApiResponse<ToggleOutcome>> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let outcome = toggle_comment_like(&state.pool, claims.sub, comment_id).await?;
    let message = if outcome.active {
        "Comment liked"
    } else {
        "Comment unliked"
    };
    Ok(ApiResponse::ok(outcome, message))
}

/// `GET /api/v1/likes/videos` — the actor's liked videos, most recent
/// like first.
pub async fn videos(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
) -> ApiResult<ApiResponse<Vec<VideoView>>> {
    let videos = liked_videos(&state.pool, claims.sub).await?;
    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
