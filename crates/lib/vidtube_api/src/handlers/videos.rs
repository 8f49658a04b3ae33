//! Video request handlers.

use axum::extract::{Path, State};
use axum::Extension;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use vidtube_core::media::{delete_blob_best_effort, UploadSaga};
use vidtube_core::models::{Video, VideoView};
use vidtube_core::videos as video_store;
use vidtube_core::views::videos::{list_videos, VideoFilter};
use vidtube_core::views::{self, Page, PageRequest, SortDirection, SortField};

use super::parse_id;
use crate::error::ApiResult;
use crate::extract::{Multipart, Query};
use crate::middleware::session::{CurrentIdentity, MaybeIdentity};
use crate::response::ApiResponse;
use crate::services::uploads::MultipartForm;
use crate::AppState;

/// Listing query parameters. Page and limit arrive as raw strings so that
/// non-numeric input defaults instead of failing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

/// `GET /api/v1/videos` — paginated public listing/search. Unpublished
/// videos appear only when the requesting actor filters by their own id
/// (the management view).
pub async fn list(
    State(state): State<AppState>,
    Extension(MaybeIdentity(claims)): Extension<MaybeIdentity>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Page<VideoView>>> {
    let actor = claims.map(|c| c.sub);
    let owner = match params.user_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw, "user")?),
        _ => None,
    };
    let filter = VideoFilter {
        text: params
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string),
        owner,
        include_unpublished: owner.is_some() && owner == actor,
    };
    let page = list_videos(
        &state.pool,
        &filter,
        SortField::parse(params.sort_by.as_deref()),
        SortDirection::parse(params.sort_type.as_deref()),
        PageRequest::from_raw(params.page.as_deref(), params.limit.as_deref()),
        actor,
    )
    .await?;
    Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

/// `POST /api/v1/videos` — publish a video from a multipart form
/// (`title`, `description`, `videoFile`, `thumbnail`). The record starts
/// unpublished; a failed insert compensates the uploads.
pub async fn publish(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    multipart: Multipart,
) -> ApiResult<ApiResponse<Video>> {
    let form = MultipartForm::collect(multipart).await?;
    let title = form.require_text("title")?;
    let description = form.require_text("description")?;
    let video_file = form.require_file("videoFile")?;
    let thumbnail_file = form.require_file("thumbnail")?;

    let mut saga = UploadSaga::new(state.blob_store.as_ref());
    let video_blob = saga
        .upload(&video_file.filename, video_file.bytes.clone())
        .await?;
    let thumbnail_blob = match saga
        .upload(&thumbnail_file.filename, thumbnail_file.bytes.clone())
        .await
    {
        Ok(blob) => blob,
        Err(e) => {
            saga.abort().await;
            return Err(e.into());
        }
    };

    let duration = video_blob.duration_secs.unwrap_or(0.0);
    let created = video_store::create_video(
        &state.pool,
        claims.sub,
        title,
        description,
        &video_blob,
        &thumbnail_blob,
        duration,
    )
    .await;

    match created {
        Ok(video) => {
            saga.commit();
            info!(video = %video.id, owner = %video.owner_id, "video uploaded");
            Ok(ApiResponse::created(video, "Video uploaded successfully"))
        }
        Err(e) => {
            saga.abort().await;
            Err(e.into())
        }
    }
}

/// `GET /api/v1/videos/{id}` — single video with owner and engagement
/// fields. Records the view: bumps the counter and prepends the video to
/// an authenticated actor's watch history.
pub async fn get(
    State(state): State<AppState>,
    Extension(MaybeIdentity(claims)): Extension<MaybeIdentity>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<VideoView>> {
    let video_id = parse_id(&id, "video")?;
    let actor = claims.map(|c| c.sub);
    let view = views::videos::get_video(&state.pool, video_id, actor).await?;
    video_store::record_view(&state.pool, video_id, actor).await?;
    Ok(ApiResponse::ok(view, "Video fetched successfully"))
}

/// `PATCH /api/v1/videos/{id}` — update title and description from a
/// multipart form, with an optional replacement `thumbnail` file
/// (ownership-gated). A replaced thumbnail blob is deleted after the swap
/// commits.
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<ApiResponse<Video>> {
    let video_id = parse_id(&id, "video")?;
    let form = MultipartForm::collect(multipart).await?;
    let title = form.require_text("title")?;
    let description = form.require_text("description")?;

    let mut saga = UploadSaga::new(state.blob_store.as_ref());
    let thumbnail = match form.file("thumbnail") {
        Some(f) if !f.bytes.is_empty() => {
            Some(saga.upload(&f.filename, f.bytes.clone()).await?)
        }
        _ => None,
    };

    let updated = video_store::update_video(
        &state.pool,
        video_id,
        claims.sub,
        title,
        description,
        thumbnail.as_ref(),
    )
    .await;

    match updated {
        Ok((video, old_thumbnail)) => {
            saga.commit();
            if let Some(old) = old_thumbnail {
                delete_blob_best_effort(state.blob_store.as_ref(), &old).await;
            }
            Ok(ApiResponse::ok(video, "Video updated successfully"))
        }
        Err(e) => {
            saga.abort().await;
            Err(e.into())
        }
    }
}

/// `DELETE /api/v1/videos/{id}` — delete a video (ownership-gated). Likes
/// and comments cascade in the store; playlist entries and watch history
/// keep dangling references that read views tolerate. Media blobs are
/// deleted after the record is gone.
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let video_id = parse_id(&id, "video")?;
    let (video_public_id, thumbnail_public_id) =
        video_store::delete_video(&state.pool, video_id, claims.sub).await?;
    delete_blob_best_effort(state.blob_store.as_ref(), &video_public_id).await;
    delete_blob_best_effort(state.blob_store.as_ref(), &thumbnail_public_id).await;
    info!(video = %video_id, "video deleted");
    Ok(ApiResponse::ok(json!({}), "Video deleted successfully"))
}

/// `PATCH /api/v1/videos/toggle/publish/{id}` — flip the publication flag
/// (ownership-gated).
pub async fn toggle_publish(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let video_id = parse_id(&id, "video")?;
    let is_published = video_store::toggle_publish(&state.pool, video_id, claims.sub).await?;
    Ok(ApiResponse::ok(
        json!({ "isPublished": is_published }),
        "Video publish toggled successfully",
    ))
}
