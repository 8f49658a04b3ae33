//! Playlist request handlers.

use axum::extract::{Path, State};
use axum::Extension;
use serde::Deserialize;
use serde_json::json;
use vidtube_core::models::{Playlist, PlaylistView};
use vidtube_core::playlists as playlist_store;
use vidtube_core::views::playlists::{get_playlist, user_playlists};

use super::parse_id;
use crate::error::ApiResult;
use crate::extract::Json;
use crate::middleware::session::{CurrentIdentity, MaybeIdentity};
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PlaylistRequest {
    pub name: String,
    pub description: String,
}

/// `POST /api/v1/playlists` — create a playlist.
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Json(body): Json<PlaylistRequest>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist =
        playlist_store::create_playlist(&state.pool, claims.sub, &body.name, &body.description)
            .await?;
    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

/// `GET /api/v1/playlists/{id}` — a playlist with its resolved videos.
/// Unpublished entries are visible only to their owner; dangling entries
/// are omitted.
pub async fn get(
    State(state): State<AppState>,
    Extension(MaybeIdentity(claims)): Extension<MaybeIdentity>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<PlaylistView>> {
    let playlist_id = parse_id(&id, "playlist")?;
    let view = get_playlist(&state.pool, playlist_id, claims.map(|c| c.sub)).await?;
    Ok(ApiResponse::ok(view, "Playlist fetched successfully"))
}

/// `PATCH /api/v1/playlists/{id}` — rename a playlist (ownership-gated).
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(id): Path<String>,
    Json(body): Json<PlaylistRequest>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist_id = parse_id(&id, "playlist")?;
    let playlist = playlist_store::update_playlist(
        &state.pool,
        playlist_id,
        claims.sub,
        &body.name,
        &body.description,
    )
    .await?;
    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

/// `DELETE /api/v1/playlists/{id}` — delete a playlist (ownership-gated).
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let playlist_id = parse_id(&id, "playlist")?;
    playlist_store::delete_playlist(&state.pool, playlist_id, claims.sub).await?;
    Ok(ApiResponse::ok(json!({}), "Playlist deleted successfully"))
}

/// `PATCH /api/v1/playlists/add/{videoId}/{playlistId}` — append a video
/// to a playlist (ownership-gated, idempotent).
pub async fn add_video(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let video_id = parse_id(&video_id, "video")?;
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    playlist_store::add_video(&state.pool, playlist_id, video_id, claims.sub).await?;
    Ok(ApiResponse::ok(
        json!({}),
        "Video added to playlist successfully",
    ))
}

/// `PATCH /api/v1/playlists/remove/{videoId}/{playlistId}` — remove a
/// video from a playlist (ownership-gated).
pub async fn remove_video(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let video_id = parse_id(&video_id, "video")?;
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    playlist_store::remove_video(&state.pool, playlist_id, video_id, claims.sub).await?;
    Ok(ApiResponse::ok(
        json!({}),
        "Video removed from playlist successfully",
    ))
}

/// `GET /api/v1/playlists/user/{userId}` — the playlists owned by an
/// identity.
pub async fn for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<Playlist>>> {
    let user_id = parse_id(&user_id, "user")?;
    let playlists = user_playlists(&state.pool, user_id).await?;
    Ok(ApiResponse::ok(playlists, "Playlists fetched successfully"))
}
