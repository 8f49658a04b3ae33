//! # vidtube_api
//!
//! HTTP API library for VidTube.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod services;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use vidtube_core::auth::TokenSecrets;
use vidtube_core::media::BlobStore;

use crate::config::ApiConfig;
use crate::handlers::{
    comments, healthcheck, likes, playlists, subscriptions, users, videos,
};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Token signing secrets.
    pub secrets: TokenSecrets,
    /// Media blob store.
    pub blob_store: Arc<dyn BlobStore>,
}

/// Run embedded database migrations.
///
/// Delegates to `vidtube_core::migrate::migrate()` which owns the migration
/// files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    vidtube_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = match state.config.cors_origin.as_str() {
        "*" => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        origin => {
            let origin = origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("*"));
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any)
                .allow_credentials(false)
        }
    };

    // Public routes (no session required)
    let public = Router::new()
        .route("/healthcheck", get(healthcheck::healthcheck))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/refresh-token", post(users::refresh_token))
        .route("/subscriptions/c/{channelId}", get(subscriptions::subscribers))
        .route("/subscriptions/u/{subscriberId}", get(subscriptions::channels))
        .route("/playlists/user/{userId}", get(playlists::for_user));

    // Viewer routes: anonymous allowed, per-actor flags when a valid
    // session is presented
    let viewer = Router::new()
        .route("/users/c/{username}", get(users::channel_profile))
        .route("/videos", get(videos::list))
        .route("/videos/{id}", get(videos::get))
        .route("/comments/{videoId}", get(comments::list))
        .route("/playlists/{id}", get(playlists::get))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session::optional_session,
        ));

    // Protected routes (require a session)
    let protected = Router::new()
        .route("/users/logout", post(users::logout))
        .route("/users/change-password", post(users::change_password))
        .route("/users/current-user", get(users::current_user))
        .route("/users/update-account", patch(users::update_account))
        .route("/users/avatar", patch(users::update_avatar))
        .route("/users/cover-image", patch(users::update_cover_image))
        .route("/users/history", get(users::watch_history))
        .route("/videos", post(videos::publish))
        .route("/videos/{id}", patch(videos::update))
        .route("/videos/{id}", delete(videos::delete))
        .route("/videos/toggle/publish/{id}", patch(videos::toggle_publish))
        .route("/comments/{videoId}", post(comments::create))
        .route("/comments/c/{id}", patch(comments::update))
        .route("/comments/c/{id}", delete(comments::delete))
        .route("/likes/toggle/v/{videoId}", post(likes::toggle_video))
        .route("/likes/toggle/c/{commentId}", post(likes::toggle_comment))
        .route("/likes/videos", get(likes::videos))
        .route("/subscriptions/c/{channelId}", post(subscriptions::toggle))
        .route("/playlists", post(playlists::create))
        .route("/playlists/{id}", patch(playlists::update))
        .route("/playlists/{id}", delete(playlists::delete))
        .route(
            "/playlists/add/{videoId}/{playlistId}",
            patch(playlists::add_video),
        )
        .route(
            "/playlists/remove/{videoId}/{playlistId}",
            patch(playlists::remove_video),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session::require_session,
        ));

    let api = Router::new().merge(public).merge(viewer).merge(protected);

    Router::new()
        .nest("/api/v1", api)
        .layer(cors)
        .with_state(state)
}
