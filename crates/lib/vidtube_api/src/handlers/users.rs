//! Identity request handlers: registration, session lifecycle, profile
//! management, channel profiles, and watch history.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use vidtube_core::auth::{queries, tokens, TokenPair};
use vidtube_core::media::{delete_blob_best_effort, UploadSaga};
use vidtube_core::models::IdentityProfile;
use vidtube_core::views;
use vidtube_core::Error as CoreError;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Multipart};
use crate::middleware::session::{CurrentIdentity, MaybeIdentity};
use crate::response::ApiResponse;
use crate::services::cookies;
use crate::services::uploads::MultipartForm;
use crate::AppState;

/// `POST /api/v1/users/register` — create an identity from a multipart
/// form (`fullname`, `email`, `username`, `password`, `avatar` file,
/// optional `coverImage` file).
///
/// Uploads run inside a saga: if the record insert fails the uploaded
/// blobs are deleted, newest first, before the error is surfaced.
pub async fn register(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let form = MultipartForm::collect(multipart).await?;
    let fullname = form.require_text("fullname")?;
    let email = form.require_text("email")?;
    let username = form.require_text("username")?;
    let password = form.require_text("password")?;

    if !email.contains('@') {
        return Err(ApiError::validation("email is malformed"));
    }
    if password.len() < 8 {
        return Err(ApiError::validation(
            "password must be at least 8 characters",
        ));
    }

    if queries::identifier_taken(&state.pool, username, email).await? {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "username or email already taken",
        ));
    }

    let avatar_file = form.require_file("avatar")?;
    let mut saga = UploadSaga::new(state.blob_store.as_ref());
    let avatar = saga
        .upload(&avatar_file.filename, avatar_file.bytes.clone())
        .await?;
    let cover = match form.file("coverImage") {
        Some(f) => match saga.upload(&f.filename, f.bytes.clone()).await {
            Ok(blob) => Some(blob),
            Err(e) => {
                saga.abort().await;
                return Err(e.into());
            }
        },
        None => None,
    };

    let password_hash = match vidtube_core::auth::password::hash_password(password) {
        Ok(h) => h,
        Err(e) => {
            saga.abort().await;
            return Err(e.into());
        }
    };

    let created = queries::create_identity(
        &state.pool,
        username,
        email,
        fullname,
        &password_hash,
        &avatar.url,
        &avatar.public_id,
        cover.as_ref().map(|c| c.url.as_str()),
        cover.as_ref().map(|c| c.public_id.as_str()),
    )
    .await;

    match created {
        Ok(identity) => {
            saga.commit();
            info!(identity = %identity.id, "identity registered");
            let profile: IdentityProfile = identity.into();
            Ok(ApiResponse::created(profile, "User registered successfully").into_response())
        }
        Err(e) => {
            saga.abort().await;
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

impl LoginRequest {
    fn identifier(&self) -> Option<&str> {
        [&self.identifier, &self.username, &self.email]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

fn session_cookies(jar: CookieJar, pair: &TokenPair, secure: bool) -> CookieJar {
    jar.add(cookies::access_cookie(&pair.access_token, secure))
        .add(cookies::refresh_cookie(&pair.refresh_token, secure))
}

/// `POST /api/v1/users/login` — authenticate by handle or email and set the
/// session cookie pair.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Response> {
    let identifier = body
        .identifier()
        .ok_or_else(|| ApiError::validation("username or email is required"))?;

    let (profile, pair) =
        tokens::authenticate(&state.pool, identifier, &body.password, &state.secrets).await?;

    let jar = session_cookies(jar, &pair, state.config.secure_cookies);
    let data = json!({
        "user": profile,
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    });
    Ok((jar, ApiResponse::ok(data, "User logged in successfully")).into_response())
}

/// `POST /api/v1/users/logout` — revoke the refresh token and clear
/// cookies. Outstanding access tokens expire naturally.
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    jar: CookieJar,
) -> ApiResult<Response> {
    tokens::revoke(&state.pool, claims.sub).await?;
    let jar = jar
        .add(cookies::clear_access_cookie(state.config.secure_cookies))
        .add(cookies::clear_refresh_cookie(state.config.secure_cookies));
    Ok((
        jar,
        ApiResponse::ok(json!({}), "User logged out successfully"),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// `POST /api/v1/users/refresh-token` — single-use rotation. The token is
/// read from the `refreshToken` cookie or the request body.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<Response> {
    let presented = jar
        .get(cookies::REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or(CoreError::InvalidToken)
        .map_err(ApiError::from)?;

    let (_, pair) = tokens::rotate_refresh_token(&state.pool, &presented, &state.secrets).await?;

    let jar = session_cookies(jar, &pair, state.config.secure_cookies);
    let data = json!({
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    });
    Ok((jar, ApiResponse::ok(data, "Access token refreshed successfully")).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// `POST /api/v1/users/change-password` — verify the old password, store
/// the new hash. Existing access tokens stay valid until expiry.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    tokens::change_password(&state.pool, claims.sub, &body.old_password, &body.new_password)
        .await?;
    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

/// `GET /api/v1/users/current-user` — the acting identity's profile,
/// without credential or token fields.
pub async fn current_user(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
) -> ApiResult<ApiResponse<IdentityProfile>> {
    let identity = queries::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or(CoreError::NotFound("identity not found".into()))?;
    Ok(ApiResponse::ok(identity.into(), "Current user details"))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub fullname: String,
    pub email: String,
}

/// `PATCH /api/v1/users/update-account` — update display name and email.
pub async fn update_account(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Json(body): Json<UpdateAccountRequest>,
) -> ApiResult<ApiResponse<IdentityProfile>> {
    if body.fullname.trim().is_empty() || body.email.trim().is_empty() {
        return Err(ApiError::validation("fullname and email are required"));
    }
    let profile =
        queries::update_account(&state.pool, claims.sub, &body.fullname, &body.email).await?;
    Ok(ApiResponse::ok(profile, "Account details updated"))
}

async fn swap_profile_image(
    state: &AppState,
    actor: uuid::Uuid,
    multipart: Multipart,
    field: &str,
    is_avatar: bool,
) -> ApiResult<IdentityProfile> {
    let form = MultipartForm::collect(multipart).await?;
    let file = form.require_file(field)?;

    let mut saga = UploadSaga::new(state.blob_store.as_ref());
    let blob = saga.upload(&file.filename, file.bytes.clone()).await?;

    let swapped = if is_avatar {
        queries::swap_avatar(&state.pool, actor, &blob.url, &blob.public_id).await
    } else {
        queries::swap_cover_image(&state.pool, actor, &blob.url, &blob.public_id).await
    };

    match swapped {
        Ok((profile, old_public_id)) => {
            saga.commit();
            if let Some(old) = old_public_id {
                delete_blob_best_effort(state.blob_store.as_ref(), &old).await;
            }
            Ok(profile)
        }
        Err(e) => {
            saga.abort().await;
            Err(e.into())
        }
    }
}

/// `PATCH /api/v1/users/avatar` — replace the avatar; the old blob is
/// deleted once the swap has committed.
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    multipart: Multipart,
) -> ApiResult<ApiResponse<IdentityProfile>> {
    let profile = swap_profile_image(&state, claims.sub, multipart, "avatar", true).await?;
    Ok(ApiResponse::ok(profile, "Avatar updated successfully"))
}

/// `PATCH /api/v1/users/cover-image` — replace the cover image.
pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    multipart: Multipart,
) -> ApiResult<ApiResponse<IdentityProfile>> {
    let profile = swap_profile_image(&state, claims.sub, multipart, "coverImage", false).await?;
    Ok(ApiResponse::ok(profile, "Cover image updated successfully"))
}

/// `GET /api/v1/users/c/{username}` — channel profile with subscription
/// counts; `isSubscribed` reflects the acting identity, false when
/// anonymous.
pub async fn channel_profile(
    State(state): State<AppState>,
    Extension(MaybeIdentity(claims)): Extension<MaybeIdentity>,
    Path(username): Path<String>,
) -> ApiResult<ApiResponse<views::channels::ChannelProfile>> {
    if username.trim().is_empty() {
        return Err(ApiError::validation("username is missing"));
    }
    let actor = claims.map(|c| c.sub);
    let profile = views::channels::channel_profile(&state.pool, &username, actor).await?;
    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

/// `GET /api/v1/users/history` — the acting identity's watch history,
/// most recent first; deleted videos are omitted.
pub async fn watch_history(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
) -> ApiResult<ApiResponse<Vec<vidtube_core::models::VideoView>>> {
    let history = views::videos::watch_history(&state.pool, claims.sub).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}
