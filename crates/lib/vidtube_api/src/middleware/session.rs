//! Session guard — access-token extraction and verification.
//!
//! The token comes from the `accessToken` cookie or an
//! `Authorization: Bearer` header. On success the identity context from the
//! token's claims is inserted into request extensions; the guard never
//! touches the store.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use vidtube_core::auth::jwt::verify_access_token;
use vidtube_core::auth::AccessClaims;

use crate::error::ApiError;
use crate::services::cookies::ACCESS_COOKIE;
use crate::AppState;

/// Identity context attached by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub AccessClaims);

/// Identity context attached by [`optional_session`]; `None` when the
/// request is anonymous or carries an unverifiable token.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<AccessClaims>);

fn extract_token(jar: &CookieJar, request: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Some(cookie.value().to_string());
    }
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Reject the request unless a valid access token is presented.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&jar, &request).ok_or_else(ApiError::unauthenticated)?;
    let claims = verify_access_token(&token, state.secrets.access.as_bytes())
        .ok_or_else(ApiError::unauthenticated)?;
    request.extensions_mut().insert(CurrentIdentity(claims));
    Ok(next.run(request).await)
}

/// Attach the identity context when a valid token is presented, but let
/// anonymous requests through — used by views that compute per-actor
/// relationship flags (which must come back false when anonymous).
pub async fn optional_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = extract_token(&jar, &request)
        .and_then(|token| verify_access_token(&token, state.secrets.access.as_bytes()));
    request.extensions_mut().insert(MaybeIdentity(claims));
    next.run(request).await
}
