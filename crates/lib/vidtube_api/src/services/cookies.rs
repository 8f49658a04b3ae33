//! Cookie service — set/get/clear httpOnly auth cookies.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;
use vidtube_core::auth::jwt::{ACCESS_TOKEN_EXPIRY_SECS, REFRESH_TOKEN_EXPIRY_DAYS};

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

fn build(name: &str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(max_age)
        .build()
}

/// httpOnly cookie carrying the access token (15 minutes).
pub fn access_cookie(token: &str, secure: bool) -> Cookie<'static> {
    build(
        ACCESS_COOKIE,
        token.to_string(),
        Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS),
        secure,
    )
}

/// httpOnly cookie carrying the refresh token (30 days).
pub fn refresh_cookie(token: &str, secure: bool) -> Cookie<'static> {
    build(
        REFRESH_COOKIE,
        token.to_string(),
        Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
        secure,
    )
}

/// Expired cookie clearing the access token.
pub fn clear_access_cookie(secure: bool) -> Cookie<'static> {
    build(ACCESS_COOKIE, String::new(), Duration::ZERO, secure)
}

/// Expired cookie clearing the refresh token.
pub fn clear_refresh_cookie(secure: bool) -> Cookie<'static> {
    build(REFRESH_COOKIE, String::new(), Duration::ZERO, secure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_cookies_are_http_only() {
        let cookie = access_cookie("tok", true);
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_refresh_cookie(false);
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.value(), "");
    }
}
