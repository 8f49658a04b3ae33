//! Request handlers.

pub mod comments;
pub mod healthcheck;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod users;
pub mod videos;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path id, reporting a validation error in the uniform envelope
/// instead of axum's bare rejection.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    raw.parse::<Uuid>()
        .map_err(|_| ApiError::validation(format!("invalid {what} id")))
}
