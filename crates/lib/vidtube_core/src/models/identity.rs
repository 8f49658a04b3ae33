//! Identity records and their public projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full identity row. Never serialized to the API — `password_hash` and
/// `refresh_token_hash` stay inside the core.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub avatar_public_id: String,
    pub cover_image_url: Option<String>,
    pub cover_image_public_id: Option<String>,
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of an identity (what `current-user` and register return).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for IdentityProfile {
    fn from(i: Identity) -> Self {
        Self {
            id: i.id,
            username: i.username,
            email: i.email,
            full_name: i.full_name,
            avatar_url: i.avatar_url,
            cover_image_url: i.cover_image_url,
            created_at: i.created_at,
        }
    }
}

/// Minimal owner fields joined into video/comment views.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}
