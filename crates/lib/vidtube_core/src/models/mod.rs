//! Domain models.
//!
//! Internal records mirror table rows (`sqlx::FromRow`); the `*Profile` /
//! `*View` shapes are what crosses the API boundary (camelCase, secrets
//! stripped).

pub mod comment;
pub mod identity;
pub mod playlist;
pub mod video;

pub use comment::Comment;
pub use identity::{Identity, IdentityProfile, OwnerProfile};
pub use playlist::{Playlist, PlaylistView};
pub use video::{Video, VideoView};
