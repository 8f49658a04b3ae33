//! # vidtube_core
//!
//! Domain logic for the Vidtube backend: identity and session/token
//! lifecycle, ownership-gated mutations, race-free presence toggles, the
//! derived-view composition engine, and the blob-storage saga. HTTP
//! concerns live in `vidtube_api`.

pub mod auth;
pub mod authz;
pub mod comments;
pub mod error;
pub mod ids;
pub mod media;
pub mod migrate;
pub mod models;
pub mod playlists;
pub mod toggle;
pub mod videos;
pub mod views;

pub use error::Error;
