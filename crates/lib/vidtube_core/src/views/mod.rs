//! Derived-view composition engine.
//!
//! Read-only views are built as an ordered pipeline: filter stages, a sort
//! stage with a stable id tiebreak, join stages attaching related entities,
//! a derive stage computing counts and per-actor relationship flags, and a
//! pagination stage. Counts and flags are always computed at read time,
//! never stored.

pub mod channels;
pub mod comments;
pub mod pipeline;
pub mod playlists;
pub mod videos;

pub use pipeline::{Page, PageRequest, SortDirection, SortField};
