//! Local-first music player core.
//!
//! Playback and queue orchestration plus a background, rate-limited lyrics
//! pipeline. Storage backends, the media element and the lyrics service are
//! collaborators reached through the traits in [`storage`], [`player`] and
//! [`lyrics`].

pub mod app;
pub mod config;
pub mod error;
pub mod input;
pub mod library;
pub mod lyrics;
pub mod notify;
pub mod player;
pub mod queue;
pub mod storage;

pub use error::{Error, Result};
