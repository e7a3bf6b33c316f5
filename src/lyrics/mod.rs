//! Lyrics lookup, LRC handling and the background fetch queue
//!
//! This module provides:
//! - LRCLIB API client with result ranking
//! - LRC format parser for synchronized display and plain-text fallback
//! - The serialized fetch backlog driven by the app event loop

pub mod lrclib;
pub mod parser;
pub mod queue;

use crate::library::Track;
use async_trait::async_trait;

pub use lrclib::LrclibClient;
pub use parser::ParsedLyrics;
pub use queue::LyricsFetchQueue;

#[derive(Debug, thiserror::Error)]
pub enum LyricsError {
    #[error("lyrics request timed out")]
    Timeout,

    #[error("lyrics request failed: {0}")]
    Network(String),

    #[error("lyrics service returned HTTP {0}")]
    Status(u16),

    #[error("could not decode lyrics response: {0}")]
    Decode(String),
}

impl LyricsError {
    pub fn is_transient(&self) -> bool {
        match self {
            LyricsError::Timeout | LyricsError::Network(_) => true,
            LyricsError::Status(code) => *code >= 500 || *code == 429,
            LyricsError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for LyricsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LyricsError::Timeout
        } else if e.is_decode() {
            LyricsError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            LyricsError::Status(status.as_u16())
        } else {
            LyricsError::Network(e.to_string())
        }
    }
}

/// Lyrics lookup for a single track.
///
/// `Ok(None)` means the service has nothing for this track; `Err` means the
/// lookup itself failed and may be retried.
#[async_trait]
pub trait LyricsFetcher: Send + Sync {
    async fn fetch_lyrics(&self, track: &Track) -> Result<Option<String>, LyricsError>;
}

#[async_trait]
impl LyricsFetcher for LrclibClient {
    async fn fetch_lyrics(&self, track: &Track) -> Result<Option<String>, LyricsError> {
        if !track.has_searchable_tags() {
            tracing::warn!(track_id = %track.id, "skipping lyrics lookup: missing title or artist");
            return Ok(None);
        }
        let results = self.search(&track.title, &track.artist).await?;
        Ok(lrclib::select_best(&results, track.duration).and_then(|r| r.lyrics_text()))
    }
}
