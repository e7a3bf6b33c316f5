//! Crate-wide error type.
//!
//! Each subsystem has its own `thiserror` enum ([`StorageError`],
//! [`LyricsError`], [`PlaybackError`]); [`Error`] aggregates them for callers
//! that do not care which boundary failed. The binary wraps everything in
//! `anyhow`.

pub use crate::lyrics::LyricsError;
pub use crate::player::PlaybackError;
pub use crate::storage::StorageError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("lyrics: {0}")]
    Lyrics(#[from] LyricsError),

    #[error("playback: {0}")]
    Playback(#[from] PlaybackError),

    /// A track id that is no longer part of the library.
    #[error("track {0} no longer exists")]
    StaleReference(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_reference_names_the_track() {
        let e = Error::StaleReference("abc".into());
        assert_eq!(e.to_string(), "track abc no longer exists");
    }

    #[test]
    fn display_names_the_boundary() {
        let e = Error::from(StorageError::UnknownTrack("t1".into()));
        assert_eq!(e.to_string(), "storage: unknown track t1");
    }
}
