//! Playback: the media backend seam, the state machine and context resolution.

pub mod mpv;
pub mod resolver;
pub mod state;

use crate::app::events::Event;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub use mpv::MpvHandle;
pub use state::{EndAction, PlayState, Playback, RepeatMode};

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("media backend rejected play: {0}")]
    Rejected(String),

    #[error("no track loaded")]
    NoTrack,

    #[error("media backend: {0}")]
    Backend(String),
}

/// What the media layer reports, independent of the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Playing,
    Paused,
    Position { secs: f64 },
    Metadata { duration: f64 },
    Ended,
    Error(String),
}

/// Imperative commands to an independently clocked audio engine.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn load(&self, url: &str) -> Result<(), PlaybackError>;
    async fn play(&self) -> Result<(), PlaybackError>;
    async fn pause(&self) -> Result<(), PlaybackError>;
    async fn seek(&self, secs: f64) -> Result<(), PlaybackError>;
    async fn set_volume(&self, volume: u8) -> Result<(), PlaybackError>;
}

/// Accepts every command and echoes play/pause back as events.
/// Used when mpv is unavailable.
#[derive(Debug, Clone)]
pub struct NullBackend {
    event_tx: mpsc::Sender<Event>,
}

impl NullBackend {
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self { event_tx }
    }

    async fn emit(&self, ev: MediaEvent) {
        let _ = self.event_tx.send(Event::Media(ev)).await;
    }
}

#[async_trait]
impl MediaBackend for NullBackend {
    async fn load(&self, _url: &str) -> Result<(), PlaybackError> {
        Ok(())
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        self.emit(MediaEvent::Playing).await;
        Ok(())
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        self.emit(MediaEvent::Paused).await;
        Ok(())
    }

    async fn seek(&self, secs: f64) -> Result<(), PlaybackError> {
        self.emit(MediaEvent::Position { secs }).await;
        Ok(())
    }

    async fn set_volume(&self, _volume: u8) -> Result<(), PlaybackError> {
        Ok(())
    }
}
