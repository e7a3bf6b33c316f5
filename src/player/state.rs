use super::PlaybackError;
use crate::library::Track;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::Off => "Repeat: Off",
            RepeatMode::One => "Repeat: One",
            RepeatMode::All => "Repeat: All",
        }
    }
}

/// `Starting` is a play command that the backend has not confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Idle,
    Paused,
    Starting,
    Playing,
}

/// What to do when the media layer reports the end of the active track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndAction {
    /// Same track from 0.
    Restart,
    /// Ask the resolver for the next track.
    Advance,
    /// Back to the first displayed track.
    WrapToFirst,
    /// Pause at position 0.
    Stop,
}

/// The active track and everything the media layer reports about it.
#[derive(Debug, Clone)]
pub struct Playback {
    current: Option<Arc<Track>>,
    loaded_url: Option<String>,
    state: PlayState,
    pub position: f64,
    pub duration: f64,
    pub volume: u8,
    pub repeat: RepeatMode,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(70, RepeatMode::Off)
    }
}

impl Playback {
    pub fn new(volume: u8, repeat: RepeatMode) -> Self {
        Self {
            current: None,
            loaded_url: None,
            state: PlayState::Idle,
            position: 0.0,
            duration: 0.0,
            volume: volume.min(100),
            repeat,
        }
    }

    pub fn current(&self) -> Option<&Arc<Track>> {
        self.current.as_ref()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref().map(|t| t.id.as_str())
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlayState::Playing | PlayState::Starting)
    }

    /// Make `track` active. Returns true when the backend source must be
    /// swapped, i.e. the audio locator differs from what is loaded.
    pub fn load(&mut self, track: Arc<Track>) -> bool {
        let swap = self.loaded_url.as_deref() != Some(track.audio_url.as_str());
        if swap {
            self.loaded_url = Some(track.audio_url.clone());
            self.position = 0.0;
            self.duration = track.duration;
        }
        self.current = Some(track);
        if self.state != PlayState::Starting {
            self.state = PlayState::Paused;
        }
        swap
    }

    /// Returns `Ok(true)` when a play command should go to the backend.
    /// A play that is already pending or running is not issued again.
    pub fn begin_play(&mut self) -> Result<bool, PlaybackError> {
        match self.state {
            PlayState::Idle => Err(PlaybackError::NoTrack),
            PlayState::Starting | PlayState::Playing => Ok(false),
            PlayState::Paused => {
                self.state = PlayState::Starting;
                Ok(true)
            }
        }
    }

    pub fn confirm_playing(&mut self) {
        if self.state != PlayState::Idle {
            self.state = PlayState::Playing;
        }
    }

    /// The backend refused to start; never stay "playing".
    pub fn reject_play(&mut self) {
        if self.state != PlayState::Idle {
            self.state = PlayState::Paused;
        }
    }

    /// Returns true when something was playing or about to.
    pub fn pause(&mut self) -> bool {
        if self.is_playing() {
            self.state = PlayState::Paused;
            true
        } else {
            false
        }
    }

    /// Clamp to `[0, duration]`; `None` without an active track or for a
    /// non-finite target.
    pub fn seek(&mut self, secs: f64) -> Option<f64> {
        if self.state == PlayState::Idle || !secs.is_finite() {
            return None;
        }
        let target = secs.clamp(0.0, self.duration.max(0.0));
        self.position = target;
        Some(target)
    }

    pub fn seek_percent(&mut self, percent: f64) -> Option<f64> {
        if !percent.is_finite() {
            return None;
        }
        let pct = percent.clamp(0.0, 100.0);
        self.seek(self.duration * pct / 100.0)
    }

    pub fn on_position(&mut self, secs: f64) {
        if self.state != PlayState::Idle && secs.is_finite() {
            self.position = secs.max(0.0);
        }
    }

    /// Record the real duration. Returns true when the stored track had none
    /// and needs a one-time backfill.
    pub fn on_metadata(&mut self, duration: f64) -> bool {
        if self.state == PlayState::Idle || duration <= 0.0 {
            return false;
        }
        self.duration = duration;
        self.current.as_ref().is_some_and(|t| t.duration <= 0.0)
    }

    pub fn on_ended(&mut self) {
        if self.is_playing() {
            self.state = PlayState::Paused;
        }
        self.position = self.duration;
    }

    /// Paused at 0, track stays loaded.
    pub fn stop(&mut self) {
        if self.state != PlayState::Idle {
            self.state = PlayState::Paused;
            self.position = 0.0;
        }
    }

    /// Back to Idle with no active track.
    pub fn clear(&mut self) {
        self.current = None;
        self.loaded_url = None;
        self.state = PlayState::Idle;
        self.position = 0.0;
        self.duration = 0.0;
    }

    pub fn toggle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.next();
        self.repeat
    }

    /// Swap in a newer copy of the active track, if it is the same id.
    pub fn replace_current(&mut self, track: &Arc<Track>) -> bool {
        match &self.current {
            Some(cur) if cur.id == track.id => {
                self.current = Some(track.clone());
                true
            }
            _ => false,
        }
    }

    pub fn set_volume(&mut self, volume: i32) -> u8 {
        self.volume = volume.clamp(0, 100) as u8;
        self.volume
    }

    pub fn adjust_volume(&mut self, delta: i32) -> u8 {
        self.set_volume(i32::from(self.volume) + delta)
    }
}
