use super::actions::Action;
use crate::library::Track;
use crate::lyrics::LyricsError;
use crate::player::MediaEvent;
use std::sync::Arc;

/// Everything the event loop reacts to.
#[derive(Debug)]
pub enum Event {
    Input(Action),
    Media(MediaEvent),
    Lyrics(LyricsEvent),
}

#[derive(Debug)]
pub enum LyricsEvent {
    /// A lookup for `track` resolved.
    Fetched {
        track: Arc<Track>,
        outcome: Result<Option<String>, LyricsError>,
    },
    /// The inter-request delay after the last lookup has elapsed.
    CooledDown,
}
