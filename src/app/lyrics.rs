//! The lyrics pipeline as seen from the event loop.
//!
//! One lookup at a time: `pump_lyrics` claims the backlog head and spawns the
//! fetch, the result comes back as [`LyricsEvent::Fetched`], and a timer
//! posts [`LyricsEvent::CooledDown`] once the request delay has passed. Only
//! then is the head released and the next one claimed.

use super::App;
use super::events::{Event, LyricsEvent};
use crate::library::{LyricsStatus, Track, TrackPatch};
use crate::lyrics::{LyricsError, ParsedLyrics};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Parsed lyrics of the active track and the synced line last shown.
pub(crate) struct LyricsFollow {
    track: Arc<Track>,
    parsed: ParsedLyrics,
    shown: Option<usize>,
}

impl LyricsFollow {
    fn new(track: Arc<Track>) -> Self {
        let parsed = track
            .lyrics
            .as_deref()
            .map(ParsedLyrics::parse)
            .unwrap_or_default();
        Self {
            track,
            parsed,
            shown: None,
        }
    }
}

impl App {
    pub(crate) fn pump_lyrics(&mut self, tx: &mpsc::Sender<Event>) {
        let session = &self.session;
        let Some(track) = self.lyrics_queue.next_job(|id| session.contains(id)) else {
            return;
        };
        tracing::debug!(track_id = %track.id, "fetching lyrics");
        let fetcher = self.fetcher.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = fetcher.fetch_lyrics(&track).await;
            let _ = tx
                .send(Event::Lyrics(LyricsEvent::Fetched { track, outcome }))
                .await;
        });
    }

    pub(crate) fn handle_lyrics(&mut self, ev: LyricsEvent, tx: &mpsc::Sender<Event>) {
        match ev {
            LyricsEvent::Fetched { track, outcome } => {
                self.apply_lyrics_outcome(&track, outcome);
                let delay = self.cfg.lyrics.request_delay();
                let tx = tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Event::Lyrics(LyricsEvent::CooledDown)).await;
                });
            }
            LyricsEvent::CooledDown => {
                self.lyrics_queue.finish();
                self.pump_lyrics(tx);
            }
        }
    }

    /// Write back one lookup result. A track removed while its lookup was in
    /// flight is left alone.
    fn apply_lyrics_outcome(
        &mut self,
        track: &Arc<Track>,
        outcome: Result<Option<String>, LyricsError>,
    ) {
        if let Err(e) = self.session.require(&track.id) {
            tracing::debug!("discarding lyrics result: {e}");
            return;
        }
        let id = Some(track.id.clone());
        match outcome {
            Ok(Some(text)) => {
                self.write_track(&track.id, TrackPatch::lyrics_found(text));
                self.notifications
                    .success(format!("Lyrics fetched for \"{}\"", track.title), id);
            }
            Ok(None) => {
                self.write_track(&track.id, TrackPatch::status(LyricsStatus::Failed));
                self.notifications
                    .error(format!("Could not find lyrics for \"{}\"", track.title), id);
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::info!(track_id = %track.id, "lyrics lookup failed: {e}");
                } else {
                    tracing::warn!(track_id = %track.id, "lyrics lookup failed: {e}");
                }
                self.notifications
                    .error(format!("Error fetching lyrics for \"{}\"", track.title), id);
            }
        }
    }

    /// Show the synced line under the playhead whenever it changes. The
    /// lyrics are re-parsed only when the active track value changes.
    pub(crate) fn follow_lyrics(&mut self) {
        let Some(track) = self.session.playback.current().cloned() else {
            self.follow = None;
            return;
        };
        if self
            .follow
            .as_ref()
            .is_none_or(|f| !Arc::ptr_eq(&f.track, &track))
        {
            self.follow = Some(LyricsFollow::new(track));
        }
        let Some(follow) = self.follow.as_mut() else {
            return;
        };
        if !follow.parsed.is_synced() {
            return;
        }
        let position_ms = (self.session.playback.position * 1000.0) as u64;
        let index = follow.parsed.line_index_at(position_ms);
        if index == follow.shown {
            return;
        }
        follow.shown = index;
        if let Some(line) = follow.parsed.line_at(position_ms)
            && !line.text.is_empty()
        {
            self.status = format!("~ {}", line.text);
        }
    }

    /// Retry from an error notification: dismiss it, mark the track pending
    /// again and put it back at the tail of the backlog.
    pub(crate) fn retry_lyrics(&mut self, notification_id: u64, tx: &mpsc::Sender<Event>) {
        let Some(track_id) = self
            .notifications
            .get(notification_id)
            .filter(|n| n.is_retryable())
            .and_then(|n| n.track_id.clone())
        else {
            self.status = format!("Nothing to retry for #{notification_id}");
            return;
        };
        self.notifications.dismiss(notification_id);
        match self.write_track(&track_id, TrackPatch::status(LyricsStatus::Pending)) {
            Some(track) => {
                self.status = format!("Retrying lyrics for \"{}\"", track.title);
                self.lyrics_queue.enroll([track]);
                self.pump_lyrics(tx);
            }
            None => self.status = format!("Track {track_id} no longer exists"),
        }
    }

    /// Headless drain: same steps and pacing as the event loop, awaited inline.
    pub async fn drain_lyrics(&mut self) -> usize {
        let delay = self.cfg.lyrics.request_delay();
        let mut processed = 0;
        loop {
            let session = &self.session;
            let Some(track) = self.lyrics_queue.next_job(|id| session.contains(id)) else {
                break;
            };
            let outcome = self.fetcher.fetch_lyrics(&track).await;
            self.apply_lyrics_outcome(&track, outcome);
            processed += 1;
            tokio::time::sleep(delay).await;
            self.lyrics_queue.finish();
        }
        self.flush_writes().await;
        processed
    }
}
