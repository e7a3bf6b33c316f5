use super::App;
use crate::library::{Track, TrackPatch};
use crate::player::{EndAction, MediaEvent};
use std::sync::Arc;

impl App {
    /// Make `track` active, swapping the backend source only when needed.
    pub(crate) async fn activate(&mut self, track: Arc<Track>, autoplay: bool) {
        let name = track.display_name();
        let url = track.audio_url.clone();
        if self.session.playback.load(track)
            && let Err(e) = self.media.load(&url).await
        {
            tracing::warn!("load {url}: {e}");
            // The backend still holds the previous source.
            self.session.playback.clear();
            self.status = format!("Could not load \"{name}\": {e}");
            return;
        }
        if autoplay {
            if self.play().await {
                self.status = format!("Playing: {name}");
            }
        } else {
            if let Err(e) = self.media.pause().await {
                tracing::warn!("pause: {e}");
            }
            self.status = format!("Loaded: {name}");
        }
    }

    /// Returns whether playback is running or starting afterwards.
    pub(crate) async fn play(&mut self) -> bool {
        match self.session.playback.begin_play() {
            Err(e) => {
                self.status = e.to_string();
                false
            }
            Ok(false) => true,
            Ok(true) => match self.media.play().await {
                Ok(()) => {
                    self.session.playback.confirm_playing();
                    true
                }
                Err(e) => {
                    self.session.playback.reject_play();
                    tracing::warn!("play rejected: {e}");
                    self.status = format!("Playback failed: {e}");
                    false
                }
            },
        }
    }

    pub(crate) async fn pause(&mut self) {
        if self.session.playback.pause() {
            if let Err(e) = self.media.pause().await {
                tracing::warn!("pause: {e}");
            }
            self.status = "Paused".into();
        }
    }

    pub(crate) async fn toggle_pause(&mut self) {
        if self.session.playback.is_playing() {
            self.pause().await;
        } else if self.play().await
            && let Some(t) = self.session.playback.current()
        {
            self.status = format!("Playing: {}", t.display_name());
        }
    }

    pub(crate) async fn play_displayed(&mut self, index: usize) {
        match self.session.displayed().get(index).cloned() {
            Some(t) => self.activate(t, true).await,
            None => self.status = format!("No track {}", index + 1),
        }
    }

    /// A queued track always starts playing; a context step keeps the
    /// current play/pause state.
    pub(crate) async fn next(&mut self) {
        let from_queue = !self.session.queue.is_empty();
        let was_playing = self.session.playback.is_playing();
        if let Some(t) = self.session.resolve_next() {
            self.activate(t, from_queue || was_playing).await;
        }
    }

    pub(crate) async fn prev(&mut self) {
        let was_playing = self.session.playback.is_playing();
        if let Some(t) = self.session.resolve_prev() {
            self.activate(t, was_playing).await;
        }
    }

    pub(crate) async fn play_from_queue(&mut self, index: usize) {
        match self.session.queue.remove_at(index) {
            Some(t) => self.activate(t, true).await,
            None => self.status = format!("No queue entry {}", index + 1),
        }
    }

    pub(crate) fn enqueue_displayed(&mut self, index: usize) {
        let Some(t) = self.session.displayed().get(index).cloned() else {
            self.status = format!("No track {}", index + 1);
            return;
        };
        let msg = format!("Added \"{}\" to queue", t.title);
        self.session.queue.enqueue(t);
        self.notifications.info(msg.clone());
        self.status = msg;
    }

    pub(crate) async fn seek_percent(&mut self, percent: f64) {
        if let Some(secs) = self.session.playback.seek_percent(percent) {
            self.send_seek(secs).await;
        }
    }

    pub(crate) async fn seek_relative(&mut self, delta: f64) {
        let target = self.session.playback.position + delta;
        if let Some(secs) = self.session.playback.seek(target) {
            self.send_seek(secs).await;
        }
    }

    async fn send_seek(&mut self, secs: f64) {
        if let Err(e) = self.media.seek(secs).await {
            tracing::warn!("seek: {e}");
        }
    }

    pub(crate) async fn apply_volume(&mut self, volume: u8) {
        if let Err(e) = self.media.set_volume(volume).await {
            tracing::warn!("set volume: {e}");
        }
        self.status = format!("Volume: {volume}");
    }

    pub(crate) async fn handle_media(&mut self, ev: MediaEvent) {
        match ev {
            MediaEvent::Playing => self.session.playback.confirm_playing(),
            MediaEvent::Paused => {
                self.session.playback.pause();
            }
            MediaEvent::Position { secs } => {
                self.session.playback.on_position(secs);
                self.follow_lyrics();
            }
            MediaEvent::Metadata { duration } => {
                if self.session.playback.on_metadata(duration)
                    && let Some(id) = self.session.playback.current_id().map(str::to_string)
                {
                    tracing::debug!(track_id = %id, duration, "backfilling track duration");
                    self.write_track(&id, TrackPatch::duration(duration));
                }
            }
            MediaEvent::Ended => self.on_track_ended().await,
            MediaEvent::Error(msg) => {
                self.session.playback.reject_play();
                tracing::warn!("media error: {msg}");
                self.status = format!("Player error: {msg}");
            }
        }
    }

    pub(crate) async fn on_track_ended(&mut self) {
        if self.session.playback.current().is_none() {
            return;
        }
        self.session.playback.on_ended();
        match self.session.end_action() {
            EndAction::Restart => {
                self.session.playback.seek(0.0);
                self.send_seek(0.0).await;
                self.play().await;
            }
            EndAction::Advance => {
                if let Some(t) = self.session.resolve_next() {
                    self.activate(t, true).await;
                }
            }
            EndAction::WrapToFirst => {
                if let Some(first) = self.session.displayed().first().cloned() {
                    self.activate(first, true).await;
                }
            }
            EndAction::Stop => {
                if let Err(e) = self.media.pause().await {
                    tracing::warn!("pause: {e}");
                }
                self.send_seek(0.0).await;
                self.session.playback.stop();
                self.status = "Stopped".into();
            }
        }
    }
}
