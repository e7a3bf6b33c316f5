use super::App;
use crate::library::{LyricsStatus, Track, TrackPatch};
use crate::lyrics::parser;
use std::path::Path;
use std::sync::Arc;

/// `pl-<unix millis>`, suffixed with a counter when that id is taken.
fn playlist_id(taken: impl Fn(&str) -> bool) -> String {
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let base = format!("pl-{millis}");
    let mut id = base.clone();
    let mut n = 1;
    while taken(&id) {
        n += 1;
        id = format!("{base}-{n}");
    }
    id
}

impl App {
    /// Load tracks and playlists from the store and enroll every track still
    /// pending lyrics. A store failure leaves an empty library and one error
    /// notification.
    pub async fn load_library(&mut self) -> usize {
        let (tracks, source) = match self.store.load_tracks().await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!("library load failed: {e}");
                self.notifications
                    .error(format!("Could not load library: {e}"), None);
                self.session.set_library(Vec::new(), Vec::new());
                return 0;
            }
        };
        let playlists = self.store.load_playlists().await.unwrap_or_else(|e| {
            tracing::warn!("playlists unavailable: {e}");
            Vec::new()
        });
        tracing::info!(count = tracks.len(), ?source, "library loaded");
        let count = tracks.len();
        self.session.set_library(tracks, playlists);
        let enrolled = self.lyrics_queue.enroll(self.session.pending_lyrics());
        if enrolled > 0 {
            tracing::info!(enrolled, "resuming lyrics backlog");
        }
        count
    }

    /// Update the in-memory track and persist the patch in the background.
    pub(crate) fn write_track(&mut self, id: &str, patch: TrackPatch) -> Option<Arc<Track>> {
        let updated = match self.session.update_track(id, &patch) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!("skipping write: {e}");
                return None;
            }
        };
        self.writer.update_track(id, patch);
        Some(updated)
    }

    fn persist_playlists(&self) {
        self.writer.save_playlists(self.session.playlists().to_vec());
    }

    /// Add scanned tracks; new pending ones join the lyrics backlog when
    /// auto-fetch is on. The caller pumps the backlog.
    pub fn import(&mut self, tracks: Vec<Track>) -> usize {
        let added = self.session.add_tracks(tracks);
        for t in &added {
            self.writer.add_track(t.clone());
        }
        if self.cfg.lyrics.auto_fetch {
            self.lyrics_queue.enroll(
                added
                    .iter()
                    .filter(|t| t.lyrics_status == LyricsStatus::Pending)
                    .cloned(),
            );
        }
        if !added.is_empty() {
            self.notifications
                .success(format!("Imported {} tracks", added.len()), None);
        }
        added.len()
    }

    pub async fn remove_track(&mut self, id: &str) {
        let (removed, was_active) = match self.session.remove_track(id) {
            Ok(r) => r,
            Err(e) => {
                self.status = e.to_string();
                return;
            }
        };
        if was_active && let Err(e) = self.media.pause().await {
            tracing::warn!("pause: {e}");
        }
        self.writer.delete_track(id);
        self.persist_playlists();
        self.status = format!("Removed \"{}\"", removed.title);
    }

    pub fn toggle_favorite(&mut self, id: &str) {
        let Some(current) = self.session.track(id) else {
            return;
        };
        let patch = TrackPatch::favorite(!current.favorite);
        if let Some(t) = self.write_track(id, patch) {
            self.status = if t.favorite {
                format!("Added \"{}\" to favorites", t.title)
            } else {
                format!("Removed \"{}\" from favorites", t.title)
            };
        }
    }

    /// Manual lyrics edit or file import. Leaves the status alone.
    pub fn set_lyrics(&mut self, id: &str, text: &str) {
        let patch = TrackPatch {
            lyrics: Some(text.to_string()),
            ..Default::default()
        };
        self.write_track(id, patch);
    }

    pub fn remove_lyrics(&mut self, id: &str) {
        let patch = TrackPatch {
            lyrics: Some(String::new()),
            lyrics_status: Some(LyricsStatus::None),
            ..Default::default()
        };
        self.write_track(id, patch);
    }

    pub fn create_playlist(&mut self, name: &str, first: Option<&str>) -> String {
        let id = playlist_id(|id| self.session.playlist(id).is_some());
        self.session.create_playlist(id.clone(), name, first);
        self.persist_playlists();
        self.notifications.success(format!("Created playlist \"{name}\""), None);
        id
    }

    pub fn add_to_playlist(&mut self, playlist_id: &str, track_id: &str) {
        match self.session.add_to_playlist(playlist_id, track_id) {
            Ok(true) => {
                self.persist_playlists();
                self.status = "Added to playlist".into();
            }
            Ok(false) => self.status = "Already in playlist".into(),
            Err(e) => self.status = e.to_string(),
        }
    }

    pub fn remove_from_playlist(&mut self, playlist_id: &str, track_id: &str) {
        if self.session.remove_from_playlist(playlist_id, track_id) {
            self.persist_playlists();
            self.status = "Removed from playlist".into();
        } else {
            self.status = "Not in playlist".into();
        }
    }

    pub fn delete_playlist(&mut self, playlist_id: &str) {
        if let Some(pl) = self.session.delete_playlist(playlist_id) {
            self.persist_playlists();
            self.notifications.info(format!("Deleted playlist \"{}\"", pl.name));
            self.status = format!("Deleted playlist \"{}\"", pl.name);
        }
    }

    /// Id of the displayed track at `index`; reports a bad index.
    pub(crate) fn displayed_id(&mut self, index: usize) -> Option<String> {
        let id = self.session.displayed().get(index).map(|t| t.id.clone());
        if id.is_none() {
            self.status = format!("No track {}", index + 1);
        }
        id
    }

    /// Id of the playlist at `index` in listing order; reports a bad index.
    pub(crate) fn playlist_id_at(&mut self, index: usize) -> Option<String> {
        let id = self.session.playlists().get(index).map(|p| p.id.clone());
        if id.is_none() {
            self.status = format!("No playlist {}", index + 1);
        }
        id
    }

    pub(crate) fn remove_playlist_entry(&mut self, playlist: usize, position: usize) {
        let Some(pl) = self.playlist_id_at(playlist) else {
            return;
        };
        let track_id = self
            .session
            .playlist(&pl)
            .and_then(|p| p.track_ids.get(position).cloned());
        match track_id {
            Some(track_id) => self.remove_from_playlist(&pl, &track_id),
            None => self.status = format!("No entry {} in playlist", position + 1),
        }
    }

    /// Read an `.lrc` or text file and store it as the track's lyrics.
    pub(crate) fn import_lyrics_file(&mut self, id: &str, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                self.set_lyrics(id, &text);
                self.status = format!("Lyrics imported from {}", path.display());
            }
            Err(e) => {
                tracing::warn!("read {}: {e}", path.display());
                self.status = format!("Could not read {}: {e}", path.display());
            }
        }
    }

    pub(crate) fn render_playlists(&self) -> String {
        let playlists = self.session.playlists();
        if playlists.is_empty() {
            return "No playlists".into();
        }
        let mut out = String::from("Playlists:");
        for (i, pl) in playlists.iter().enumerate() {
            out.push_str(&format!(
                "\n{:3}. {} ({} tracks, id={})",
                i + 1,
                pl.name,
                pl.track_ids.len(),
                pl.id
            ));
        }
        out
    }

    pub(crate) fn render_lyrics(&self, id: &str) -> String {
        let Some(track) = self.session.track(id) else {
            return format!("No track {id}");
        };
        match track.lyrics.as_deref().filter(|l| !l.trim().is_empty()) {
            None => format!("No lyrics for \"{}\"", track.title),
            Some(text) => {
                let kind = if parser::has_timestamps(text) { "synced" } else { "plain" };
                format!("{} ({kind}):\n{}", track.display_name(), parser::plain_text(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::actions::Action;
    use crate::app::testing::Harness;
    use crate::library::model::test_track;
    use crate::library::{LyricsStatus, View};
    use crate::player::PlayState;
    use crate::storage::TrackStore;

    #[tokio::test]
    async fn removing_active_track_goes_idle_everywhere() {
        let mut h = Harness::new(vec![test_track("A"), test_track("B")], vec![]).await;
        let pl = h.app.create_playlist("Mix", Some("A"));
        h.act(Action::PlayIndex(0)).await;
        h.act(Action::QueueAdd(0)).await;

        h.act(Action::RemoveTrack(0)).await;
        h.app.flush_writes().await;

        assert_eq!(h.app.session.playback.state(), PlayState::Idle);
        assert!(h.app.session.queue.is_empty());
        assert!(h.app.session.playlist(&pl).unwrap().track_ids.is_empty());
        assert!(h.store.track("A").is_none());
        assert_eq!(h.media.commands().last().map(String::as_str), Some("pause"));
        assert!(h.store.load_playlists().await.unwrap()[0].track_ids.is_empty());
    }

    #[tokio::test]
    async fn favorite_toggle_persists_and_filters_view() {
        let mut h = Harness::new(vec![test_track("A"), test_track("B")], vec![]).await;
        h.act(Action::ToggleFavorite(1)).await;
        h.app.flush_writes().await;
        assert!(h.store.track("B").unwrap().favorite);

        h.act(Action::SetView(View::Favorites)).await;
        let ids: Vec<_> = h.app.session.displayed().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["B"]);
    }

    #[tokio::test]
    async fn import_enrolls_pending_tracks_only() {
        let mut h = Harness::new(vec![], vec![]).await;
        let mut pending = test_track("p");
        pending.lyrics_status = LyricsStatus::Pending;
        let plain = test_track("n");

        assert_eq!(h.app.import(vec![pending, plain, test_track("p")]), 2);
        h.app.flush_writes().await;
        assert_eq!(h.app.lyrics_queue.len(), 1);
        assert_eq!(h.store.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn lyrics_edits_write_through() {
        let mut h = Harness::new(vec![test_track("A")], vec![]).await;
        h.app.set_lyrics("A", "[00:01.00]la");
        h.app.flush_writes().await;
        let stored = h.store.track("A").unwrap();
        assert_eq!(stored.lyrics.as_deref(), Some("[00:01.00]la"));
        assert_eq!(stored.lyrics_status, LyricsStatus::None);

        h.app.remove_lyrics("A");
        h.app.flush_writes().await;
        assert!(h.store.track("A").unwrap().lyrics.is_none());
    }

    #[tokio::test]
    async fn deleting_viewed_playlist_returns_to_library() {
        let mut h = Harness::new(vec![test_track("A")], vec![]).await;
        let pl = h.app.create_playlist("Mix", None);
        h.app.add_to_playlist(&pl, "A");
        h.app.add_to_playlist(&pl, "A");
        assert_eq!(h.app.status, "Already in playlist");

        h.act(Action::SetView(View::Playlist(pl.clone()))).await;
        h.app.delete_playlist(&pl);
        assert_eq!(h.app.session.view(), &View::Library);
    }

    #[tokio::test]
    async fn playlists_created_together_get_distinct_ids() {
        let mut h = Harness::new(vec![test_track("A")], vec![]).await;
        let ids: Vec<String> = (0..3).map(|i| h.app.create_playlist(&format!("Mix {i}"), None)).collect();
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
        assert_eq!(h.app.session.playlists().len(), 3);
    }

    #[tokio::test]
    async fn double_favorite_toggle_persists_last_value() {
        let mut h = Harness::new(vec![test_track("A")], vec![]).await;
        h.act(Action::ToggleFavorite(0)).await;
        h.act(Action::ToggleFavorite(0)).await;
        h.app.flush_writes().await;
        assert!(!h.store.track("A").unwrap().favorite);
        assert!(!h.app.session.track("A").unwrap().favorite);
    }

    #[tokio::test]
    async fn playlist_commands_drive_the_playlist_view() {
        let mut h = Harness::new(vec![test_track("A"), test_track("B")], vec![]).await;
        h.act(Action::CreatePlaylist("Mix".into())).await;
        h.act(Action::AddToPlaylist { playlist: 0, track: 1 }).await;
        h.act(Action::AddToPlaylist { playlist: 0, track: 0 }).await;
        h.act(Action::AddToPlaylist { playlist: 3, track: 0 }).await;
        assert_eq!(h.app.status, "No playlist 4");

        h.act(Action::OpenPlaylist(0)).await;
        let ids: Vec<_> = h.app.session.displayed().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["B", "A"]);

        h.act(Action::RemoveFromPlaylist { playlist: 0, track: 0 }).await;
        assert_eq!(h.app.session.displayed()[0].id, "A");
        h.app.flush_writes().await;
        assert_eq!(h.store.load_playlists().await.unwrap()[0].track_ids, vec!["A".to_string()]);

        h.act(Action::ShowPlaylists).await;
        assert!(h.app.status.contains("Mix (1 tracks"));

        h.act(Action::DeletePlaylist(0)).await;
        h.app.flush_writes().await;
        assert_eq!(h.app.session.view(), &View::Library);
        assert!(h.store.load_playlists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lyrics_commands_import_show_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.lrc");
        std::fs::write(&file, "[ti:Song]\n[00:01.00]hello\n[00:02.00]world").unwrap();
        let mut h = Harness::new(vec![test_track("A")], vec![]).await;

        h.act(Action::ImportLyrics(0, file)).await;
        h.app.flush_writes().await;
        assert!(h.store.track("A").unwrap().lyrics.unwrap().contains("hello"));

        h.act(Action::ShowLyrics(0)).await;
        assert!(h.app.status.contains("(synced)"));
        assert!(h.app.status.ends_with("hello\nworld"));

        h.act(Action::ImportLyrics(0, dir.path().join("missing.lrc"))).await;
        assert!(h.app.status.starts_with("Could not read"));

        h.act(Action::RemoveLyrics(0)).await;
        h.act(Action::ShowLyrics(0)).await;
        assert_eq!(h.app.status, "No lyrics for \"Track A\"");
    }

    #[tokio::test]
    async fn pending_tracks_are_enrolled_on_load() {
        let mut a = test_track("A");
        a.lyrics_status = LyricsStatus::Pending;
        let h = Harness::new(vec![a, test_track("B")], vec![]).await;
        assert_eq!(h.app.lyrics_queue.len(), 1);
    }
}
