//! The single owned aggregate behind playback: library, playlists, play
//! queue, current view and the playback state machine.
//!
//! Every track change goes through [`PlayerSession::update_track`], which
//! swaps in a new `Arc<Track>` so readers never see a half-updated value.

use crate::error::{Error, Result};
use crate::library::{self, Playlist, SortKey, Track, TrackPatch, View};
use crate::player::resolver;
use crate::player::{EndAction, Playback};
use crate::queue::PlayQueue;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct PlayerSession {
    tracks: Vec<Arc<Track>>,
    playlists: Vec<Playlist>,
    pub queue: PlayQueue,
    pub playback: Playback,
    view: View,
    search: String,
    sort: Option<SortKey>,
}

impl PlayerSession {
    pub fn new(playback: Playback) -> Self {
        Self {
            playback,
            ..Default::default()
        }
    }

    /// Replace the library wholesale (startup load).
    pub fn set_library(&mut self, tracks: Vec<Track>, playlists: Vec<Playlist>) {
        self.tracks = tracks.into_iter().map(Arc::new).collect();
        self.playlists = playlists;
    }

    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
        self.search.clear();
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn sort(&self) -> Option<SortKey> {
        self.sort
    }

    /// Applies to every view until cleared with `None`.
    pub fn set_sort(&mut self, key: Option<SortKey>) {
        self.sort = key;
    }

    /// The current view's tracks, computed on demand.
    pub fn displayed(&self) -> Vec<Arc<Track>> {
        let mut shown = library::project(&self.tracks, &self.playlists, &self.view, &self.search);
        if let Some(key) = self.sort {
            library::sort_tracks(&mut shown, key);
        }
        shown
    }

    pub fn track(&self, id: &str) -> Option<&Arc<Track>> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.track(id).is_some()
    }

    pub fn require(&self, id: &str) -> Result<Arc<Track>> {
        self.track(id)
            .cloned()
            .ok_or_else(|| Error::StaleReference(id.to_string()))
    }

    /// Tracks whose persisted lyrics status is still pending.
    pub fn pending_lyrics(&self) -> Vec<Arc<Track>> {
        self.tracks
            .iter()
            .filter(|t| t.lyrics_status == library::LyricsStatus::Pending)
            .cloned()
            .collect()
    }

    /// Append tracks whose id is not in the library yet; returns what was added.
    pub fn add_tracks(&mut self, tracks: Vec<Track>) -> Vec<Arc<Track>> {
        let mut added = Vec::new();
        for t in tracks {
            if self.contains(&t.id) || added.iter().any(|a: &Arc<Track>| a.id == t.id) {
                continue;
            }
            added.push(Arc::new(t));
        }
        self.tracks.extend(added.iter().cloned());
        added
    }

    /// Copy-on-write update of one track, mirrored into the play queue and
    /// the active track.
    pub fn update_track(&mut self, id: &str, patch: &TrackPatch) -> Result<Arc<Track>> {
        let slot = self
            .tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::StaleReference(id.to_string()))?;
        let updated = Arc::new(slot.patched(patch));
        *slot = updated.clone();
        self.queue.replace_track(&updated);
        self.playback.replace_current(&updated);
        Ok(updated)
    }

    /// Remove a track everywhere. Returns it and whether it was the active one;
    /// an active track leaves playback Idle.
    pub fn remove_track(&mut self, id: &str) -> Result<(Arc<Track>, bool)> {
        let idx = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::StaleReference(id.to_string()))?;
        let removed = self.tracks.remove(idx);
        for pl in &mut self.playlists {
            pl.remove(id);
        }
        self.queue.remove_track(id);
        let was_active = self.playback.current_id() == Some(id);
        if was_active {
            self.playback.clear();
        }
        Ok((removed, was_active))
    }

    // Context resolution over the current view.

    pub fn resolve_next(&mut self) -> Option<Arc<Track>> {
        let displayed = self.displayed();
        resolver::next(self.playback.current_id(), &displayed, &mut self.queue)
    }

    pub fn resolve_prev(&self) -> Option<Arc<Track>> {
        resolver::prev(self.playback.current_id(), &self.displayed())
    }

    pub fn upcoming(&self, count: usize) -> Vec<Arc<Track>> {
        resolver::peek_upcoming(self.playback.current_id(), &self.displayed(), count)
    }

    pub fn end_action(&self) -> EndAction {
        resolver::end_action(
            self.playback.repeat,
            self.playback.current_id(),
            &self.displayed(),
            &self.queue,
        )
    }

    // Playlists

    pub fn playlist(&self, id: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    pub fn create_playlist(&mut self, id: String, name: &str, first: Option<&str>) -> &Playlist {
        let mut pl = Playlist::new(id, name);
        if let Some(track_id) = first.filter(|t| self.contains(t)) {
            pl.add(track_id);
        }
        self.playlists.push(pl);
        &self.playlists[self.playlists.len() - 1]
    }

    /// False when the track was already in the playlist.
    pub fn add_to_playlist(&mut self, playlist_id: &str, track_id: &str) -> Result<bool> {
        self.require(track_id)?;
        let pl = self
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| Error::StaleReference(playlist_id.to_string()))?;
        Ok(pl.add(track_id))
    }

    pub fn remove_from_playlist(&mut self, playlist_id: &str, track_id: &str) -> bool {
        self.playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .is_some_and(|p| p.remove(track_id))
    }

    /// Deleting the playlist being viewed sends the view back to the library.
    pub fn delete_playlist(&mut self, playlist_id: &str) -> Option<Playlist> {
        let idx = self.playlists.iter().position(|p| p.id == playlist_id)?;
        if self.view == View::Playlist(playlist_id.to_string()) {
            self.view = View::Library;
        }
        Some(self.playlists.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::model::test_track;

    fn session(ids: &[&str]) -> PlayerSession {
        let mut s = PlayerSession::default();
        s.set_library(ids.iter().map(|id| test_track(id)).collect(), Vec::new());
        s
    }

    #[test]
    fn update_is_copy_on_write_and_mirrors_active() {
        let mut s = session(&["a", "b"]);
        let before = s.track("a").unwrap().clone();
        s.playback.load(before.clone());

        let after = s.update_track("a", &TrackPatch::favorite(true)).unwrap();
        assert!(!before.favorite);
        assert!(after.favorite);
        assert!(s.playback.current().unwrap().favorite);
        assert!(matches!(
            s.update_track("zzz", &TrackPatch::favorite(true)),
            Err(Error::StaleReference(_))
        ));
    }

    #[test]
    fn update_reaches_queued_copies() {
        let mut s = session(&["a", "b"]);
        let b = s.track("b").unwrap().clone();
        s.queue.enqueue(b);
        s.update_track("b", &TrackPatch::lyrics_found("[00:01.00]la")).unwrap();
        let queued = s.queue.front().unwrap();
        assert_eq!(queued.lyrics.as_deref(), Some("[00:01.00]la"));
        assert_eq!(queued.lyrics_status, library::LyricsStatus::Completed);
    }

    #[test]
    fn remove_cascades_everywhere() {
        let mut s = session(&["a", "b"]);
        let pl = s.create_playlist("pl-1".into(), "Mix", Some("a")).id.clone();
        s.add_to_playlist(&pl, "b").unwrap();
        let a = s.track("a").unwrap().clone();
        s.queue.enqueue(a.clone());
        s.playback.load(a);

        let (removed, was_active) = s.remove_track("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(was_active);
        assert!(s.playback.current().is_none());
        assert!(s.queue.is_empty());
        assert_eq!(s.playlist(&pl).unwrap().track_ids, vec!["b".to_string()]);
        assert!(!s.contains("a"));
    }

    #[test]
    fn add_tracks_skips_known_ids() {
        let mut s = session(&["a"]);
        let added = s.add_tracks(vec![test_track("a"), test_track("b"), test_track("b")]);
        assert_eq!(added.len(), 1);
        assert_eq!(s.tracks().len(), 2);
    }

    #[test]
    fn deleting_viewed_playlist_resets_view() {
        let mut s = session(&["a"]);
        s.create_playlist("pl-1".into(), "Mix", None);
        s.set_view(View::Playlist("pl-1".into()));
        assert!(s.delete_playlist("pl-1").is_some());
        assert_eq!(s.view(), &View::Library);
        assert!(s.delete_playlist("pl-1").is_none());
    }

    #[test]
    fn playlist_add_rejects_duplicates_and_unknown_tracks() {
        let mut s = session(&["a"]);
        s.create_playlist("pl-1".into(), "Mix", None);
        assert!(s.add_to_playlist("pl-1", "a").unwrap());
        assert!(!s.add_to_playlist("pl-1", "a").unwrap());
        assert!(s.add_to_playlist("pl-1", "ghost").is_err());
    }

    #[test]
    fn sort_reorders_navigation() {
        let mut s = session(&["a", "b", "c"]);
        s.update_track("a", &TrackPatch::duration(300.0)).unwrap();
        s.update_track("c", &TrackPatch::duration(10.0)).unwrap();
        s.set_sort(Some(SortKey::Duration));
        let ids: Vec<_> = s.displayed().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let c = s.track("c").unwrap().clone();
        s.playback.load(c);
        assert_eq!(s.resolve_next().unwrap().id, "b");
        s.set_sort(None);
        assert_eq!(s.displayed()[0].id, "a");
    }

    #[test]
    fn navigation_follows_view() {
        let mut s = session(&["a", "b", "c"]);
        s.update_track("c", &TrackPatch::favorite(true)).unwrap();
        s.update_track("a", &TrackPatch::favorite(true)).unwrap();
        s.set_view(View::Favorites);
        let a = s.track("a").unwrap().clone();
        s.playback.load(a);
        assert_eq!(s.resolve_next().unwrap().id, "c");
        assert_eq!(s.resolve_prev().unwrap().id, "c");
        assert_eq!(s.upcoming(10).len(), 1);
    }
}
