//! Which tracks a view shows, and in what order.
//!
//! `project` is pure and cheap enough to call on demand; nothing caches the
//! displayed list between state changes.

use super::model::{Playlist, Track};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Album tracks without a number sort after numbered ones.
const UNNUMBERED_TRACK: u32 = 999;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Library,
    Favorites,
    Album(String),
    Playlist(String),
}

impl View {
    /// Parse `library`, `favorites`, `album:<name>` or `playlist:<id>`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s {
            "library" | "home" => return Some(View::Library),
            "favorites" => return Some(View::Favorites),
            _ => {}
        }
        if let Some(name) = s.strip_prefix("album:") {
            return Some(View::Album(name.to_string()));
        }
        if let Some(id) = s.strip_prefix("playlist:") {
            return Some(View::Playlist(id.to_string()));
        }
        None
    }

    pub fn label(&self) -> String {
        match self {
            View::Library => "Library".to_string(),
            View::Favorites => "Favorites".to_string(),
            View::Album(name) => name.clone(),
            View::Playlist(id) => format!("Playlist {id}"),
        }
    }
}

fn matches_query(t: &Track, needle: &str) -> bool {
    t.title.to_lowercase().contains(needle)
        || t.artist.to_lowercase().contains(needle)
        || t.album.to_lowercase().contains(needle)
}

/// Ordered tracks for `view`, or search results when `query` is non-blank.
pub fn project(
    all: &[Arc<Track>],
    playlists: &[Playlist],
    view: &View,
    query: &str,
) -> Vec<Arc<Track>> {
    let query = query.trim();
    if !query.is_empty() {
        let needle = query.to_lowercase();
        return all
            .iter()
            .filter(|t| matches_query(t, &needle))
            .cloned()
            .collect();
    }

    match view {
        View::Library => all.to_vec(),
        View::Favorites => all.iter().filter(|t| t.favorite).cloned().collect(),
        View::Album(name) => {
            let mut tracks: Vec<Arc<Track>> =
                all.iter().filter(|t| &t.album == name).cloned().collect();
            tracks.sort_by_key(|t| t.track_number.unwrap_or(UNNUMBERED_TRACK));
            tracks
        }
        View::Playlist(id) => {
            let Some(pl) = playlists.iter().find(|p| &p.id == id) else {
                return Vec::new();
            };
            pl.track_ids
                .iter()
                .filter_map(|tid| all.iter().find(|t| &t.id == tid).cloned())
                .collect()
        }
    }
}

/// Albums matching a search by album name or artist.
pub fn matching_albums(all: &[Arc<Track>], query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    all.iter()
        .filter(|t| {
            t.album.to_lowercase().contains(&needle) || t.artist.to_lowercase().contains(&needle)
        })
        .map(|t| t.album.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Artist,
    Duration,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "title" => Some(SortKey::Title),
            "artist" => Some(SortKey::Artist),
            "duration" => Some(SortKey::Duration),
            _ => None,
        }
    }
}

/// Stable, so equal keys keep the view's order.
pub fn sort_tracks(tracks: &mut [Arc<Track>], key: SortKey) {
    match key {
        SortKey::Title => tracks.sort_by(|a, b| a.title.cmp(&b.title)),
        SortKey::Artist => tracks.sort_by(|a, b| a.artist.cmp(&b.artist)),
        SortKey::Duration => tracks.sort_by(|a, b| a.duration.total_cmp(&b.duration)),
    }
}
