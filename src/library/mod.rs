//! Track and playlist records plus the pure view projection.

pub mod model;
pub mod view;

pub use model::{LyricsStatus, ManifestEntry, Playlist, Track, TrackPatch, TrackTags, parse_manifest};
pub use view::{SortKey, View, matching_albums, project, sort_tracks};
