use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Where a track stands in the lyrics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LyricsStatus {
    #[default]
    None,
    Pending,
    Fetching,
    Completed,
    Failed,
}

impl LyricsStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LyricsStatus::None => "none",
            LyricsStatus::Pending => "pending",
            LyricsStatus::Fetching => "fetching",
            LyricsStatus::Completed => "completed",
            LyricsStatus::Failed => "failed",
        }
    }

    /// Unknown strings map to `None` so stale rows never break a load.
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => LyricsStatus::Pending,
            "fetching" => LyricsStatus::Fetching,
            "completed" => LyricsStatus::Completed,
            "failed" => LyricsStatus::Failed,
            _ => LyricsStatus::None,
        }
    }
}

/// One audio asset and its metadata.
///
/// Tracks are shared as `Arc<Track>` and never mutated in place: every change
/// goes through [`Track::patched`] which returns a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub mood: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
    /// Seconds; 0 until known.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub audio_url: String,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub lyrics_status: LyricsStatus,
    #[serde(default)]
    pub favorite: bool,
}

/// Tags read by an external scanner for one file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub track_number: Option<u32>,
    pub duration: Option<f64>,
}

/// One entry of an import manifest: a full record, or a scanned file with
/// whatever tags the scanner could read.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntry {
    Record(Track),
    Scanned {
        path: PathBuf,
        #[serde(flatten)]
        tags: TrackTags,
    },
}

impl ManifestEntry {
    pub fn into_track(self) -> Track {
        match self {
            ManifestEntry::Record(track) => track,
            ManifestEntry::Scanned { path, tags } => Track::from_file(&path, tags),
        }
    }
}

/// Parse a JSON manifest (an array of entries) into library records.
pub fn parse_manifest(raw: &str) -> serde_json::Result<Vec<Track>> {
    let entries: Vec<ManifestEntry> = serde_json::from_str(raw)?;
    Ok(entries.into_iter().map(ManifestEntry::into_track).collect())
}

impl Track {
    /// Stable id for a file: hex SHA-1 of its path.
    pub fn id_for_path(path: &Path) -> String {
        let mut hasher = Sha1::new();
        hasher.update(path.to_string_lossy().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Build a library record for a scanned file.
    pub fn from_file(path: &Path, tags: TrackTags) -> Self {
        let id = Self::id_for_path(path);
        let title = tags
            .title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_default();
        let artist = tags
            .artist
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let lyrics_status = initial_lyrics_status(&title, &artist);

        Self {
            audio_url: format!("media://audio/{id}"),
            cover_url: format!("media://cover/{id}"),
            id,
            title,
            artist,
            album: tags.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            genre: tags.genre.unwrap_or_else(|| UNKNOWN_GENRE.to_string()),
            mood: Vec::new(),
            track_number: tags.track_number,
            duration: tags.duration.unwrap_or(0.0),
            lyrics: None,
            lyrics_status,
            favorite: false,
        }
    }

    /// Whether the tags are good enough to query a lyrics service.
    pub fn has_searchable_tags(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.artist.trim().is_empty()
            && self.artist != UNKNOWN_ARTIST
    }

    pub fn patched(&self, patch: &TrackPatch) -> Self {
        let mut t = self.clone();
        patch.apply_to(&mut t);
        t
    }

    pub fn display_name(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.artist)
        }
    }
}

pub fn initial_lyrics_status(title: &str, artist: &str) -> LyricsStatus {
    if !title.trim().is_empty() && !artist.trim().is_empty() && artist != UNKNOWN_ARTIST {
        LyricsStatus::Pending
    } else {
        LyricsStatus::None
    }
}

/// Partial update restricted to the fields a store accepts.
///
/// An empty `lyrics` string clears the lyrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics_status: Option<LyricsStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl TrackPatch {
    pub fn lyrics_found(text: impl Into<String>) -> Self {
        Self {
            lyrics: Some(text.into()),
            lyrics_status: Some(LyricsStatus::Completed),
            ..Default::default()
        }
    }

    pub fn status(status: LyricsStatus) -> Self {
        Self {
            lyrics_status: Some(status),
            ..Default::default()
        }
    }

    pub fn duration(seconds: f64) -> Self {
        Self {
            duration: Some(seconds),
            ..Default::default()
        }
    }

    pub fn favorite(favorite: bool) -> Self {
        Self {
            favorite: Some(favorite),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, t: &mut Track) {
        if let Some(v) = &self.title {
            t.title = v.clone();
        }
        if let Some(v) = &self.artist {
            t.artist = v.clone();
        }
        if let Some(v) = &self.album {
            t.album = v.clone();
        }
        if let Some(v) = &self.genre {
            t.genre = v.clone();
        }
        if let Some(v) = &self.lyrics {
            t.lyrics = if v.is_empty() { None } else { Some(v.clone()) };
        }
        if let Some(v) = self.favorite {
            t.favorite = v;
        }
        if let Some(v) = &self.mood {
            t.mood = v.clone();
        }
        if let Some(v) = self.lyrics_status {
            t.lyrics_status = v;
        }
        if let Some(v) = self.duration {
            t.duration = v;
        }
    }
}

/// Named, ordered list of track ids. No id appears twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub track_ids: Vec<String>,
}

impl Playlist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            track_ids: Vec::new(),
        }
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.track_ids.iter().any(|t| t == track_id)
    }

    /// Returns false when the track was already present.
    pub fn add(&mut self, track_id: &str) -> bool {
        if self.contains(track_id) {
            return false;
        }
        self.track_ids.push(track_id.to_string());
        true
    }

    pub fn remove(&mut self, track_id: &str) -> bool {
        let before = self.track_ids.len();
        self.track_ids.retain(|t| t != track_id);
        self.track_ids.len() != before
    }
}

#[cfg(test)]
pub(crate) fn test_track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Track {id}"),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        genre: "Rock".to_string(),
        mood: Vec::new(),
        track_number: None,
        duration: 180.0,
        audio_url: format!("media://audio/{id}"),
        cover_url: format!("media://cover/{id}"),
        lyrics: None,
        lyrics_status: LyricsStatus::None,
        favorite: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn from_file_marks_tagged_tracks_pending() {
        let path = PathBuf::from("/music/imagine.flac");
        let t = Track::from_file(
            &path,
            TrackTags {
                title: Some("Imagine".into()),
                artist: Some("John Lennon".into()),
                ..Default::default()
            },
        );
        assert_eq!(t.lyrics_status, LyricsStatus::Pending);
        assert_eq!(t.id, Track::id_for_path(&path));
        assert_eq!(t.id.len(), 40);
        assert_eq!(t.audio_url, format!("media://audio/{}", t.id));
        assert_eq!(t.album, UNKNOWN_ALBUM);
    }

    #[test]
    fn from_file_without_artist_is_not_searchable() {
        let t = Track::from_file(Path::new("/music/demo take 3.mp3"), TrackTags::default());
        assert_eq!(t.title, "demo take 3");
        assert_eq!(t.artist, UNKNOWN_ARTIST);
        assert_eq!(t.lyrics_status, LyricsStatus::None);
        assert!(!t.has_searchable_tags());
    }

    #[test]
    fn manifest_mixes_records_and_scanned_files() {
        let raw = r#"[
            {"id": "t1", "title": "Imagine", "artist": "John Lennon", "lyricsStatus": "completed"},
            {"path": "/music/jealous guy.flac", "title": "Jealous Guy", "artist": "John Lennon", "trackNumber": 2, "duration": 254.5},
            {"path": "/music/untitled.mp3"}
        ]"#;
        let tracks = parse_manifest(raw).unwrap();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].id, "t1");
        assert_eq!(tracks[0].lyrics_status, LyricsStatus::Completed);

        let scanned = &tracks[1];
        assert_eq!(scanned.id, Track::id_for_path(Path::new("/music/jealous guy.flac")));
        assert_eq!(scanned.track_number, Some(2));
        assert_eq!(scanned.duration, 254.5);
        assert_eq!(scanned.lyrics_status, LyricsStatus::Pending);

        assert_eq!(tracks[2].title, "untitled");
        assert_eq!(tracks[2].lyrics_status, LyricsStatus::None);
        assert!(parse_manifest(r#"[{"title": "no path or id"}]"#).is_err());
    }

    #[test]
    fn patch_returns_new_value_and_empty_lyrics_clears() {
        let mut original = test_track("a");
        original.lyrics = Some("[00:01.00]hi".into());
        let cleared = original.patched(&TrackPatch {
            lyrics: Some(String::new()),
            lyrics_status: Some(LyricsStatus::None),
            ..Default::default()
        });
        assert!(cleared.lyrics.is_none());
        assert!(original.lyrics.is_some());
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let json = serde_json::to_value(TrackPatch::lyrics_found("la")).unwrap();
        assert_eq!(json, serde_json::json!({"lyrics": "la", "lyricsStatus": "completed"}));
    }

    #[test]
    fn playlist_rejects_duplicates() {
        let mut pl = Playlist::new("pl-1", "Mix");
        assert!(pl.add("a"));
        assert!(!pl.add("a"));
        assert_eq!(pl.track_ids, vec!["a".to_string()]);
        assert!(pl.remove("a"));
        assert!(!pl.remove("a"));
    }

    #[test]
    fn unknown_status_text_reads_as_none() {
        assert_eq!(LyricsStatus::parse("garbage"), LyricsStatus::None);
        assert_eq!(LyricsStatus::parse(""), LyricsStatus::None);
    }
}
