use super::{StorageError, TrackStore};
use crate::library::{Playlist, Track, TrackPatch};
use async_trait::async_trait;
use std::sync::Mutex;

/// Process-local store. Used when no persistent backend could be opened, and
/// by tests (optionally failing every write).
#[derive(Debug, Default)]
pub struct MemoryStore {
    tracks: Mutex<Vec<Track>>,
    playlists: Mutex<Vec<Playlist>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(tracks: Vec<Track>) -> Self {
        Self {
            tracks: Mutex::new(tracks),
            ..Default::default()
        }
    }

    /// A store whose every operation reports the backend as unreachable.
    pub fn unreachable() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> Vec<Track> {
        self.tracks.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn track(&self, id: &str) -> Option<Track> {
        self.snapshot().into_iter().find(|t| t.id == id)
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unreachable("memory store offline".into()));
        }
        Ok(())
    }
}

fn poisoned() -> StorageError {
    StorageError::Unreachable("memory store lock poisoned".into())
}

#[async_trait]
impl TrackStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_tracks(&self) -> Result<Vec<Track>, StorageError> {
        self.check()?;
        Ok(self.tracks.lock().map_err(|_| poisoned())?.clone())
    }

    async fn add_track(&self, track: &Track) -> Result<(), StorageError> {
        self.check()?;
        let mut tracks = self.tracks.lock().map_err(|_| poisoned())?;
        match tracks.iter_mut().find(|t| t.id == track.id) {
            Some(existing) => *existing = track.clone(),
            None => tracks.push(track.clone()),
        }
        Ok(())
    }

    async fn update_track(&self, id: &str, patch: &TrackPatch) -> Result<(), StorageError> {
        self.check()?;
        let mut tracks = self.tracks.lock().map_err(|_| poisoned())?;
        let t = tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StorageError::UnknownTrack(id.to_string()))?;
        patch.apply_to(t);
        Ok(())
    }

    async fn delete_track(&self, id: &str) -> Result<(), StorageError> {
        self.check()?;
        self.tracks.lock().map_err(|_| poisoned())?.retain(|t| t.id != id);
        Ok(())
    }

    async fn load_playlists(&self) -> Result<Vec<Playlist>, StorageError> {
        self.check()?;
        Ok(self.playlists.lock().map_err(|_| poisoned())?.clone())
    }

    async fn save_playlists(&self, playlists: &[Playlist]) -> Result<(), StorageError> {
        self.check()?;
        *self.playlists.lock().map_err(|_| poisoned())? = playlists.to_vec();
        Ok(())
    }
}
