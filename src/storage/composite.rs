use super::{StorageError, TrackStore};
use crate::library::{Playlist, Track, TrackPatch};
use std::sync::Arc;

/// Outcome of one write fanned out to every backend.
#[derive(Debug)]
pub struct PersistReport {
    pub local: Result<(), StorageError>,
    /// `None` when running without a remote store.
    pub remote: Option<Result<(), StorageError>>,
}

impl PersistReport {
    /// Every configured backend accepted the write.
    pub fn fully_persisted(&self) -> bool {
        self.local.is_ok() && self.remote.as_ref().is_none_or(|r| r.is_ok())
    }

    /// The local cache has it but the authoritative remote store does not.
    pub fn locally_only(&self) -> bool {
        self.local.is_ok() && matches!(self.remote, Some(Err(_)))
    }

    /// No backend accepted the write.
    pub fn lost(&self) -> bool {
        self.local.is_err() && self.remote.as_ref().is_none_or(|r| r.is_err())
    }

    /// Log the outcome; never escalates.
    pub fn log(&self, what: &str) {
        if self.lost() {
            tracing::error!("{what}: not saved ({})", self.errors());
        } else if self.locally_only() {
            tracing::warn!("{what}: saved locally only ({})", self.errors());
        } else if !self.fully_persisted() {
            tracing::warn!("{what}: local cache is behind ({})", self.errors());
        }
    }

    fn errors(&self) -> String {
        let mut parts = Vec::new();
        if let Err(e) = &self.local {
            parts.push(format!("local: {e}"));
        }
        if let Some(Err(e)) = &self.remote {
            parts.push(format!("remote: {e}"));
        }
        parts.join("; ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Local,
}

/// Local cache plus optional remote authority.
#[derive(Clone)]
pub struct CompositeStore {
    local: Arc<dyn TrackStore>,
    remote: Option<Arc<dyn TrackStore>>,
}

impl CompositeStore {
    pub fn new(local: Arc<dyn TrackStore>, remote: Option<Arc<dyn TrackStore>>) -> Self {
        Self { local, remote }
    }

    pub fn local_only(local: Arc<dyn TrackStore>) -> Self {
        Self::new(local, None)
    }

    /// Remote first; if it cannot answer, fall back to the local cache. A
    /// remote load overwrites the cached copy of every track it returned.
    pub async fn load_tracks(&self) -> Result<(Vec<Track>, LoadSource), StorageError> {
        if let Some(remote) = &self.remote {
            match remote.get_tracks().await {
                Ok(tracks) => {
                    self.seed_local(&tracks).await;
                    return Ok((tracks, LoadSource::Remote));
                }
                Err(e) => {
                    tracing::warn!("remote store unavailable, using local library: {e}");
                }
            }
        }
        let tracks = self.local.get_tracks().await?;
        Ok((tracks, LoadSource::Local))
    }

    async fn seed_local(&self, tracks: &[Track]) {
        let mut failed = 0;
        for t in tracks {
            if let Err(e) = self.local.add_track(t).await {
                tracing::debug!(track_id = %t.id, "cache {}: {e}", self.local.name());
                failed += 1;
            }
        }
        if failed > 0 {
            tracing::warn!(failed, "could not refresh local library cache");
        }
    }

    pub async fn add_track(&self, track: &Track) -> PersistReport {
        match &self.remote {
            Some(remote) => {
                let (local, remote) =
                    tokio::join!(self.local.add_track(track), remote.add_track(track));
                PersistReport {
                    local,
                    remote: Some(remote),
                }
            }
            None => PersistReport {
                local: self.local.add_track(track).await,
                remote: None,
            },
        }
    }

    pub async fn update_track(&self, id: &str, patch: &TrackPatch) -> PersistReport {
        match &self.remote {
            Some(remote) => {
                let (local, remote) = tokio::join!(
                    self.local.update_track(id, patch),
                    remote.update_track(id, patch)
                );
                PersistReport {
                    local,
                    remote: Some(remote),
                }
            }
            None => PersistReport {
                local: self.local.update_track(id, patch).await,
                remote: None,
            },
        }
    }

    pub async fn delete_track(&self, id: &str) -> PersistReport {
        match &self.remote {
            Some(remote) => {
                let (local, remote) =
                    tokio::join!(self.local.delete_track(id), remote.delete_track(id));
                PersistReport {
                    local,
                    remote: Some(remote),
                }
            }
            None => PersistReport {
                local: self.local.delete_track(id).await,
                remote: None,
            },
        }
    }

    /// Playlists only live in the local store.
    pub async fn load_playlists(&self) -> Result<Vec<Playlist>, StorageError> {
        self.local.load_playlists().await
    }

    pub async fn save_playlists(&self, playlists: &[Playlist]) -> Result<(), StorageError> {
        self.local.save_playlists(playlists).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::model::test_track;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn remote_failure_is_reported_as_local_only() {
        let local = Arc::new(MemoryStore::with_tracks(vec![test_track("a")]));
        let store = CompositeStore::new(local.clone(), Some(Arc::new(MemoryStore::unreachable())));

        let report = store.update_track("a", &TrackPatch::favorite(true)).await;
        assert!(report.locally_only());
        assert!(!report.fully_persisted());
        assert!(!report.lost());
        assert!(local.track("a").unwrap().favorite);
    }

    #[tokio::test]
    async fn local_only_store_is_fully_persisted_on_success() {
        let store = CompositeStore::local_only(Arc::new(MemoryStore::new()));
        let report = store.add_track(&test_track("a")).await;
        assert!(report.fully_persisted());
        assert!(!report.locally_only());
    }

    #[tokio::test]
    async fn load_falls_back_to_local_when_remote_is_down() {
        let local = Arc::new(MemoryStore::with_tracks(vec![test_track("a")]));
        let store = CompositeStore::new(local, Some(Arc::new(MemoryStore::unreachable())));
        let (tracks, source) = store.load_tracks().await.unwrap();
        assert_eq!(source, LoadSource::Local);
        assert_eq!(tracks.len(), 1);
    }

    #[tokio::test]
    async fn load_prefers_remote() {
        let local = Arc::new(MemoryStore::new());
        let remote = Arc::new(MemoryStore::with_tracks(vec![test_track("r")]));
        let store = CompositeStore::new(local, Some(remote));
        let (tracks, source) = store.load_tracks().await.unwrap();
        assert_eq!(source, LoadSource::Remote);
        assert_eq!(tracks[0].id, "r");
    }

    #[tokio::test]
    async fn remote_load_seeds_local_cache() {
        let local = Arc::new(MemoryStore::new());
        let remote = Arc::new(MemoryStore::with_tracks(vec![test_track("r")]));
        let store = CompositeStore::new(local.clone(), Some(remote));
        store.load_tracks().await.unwrap();

        let report = store.update_track("r", &TrackPatch::favorite(true)).await;
        assert!(report.fully_persisted());
        assert!(local.track("r").unwrap().favorite);
    }

    #[tokio::test]
    async fn both_sides_down_is_lost() {
        let store = CompositeStore::new(
            Arc::new(MemoryStore::unreachable()),
            Some(Arc::new(MemoryStore::unreachable())),
        );
        assert!(store.delete_track("a").await.lost());
    }
}
