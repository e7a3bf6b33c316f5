//! Track persistence.
//!
//! Every backend implements [`TrackStore`]. [`CompositeStore`] fans writes out
//! to a local cache and, in client-server mode, a remote authoritative store,
//! and reports per-backend outcomes instead of swallowing one side's failure.
//! The app submits writes to a [`StoreWriter`], which applies them in order.

pub mod composite;
pub mod memory;
pub mod remote;
pub mod sqlite;
pub mod writer;

use crate::library::{Playlist, Track, TrackPatch};
use async_trait::async_trait;

pub use composite::{CompositeStore, LoadSource, PersistReport};
pub use memory::MemoryStore;
pub use remote::RemoteStore;
pub use sqlite::SqliteStore;
pub use writer::StoreWriter;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown track {0}")]
    UnknownTrack(String),
}

#[async_trait]
pub trait TrackStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn get_tracks(&self) -> Result<Vec<Track>, StorageError>;

    async fn add_track(&self, track: &Track) -> Result<(), StorageError>;

    async fn update_track(&self, id: &str, patch: &TrackPatch) -> Result<(), StorageError>;

    async fn delete_track(&self, id: &str) -> Result<(), StorageError>;

    /// Backends that do not keep playlists report none.
    async fn load_playlists(&self) -> Result<Vec<Playlist>, StorageError> {
        Ok(Vec::new())
    }

    async fn save_playlists(&self, _playlists: &[Playlist]) -> Result<(), StorageError> {
        Ok(())
    }
}
