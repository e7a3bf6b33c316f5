//! The single background writer. Every store write goes through one task, so
//! writes land in the order the event loop issued them.

use super::CompositeStore;
use crate::library::{Playlist, Track, TrackPatch};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
enum StoreOp {
    AddTrack(Arc<Track>),
    UpdateTrack(String, TrackPatch),
    DeleteTrack(String),
    SavePlaylists(Vec<Playlist>),
    /// Answered once everything queued before it has been written.
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. Submitting never blocks the caller.
#[derive(Debug, Clone)]
pub struct StoreWriter {
    tx: mpsc::UnboundedSender<StoreOp>,
}

impl StoreWriter {
    /// Start the writer task. Must be called inside a tokio runtime.
    pub fn spawn(store: CompositeStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(store, rx));
        Self { tx }
    }

    pub fn add_track(&self, track: Arc<Track>) {
        self.submit(StoreOp::AddTrack(track));
    }

    pub fn update_track(&self, id: &str, patch: TrackPatch) {
        self.submit(StoreOp::UpdateTrack(id.to_string(), patch));
    }

    pub fn delete_track(&self, id: &str) {
        self.submit(StoreOp::DeleteTrack(id.to_string()));
    }

    pub fn save_playlists(&self, playlists: Vec<Playlist>) {
        self.submit(StoreOp::SavePlaylists(playlists));
    }

    /// Wait until every write submitted so far has finished.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        self.submit(StoreOp::Flush(done));
        if wait.await.is_err() {
            tracing::warn!("store writer stopped before flushing");
        }
    }

    fn submit(&self, op: StoreOp) {
        if let Err(e) = self.tx.send(op) {
            tracing::error!("store writer is gone, dropping {:?}", e.0);
        }
    }
}

async fn run(store: CompositeStore, mut rx: mpsc::UnboundedReceiver<StoreOp>) {
    while let Some(op) = rx.recv().await {
        match op {
            StoreOp::AddTrack(track) => store.add_track(&track).await.log("add track"),
            StoreOp::UpdateTrack(id, patch) => {
                store.update_track(&id, &patch).await.log("update track")
            }
            StoreOp::DeleteTrack(id) => store.delete_track(&id).await.log("delete track"),
            StoreOp::SavePlaylists(playlists) => {
                if let Err(e) = store.save_playlists(&playlists).await {
                    tracing::warn!("save playlists: {e}");
                }
            }
            StoreOp::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("store writer finished");
}
