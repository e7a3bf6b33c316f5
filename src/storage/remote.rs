use super::{StorageError, TrackStore};
use crate::library::{Track, TrackPatch};
use async_trait::async_trait;
use std::time::Duration;

/// REST library server (`/api/tracks`).
#[derive(Debug, Clone)]
pub struct RemoteStore {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteStore {
    const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: &str) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn tracks_url(&self) -> String {
        format!("{}/api/tracks", self.base_url)
    }

    fn track_url(&self, id: &str) -> String {
        format!("{}/api/tracks/{}", self.base_url, urlencoding::encode(id))
    }
}

fn unreachable_on_connect(e: reqwest::Error) -> StorageError {
    if e.is_connect() || e.is_timeout() {
        StorageError::Unreachable(e.to_string())
    } else {
        StorageError::Http(e)
    }
}

#[async_trait]
impl TrackStore for RemoteStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn get_tracks(&self) -> Result<Vec<Track>, StorageError> {
        let tracks = self
            .http
            .get(self.tracks_url())
            .send()
            .await
            .map_err(unreachable_on_connect)?
            .error_for_status()?
            .json::<Vec<Track>>()
            .await?;
        Ok(tracks)
    }

    async fn add_track(&self, track: &Track) -> Result<(), StorageError> {
        self.http
            .post(self.tracks_url())
            .json(track)
            .send()
            .await
            .map_err(unreachable_on_connect)?
            .error_for_status()?;
        Ok(())
    }

    async fn update_track(&self, id: &str, patch: &TrackPatch) -> Result<(), StorageError> {
        if patch.is_empty() {
            return Ok(());
        }
        let resp = self
            .http
            .patch(self.track_url(id))
            .json(patch)
            .send()
            .await
            .map_err(unreachable_on_connect)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::UnknownTrack(id.to_string()));
        }
        resp.error_for_status()?;
        Ok(())
    }

    async fn delete_track(&self, id: &str) -> Result<(), StorageError> {
        self.http
            .delete(self.track_url(id))
            .send()
            .await
            .map_err(unreachable_on_connect)?
            .error_for_status()?;
        Ok(())
    }
}
