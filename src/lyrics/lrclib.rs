//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use super::LyricsError;
use serde::Deserialize;
use std::cmp::Ordering;
use std::time::Duration;

/// One LRCLIB search hit
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LrclibRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub track_name: String,
    #[serde(default)]
    pub artist_name: String,
    pub album_name: Option<String>,
    pub duration: Option<f64>,
    pub plain_lyrics: Option<String>,
    pub synced_lyrics: Option<String>,
}

impl LrclibRecord {
    pub fn has_synced(&self) -> bool {
        self.synced_lyrics.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Synced text when present, else plain text.
    pub fn lyrics_text(&self) -> Option<String> {
        [&self.synced_lyrics, &self.plain_lyrics]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .cloned()
    }
}

/// Rank search hits: synced before plain; then, when the track duration is
/// known, the closest duration. Ties keep the service's order.
pub fn select_best(results: &[LrclibRecord], track_duration: f64) -> Option<&LrclibRecord> {
    let mut ranked: Vec<&LrclibRecord> = results.iter().collect();
    ranked.sort_by(|a, b| {
        match (a.has_synced(), b.has_synced()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        if track_duration > 0.0 {
            let da = (a.duration.unwrap_or(0.0) - track_duration).abs();
            let db = (b.duration.unwrap_or(0.0) - track_duration).abs();
            return da.total_cmp(&db);
        }
        Ordering::Equal
    });
    ranked.into_iter().next()
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    const USER_AGENT: &'static str = concat!("muse/", env!("CARGO_PKG_VERSION"));

    /// Create a new LRCLIB client with a bounded request time
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LyricsError> {
        let client = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| LyricsError::Network(format!("build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, track_name: &str, artist_name: &str) -> String {
        // No album filter: edition names ("Deluxe", "Remastered") mismatch too
        // often, the duration ranking picks the right cut instead.
        format!(
            "{}/search?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(track_name),
            urlencoding::encode(artist_name)
        )
    }

    /// Search for lyrics by title and artist
    pub async fn search(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> Result<Vec<LrclibRecord>, LyricsError> {
        let url = self.search_url(track_name, artist_name);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(LyricsError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64, duration: Option<f64>, synced: bool) -> LrclibRecord {
        LrclibRecord {
            id,
            track_name: "Imagine".into(),
            artist_name: "John Lennon".into(),
            album_name: None,
            duration,
            plain_lyrics: Some(format!("plain {id}")),
            synced_lyrics: synced.then(|| format!("[00:01.00]synced {id}")),
        }
    }

    #[test]
    fn synced_beats_closer_duration() {
        let results = vec![rec(1, Some(183.0), false), rec(2, Some(240.0), true)];
        assert_eq!(select_best(&results, 183.0).map(|r| r.id), Some(2));
    }

    #[test]
    fn closest_duration_among_synced() {
        let results = vec![
            rec(1, Some(300.0), true),
            rec(2, Some(181.0), true),
            rec(3, Some(150.0), true),
        ];
        assert_eq!(select_best(&results, 183.0).map(|r| r.id), Some(2));
    }

    #[test]
    fn unknown_duration_keeps_service_order() {
        let results = vec![rec(7, Some(300.0), true), rec(8, Some(183.0), true)];
        assert_eq!(select_best(&results, 0.0).map(|r| r.id), Some(7));
        assert!(select_best(&[], 0.0).is_none());
    }

    #[test]
    fn lyrics_text_prefers_synced_and_skips_empty() {
        let mut r = rec(1, None, true);
        assert_eq!(r.lyrics_text().as_deref(), Some("[00:01.00]synced 1"));
        r.synced_lyrics = Some(String::new());
        assert_eq!(r.lyrics_text().as_deref(), Some("plain 1"));
        r.plain_lyrics = None;
        assert!(r.lyrics_text().is_none());
        assert!(!r.has_synced());
    }

    #[test]
    fn search_record_decodes_camel_case() {
        let json = r#"[{"id":3,"trackName":"Imagine","artistName":"John Lennon",
            "albumName":"Imagine","duration":183.0,"plainLyrics":"x","syncedLyrics":null}]"#;
        let parsed: Vec<LrclibRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed[0].duration, Some(183.0));
        assert!(!parsed[0].has_synced());
    }

    #[test]
    fn search_url_encodes_terms() {
        let c = LrclibClient::new("https://lrclib.net/api/", Duration::from_secs(10)).unwrap();
        assert_eq!(
            c.search_url("Imagine", "John Lennon"),
            "https://lrclib.net/api/search?track_name=Imagine&artist_name=John%20Lennon"
        );
    }
}
