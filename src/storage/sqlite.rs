use super::{StorageError, TrackStore};
use crate::library::{LyricsStatus, Playlist, Track, TrackPatch};
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use std::path::{Path, PathBuf};

/// Local SQLite library database.
///
/// rusqlite is blocking, so each operation opens its own connection inside
/// `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&path)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StorageError::Unreachable(format!("storage task: {e}")))?
    }
}

fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS tracks (
  id TEXT PRIMARY KEY,
  title TEXT NOT NULL,
  artist TEXT NOT NULL,
  album TEXT NOT NULL DEFAULT '',
  genre TEXT NOT NULL DEFAULT '',
  mood_json TEXT NOT NULL DEFAULT '[]',
  track_number INTEGER,
  duration REAL NOT NULL DEFAULT 0,
  audio_url TEXT NOT NULL DEFAULT '',
  cover_url TEXT NOT NULL DEFAULT '',
  lyrics TEXT,
  lyrics_status TEXT NOT NULL DEFAULT 'none',
  favorite INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS playlists (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  position INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS playlist_tracks (
  playlist_id TEXT NOT NULL,
  position INTEGER NOT NULL,
  track_id TEXT NOT NULL,
  PRIMARY KEY (playlist_id, track_id)
);
"#,
    )?;

    // Databases created before the lyrics pipeline lack the status column.
    let has_status = {
        let mut stmt = conn.prepare("PRAGMA table_info(tracks)")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        names.iter().any(|n| n == "lyrics_status")
    };
    if !has_status {
        tracing::info!("migrating library db: adding lyrics_status column");
        conn.execute_batch(
            "ALTER TABLE tracks ADD COLUMN lyrics_status TEXT NOT NULL DEFAULT 'none'",
        )?;
    }
    Ok(())
}

fn row_to_track(row: &rusqlite::Row<'_>) -> rusqlite::Result<Track> {
    let mood_json: String = row.get(5)?;
    let track_number: Option<u32> = row.get(6)?;
    let status: String = row.get(11)?;
    let favorite: i64 = row.get(12)?;
    Ok(Track {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        album: row.get(3)?,
        genre: row.get(4)?,
        mood: serde_json::from_str(&mood_json).unwrap_or_default(),
        track_number: track_number.filter(|n| *n > 0),
        duration: row.get(7)?,
        audio_url: row.get(8)?,
        cover_url: row.get(9)?,
        lyrics: row.get::<_, Option<String>>(10)?.filter(|l| !l.is_empty()),
        lyrics_status: LyricsStatus::parse(&status),
        favorite: favorite != 0,
    })
}

fn patch_columns(patch: &TrackPatch) -> Result<Vec<(&'static str, Value)>, StorageError> {
    let mut cols = Vec::new();
    if let Some(v) = &patch.title {
        cols.push(("title", Value::Text(v.clone())));
    }
    if let Some(v) = &patch.artist {
        cols.push(("artist", Value::Text(v.clone())));
    }
    if let Some(v) = &patch.album {
        cols.push(("album", Value::Text(v.clone())));
    }
    if let Some(v) = &patch.genre {
        cols.push(("genre", Value::Text(v.clone())));
    }
    if let Some(v) = &patch.lyrics {
        let value = if v.is_empty() {
            Value::Null
        } else {
            Value::Text(v.clone())
        };
        cols.push(("lyrics", value));
    }
    if let Some(v) = patch.favorite {
        cols.push(("favorite", Value::Integer(i64::from(v))));
    }
    if let Some(v) = &patch.mood {
        cols.push(("mood_json", Value::Text(serde_json::to_string(v)?)));
    }
    if let Some(v) = patch.lyrics_status {
        cols.push(("lyrics_status", Value::Text(v.as_str().to_string())));
    }
    if let Some(v) = patch.duration {
        cols.push(("duration", Value::Real(v)));
    }
    Ok(cols)
}

#[async_trait]
impl TrackStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get_tracks(&self) -> Result<Vec<Track>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
SELECT id, title, artist, album, genre, mood_json, track_number, duration,
       audio_url, cover_url, lyrics, lyrics_status, favorite
FROM tracks
ORDER BY rowid
"#,
            )?;
            let tracks = stmt
                .query_map([], row_to_track)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tracks)
        })
        .await
    }

    async fn add_track(&self, track: &Track) -> Result<(), StorageError> {
        let t = track.clone();
        let mood_json = serde_json::to_string(&t.mood)?;
        self.with_conn(move |conn| {
            conn.execute(
                r#"
INSERT INTO tracks(id, title, artist, album, genre, mood_json, track_number, duration,
                   audio_url, cover_url, lyrics, lyrics_status, favorite)
VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
ON CONFLICT(id) DO UPDATE SET
  title=excluded.title,
  artist=excluded.artist,
  album=excluded.album,
  genre=excluded.genre,
  mood_json=excluded.mood_json,
  track_number=excluded.track_number,
  duration=excluded.duration,
  audio_url=excluded.audio_url,
  cover_url=excluded.cover_url,
  lyrics=excluded.lyrics,
  lyrics_status=excluded.lyrics_status,
  favorite=excluded.favorite
"#,
                params![
                    t.id,
                    t.title,
                    t.artist,
                    t.album,
                    t.genre,
                    mood_json,
                    t.track_number,
                    t.duration,
                    t.audio_url,
                    t.cover_url,
                    t.lyrics,
                    t.lyrics_status.as_str(),
                    t.favorite as i64,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn update_track(&self, id: &str, patch: &TrackPatch) -> Result<(), StorageError> {
        let cols = patch_columns(patch)?;
        if cols.is_empty() {
            return Ok(());
        }
        let id = id.to_string();
        self.with_conn(move |conn| {
            let set_clause = cols
                .iter()
                .enumerate()
                .map(|(i, (name, _))| format!("{name} = ?{}", i + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("UPDATE tracks SET {set_clause} WHERE id = ?{}", cols.len() + 1);
            let mut values: Vec<Value> = cols.into_iter().map(|(_, v)| v).collect();
            values.push(Value::Text(id.clone()));
            let changed = conn.execute(&sql, params_from_iter(values))?;
            if changed == 0 {
                return Err(StorageError::UnknownTrack(id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_track(&self, id: &str) -> Result<(), StorageError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM tracks WHERE id = ?1", params![id])?;
            conn.execute("DELETE FROM playlist_tracks WHERE track_id = ?1", params![id])?;
            Ok(())
        })
        .await
    }

    async fn load_playlists(&self) -> Result<Vec<Playlist>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM playlists ORDER BY position")?;
            let mut playlists = stmt
                .query_map([], |row| Ok(Playlist::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = conn.prepare(
                "SELECT track_id FROM playlist_tracks WHERE playlist_id = ?1 ORDER BY position",
            )?;
            for pl in &mut playlists {
                pl.track_ids = stmt
                    .query_map(params![pl.id], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
            }
            Ok(playlists)
        })
        .await
    }

    async fn save_playlists(&self, playlists: &[Playlist]) -> Result<(), StorageError> {
        let playlists = playlists.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM playlist_tracks", [])?;
            tx.execute("DELETE FROM playlists", [])?;
            for (pos, pl) in playlists.iter().enumerate() {
                tx.execute(
                    "INSERT INTO playlists(id, name, position) VALUES(?1, ?2, ?3)",
                    params![pl.id, pl.name, pos as i64],
                )?;
                for (tpos, tid) in pl.track_ids.iter().enumerate() {
                    tx.execute(
                        "INSERT OR IGNORE INTO playlist_tracks(playlist_id, position, track_id) VALUES(?1, ?2, ?3)",
                        params![pl.id, tpos as i64, tid],
                    )?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::model::test_track;

    fn temp_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("nested").join("library.sqlite3")).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn add_then_patch_lyrics() {
        let (store, _dir) = temp_store();
        let mut t = test_track("a");
        t.mood = vec!["calm".into()];
        t.track_number = Some(3);
        store.add_track(&t).await.unwrap();

        store
            .update_track("a", &TrackPatch::lyrics_found("[00:01.00]hello"))
            .await
            .unwrap();

        let tracks = store.get_tracks().await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].lyrics.as_deref(), Some("[00:01.00]hello"));
        assert_eq!(tracks[0].lyrics_status, LyricsStatus::Completed);
        assert_eq!(tracks[0].mood, vec!["calm".to_string()]);
        assert_eq!(tracks[0].track_number, Some(3));
    }

    #[tokio::test]
    async fn update_unknown_track_is_an_error() {
        let (store, _dir) = temp_store();
        let err = store
            .update_track("missing", &TrackPatch::favorite(true))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownTrack(id) if id == "missing"));
    }

    #[tokio::test]
    async fn empty_lyrics_patch_clears_column() {
        let (store, _dir) = temp_store();
        let mut t = test_track("a");
        t.lyrics = Some("words".into());
        store.add_track(&t).await.unwrap();
        store
            .update_track(
                "a",
                &TrackPatch {
                    lyrics: Some(String::new()),
                    lyrics_status: Some(LyricsStatus::None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let back = store.get_tracks().await.unwrap();
        assert!(back[0].lyrics.is_none());
    }

    #[tokio::test]
    async fn playlists_replace_whole_set_and_keep_order() {
        let (store, _dir) = temp_store();
        let mut a = Playlist::new("pl-1", "Morning");
        a.add("t2");
        a.add("t1");
        store.save_playlists(&[a.clone(), Playlist::new("pl-2", "Empty")]).await.unwrap();
        assert_eq!(store.load_playlists().await.unwrap().len(), 2);

        store.save_playlists(&[a.clone()]).await.unwrap();
        let loaded = store.load_playlists().await.unwrap();
        assert_eq!(loaded, vec![a]);
    }

    #[tokio::test]
    async fn delete_removes_track_and_playlist_entries() {
        let (store, _dir) = temp_store();
        store.add_track(&test_track("a")).await.unwrap();
        let mut pl = Playlist::new("pl-1", "Mix");
        pl.add("a");
        store.save_playlists(&[pl]).await.unwrap();

        store.delete_track("a").await.unwrap();
        assert!(store.get_tracks().await.unwrap().is_empty());
        assert!(store.load_playlists().await.unwrap()[0].track_ids.is_empty());
    }
}
