use crate::player::RepeatMode;
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub storage: StorageConfig,
    pub lyrics: LyricsConfig,
    pub player: PlayerConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Holds `library.sqlite3` and `mpv.log`.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Library server base URL. When set it is authoritative and the local
    /// database acts as a cache.
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Pause after every lookup, whatever its outcome.
    pub request_delay_ms: u64,
    /// Enroll newly imported tracks for lookup.
    pub auto_fetch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// mpv audio device name (see `mpv --audio-device=help`)
    pub audio_device: Option<String>,
    /// Volume level (0-100)
    pub volume: u8,
    pub repeat: RepeatMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Oldest entries are evicted past this many.
    pub capacity: usize,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("muse"));
        Self { data_dir }
    }
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            base_url: crate::lyrics::LrclibClient::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            request_delay_ms: 1000,
            auto_fetch: true,
        }
    }
}

impl LyricsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            audio_device: None,
            volume: 70,
            repeat: RepeatMode::Off,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            capacity: crate::notify::DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    pub fn library_db_path(&self) -> PathBuf {
        self.paths.data_dir.join("library.sqlite3")
    }

    pub fn mpv_log_path(&self) -> PathBuf {
        self.paths.data_dir.join("mpv.log")
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "muse", "muse")
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = project_dirs().context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

fn resolve_path(override_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match override_path {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = resolve_path(override_path)?;
    write_config(cfg, &path)
}

/// Read the config, writing defaults on first run.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = resolve_path(override_path)?;

    if !path.exists() {
        let cfg = Config::default();
        write_config(&cfg, &path)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let mut cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    cfg.player.volume = cfg.player.volume.min(100);
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.lyrics.request_delay_ms, 1000);
        assert_eq!(cfg.lyrics.timeout_secs, 10);
        assert_eq!(cfg.notifications.capacity, 200);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[player]\nvolume = 250\nrepeat = \"one\"\n\n[storage]\nremote_url = \"http://localhost:3001\"\n",
        )
        .unwrap();
        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg.player.volume, 100);
        assert_eq!(cfg.player.repeat, RepeatMode::One);
        assert_eq!(cfg.storage.remote_url.as_deref(), Some("http://localhost:3001"));
        assert!(cfg.lyrics.auto_fetch);
    }

    #[test]
    fn save_round_trips_player_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.player.volume = 35;
        cfg.player.repeat = RepeatMode::All;
        save(&cfg, Some(&path)).unwrap();
        let back = load(Some(&path)).unwrap();
        assert_eq!(back.player.volume, 35);
        assert_eq!(back.player.repeat, RepeatMode::All);
    }
}
