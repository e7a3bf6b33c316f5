use super::{MediaBackend, MediaEvent, PlaybackError};
use crate::app::events::Event;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
    process::{Child, Command},
    sync::mpsc,
};

/// mpv child process driven over its JSON IPC socket.
#[derive(Debug)]
pub struct MpvHandle {
    child: Child,
    socket_path: PathBuf,
    writer: tokio::sync::Mutex<tokio::io::WriteHalf<UnixStream>>,
    request_id: AtomicU64,
}

impl MpvHandle {
    pub async fn spawn(
        event_tx: mpsc::Sender<Event>,
        audio_device: Option<&str>,
        log_file: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let socket_path =
            std::env::temp_dir().join(format!("muse-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new("mpv");
        cmd.args([
            "--no-video",
            "--idle=yes",
            // Stay on the file at EOF; the app decides what follows.
            "--keep-open=yes",
            "--pause",
            "--input-terminal=no",
            "--really-quiet",
        ]);
        if let Some(dev) = audio_device {
            cmd.arg(format!("--audio-device={dev}"));
        }
        if let Some(p) = log_file {
            cmd.arg(format!("--log-file={}", p.display()));
        }
        let child = cmd
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("spawn mpv")?;

        let stream = connect_with_retry(&socket_path).await?;
        let (reader, writer) = tokio::io::split(stream);

        tokio::spawn(read_events_loop(reader, event_tx));

        let this = Self {
            child,
            socket_path,
            writer: tokio::sync::Mutex::new(writer),
            request_id: AtomicU64::new(1),
        };

        this.command(json!({"command":["request_log_messages", "warn"]}))
            .await?;
        this.command(json!({"command":["observe_property", 1, "time-pos"]}))
            .await?;
        this.command(json!({"command":["observe_property", 2, "duration"]}))
            .await?;
        this.command(json!({"command":["observe_property", 3, "pause"]}))
            .await?;
        this.command(json!({"command":["observe_property", 4, "eof-reached"]}))
            .await?;

        Ok(this)
    }

    async fn command(&self, mut v: serde_json::Value) -> anyhow::Result<()> {
        // Tag requests so failures come back as structured replies.
        if v.get("request_id").is_none() {
            let id = self.request_id.fetch_add(1, Ordering::Relaxed);
            if let serde_json::Value::Object(ref mut o) = v {
                o.insert("request_id".to_string(), serde_json::Value::from(id));
            }
        }
        let mut w = self.writer.lock().await;
        let mut line = serde_json::to_vec(&v).context("encode mpv json")?;
        line.push(b'\n');
        w.write_all(&line).await.context("write mpv ipc")?;
        w.flush().await.context("flush mpv ipc")?;
        Ok(())
    }

    async fn backend_command(&self, v: serde_json::Value) -> Result<(), PlaybackError> {
        self.command(v)
            .await
            .map_err(|e| PlaybackError::Backend(format!("{e:#}")))
    }
}

#[async_trait]
impl MediaBackend for MpvHandle {
    async fn load(&self, url: &str) -> Result<(), PlaybackError> {
        self.backend_command(json!({"command":["loadfile", url, "replace"]}))
            .await
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        self.command(json!({"command":["set_property", "pause", false]}))
            .await
            .map_err(|e| PlaybackError::Rejected(format!("{e:#}")))
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        self.backend_command(json!({"command":["set_property", "pause", true]}))
            .await
    }

    async fn seek(&self, secs: f64) -> Result<(), PlaybackError> {
        self.backend_command(json!({"command":["seek", secs, "absolute"]}))
            .await
    }

    async fn set_volume(&self, volume: u8) -> Result<(), PlaybackError> {
        self.backend_command(json!({"command":["set_property", "volume", volume.min(100)]}))
            .await
    }
}

impl Drop for MpvHandle {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn connect_with_retry(path: &Path) -> anyhow::Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        match UnixStream::connect(path).await {
            Ok(s) => return Ok(s),
            Err(e) => {
                if tokio::time::Instant::now() > deadline {
                    return Err(e)
                        .with_context(|| format!("connect to mpv ipc {}", path.display()));
                }
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_events_loop(reader: tokio::io::ReadHalf<UnixStream>, event_tx: mpsc::Sender<Event>) {
    let mut lines = BufReader::new(reader).lines();
    let mut paused = true;
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(v) = serde_json::from_str::<serde_json::Value>(&line) else {
            continue;
        };
        if let (Some(_), Some(err)) = (v.get("request_id"), v.get("error").and_then(|e| e.as_str()))
            && err != "success"
        {
            tracing::warn!("mpv ipc error: {err}");
        }
        if let Some(name) = property_name(&v)
            && name == "pause"
        {
            paused = v.get("data").and_then(|d| d.as_bool()).unwrap_or(paused);
        }
        if let Some(ev) = map_mpv_event(&v, paused)
            && event_tx.send(Event::Media(ev)).await.is_err()
        {
            break;
        }
    }
    tracing::debug!("mpv event stream closed");
}

fn property_name(v: &serde_json::Value) -> Option<&str> {
    if v.get("event")?.as_str()? != "property-change" {
        return None;
    }
    v.get("name")?.as_str()
}

fn map_mpv_event(v: &serde_json::Value, paused: bool) -> Option<MediaEvent> {
    match v.get("event")?.as_str()? {
        "property-change" => {
            let data = v.get("data");
            match v.get("name")?.as_str()? {
                "time-pos" => Some(MediaEvent::Position {
                    secs: data?.as_f64()?,
                }),
                "duration" => Some(MediaEvent::Metadata {
                    duration: data?.as_f64()?,
                }),
                "pause" => Some(if data?.as_bool()? {
                    MediaEvent::Paused
                } else {
                    MediaEvent::Playing
                }),
                "eof-reached" => data?.as_bool()?.then_some(MediaEvent::Ended),
                _ => None,
            }
        }
        "end-file" => {
            // Normal ends arrive as eof-reached under --keep-open.
            let reason = v.get("reason").and_then(|x| x.as_str()).unwrap_or("");
            (reason == "error").then(|| {
                let err = v.get("file_error").or_else(|| v.get("error"));
                let err = err.and_then(|x| x.as_str()).unwrap_or("unknown");
                MediaEvent::Error(format!("mpv could not play file: {err}"))
            })
        }
        "playback-restart" if !paused => Some(MediaEvent::Playing),
        "log-message" => {
            let level = v.get("level")?.as_str()?;
            let text = v.get("text")?.as_str()?.trim();
            if !text.is_empty() {
                tracing::warn!("mpv {level}: {text}");
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_changes_map_to_media_events() {
        let pos = json!({"event":"property-change","name":"time-pos","data":12.5});
        assert_eq!(map_mpv_event(&pos, false), Some(MediaEvent::Position { secs: 12.5 }));

        let dur = json!({"event":"property-change","name":"duration","data":201.0});
        assert_eq!(map_mpv_event(&dur, false), Some(MediaEvent::Metadata { duration: 201.0 }));

        let eof = json!({"event":"property-change","name":"eof-reached","data":true});
        assert_eq!(map_mpv_event(&eof, false), Some(MediaEvent::Ended));
        let not_eof = json!({"event":"property-change","name":"eof-reached","data":false});
        assert_eq!(map_mpv_event(&not_eof, false), None);
    }

    #[test]
    fn unset_properties_are_ignored() {
        let idle = json!({"event":"property-change","name":"duration"});
        assert_eq!(map_mpv_event(&idle, true), None);
    }

    #[test]
    fn file_errors_surface() {
        let err = json!({"event":"end-file","reason":"error","file_error":"unrecognized file format"});
        assert!(matches!(map_mpv_event(&err, false), Some(MediaEvent::Error(m)) if m.contains("unrecognized")));

        let stop = json!({"event":"end-file","reason":"stop"});
        assert_eq!(map_mpv_event(&stop, false), None);
    }

    #[test]
    fn restart_only_counts_as_playing_when_unpaused() {
        let restart = json!({"event":"playback-restart"});
        assert_eq!(map_mpv_event(&restart, false), Some(MediaEvent::Playing));
        assert_eq!(map_mpv_event(&restart, true), None);
    }
}
