use anyhow::Context;
use clap::{Parser, Subcommand};
use muse::app::App;
use muse::app::actions::Action;
use muse::app::events::Event;
use muse::config::{self, Config};
use muse::library::{Track, View};
use muse::lyrics::{LrclibClient, LyricsFetcher};
use muse::player::{MediaBackend, MpvHandle, NullBackend};
use muse::storage::{CompositeStore, MemoryStore, RemoteStore, SqliteStore, TrackStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "muse", version, about = "Local-first music player")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive player driven by line commands on stdin (default).
    Play {
        /// library, favorites, album:<name> or playlist:<id>
        #[arg(long)]
        view: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Print the library.
    List,
    /// Import a JSON array of track records or scanned `{path, tags...}` entries.
    Import { manifest: PathBuf },
    Lyrics {
        #[command(subcommand)]
        cmd: LyricsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum LyricsCommand {
    /// Work through every track still pending lyrics, one request at a time.
    Fetch,
    /// Print a track's lyrics without timestamps.
    Show { track_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let (tx, rx) = mpsc::channel::<Event>(256);

    match cli.command.unwrap_or(Command::Play {
        view: None,
        search: None,
    }) {
        Command::Play { view, search } => {
            let log_path = cfg.mpv_log_path();
            let spawned = MpvHandle::spawn(
                tx.clone(),
                cfg.player.audio_device.as_deref(),
                Some(log_path.as_path()),
            )
            .await;
            let media: Arc<dyn MediaBackend> = match spawned {
                Ok(mpv) => Arc::new(mpv),
                Err(e) => {
                    tracing::warn!("mpv unavailable, running without audio: {e:#}");
                    Arc::new(NullBackend::new(tx.clone()))
                }
            };
            let mut app = make_app(cfg, cli.config, media)?;

            if let Some(v) = view {
                let v = View::parse(&v).with_context(|| format!("unknown view {v:?}"))?;
                tx.send(Event::Input(Action::SetView(v))).await?;
            }
            if let Some(q) = search {
                tx.send(Event::Input(Action::Search(q))).await?;
            }
            println!("{}", muse::input::HELP);
            muse::input::spawn_stdin_task(tx.clone());
            app.run(tx, rx).await?;
        }
        Command::List => {
            let mut app = make_app(cfg, cli.config, Arc::new(NullBackend::new(tx)))?;
            app.load_library().await;
            print_tracks(app.session.displayed().iter().map(|t| t.as_ref()));
        }
        Command::Import { manifest } => {
            let raw = std::fs::read_to_string(&manifest)
                .with_context(|| format!("read {}", manifest.display()))?;
            let tracks = muse::library::parse_manifest(&raw)
                .with_context(|| format!("parse {}", manifest.display()))?;
            let mut app = make_app(cfg, cli.config, Arc::new(NullBackend::new(tx)))?;
            app.load_library().await;
            let added = app.import(tracks);
            app.flush_writes().await;
            println!("Imported {added} tracks.");
            let pending = app.session.pending_lyrics().len();
            if pending > 0 {
                println!("{pending} tracks wait for lyrics; run `muse lyrics fetch`.");
            }
        }
        Command::Lyrics { cmd } => {
            let mut app = make_app(cfg, cli.config, Arc::new(NullBackend::new(tx)))?;
            app.load_library().await;
            match cmd {
                LyricsCommand::Fetch => {
                    let processed = app.drain_lyrics().await;
                    println!("Processed {processed} tracks.");
                    for n in app.notifications.iter() {
                        println!("  {:?}: {}", n.kind, n.message);
                    }
                }
                LyricsCommand::Show { track_id } => {
                    let track = app
                        .session
                        .track(&track_id)
                        .with_context(|| format!("no track {track_id}"))?;
                    match track.lyrics.as_deref() {
                        Some(text) => println!("{}", muse::lyrics::parser::plain_text(text)),
                        None => println!("No lyrics for \"{}\".", track.title),
                    }
                }
            }
        }
    }

    Ok(())
}

fn make_app(
    cfg: Config,
    config_path: Option<PathBuf>,
    media: Arc<dyn MediaBackend>,
) -> anyhow::Result<App> {
    let store = open_store(&cfg);
    let fetcher: Arc<dyn LyricsFetcher> = Arc::new(
        LrclibClient::new(&cfg.lyrics.base_url, cfg.lyrics.timeout()).context("lyrics client")?,
    );
    Ok(App::new(cfg, config_path, store, fetcher, media))
}

fn open_store(cfg: &Config) -> CompositeStore {
    let path = cfg.library_db_path();
    let local: Arc<dyn TrackStore> = match SqliteStore::open(&path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::error!("open {}: {e}; library changes will not be saved", path.display());
            Arc::new(MemoryStore::new())
        }
    };
    let remote = cfg.storage.remote_url.as_deref().and_then(|url| {
        RemoteStore::new(url)
            .map(|r| Arc::new(r) as Arc<dyn TrackStore>)
            .map_err(|e| tracing::warn!("library server {url}: {e}"))
            .ok()
    });
    CompositeStore::new(local, remote)
}

fn print_tracks<'a>(tracks: impl Iterator<Item = &'a Track>) {
    for (i, t) in tracks.enumerate() {
        let fav = if t.favorite { " *" } else { "" };
        println!(
            "{:3}. {}{fav}  [{:?}]  (id={})",
            i + 1,
            t.display_name(),
            t.lyrics_status,
            t.id
        );
    }
}
