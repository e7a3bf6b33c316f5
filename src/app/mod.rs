pub mod actions;
pub mod events;
pub mod session;

mod library;
mod lyrics;
mod playback;

use crate::config::Config;
use crate::library::View;
use crate::lyrics::{LyricsFetchQueue, LyricsFetcher};
use crate::notify::NotificationSink;
use crate::player::{MediaBackend, Playback};
use crate::storage::{CompositeStore, StoreWriter};
use actions::Action;
use events::Event;
use session::PlayerSession;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The engine: owns the session and every collaborator, and runs the single
/// event loop. Spawned tasks only do I/O and post results back as events.
pub struct App {
    cfg: Config,
    config_path: Option<PathBuf>,
    pub session: PlayerSession,
    pub notifications: NotificationSink,
    lyrics_queue: LyricsFetchQueue,
    follow: Option<lyrics::LyricsFollow>,
    store: CompositeStore,
    writer: StoreWriter,
    fetcher: Arc<dyn LyricsFetcher>,
    media: Arc<dyn MediaBackend>,
    pub status: String,
    should_quit: bool,
}

impl App {
    pub fn new(
        cfg: Config,
        config_path: Option<PathBuf>,
        store: CompositeStore,
        fetcher: Arc<dyn LyricsFetcher>,
        media: Arc<dyn MediaBackend>,
    ) -> Self {
        let playback = Playback::new(cfg.player.volume, cfg.player.repeat);
        let notifications = NotificationSink::new(cfg.notifications.capacity);
        let writer = StoreWriter::spawn(store.clone());
        Self {
            cfg,
            config_path,
            session: PlayerSession::new(playback),
            notifications,
            lyrics_queue: LyricsFetchQueue::new(),
            follow: None,
            store,
            writer,
            fetcher,
            media,
            status: String::new(),
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Load the library and start draining any pending lyrics backlog.
    pub async fn start(&mut self, tx: &mpsc::Sender<Event>) {
        self.load_library().await;
        if let Err(e) = self.media.set_volume(self.session.playback.volume).await {
            tracing::warn!("set initial volume: {e}");
        }
        self.pump_lyrics(tx);
    }

    pub async fn run(
        &mut self,
        tx: mpsc::Sender<Event>,
        mut rx: mpsc::Receiver<Event>,
    ) -> anyhow::Result<()> {
        self.start(&tx).await;
        let mut shown = self.report(String::new());

        while let Some(ev) = rx.recv().await {
            self.handle_event(ev, &tx).await;
            if self.should_quit {
                break;
            }
            shown = self.report(shown);
        }

        self.save_state_on_quit();
        self.flush_writes().await;
        Ok(())
    }

    /// Print the status line when it changed since the last event.
    fn report(&self, last: String) -> String {
        if self.status != last && !self.status.is_empty() {
            println!("{}", self.status);
        }
        self.status.clone()
    }

    pub async fn handle_event(&mut self, ev: Event, tx: &mpsc::Sender<Event>) {
        match ev {
            Event::Input(action) => self.handle_action(action, tx).await,
            Event::Media(me) => self.handle_media(me).await,
            Event::Lyrics(le) => self.handle_lyrics(le, tx),
        }
    }

    pub async fn handle_action(&mut self, action: Action, tx: &mpsc::Sender<Event>) {
        match action {
            Action::Quit => self.should_quit = true,

            Action::PlayIndex(i) => self.play_displayed(i).await,
            Action::TogglePause => self.toggle_pause().await,
            Action::Pause => self.pause().await,
            Action::PlayNext => self.next().await,
            Action::PlayPrev => self.prev().await,
            Action::SeekPercent(pct) => self.seek_percent(pct).await,
            Action::SeekForward => self.seek_relative(10.0).await,
            Action::SeekBack => self.seek_relative(-10.0).await,
            Action::SetVolume(v) => {
                let v = self.session.playback.set_volume(v);
                self.apply_volume(v).await;
            }
            Action::VolumeUp => {
                let v = self.session.playback.adjust_volume(5);
                self.apply_volume(v).await;
            }
            Action::VolumeDown => {
                let v = self.session.playback.adjust_volume(-5);
                self.apply_volume(v).await;
            }
            Action::ToggleRepeatMode => {
                let mode = self.session.playback.toggle_repeat();
                self.status = mode.label().to_string();
            }

            Action::QueueAdd(i) => self.enqueue_displayed(i),
            Action::QueueRemove(i) => match self.session.queue.remove_at(i) {
                Some(t) => self.status = format!("Removed \"{}\" from queue", t.title),
                None => self.status = format!("No queue entry {}", i + 1),
            },
            Action::QueuePlayIndex(i) => self.play_from_queue(i).await,
            Action::QueueClear => {
                self.session.queue.clear();
                self.notifications.info("Queue cleared");
                self.status = "Queue cleared".into();
            }
            Action::ShowUpNext => self.status = self.render_up_next(),

            Action::SetView(view) => {
                self.session.set_view(view);
                self.status = self.render_list();
            }
            Action::Search(q) => {
                self.session.set_search(q);
                self.status = self.render_list();
            }
            Action::ShowList => self.status = self.render_list(),
            Action::SortBy(key) => {
                self.session.set_sort(key);
                self.status = self.render_list();
            }
            Action::ToggleFavorite(i) => {
                if let Some(id) = self.displayed_id(i) {
                    self.toggle_favorite(&id);
                }
            }
            Action::RemoveTrack(i) => {
                if let Some(id) = self.displayed_id(i) {
                    self.remove_track(&id).await;
                }
            }

            Action::ShowPlaylists => self.status = self.render_playlists(),
            Action::OpenPlaylist(p) => {
                if let Some(pl) = self.playlist_id_at(p) {
                    self.session.set_view(View::Playlist(pl));
                    self.status = self.render_list();
                }
            }
            Action::CreatePlaylist(name) => {
                let id = self.create_playlist(&name, None);
                self.status = format!("Created playlist \"{name}\" (id={id})");
            }
            Action::AddToPlaylist { playlist, track } => {
                if let Some(pl) = self.playlist_id_at(playlist)
                    && let Some(id) = self.displayed_id(track)
                {
                    self.add_to_playlist(&pl, &id);
                }
            }
            Action::RemoveFromPlaylist { playlist, track } => {
                self.remove_playlist_entry(playlist, track)
            }
            Action::DeletePlaylist(p) => {
                if let Some(pl) = self.playlist_id_at(p) {
                    self.delete_playlist(&pl);
                }
            }

            Action::ShowLyrics(i) => {
                if let Some(id) = self.displayed_id(i) {
                    self.status = self.render_lyrics(&id);
                }
            }
            Action::ImportLyrics(i, path) => {
                if let Some(id) = self.displayed_id(i) {
                    self.import_lyrics_file(&id, &path);
                }
            }
            Action::RemoveLyrics(i) => {
                if let Some(id) = self.displayed_id(i) {
                    self.remove_lyrics(&id);
                    self.status = "Lyrics removed".into();
                }
            }

            Action::ShowNotifications => {
                self.status = self.render_notifications();
                self.notifications.mark_all_read();
            }
            Action::DismissNotification(id) => {
                self.status = match self.notifications.dismiss(id) {
                    Some(_) => format!("Dismissed #{id}"),
                    None => format!("No notification #{id}"),
                };
            }
            Action::RetryNotification(id) => self.retry_lyrics(id, tx),
            Action::ClearNotifications => {
                self.notifications.clear_all();
                self.status = "Notifications cleared".into();
            }

            Action::Invalid(msg) => self.status = msg,
        }
    }

    fn save_state_on_quit(&mut self) {
        self.cfg.player.volume = self.session.playback.volume;
        self.cfg.player.repeat = self.session.playback.repeat;
        if let Err(e) = crate::config::save(&self.cfg, self.config_path.as_deref()) {
            tracing::warn!("save config: {e:#}");
        }
    }

    /// Wait for every store write issued so far.
    pub async fn flush_writes(&self) {
        self.writer.flush().await;
    }

    fn render_list(&self) -> String {
        let shown = self.session.displayed();
        let mut out = format!("{} ({} tracks)", self.session.view().label(), shown.len());
        if let Some(key) = self.session.sort() {
            out.push_str(&format!(", sorted by {key:?}").to_lowercase());
        }
        if !self.session.search().trim().is_empty() {
            out = format!("Search \"{}\" ({} tracks)", self.session.search(), shown.len());
            let albums = crate::library::matching_albums(self.session.tracks(), self.session.search());
            if !albums.is_empty() {
                out.push_str(&format!("\n  albums: {}", albums.join(", ")));
            }
        }
        let active = self.session.playback.current_id();
        for (i, t) in shown.iter().enumerate() {
            let marker = if Some(t.id.as_str()) == active { '>' } else { ' ' };
            let fav = if t.favorite { " *" } else { "" };
            out.push_str(&format!("\n{marker}{:3}. {}{fav}", i + 1, t.display_name()));
        }
        out
    }

    fn render_up_next(&self) -> String {
        let mut out = String::from("Up next:");
        for (i, t) in self.session.queue.iter().enumerate() {
            out.push_str(&format!("\n  q{}. {}", i + 1, t.display_name()));
        }
        for t in self.session.upcoming(crate::player::resolver::DEFAULT_PEEK) {
            out.push_str(&format!("\n      {}", t.display_name()));
        }
        out
    }

    fn render_notifications(&self) -> String {
        if self.notifications.is_empty() {
            return "No notifications".into();
        }
        let mut out = format!("Notifications ({} unread):", self.notifications.unread_count());
        for n in self.notifications.iter() {
            let retry = if n.is_retryable() { " [retry]" } else { "" };
            let unread = if n.is_read { ' ' } else { '!' };
            out.push_str(&format!(
                "\n{unread}#{} {:?}: {}{retry}",
                n.id, n.kind, n.message
            ));
        }
        out
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Harness;
    use super::*;
    use crate::library::model::test_track;
    use crate::player::{PlayState, RepeatMode};

    fn abc() -> Vec<crate::library::Track> {
        vec![test_track("A"), test_track("B"), test_track("C")]
    }

    #[tokio::test]
    async fn next_walks_view_then_wraps() {
        let mut h = Harness::new(abc(), vec![]).await;
        h.act(Action::PlayIndex(1)).await;
        assert_eq!(h.active_id().as_deref(), Some("B"));
        h.act(Action::PlayNext).await;
        assert_eq!(h.active_id().as_deref(), Some("C"));
        h.act(Action::PlayNext).await;
        assert_eq!(h.active_id().as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn queue_preempts_and_is_consumed() {
        let mut h = Harness::new(abc(), vec![]).await;
        h.act(Action::PlayIndex(0)).await;
        h.act(Action::QueueAdd(2)).await;
        h.act(Action::QueueAdd(1)).await;
        h.act(Action::PlayNext).await;
        assert_eq!(h.active_id().as_deref(), Some("C"));
        assert_eq!(h.app.session.queue.len(), 1);
        assert_eq!(h.app.notifications.len(), 2);
    }

    #[tokio::test]
    async fn play_from_queue_bypasses_order() {
        let mut h = Harness::new(abc(), vec![]).await;
        h.act(Action::QueueAdd(0)).await;
        h.act(Action::QueueAdd(2)).await;
        h.act(Action::QueuePlayIndex(1)).await;
        assert_eq!(h.active_id().as_deref(), Some("C"));
        assert_eq!(h.app.session.playback.state(), PlayState::Playing);
        let left: Vec<_> = h.app.session.queue.iter().map(|t| t.id.clone()).collect();
        assert_eq!(left, vec!["A"]);
    }

    #[tokio::test]
    async fn refused_play_reverts_to_paused() {
        let mut h = Harness::new(abc(), vec![]).await;
        h.media
            .refuse_play
            .store(true, std::sync::atomic::Ordering::SeqCst);
        h.act(Action::PlayIndex(0)).await;
        assert_eq!(h.app.session.playback.state(), PlayState::Paused);
        assert!(h.app.status.contains("Playback failed"));
    }

    #[tokio::test]
    async fn same_locator_is_not_reloaded() {
        let mut h = Harness::new(abc(), vec![]).await;
        h.act(Action::PlayIndex(0)).await;
        h.act(Action::PlayIndex(0)).await;
        let loads = h
            .media
            .commands()
            .iter()
            .filter(|c| c.starts_with("load"))
            .count();
        assert_eq!(loads, 1);
    }

    #[tokio::test]
    async fn repeat_toggle_cycles_and_reports() {
        let mut h = Harness::new(abc(), vec![]).await;
        h.act(Action::ToggleRepeatMode).await;
        assert_eq!(h.app.session.playback.repeat, RepeatMode::All);
        assert_eq!(h.app.status, "Repeat: All");
    }

    #[tokio::test]
    async fn sort_changes_listing_and_next() {
        let mut tracks = abc();
        tracks[0].title = "Zebra".into();
        let mut h = Harness::new(tracks, vec![]).await;
        h.act(Action::SortBy(Some(crate::library::SortKey::Title))).await;
        assert!(h.app.status.contains("sorted by title"));
        h.act(Action::PlayIndex(0)).await;
        assert_eq!(h.active_id().as_deref(), Some("B"));
        h.act(Action::PlayNext).await;
        assert_eq!(h.active_id().as_deref(), Some("C"));
        h.act(Action::PlayNext).await;
        assert_eq!(h.active_id().as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn notifications_panel_marks_read() {
        let mut h = Harness::new(abc(), vec![]).await;
        h.act(Action::QueueAdd(0)).await;
        assert_eq!(h.app.notifications.unread_count(), 1);
        h.act(Action::ShowNotifications).await;
        assert_eq!(h.app.notifications.unread_count(), 0);
        assert_eq!(h.app.notifications.len(), 1);
        h.act(Action::ClearNotifications).await;
        assert!(h.app.notifications.is_empty());
    }
}
