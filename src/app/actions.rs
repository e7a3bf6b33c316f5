use crate::library::{SortKey, View};
use std::path::PathBuf;

/// User intents. Indices are zero-based positions in the displayed list or
/// the play queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,

    // Transport
    PlayIndex(usize),
    TogglePause,
    Pause,
    PlayNext,
    PlayPrev,
    SeekPercent(f64),
    SeekForward,
    SeekBack,
    SetVolume(i32),
    VolumeUp,
    VolumeDown,
    ToggleRepeatMode,

    // Queue actions
    QueueAdd(usize),
    QueueRemove(usize),
    QueuePlayIndex(usize),
    QueueClear,
    ShowUpNext,

    // Library
    SetView(View),
    Search(String),
    ShowList,
    SortBy(Option<SortKey>),
    ToggleFavorite(usize),
    RemoveTrack(usize),

    // Playlists: the first index is a position in the playlist listing.
    ShowPlaylists,
    OpenPlaylist(usize),
    CreatePlaylist(String),
    AddToPlaylist { playlist: usize, track: usize },
    /// `track` is a position within the playlist itself.
    RemoveFromPlaylist { playlist: usize, track: usize },
    DeletePlaylist(usize),

    // Lyrics
    ShowLyrics(usize),
    ImportLyrics(usize, PathBuf),
    RemoveLyrics(usize),

    // Notifications
    ShowNotifications,
    DismissNotification(u64),
    RetryNotification(u64),
    ClearNotifications,

    /// A line that did not parse.
    Invalid(String),
}
