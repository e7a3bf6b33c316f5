use crate::app::actions::Action;
use crate::app::events::Event;
use crate::library::{SortKey, View};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub const HELP: &str = "\
commands:
  list | view <library|favorites|album:NAME|playlist:ID> | search [TEXT]
  play <n> | pause | toggle | next | prev | seek <pct> | fwd | back
  vol <0-100> | vol+ | vol- | repeat
  queue <n> | unqueue <n> | playq <n> | clearq | upnext
  sort <title|artist|duration|off> | fav <n> | rm <n>
  playlists | openpl <p> | mkpl <name> | rmpl <p>
  pladd <p> <n> | plrm <p> <pos>
  lyrics <n> | setlyrics <n> <file> | rmlyrics <n>
  notes | dismiss <id> | retry <id> | clear-notes
  quit";

/// Read commands from stdin until EOF or until the app stops listening.
pub fn spawn_stdin_task(tx: mpsc::Sender<Event>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let action = match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => parse_line(&line).unwrap_or_else(Action::Invalid),
                Ok(None) => Action::Quit,
                Err(e) => {
                    tracing::warn!("stdin: {e}");
                    Action::Quit
                }
            };
            let quit = action == Action::Quit;
            if tx.send(Event::Input(action)).await.is_err() || quit {
                break;
            }
        }
    });
}

/// Map one command line to an action. Track and queue numbers are 1-based
/// as printed; they become 0-based indices here.
pub fn parse_line(line: &str) -> Result<Action, String> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((c, r)) => (c, r.trim()),
        None => (line, ""),
    };

    let action = match cmd {
        "quit" | "q" | "exit" => Action::Quit,
        "help" | "?" => return Err(HELP.to_string()),

        "play" | "p" => Action::PlayIndex(position(rest)?),
        "pause" => Action::Pause,
        "toggle" | "t" => Action::TogglePause,
        "next" | "n" => Action::PlayNext,
        "prev" => Action::PlayPrev,
        "seek" => {
            let pct = rest
                .trim_end_matches('%')
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite())
                .ok_or_else(|| format!("seek expects a percentage, got {rest:?}"))?;
            Action::SeekPercent(pct)
        }
        "fwd" => Action::SeekForward,
        "back" => Action::SeekBack,
        "vol" => Action::SetVolume(
            rest.parse::<i32>()
                .map_err(|_| format!("vol expects 0-100, got {rest:?}"))?,
        ),
        "vol+" => Action::VolumeUp,
        "vol-" => Action::VolumeDown,
        "repeat" | "r" => Action::ToggleRepeatMode,

        "queue" => Action::QueueAdd(position(rest)?),
        "unqueue" => Action::QueueRemove(position(rest)?),
        "playq" => Action::QueuePlayIndex(position(rest)?),
        "clearq" => Action::QueueClear,
        "upnext" => Action::ShowUpNext,

        "list" | "ls" => Action::ShowList,
        "view" => Action::SetView(
            View::parse(rest).ok_or_else(|| format!("unknown view {rest:?}"))?,
        ),
        "search" | "/" => Action::Search(rest.to_string()),
        "sort" => Action::SortBy(match rest {
            "off" | "none" => None,
            key => Some(SortKey::parse(key).ok_or_else(|| format!("unknown sort {key:?}"))?),
        }),
        "fav" => Action::ToggleFavorite(position(rest)?),
        "rm" => Action::RemoveTrack(position(rest)?),

        "playlists" | "pls" => Action::ShowPlaylists,
        "openpl" => Action::OpenPlaylist(position(rest)?),
        "mkpl" if !rest.is_empty() => Action::CreatePlaylist(rest.to_string()),
        "mkpl" => return Err("mkpl expects a playlist name".into()),
        "rmpl" => Action::DeletePlaylist(position(rest)?),
        "pladd" => {
            let (playlist, track) = two_positions(rest)?;
            Action::AddToPlaylist { playlist, track }
        }
        "plrm" => {
            let (playlist, track) = two_positions(rest)?;
            Action::RemoveFromPlaylist { playlist, track }
        }

        "lyrics" => Action::ShowLyrics(position(rest)?),
        "setlyrics" => {
            let (n, file) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "setlyrics expects <n> <file>".to_string())?;
            Action::ImportLyrics(position(n)?, PathBuf::from(file.trim()))
        }
        "rmlyrics" => Action::RemoveLyrics(position(rest)?),

        "notes" => Action::ShowNotifications,
        "dismiss" => Action::DismissNotification(note_id(rest)?),
        "retry" => Action::RetryNotification(note_id(rest)?),
        "clear-notes" => Action::ClearNotifications,

        other => return Err(format!("unknown command {other:?} (try `help`)")),
    };
    Ok(action)
}

fn position(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("expected a number from 1, got {arg:?}")),
    }
}

fn two_positions(arg: &str) -> Result<(usize, usize), String> {
    let mut parts = arg.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) => Ok((position(a)?, position(b)?)),
        _ => Err(format!("expected two numbers, got {arg:?}")),
    }
}

fn note_id(arg: &str) -> Result<u64, String> {
    arg.trim_start_matches('#')
        .parse()
        .map_err(|_| format!("expected a notification id, got {arg:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_one_based() {
        assert_eq!(parse_line("play 1"), Ok(Action::PlayIndex(0)));
        assert_eq!(parse_line("  queue 3 "), Ok(Action::QueueAdd(2)));
        assert_eq!(parse_line("playq 2"), Ok(Action::QueuePlayIndex(1)));
        assert!(parse_line("play 0").is_err());
        assert!(parse_line("play").is_err());
        assert!(parse_line("unqueue x").is_err());
    }

    #[test]
    fn transport_commands() {
        assert_eq!(parse_line("toggle"), Ok(Action::TogglePause));
        assert_eq!(parse_line("seek 50"), Ok(Action::SeekPercent(50.0)));
        assert_eq!(parse_line("seek 12.5%"), Ok(Action::SeekPercent(12.5)));
        assert_eq!(parse_line("vol 120"), Ok(Action::SetVolume(120)));
        assert_eq!(parse_line("repeat"), Ok(Action::ToggleRepeatMode));
        assert!(parse_line("vol loud").is_err());
        assert!(parse_line("seek nan").is_err());
        assert!(parse_line("seek inf").is_err());
    }

    #[test]
    fn views_and_search() {
        assert_eq!(
            parse_line("view album:Abbey Road"),
            Ok(Action::SetView(View::Album("Abbey Road".into())))
        );
        assert_eq!(parse_line("search "), Ok(Action::Search(String::new())));
        assert_eq!(
            parse_line("search john lennon"),
            Ok(Action::Search("john lennon".into()))
        );
        assert!(parse_line("view nowhere").is_err());
    }

    #[test]
    fn notification_commands() {
        assert_eq!(parse_line("retry #4"), Ok(Action::RetryNotification(4)));
        assert_eq!(parse_line("dismiss 7"), Ok(Action::DismissNotification(7)));
        assert_eq!(parse_line("clear-notes"), Ok(Action::ClearNotifications));
    }

    #[test]
    fn playlist_commands() {
        assert_eq!(parse_line("playlists"), Ok(Action::ShowPlaylists));
        assert_eq!(
            parse_line("mkpl Road Trip"),
            Ok(Action::CreatePlaylist("Road Trip".into()))
        );
        assert!(parse_line("mkpl").is_err());
        assert_eq!(
            parse_line("pladd 1 3"),
            Ok(Action::AddToPlaylist { playlist: 0, track: 2 })
        );
        assert_eq!(
            parse_line("plrm 2 1"),
            Ok(Action::RemoveFromPlaylist { playlist: 1, track: 0 })
        );
        assert!(parse_line("pladd 1").is_err());
        assert!(parse_line("pladd 1 2 3").is_err());
        assert_eq!(parse_line("openpl 1"), Ok(Action::OpenPlaylist(0)));
        assert_eq!(parse_line("rmpl 4"), Ok(Action::DeletePlaylist(3)));
    }

    #[test]
    fn lyrics_and_sort_commands() {
        assert_eq!(parse_line("lyrics 2"), Ok(Action::ShowLyrics(1)));
        assert_eq!(
            parse_line("setlyrics 1 /tmp/imagine lyrics.lrc"),
            Ok(Action::ImportLyrics(0, PathBuf::from("/tmp/imagine lyrics.lrc")))
        );
        assert!(parse_line("setlyrics 1").is_err());
        assert_eq!(parse_line("rmlyrics 3"), Ok(Action::RemoveLyrics(2)));
        assert_eq!(parse_line("sort artist"), Ok(Action::SortBy(Some(SortKey::Artist))));
        assert_eq!(parse_line("sort off"), Ok(Action::SortBy(None)));
        assert!(parse_line("sort mood").is_err());
    }

    #[test]
    fn unknown_command_is_an_error() {
        let err = parse_line("shuffle").unwrap_err();
        assert!(err.contains("shuffle"));
        assert!(parse_line("help").unwrap_err().contains("commands:"));
    }
}
