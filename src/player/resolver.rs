//! Context resolution: what plays after (or before) the active track.
//!
//! The context is the displayed list, treated as circular for manual
//! navigation. The play queue only ever affects forward movement.

use super::state::{EndAction, RepeatMode};
use crate::library::Track;
use crate::queue::PlayQueue;
use std::sync::Arc;

pub const DEFAULT_PEEK: usize = 10;
const FALLBACK_PEEK: usize = 5;

fn index_of(displayed: &[Arc<Track>], active: Option<&str>) -> Option<usize> {
    let id = active?;
    displayed.iter().position(|t| t.id == id)
}

/// The next track. A non-empty queue always wins and loses its head.
pub fn next(
    active: Option<&str>,
    displayed: &[Arc<Track>],
    queue: &mut PlayQueue,
) -> Option<Arc<Track>> {
    if let Some(head) = queue.pop_front() {
        return Some(head);
    }
    if displayed.is_empty() {
        return None;
    }
    match index_of(displayed, active) {
        Some(i) => Some(displayed[(i + 1) % displayed.len()].clone()),
        None => Some(displayed[0].clone()),
    }
}

/// The previous track in the context. Never looks at the queue.
pub fn prev(active: Option<&str>, displayed: &[Arc<Track>]) -> Option<Arc<Track>> {
    if displayed.is_empty() {
        return None;
    }
    let len = displayed.len();
    match index_of(displayed, active) {
        Some(i) => Some(displayed[(i + len - 1) % len].clone()),
        None => Some(displayed[0].clone()),
    }
}

/// Context tracks after the active one, wrapping, without repeats and never
/// the active track itself.
pub fn peek_upcoming(
    active: Option<&str>,
    displayed: &[Arc<Track>],
    count: usize,
) -> Vec<Arc<Track>> {
    let len = displayed.len();
    match index_of(displayed, active) {
        None => displayed.iter().take(count.min(FALLBACK_PEEK)).cloned().collect(),
        Some(i) => (1..len)
            .take(count)
            .map(|step| displayed[(i + step) % len].clone())
            .collect(),
    }
}

/// Decide what an end-of-track means under `repeat`.
pub fn end_action(
    repeat: RepeatMode,
    active: Option<&str>,
    displayed: &[Arc<Track>],
    queue: &PlayQueue,
) -> EndAction {
    if repeat == RepeatMode::One {
        return EndAction::Restart;
    }
    if !queue.is_empty() {
        return EndAction::Advance;
    }
    if displayed.is_empty() {
        return EndAction::Stop;
    }
    let is_last = index_of(displayed, active) == Some(displayed.len() - 1);
    match (repeat, is_last) {
        (RepeatMode::All, true) => EndAction::WrapToFirst,
        (RepeatMode::Off, true) => EndAction::Stop,
        _ => EndAction::Advance,
    }
}
