//! User-visible event log.
//!
//! Newest entries come first. The log keeps at most `capacity` entries and
//! evicts the oldest when full.

use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppNotification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub track_id: Option<String>,
    pub is_read: bool,
}

impl AppNotification {
    /// Error entries tied to a track can be retried.
    pub fn is_retryable(&self) -> bool {
        self.kind == NotificationKind::Error && self.track_id.is_some()
    }
}

#[derive(Debug)]
pub struct NotificationSink {
    entries: VecDeque<AppNotification>,
    next_id: u64,
    capacity: usize,
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

impl NotificationSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 1,
            capacity: capacity.max(1),
        }
    }

    pub fn push(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        track_id: Option<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_front(AppNotification {
            id,
            kind,
            message: message.into(),
            timestamp: now_millis(),
            track_id,
            is_read: false,
        });
        self.entries.truncate(self.capacity);
        id
    }

    pub fn success(&mut self, message: impl Into<String>, track_id: Option<String>) -> u64 {
        self.push(NotificationKind::Success, message, track_id)
    }

    pub fn error(&mut self, message: impl Into<String>, track_id: Option<String>) -> u64 {
        self.push(NotificationKind::Error, message, track_id)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Info, message, None)
    }

    pub fn get(&self, id: u64) -> Option<&AppNotification> {
        self.entries.iter().find(|n| n.id == id)
    }

    pub fn dismiss(&mut self, id: u64) -> Option<AppNotification> {
        let idx = self.entries.iter().position(|n| n.id == id)?;
        self.entries.remove(idx)
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Opening the panel reads everything currently in it.
    pub fn mark_all_read(&mut self) {
        for n in &mut self.entries {
            n.is_read = true;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.is_read).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppNotification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
