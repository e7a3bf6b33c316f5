use crate::library::Track;
use std::collections::VecDeque;
use std::sync::Arc;

/// Backlog of tracks waiting for a lyrics lookup.
///
/// The queue owns ordering and the single in-flight slot; the caller drives it:
/// `next_job` hands out the head, the caller fetches, waits out the request
/// delay and then calls `finish`. The head stays in the backlog until then.
#[derive(Debug, Default)]
pub struct LyricsFetchQueue {
    backlog: VecDeque<Arc<Track>>,
    in_flight: Option<String>,
}

impl LyricsFetchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail. Duplicates are allowed; a removed track is skipped
    /// when it reaches the head.
    pub fn enroll<I>(&mut self, tracks: I) -> usize
    where
        I: IntoIterator<Item = Arc<Track>>,
    {
        let before = self.backlog.len();
        self.backlog.extend(tracks);
        self.backlog.len() - before
    }

    /// Claim the head for fetching.
    ///
    /// Returns `None` while a fetch is in flight or when nothing is left.
    /// Entries whose track no longer exists are dropped on the way.
    pub fn next_job(&mut self, exists: impl Fn(&str) -> bool) -> Option<Arc<Track>> {
        if self.in_flight.is_some() {
            return None;
        }
        while let Some(head) = self.backlog.front() {
            if exists(&head.id) {
                self.in_flight = Some(head.id.clone());
                return Some(head.clone());
            }
            tracing::debug!(track_id = %head.id, "dropping stale lyrics job");
            self.backlog.pop_front();
        }
        None
    }

    /// Release the in-flight slot and dequeue the head it was holding.
    pub fn finish(&mut self) -> Option<Arc<Track>> {
        let id = self.in_flight.take()?;
        match self.backlog.front() {
            Some(head) if head.id == id => self.backlog.pop_front(),
            _ => None,
        }
    }

    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    /// Entries still waiting, including the one being fetched.
    pub fn len(&self) -> usize {
        self.backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.is_empty()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.backlog.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::model::test_track;

    fn arcs(ids: &[&str]) -> Vec<Arc<Track>> {
        ids.iter().map(|id| Arc::new(test_track(id))).collect()
    }

    #[test]
    fn one_job_at_a_time() {
        let mut q = LyricsFetchQueue::new();
        q.enroll(arcs(&["a", "b"]));

        let first = q.next_job(|_| true).unwrap();
        assert_eq!(first.id, "a");
        assert!(q.next_job(|_| true).is_none());
        assert_eq!(q.in_flight(), Some("a"));

        assert_eq!(q.finish().map(|t| t.id.clone()), Some("a".to_string()));
        assert_eq!(q.next_job(|_| true).map(|t| t.id.clone()), Some("b".to_string()));
    }

    #[test]
    fn stale_heads_are_dropped_without_claiming() {
        let mut q = LyricsFetchQueue::new();
        q.enroll(arcs(&["gone", "also-gone", "c"]));

        let job = q.next_job(|id| id == "c").unwrap();
        assert_eq!(job.id, "c");
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn all_stale_leaves_queue_idle() {
        let mut q = LyricsFetchQueue::new();
        q.enroll(arcs(&["x", "y"]));
        assert!(q.next_job(|_| false).is_none());
        assert!(q.is_idle());
    }

    #[test]
    fn duplicates_are_kept() {
        let mut q = LyricsFetchQueue::new();
        assert_eq!(q.enroll(arcs(&["a", "a"])), 2);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn finish_without_job_is_noop() {
        let mut q = LyricsFetchQueue::new();
        q.enroll(arcs(&["a"]));
        assert!(q.finish().is_none());
        assert_eq!(q.len(), 1);
    }
}
