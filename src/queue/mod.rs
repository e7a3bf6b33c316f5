use crate::library::Track;
use std::collections::VecDeque;
use std::sync::Arc;

/// User-requested "play next" order. Strictly FIFO: taking an entry removes it
/// for good.
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    tracks: VecDeque<Arc<Track>>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track to the end of the queue
    pub fn enqueue(&mut self, track: Arc<Track>) {
        self.tracks.push_back(track);
    }

    /// Consume the head of the queue
    pub fn pop_front(&mut self) -> Option<Arc<Track>> {
        self.tracks.pop_front()
    }

    pub fn front(&self) -> Option<&Arc<Track>> {
        self.tracks.front()
    }

    /// Remove the entry at `index`, returning it. Out of range is a no-op.
    pub fn remove_at(&mut self, index: usize) -> Option<Arc<Track>> {
        self.tracks.remove(index)
    }

    /// Drop every entry for a track that left the library.
    pub fn remove_track(&mut self, track_id: &str) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.id != track_id);
        before - self.tracks.len()
    }

    /// Swap in a newer copy of a track for every entry with its id.
    pub fn replace_track(&mut self, track: &Arc<Track>) {
        for slot in self.tracks.iter_mut().filter(|t| t.id == track.id) {
            *slot = track.clone();
        }
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::model::test_track;

    fn queue_of(ids: &[&str]) -> PlayQueue {
        let mut q = PlayQueue::new();
        for id in ids {
            q.enqueue(Arc::new(test_track(id)));
        }
        q
    }

    fn ids(q: &PlayQueue) -> Vec<String> {
        q.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_fifo_consumption() {
        let mut queue = queue_of(&["x", "y"]);
        assert_eq!(queue.pop_front().unwrap().id, "x");
        assert_eq!(ids(&queue), vec!["y"]);
        assert_eq!(queue.pop_front().unwrap().id, "y");
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn test_remove_at() {
        let mut queue = queue_of(&["1", "2", "3"]);
        assert_eq!(queue.remove_at(1).unwrap().id, "2");
        assert_eq!(ids(&queue), vec!["1", "3"]);
        assert!(queue.remove_at(7).is_none());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_remove_track_drops_every_copy() {
        let mut queue = queue_of(&["1", "2", "1"]);
        assert_eq!(queue.remove_track("1"), 2);
        assert_eq!(ids(&queue), vec!["2"]);
    }

    #[test]
    fn test_replace_track_refreshes_every_copy() {
        let mut queue = queue_of(&["1", "2", "1"]);
        let mut fresh = test_track("1");
        fresh.favorite = true;
        queue.replace_track(&Arc::new(fresh));
        let favs: Vec<bool> = queue.iter().map(|t| t.favorite).collect();
        assert_eq!(favs, vec![true, false, true]);
    }

    #[test]
    fn test_clear() {
        let mut queue = queue_of(&["1", "2"]);
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.front().is_none());
    }
}
