//! In-memory session tracker backed by a map under a mutex.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use parking_lot::Mutex;

use super::SessionTracker;

/// Per-session bookkeeping state.
#[derive(Debug)]
struct SessionState {
    received: HashSet<u32>,
    started_at: Instant,
}

impl SessionState {
    fn new() -> Self {
        Self {
            received: HashSet::new(),
            started_at: Instant::now(),
        }
    }
}

/// Process-lifetime session tracker.
///
/// All mutations happen under a single mutex, which serializes per-session
/// count updates and keeps concurrent uploads from losing increments. The
/// critical section is a set insert, so contention stays negligible next to
/// the disk writes surrounding it.
#[derive(Default)]
pub struct InMemorySessionTracker {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl InMemorySessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Age of a tracked session, if present. Used for diagnostics.
    pub fn session_age(&self, session_id: &str) -> Option<std::time::Duration> {
        self.sessions
            .lock()
            .get(session_id)
            .map(|state| state.started_at.elapsed())
    }
}

impl SessionTracker for InMemorySessionTracker {
    fn record_chunk(&self, session_id: &str, chunk_index: u32) -> usize {
        let mut sessions = self.sessions.lock();
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(SessionState::new);
        state.received.insert(chunk_index);
        state.received.len()
    }

    fn forget(&self, session_id: &str) {
        self.sessions.lock().remove(session_id);
    }

    fn active_sessions(&self) -> usize {
        self.sessions.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_record_chunk_counts_distinct_indices() {
        let tracker = InMemorySessionTracker::new();

        assert_eq!(tracker.record_chunk("s1", 0), 1);
        assert_eq!(tracker.record_chunk("s1", 2), 2);
        assert_eq!(tracker.record_chunk("s1", 1), 3);
    }

    #[test]
    fn test_record_chunk_duplicate_index_does_not_grow_count() {
        let tracker = InMemorySessionTracker::new();

        tracker.record_chunk("s1", 0);
        assert_eq!(tracker.record_chunk("s1", 0), 1);
    }

    #[test]
    fn test_sessions_are_independent() {
        let tracker = InMemorySessionTracker::new();

        tracker.record_chunk("s1", 0);
        tracker.record_chunk("s2", 0);
        tracker.record_chunk("s2", 1);

        assert_eq!(tracker.active_sessions(), 2);
        assert_eq!(tracker.record_chunk("s1", 1), 2);
    }

    #[test]
    fn test_forget_removes_session() {
        let tracker = InMemorySessionTracker::new();

        tracker.record_chunk("s1", 0);
        tracker.forget("s1");

        assert_eq!(tracker.active_sessions(), 0);
        // Forgetting again is a no-op
        tracker.forget("s1");
    }

    #[test]
    fn test_concurrent_records_lose_no_increments() {
        let tracker = Arc::new(InMemorySessionTracker::new());
        let mut handles = Vec::new();

        for worker in 0u32..8 {
            let tracker = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    tracker.record_chunk("shared", worker * 100 + i);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.record_chunk("shared", 9999), 801);
    }
}
