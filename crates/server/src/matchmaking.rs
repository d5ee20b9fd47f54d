//! Matchmaking queue: strictly FIFO pairing of searchers.
//!
//! The queue holds one entry per searching session, ordered by enqueue
//! sequence number. Pairing always takes the two oldest entries; no other
//! ordering criterion exists (no skill matching). Status validation and the
//! pairing side effects live in the orchestrator, which drives the queue
//! inside its single lock domain so pairing is atomic with respect to
//! concurrent enqueue, cancel and disconnect.

use std::collections::VecDeque;

use crate::session::SessionId;

/// One waiting searcher. `seq` is the enqueue sequence number: monotonic per
/// queue, doubling as both the enqueue timestamp and the stable-FIFO
/// tiebreak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub session_id: SessionId,
    pub seq: u64,
}

/// FIFO queue of searching sessions.
#[derive(Debug, Default)]
pub struct MatchQueue {
    entries: VecDeque<QueueEntry>,
    next_seq: u64,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.entries.iter().any(|e| e.session_id == session_id)
    }

    /// Append a searcher at the tail. The caller has already verified the
    /// session is idle and not yet queued.
    pub fn enqueue(&mut self, session_id: SessionId) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(QueueEntry { session_id, seq });
        seq
    }

    /// Remove a searcher, by cancellation or disconnect. Returns whether an
    /// entry existed; `false` means the entry was already consumed (for a
    /// cancel, the caller reports `NotSearching` rather than unwinding a
    /// paired match).
    pub fn remove(&mut self, session_id: SessionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.session_id != session_id);
        self.entries.len() != before
    }

    /// Dequeue the two longest-waiting searchers, oldest first. `None`
    /// unless at least two entries are queued.
    pub fn pop_pair(&mut self) -> Option<(SessionId, SessionId)> {
        if self.entries.len() < 2 {
            return None;
        }
        let (Some(first), Some(second)) = (self.entries.pop_front(), self.entries.pop_front())
        else {
            return None;
        };
        Some((first.session_id, second.session_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Searching session ids in queue order, for the lobby view.
    pub fn iter_sessions(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.entries.iter().map(|e| e.session_id)
    }
}
