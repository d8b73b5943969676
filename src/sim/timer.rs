//! Virtual-time timer queue
//!
//! Every delayed action in the sequencer is an entry here. Time only moves
//! when the host calls [`TimerQueue::pop_due`] with a later `now`, so tests can
//! fast-forward deterministically.

use std::collections::{BTreeMap, HashMap};

/// Handle to a scheduled timer, used for cancellation and stale-fire checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// A timer that has come due
#[derive(Debug, Clone, PartialEq)]
pub struct DueTimer<E> {
    pub id: TimerId,
    /// Scheduled due time (ms), which may be earlier than the `now` polled with
    pub due_ms: u64,
    pub event: E,
}

/// Pending timers ordered by due time, then by scheduling order
#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    pending: BTreeMap<(u64, TimerId), E>,
    due_by_id: HashMap<TimerId, u64>,
    next_id: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            due_by_id: HashMap::new(),
            next_id: 1,
        }
    }

    /// Schedule `event` to fire at absolute time `due_ms`
    pub fn schedule_at(&mut self, due_ms: u64, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert((due_ms, id), event);
        self.due_by_id.insert(id, due_ms);
        id
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_by_id.remove(&id) {
            Some(due_ms) => self.pending.remove(&(due_ms, id)).is_some(),
            None => false,
        }
    }

    /// Remove and return the earliest timer due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<DueTimer<E>> {
        let (&(due_ms, id), _) = self.pending.first_key_value()?;
        if due_ms > now_ms {
            return None;
        }
        let event = self.pending.remove(&(due_ms, id))?;
        self.due_by_id.remove(&id);
        Some(DueTimer { id, due_ms, event })
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_by_id.contains_key(&id)
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<u64> {
        self.pending.keys().next().map(|&(due_ms, _)| due_ms)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.pending.clear();
        self.due_by_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut timers = TimerQueue::new();
        timers.schedule_at(300, "c");
        timers.schedule_at(100, "a");
        timers.schedule_at(200, "b");

        assert!(timers.pop_due(50).is_none());
        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(1000))
            .map(|t| t.event)
            .collect();
        assert_eq!(fired, vec!["a", "b", "c"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_same_instant_keeps_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule_at(100, 1);
        timers.schedule_at(100, 2);
        timers.schedule_at(100, 3);

        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(100))
            .map(|t| t.event)
            .collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel() {
        let mut timers = TimerQueue::new();
        let a = timers.schedule_at(100, "a");
        let b = timers.schedule_at(200, "b");

        assert!(timers.cancel(a));
        assert!(!timers.cancel(a));
        assert!(!timers.is_pending(a));
        assert!(timers.is_pending(b));
        assert_eq!(timers.next_due(), Some(200));

        let due = timers.pop_due(500).unwrap();
        assert_eq!(due.id, b);
        assert_eq!(due.due_ms, 200);
        assert!(!timers.cancel(b));
    }
}
