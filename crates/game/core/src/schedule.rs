//! Deferred region work driven by the region clock.
//!
//! Tasks are plain values in a queue, not detached timers: the owner polls
//! [`TimerQueue::drain_due`] each tick and may cancel an entry through its
//! handle at any time before then.

use std::collections::{BTreeMap, HashMap};

use crate::state::{Millis, PropId};

/// Cancel handle of one scheduled entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

/// Work the skill engine defers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduledTask {
    RemoveProp(PropId),
}

#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    next: u64,
    entries: BTreeMap<(Millis, TimerHandle), T>,
    due_at: HashMap<TimerHandle, Millis>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next: 0,
            entries: BTreeMap::new(),
            due_at: HashMap::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Millis, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next);
        self.next += 1;
        self.entries.insert((due, handle), task);
        self.due_at.insert(handle, due);
        handle
    }

    /// Removes a pending entry. Returns `None` if it already ran or was
    /// canceled.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let due = self.due_at.remove(&handle)?;
        self.entries.remove(&(due, handle))
    }

    /// Pops every entry due at or before `now`, earliest first; ties keep
    /// scheduling order.
    pub fn drain_due(&mut self, now: Millis) -> Vec<T> {
        let pending = self
            .entries
            .split_off(&(Millis(now.0.saturating_add(1)), TimerHandle(0)));
        let due = std::mem::replace(&mut self.entries, pending);
        due.into_iter()
            .map(|((_, handle), task)| {
                self.due_at.remove(&handle);
                task
            })
            .collect()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(Millis(300), "c");
        queue.schedule(Millis(100), "a");
        queue.schedule(Millis(100), "b");

        assert_eq!(queue.drain_due(Millis(99)), Vec::<&str>::new());
        assert_eq!(queue.drain_due(Millis(100)), vec!["a", "b"]);
        assert_eq!(queue.next_due(), Some(Millis(300)));
        assert_eq!(queue.drain_due(Millis(1_000)), vec!["c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn cancel_removes_pending_entry_once() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(Millis(50), ScheduledTask::RemoveProp(PropId(1)));
        assert_eq!(
            queue.cancel(handle),
            Some(ScheduledTask::RemoveProp(PropId(1)))
        );
        assert_eq!(queue.cancel(handle), None);
        assert!(queue.drain_due(Millis(100)).is_empty());
    }

    #[test]
    fn cancel_after_run_is_none() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(Millis(10), 1u8);
        assert_eq!(queue.drain_due(Millis(10)), vec![1]);
        assert_eq!(queue.cancel(handle), None);
    }
}
