//! Deferred-command queue.
//!
//! Commands with a delay, and the concept follow-ups produced by timed speech,
//! wait here until the engine's `update` observes that their fire time has
//! passed. Entries come out in fire-time order; ties go to the entry queued
//! first.

use bark_world::EntityId;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::rules::RuleId;

/// Work waiting for its fire time.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    /// Command `index` of `rule`'s program, run on behalf of `speaker`.
    Command {
        rule: RuleId,
        index: usize,
        speaker: Option<EntityId>,
    },
    /// A spoken line finished: match `{SAY, concept, speaker}` again.
    Followup {
        concept: String,
        speaker: Option<EntityId>,
    },
}

/// A queued entry. Ordering: (fire_at ASC, seq ASC).
#[derive(Debug, Clone)]
pub struct Pending {
    pub fire_at: f64,
    pub seq: u64,
    pub job: Deferred,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .total_cmp(&other.fire_at)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of deferred work keyed by absolute fire time.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    heap: BinaryHeap<Reverse<Pending>>,
    next_seq: u64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `job` to run once the clock reaches `fire_at`.
    pub fn push(&mut self, fire_at: f64, job: Deferred) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Pending { fire_at, seq, job }));
    }

    /// Remove and return every entry due at `now`, in execution order.
    ///
    /// Anything pushed after this call waits for the next drain, even if it
    /// is already due.
    pub fn drain_due(&mut self, now: f64) -> Vec<Pending> {
        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.heap.peek() {
            if next.fire_at > now {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry);
            }
        }
        due
    }

    /// Put back entries taken by [`drain_due`](Self::drain_due) but not run.
    pub fn restore(&mut self, entries: impl IntoIterator<Item = Pending>) {
        for entry in entries {
            self.heap.push(Reverse(entry));
        }
    }

    /// Fire time of the earliest entry.
    pub fn next_fire_at(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(entry)| entry.fire_at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn followup(concept: &str) -> Deferred {
        Deferred::Followup {
            concept: concept.to_string(),
            speaker: None,
        }
    }

    fn concepts(entries: &[Pending]) -> Vec<&str> {
        entries
            .iter()
            .map(|entry| match &entry.job {
                Deferred::Followup { concept, .. } => concept.as_str(),
                Deferred::Command { .. } => "command",
            })
            .collect()
    }

    #[test]
    fn test_drains_in_fire_time_order() {
        let mut queue = DeferredQueue::new();
        queue.push(3.0, followup("late"));
        queue.push(1.0, followup("early"));
        queue.push(2.0, followup("middle"));

        assert_eq!(queue.next_fire_at(), Some(1.0));
        let due = queue.drain_due(2.5);
        assert_eq!(concepts(&due), vec!["early", "middle"]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut queue = DeferredQueue::new();
        for name in ["a", "b", "c"] {
            queue.push(5.0, followup(name));
        }
        assert!(queue.drain_due(4.9).is_empty());
        let due = queue.drain_due(5.0);
        assert_eq!(concepts(&due), vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_restore_keeps_queue_order() {
        let mut queue = DeferredQueue::new();
        queue.push(1.0, followup("a"));
        queue.push(1.0, followup("b"));
        let mut due = queue.drain_due(1.0);
        let rest = due.split_off(1);
        queue.push(1.0, followup("c"));
        queue.restore(rest);

        let due = queue.drain_due(1.0);
        assert_eq!(concepts(&due), vec!["b", "c"]);
    }
}
