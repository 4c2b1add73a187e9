//! Per-processor event queue.
//!
//! Arms "recheck later" wakeups: a functional-unit slot freeing, or an
//! instruction's result becoming available. Events due in the same cycle pop
//! in scheduling order. Cancelled events are dropped lazily when they reach
//! the front.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Identifier returned by [`EventQueue::schedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

/// Cycle-keyed queue of pending events.
#[derive(Debug)]
pub struct EventQueue<E> {
    now: u64,
    next_id: u64,
    heap: BinaryHeap<Reverse<(u64, EventId)>>,
    pending: HashMap<EventId, E>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventQueue<E> {
    /// Creates an empty queue at cycle 0.
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
        }
    }

    /// Advances the queue's notion of the current cycle.
    pub const fn set_now(&mut self, now: u64) {
        self.now = now;
    }

    /// Current cycle.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Schedules `event` to fire `delay` cycles from now.
    pub fn schedule(&mut self, event: E, delay: u64) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse((self.now + delay, id)));
        let _ = self.pending.insert(id, event);
        id
    }

    /// Cancels a pending event. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: EventId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Pops the next event due at or before the current cycle.
    pub fn pop_due(&mut self) -> Option<E> {
        while let Some(Reverse((due, id))) = self.heap.peek().copied() {
            if due > self.now {
                return None;
            }
            let _ = self.heap.pop();
            if let Some(event) = self.pending.remove(&id) {
                return Some(event);
            }
        }
        None
    }

    /// Number of live (not cancelled) events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if no live events remain.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
