//! Return Address Stack (RAS).
//!
//! A bounded stack of return addresses: calls push at fetch and returns pop.
//! When full the oldest address is overwritten. Nothing repairs the stack
//! after a flush, so wrong-path calls and returns can skew it; a skewed
//! prediction is caught when the return resolves.

use std::collections::VecDeque;

/// Bounded return-address stack.
#[derive(Clone, Debug)]
pub struct Ras {
    entries: VecDeque<u64>,
    depth: usize,
}

impl Ras {
    /// Creates a stack holding at most `depth` addresses.
    pub fn new(depth: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Pushes `addr`, overwriting the oldest address when full.
    pub fn push(&mut self, addr: u64) {
        if self.depth == 0 {
            return;
        }
        if self.entries.len() == self.depth {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(addr);
    }

    /// Pops the most recent address.
    pub fn pop(&mut self) -> Option<u64> {
        self.entries.pop_back()
    }

    /// Number of addresses held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if a return cannot be predicted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
