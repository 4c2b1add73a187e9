//! Stall queues.
//!
//! One wait list per physical register. An instruction blocked on a busy
//! source attaches `(handle, tag, operand)` to the producer's list and is
//! woken exactly once, when the register is written. Entries of flushed
//! instructions are dropped by [`StallQueues::flush`].

use crate::common::reg::{PhysReg, RegFile};
use crate::common::tag::Tag;
use crate::core::arena::InstHandle;

/// A waiting operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StallEntry {
    /// Waiting instance.
    pub handle: InstHandle,
    /// Its tag.
    pub tag: Tag,
    /// Index of the waiting source slot.
    pub operand: u8,
}

/// Per-register wait lists for both files.
#[derive(Debug)]
pub struct StallQueues {
    lists: [Vec<Vec<StallEntry>>; 2],
}

impl StallQueues {
    /// Creates empty lists for `int_phys` and `fp_phys` registers.
    pub fn new(int_phys: usize, fp_phys: usize) -> Self {
        Self {
            lists: [vec![Vec::new(); int_phys], vec![Vec::new(); fp_phys]],
        }
    }

    /// Attaches a waiter to a register.
    pub fn attach(&mut self, file: RegFile, reg: PhysReg, entry: StallEntry) {
        self.lists[file.index()][reg.idx()].push(entry);
    }

    /// Removes and returns every waiter of a register.
    pub fn wake(&mut self, file: RegFile, reg: PhysReg) -> Vec<StallEntry> {
        std::mem::take(&mut self.lists[file.index()][reg.idx()])
    }

    /// Discards waiters with tags greater than `cutoff`.
    pub fn flush(&mut self, cutoff: Tag) {
        for list in self.lists.iter_mut().flatten() {
            list.retain(|e| e.tag <= cutoff);
        }
    }

    /// Total number of waiters.
    pub fn len(&self) -> usize {
        self.lists.iter().flatten().map(Vec::len).sum()
    }

    /// True if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
