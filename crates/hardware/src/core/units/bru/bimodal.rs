//! Bimodal Branch Predictor.
//!
//! A table of 2-bit saturating counters indexed by the branch PC. Counters
//! start weakly not-taken; values 2 and 3 predict taken.
//!
//! # Performance
//!
//! - **Time Complexity:** O(1) predict and update
//! - **Space Complexity:** O(N) for an N-entry table
//! - **Best Case:** Strongly biased branches (loop back-edges)
//! - **Worst Case:** Branches alternating direction

use super::{BranchPredictor, ras::Ras};

/// Bimodal Predictor structure.
#[derive(Clone, Debug)]
pub struct BimodalPredictor {
    /// Branch History Table of 2-bit counters.
    bht: Vec<u8>,
    /// Return Address Stack.
    ras: Ras,
}

impl BimodalPredictor {
    /// Creates a predictor with `bht_size` counters (rounded up to a power of two).
    pub fn new(bht_size: usize, ras_size: usize) -> Self {
        Self {
            bht: vec![1; bht_size.max(1).next_power_of_two()],
            ras: Ras::new(ras_size),
        }
    }

    fn index(&self, pc: u64) -> usize {
        ((pc >> 2) as usize) & (self.bht.len() - 1)
    }
}

impl BranchPredictor for BimodalPredictor {
    fn predict(&self, pc: u64) -> bool {
        self.bht[self.index(pc)] >= 2
    }

    fn train(&mut self, pc: u64, taken: bool) {
        let i = self.index(pc);
        let c = &mut self.bht[i];
        *c = if taken { (*c + 1).min(3) } else { c.saturating_sub(1) };
    }

    fn push_return(&mut self, addr: u64) {
        self.ras.push(addr);
    }

    fn pop_return(&mut self) -> Option<u64> {
        self.ras.pop()
    }
}
