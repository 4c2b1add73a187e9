//! Static not-taken predictor.
//!
//! Every conditional branch is predicted to fall through and nothing is
//! trained. Returns still use the return-address stack.

use super::{BranchPredictor, ras::Ras};

/// Not-taken predictor with a return-address stack.
#[derive(Clone, Debug)]
pub struct StaticPredictor {
    ras: Ras,
}

impl StaticPredictor {
    /// Creates the predictor with a `ras_size`-deep return stack.
    pub fn new(ras_size: usize) -> Self {
        Self {
            ras: Ras::new(ras_size),
        }
    }
}

impl BranchPredictor for StaticPredictor {
    fn predict(&self, _pc: u64) -> bool {
        false
    }

    fn train(&mut self, _pc: u64, _taken: bool) {}

    fn push_return(&mut self, addr: u64) {
        self.ras.push(addr);
    }

    fn pop_return(&mut self) -> Option<u64> {
        self.ras.pop()
    }
}
