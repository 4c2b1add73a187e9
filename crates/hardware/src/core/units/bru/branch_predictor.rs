//! Direction and return prediction interface.
//!
//! Direct branch and call targets are carried by the instruction, so a
//! predictor only answers two questions at fetch: which way a conditional
//! branch goes, and where a return lands.

/// A fetch-time predictor.
pub trait BranchPredictor {
    /// True if the conditional branch at `pc` is predicted taken.
    fn predict(&self, pc: u64) -> bool;

    /// Trains the direction table with a resolved conditional branch.
    fn train(&mut self, pc: u64, taken: bool);

    /// Remembers the return address of a fetched call.
    fn push_return(&mut self, addr: u64);

    /// Consumes the predicted target of a fetched return.
    fn pop_return(&mut self) -> Option<u64>;
}
