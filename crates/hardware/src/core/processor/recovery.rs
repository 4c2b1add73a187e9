//! Branch Recovery and Pipeline Flush.
//!
//! A flush removes every instruction younger than a cutoff tag from all
//! structures at once. It is idempotent: flushing again at the same cutoff
//! finds nothing to remove.

use tracing::debug;

use super::Processor;
use crate::common::error::EngineError;
use crate::common::tag::Tag;

impl Processor {
    /// Rolls back to a mispredicted branch and refetches at `target`.
    pub(super) fn recover_branch(&mut self, tag: Tag, target: u64) -> Result<(), EngineError> {
        let checkpoint = self
            .branches
            .take(tag)
            .ok_or_else(|| EngineError::Invariant(format!("no checkpoint for mispredicted {tag}")))?;
        let flushed = self.flush_after(tag)?;
        self.regs.restore(&checkpoint.maps);
        self.redirect(target);
        debug!("FL {tag} mispredicted: {flushed} flushed, refetch at {target:#x}");
        Ok(())
    }

    /// Removes every instruction with a tag greater than `cutoff`.
    ///
    /// Returns the number of instructions removed from the active list.
    pub(super) fn flush_after(&mut self, cutoff: Tag) -> Result<usize, EngineError> {
        let removed = self.active.flush(cutoff, &mut self.regs)?;
        let _ = self.tags.flush(cutoff);
        let _ = self.memq.flush(cutoff);
        self.stalls.flush(cutoff);
        self.branches.flush(cutoff);
        self.units.flush(cutoff);
        self.done_list.retain(|&(_, tag)| tag <= cutoff);
        for entry in &removed {
            if let Some(inst) = self.arena.remove(entry.handle)
                && let Some(id) = inst.completion
            {
                let _ = self.completions.cancel(id);
            }
        }
        Ok(removed.len())
    }

    /// Discards fetched instructions and restarts fetch at `pc`.
    pub(super) fn redirect(&mut self, pc: u64) {
        self.fetch_queue.clear();
        self.fetch_pc = pc;
        self.fetch_block = None;
    }

    /// Flushes everything younger than `cutoff` and restarts fetch at `pc`.
    ///
    /// Exposed for harnesses that inject recoveries directly.
    pub fn flush_and_redirect(&mut self, cutoff: Tag, pc: u64) -> Result<usize, EngineError> {
        let removed = self.flush_after(cutoff)?;
        self.redirect(pc);
        Ok(removed)
    }
}
