//! Writeback.
//!
//! Applies everything completed during the previous cycle:
//! 1. **Results:** Destination values are written to the physical file and
//!    waiting sources are woken.
//! 2. **Addresses:** Memory operations are checked for alignment, translated,
//!    and resolved in the memory queue, which may kill younger loads.
//! 3. **Branches:** The outcome is compared with the prediction; a
//!    misprediction rolls the window back to the branch.
//! 4. **Loads:** Values the memory queue no longer holds are written back.

use tracing::trace;

use super::{FetchBlock, Ports, Processor};
use crate::common::error::{EngineError, ExceptionCode};
use crate::common::tag::Tag;
use crate::core::arena::InstHandle;
use crate::core::instance::{BranchKind, DestSlot};
use crate::core::units::bru::BranchPredictor;
use crate::isa::{OpCategory, Opcode};
use crate::soc::traits::{TlbOutcome, TranslationRequest};

impl Processor {
    /// Applies last cycle's completions and released load values.
    pub(super) fn update(&mut self, ports: &mut Ports<'_>) -> Result<(), EngineError> {
        let done = std::mem::take(&mut self.done_list);
        for (handle, tag) in done {
            // A recovery earlier in this loop may have flushed it.
            if self.instance(handle, tag).is_err() {
                continue;
            }
            if self.instance(handle, tag)?.category == OpCategory::Memory {
                self.resolve_address(handle, tag, ports)?;
            } else {
                self.writeback(handle, tag)?;
            }
        }
        self.release_loads()
    }

    /// Writes one destination and wakes its waiters.
    fn write_dest(&mut self, slot: DestSlot, value: u64) -> Result<(), EngineError> {
        let file = slot.dest.reg.file;
        self.regs.file_mut(file).phys.write(slot.phys, value);
        for waiter in self.stalls.wake(file, slot.phys) {
            self.capture(waiter, value)?;
        }
        Ok(())
    }

    fn writeback(&mut self, handle: InstHandle, tag: Tag) -> Result<(), EngineError> {
        let inst = self.instance(handle, tag)?;
        let outcome = inst.outcome;
        let serializing = inst.inst.op.is_serializing();
        let is_branch = inst.category == OpCategory::Branch;
        if outcome.exception.is_some() {
            trace!("UP {tag} raises {}", outcome.exception);
            let inst = self.instance_mut(handle, tag)?;
            inst.exception = outcome.exception;
            inst.progress.done = true;
            self.active.mark_done(tag, outcome.exception, self.cycle)?;
            return Ok(());
        }
        for (slot, value) in inst.dest_values(outcome.result) {
            self.write_dest(slot, value)?;
        }
        let code = if serializing {
            ExceptionCode::Serialize
        } else {
            ExceptionCode::Ok
        };
        self.instance_mut(handle, tag)?.progress.done = true;
        self.active.mark_done(tag, code, self.cycle)?;
        trace!("UP {tag} = {:#x}", outcome.result);
        if is_branch {
            self.resolve_branch(handle, tag)?;
        }
        Ok(())
    }

    /// Compares a resolved branch with its prediction.
    fn resolve_branch(&mut self, handle: InstHandle, tag: Tag) -> Result<(), EngineError> {
        let inst = self.instance(handle, tag)?;
        let (Some(actual), Some(predicted)) = (inst.outcome.branch, inst.prediction) else {
            return Ok(());
        };
        let pc = inst.pc;
        self.stats.branches += 1;
        match predicted.kind {
            BranchKind::Indirect => {
                trace!("UP {tag} indirect to {:#x}", actual.next_pc);
                if self.fetch_block == Some(FetchBlock::Indirect) {
                    self.fetch_block = None;
                    self.fetch_pc = actual.next_pc;
                }
                return Ok(());
            }
            BranchKind::Conditional => self.predictor.train(pc, actual.taken),
            BranchKind::Unconditional | BranchKind::Call | BranchKind::Return => {}
        }
        if predicted.next_pc == actual.next_pc {
            let _ = self.branches.take(tag);
            return Ok(());
        }
        self.stats.mispredictions += 1;
        self.recover_branch(tag, actual.next_pc)
    }

    /// Checks, translates and resolves the address of a memory operation.
    fn resolve_address(
        &mut self,
        handle: InstHandle,
        tag: Tag,
        ports: &mut Ports<'_>,
    ) -> Result<(), EngineError> {
        let privileged = self.pstate.privileged;
        let inst = self.instance_mut(handle, tag)?;
        inst.progress.queued = false;
        let vaddr = inst
            .outcome
            .address
            .ok_or_else(|| EngineError::Invariant(format!("{tag} has no effective address")))?;
        let op = inst.inst.op;
        let width = op
            .mem_width()
            .ok_or_else(|| EngineError::Invariant(format!("{tag} has no access width")))?;

        let translated = if width.is_aligned(vaddr) {
            let req = TranslationRequest {
                vaddr,
                width,
                is_write: !matches!(op, Opcode::Load { .. }),
                privileged,
                tag,
                context: self.id,
            };
            match ports.translator.lookup(&req) {
                TlbOutcome::Hit(paddr) => Ok(paddr),
                TlbOutcome::Miss => Err(ExceptionCode::DataTlbMiss),
                TlbOutcome::Fault => Err(ExceptionCode::DataProtection),
            }
        } else {
            Err(ExceptionCode::Alignment)
        };

        match translated {
            Ok(paddr) => {
                self.instance_mut(handle, tag)?.progress.addr_ready = true;
                trace!("UP {tag} address {vaddr:#x} -> {paddr:#x}");
                let kills = self.memq.resolve_address(tag, vaddr, paddr, &mut self.stats)?;
                for kill in kills {
                    self.restart_reference(kill)?;
                }
            }
            Err(code) => {
                trace!("UP {tag} address {vaddr:#x} faults with {code}");
                self.instance_mut(handle, tag)?.exception = code;
                self.memq.set_exception(tag)?;
                self.active.mark_done(tag, code, self.cycle)?;
            }
        }
        Ok(())
    }

    /// Writes back load and atomic values the memory queue has released.
    fn release_loads(&mut self) -> Result<(), EngineError> {
        for done in self.memq.finalize() {
            let inst = self.instance(done.handle, done.tag)?;
            for (slot, value) in inst.dest_values(done.value) {
                self.write_dest(slot, value)?;
            }
            self.instance_mut(done.handle, done.tag)?.progress.done = true;
            self.active.mark_done(done.tag, ExceptionCode::Ok, self.cycle)?;
            trace!("UP {} load = {:#x}", done.tag, done.value);
        }
        Ok(())
    }
}
