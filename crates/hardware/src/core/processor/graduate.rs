//! In-Order Graduation.
//!
//! Graduation is the only place architectural state changes. Each cycle it:
//! 1. **Marks Memory Progress:** Stores that may retire and barriers whose
//!    older references have performed are marked done.
//! 2. **Takes Interrupts:** A pending interrupt above the interrupt level is
//!    taken at the head when interrupts are enabled, unless the head is an
//!    atomic already sent to memory.
//! 3. **Handles Exceptions:** A done head carrying an exception is handled
//!    once every older store has issued.
//! 4. **Retires:** Up to the graduation width of done, exception-free
//!    instructions whose memory references allow it.

use tracing::{debug, trace};

use super::Processor;
use crate::common::error::{EngineError, ExceptionCode};
use crate::isa::{OpCategory, Opcode};

impl Processor {
    /// Runs the graduation stage.
    pub(super) fn graduate(&mut self) -> Result<(), EngineError> {
        for (tag, handle) in self.memq.mark_ready_stores() {
            trace!("GR {tag} store ready to retire");
            if let Ok(inst) = self.instance_mut(handle, tag) {
                inst.progress.done = true;
            }
            self.active.mark_done(tag, ExceptionCode::Ok, self.cycle)?;
        }
        for (tag, _) in self.memq.mark_barriers() {
            trace!("GR {tag} barrier satisfied");
            self.active.mark_done(tag, ExceptionCode::Ok, self.cycle)?;
        }

        if self.take_interrupt()? {
            return Ok(());
        }

        if let Some(head) = self.active.head()
            && head.done
            && head.exception.is_some()
        {
            let (tag, code) = (head.tag, head.exception);
            if !self.memq.older_stores_issued(tag) {
                trace!("GR {tag} {code} waits for older stores");
                return Ok(());
            }
            if self.memq.atomic_in_flight(tag) {
                trace!("GR {tag} {code} waits for its atomic to perform");
                return Ok(());
            }
            return self.handle_exception(tag, code);
        }

        let memq = &self.memq;
        let retired = self.active.retire(
            self.widths.graduation,
            &mut self.regs,
            &mut self.arch,
            |e| memq.can_graduate(e.tag),
        )?;
        for entry in retired {
            match self.tags.pop_head() {
                Some((tag, _)) if tag == entry.tag => {}
                other => {
                    return Err(EngineError::Invariant(format!(
                        "graduated {} but the tag converter head was {other:?}",
                        entry.tag
                    )));
                }
            }
            let inst = self
                .arena
                .remove(entry.handle)
                .ok_or(EngineError::StaleHandle(entry.tag))?;
            match inst.inst.op {
                Opcode::Load { .. } => self.stats.loads += 1,
                Opcode::Store { .. } => self.stats.stores += 1,
                Opcode::Rmw { .. } => self.stats.rmws += 1,
                _ => {}
            }
            match inst.category {
                OpCategory::Memory => self.memq.graduate(entry.tag),
                OpCategory::Barrier => self.memq.graduate_barrier(entry.tag),
                _ => {}
            }
            self.stats.graduated += 1;
            trace!("GR {} {:#x} {:?}", entry.tag, entry.pc, inst.inst.op);
        }
        Ok(())
    }

    /// Takes a pending interrupt at the head instruction, if allowed.
    fn take_interrupt(&mut self) -> Result<bool, EngineError> {
        let Some(level) = self.pending_interrupt else {
            return Ok(false);
        };
        if !self.pstate.interrupts_enabled || level <= self.pil {
            return Ok(false);
        }
        let Some(head) = self.active.head() else {
            return Ok(false);
        };
        let (tag, pc) = (head.tag, head.pc);
        if !self.memq.older_stores_issued(tag) || self.memq.atomic_issued(tag) {
            return Ok(false);
        }
        debug!("EX interrupt level {level} taken at {tag}");
        self.pending_interrupt = None;
        self.stats.interrupts += 1;
        self.take_trap(tag, pc, ExceptionCode::Interrupt(level))?;
        Ok(true)
    }
}
