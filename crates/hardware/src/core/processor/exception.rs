//! Trap Entry and Serializing Instructions.
//!
//! This module implements the exception handler invoked at the head of the
//! active list. It performs the following:
//! 1. **Trap Entry:** Flushes the faulting instruction and everything younger,
//!    saves `(pc, npc, pstate, tt)` on the trap stack, enters privileged mode
//!    with interrupts disabled, and vectors fetch into the trap table.
//! 2. **Serializing Effects:** `Done` and `Retry` return from a trap, `Wrpr`
//!    writes a processor-state field and `Halt` stops the processor. Each
//!    flushes younger instructions, graduates itself, then applies its effect.

use tracing::debug;

use super::Processor;
use crate::common::error::{EngineError, ExceptionClass, ExceptionCode};
use crate::common::tag::Tag;
use crate::core::arch::{Pstate, TrapState, trap_vector};
use crate::isa::{Opcode, PstateField};

impl Processor {
    /// Handles the exception carried by the head instruction `tag`.
    ///
    /// # Arguments
    ///
    /// * `tag` - Head of the active list.
    /// * `code` - Exception recorded for it.
    pub(super) fn handle_exception(&mut self, tag: Tag, code: ExceptionCode) -> Result<(), EngineError> {
        let handle = self.tags.require(tag)?;
        let inst = self.instance(handle, tag)?;
        let (pc, op, result) = (inst.pc, inst.inst.op, inst.outcome.result);
        match code.class() {
            ExceptionClass::Hard => {
                self.stats.hard_exceptions += 1;
                self.take_trap(tag, pc, code)
            }
            ExceptionClass::Serialize => self.serialize(tag, pc, op, result),
            ExceptionClass::Soft | ExceptionClass::None => {
                Err(EngineError::UnhandledException { tag, code })
            }
        }
    }

    /// Enters the trap handler for an exception at `tag`.
    ///
    /// # Arguments
    ///
    /// * `tag` - Faulting instruction; it and everything younger are flushed.
    /// * `pc` - Its address, saved for `Retry`.
    /// * `code` - Exception code selecting the trap-table entry.
    pub(super) fn take_trap(&mut self, tag: Tag, pc: u64, code: ExceptionCode) -> Result<(), EngineError> {
        let tt = code
            .trap_type()
            .ok_or(EngineError::UnhandledException { tag, code })?;
        let _ = self.flush_after(tag.prev())?;
        self.traps.push(TrapState {
            pc,
            npc: pc.wrapping_add(4),
            pstate: self.pstate,
            tt,
        })?;
        self.pstate = Pstate {
            privileged: true,
            interrupts_enabled: false,
        };
        let vector = trap_vector(self.trap_table_base, tt);
        self.stats.traps += 1;
        debug!(
            "EX {code} at {pc:#x} ({tag}) -> {vector:#x}, trap level {}",
            self.traps.level()
        );
        self.redirect(vector);
        Ok(())
    }

    /// Applies a serializing instruction at the head.
    fn serialize(&mut self, tag: Tag, pc: u64, op: Opcode, result: u64) -> Result<(), EngineError> {
        if matches!(op, Opcode::Done | Opcode::Retry) && self.traps.level() == 0 {
            self.stats.hard_exceptions += 1;
            return self.take_trap(tag, pc, ExceptionCode::Illegal);
        }
        if op == Opcode::Halt && !self.memq.drained_before(tag) {
            return Ok(());
        }

        let _ = self.flush_after(tag)?;
        let entry = self
            .active
            .retire_head(&mut self.regs, &mut self.arch)?
            .ok_or(EngineError::TagNotFound(tag))?;
        let _ = self.tags.pop_head();
        let _ = self.arena.remove(entry.handle);
        self.stats.graduated += 1;

        let resume = match op {
            Opcode::Done | Opcode::Retry => {
                let saved = self.traps.pop().ok_or(EngineError::UnhandledException {
                    tag,
                    code: ExceptionCode::Serialize,
                })?;
                self.pstate = saved.pstate;
                if op == Opcode::Done { saved.npc } else { saved.pc }
            }
            Opcode::Wrpr(PstateField::Pstate) => {
                self.pstate = Pstate::from_bits(result);
                pc.wrapping_add(4)
            }
            Opcode::Wrpr(PstateField::Pil) => {
                self.pil = (result & 0xF) as u8;
                pc.wrapping_add(4)
            }
            Opcode::Halt => {
                self.halted = true;
                self.fetch_queue.clear();
                debug!("EX cpu{} halted at {pc:#x} ({tag})", self.id);
                return Ok(());
            }
            _ => {
                return Err(EngineError::UnhandledException {
                    tag,
                    code: ExceptionCode::Serialize,
                });
            }
        };
        debug!("EX {op:?} at {pc:#x} ({tag}) resumes at {resume:#x}");
        self.redirect(resume);
        Ok(())
    }
}
