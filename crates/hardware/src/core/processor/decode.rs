//! Decode, Rename and Dispatch.
//!
//! Decode moves instructions from the fetch queue into the window in program
//! order. For each instruction it:
//! 1. **Checks Resources:** Active-list slot, physical registers per file,
//!    branch checkpoint and memory-queue slot. A shortfall stalls the rest of
//!    the group and is counted by cause.
//! 2. **Reads Sources:** Before renaming destinations, so an instruction that
//!    reads and writes the same register sees the older producer.
//! 3. **Renames Destinations:** Records `(logical, new, old)` in the active list.
//! 4. **Dispatches:** Ready instructions go to their unit's ready queue; busy
//!    sources wait in the producer's stall queue.

use tracing::trace;

use super::{FetchBlock, FetchEntry, Processor};
use crate::common::data::RmwOp;
use crate::common::error::{EngineError, ExceptionCode};
use crate::common::reg::{PhysReg, RegFile};
use crate::common::tag::Tag;
use crate::core::arena::InstHandle;
use crate::core::instance::{DestSlot, Instance, SrcSlot};
use crate::core::pipeline::memq::{MemEntry, MemKind};
use crate::core::pipeline::{ActiveEntry, DestList, DestWrite, StallEntry};
use crate::isa::{OpCategory, Opcode, StaticInst, UnitType};
use crate::stats::StallCause;

/// Exception raised by decode itself, before any resource is renamed.
fn decode_fault(entry: &FetchEntry, privileged: bool) -> ExceptionCode {
    let inst = &entry.fetched.inst;
    if entry.fetched.exception.is_some() {
        entry.fetched.exception
    } else if !inst.is_well_formed() {
        ExceptionCode::Illegal
    } else if inst.op.is_privileged() && !privileged {
        ExceptionCode::Privileged
    } else {
        ExceptionCode::Ok
    }
}

/// Memory-queue kind of a memory opcode.
const fn mem_kind(op: Opcode) -> Option<(MemKind, bool)> {
    match op {
        Opcode::Load { signed, .. } => Some((MemKind::Load, signed)),
        Opcode::Store { .. } => Some((MemKind::Store, false)),
        Opcode::Rmw { op, .. } => Some((MemKind::Rmw(op), false)),
        _ => None,
    }
}

/// Data and compare values a write sends to memory, once its data sources are ready.
fn store_data(inst: &Instance) -> Option<(u64, u64)> {
    let ops = inst.operands();
    match inst.inst.op {
        Opcode::Store { .. } => Some((ops.rs2, 0)),
        Opcode::Rmw { op: RmwOp::Swap, .. } => Some((ops.rd, 0)),
        Opcode::Rmw { op: RmwOp::Cas, .. } => Some((ops.rd, ops.rs2)),
        _ => None,
    }
}

impl Processor {
    /// Decodes up to one group from the fetch queue.
    pub(super) fn decode(&mut self) -> Result<(), EngineError> {
        for _ in 0..self.widths.decode {
            let Some(entry) = self.fetch_queue.front() else {
                if self.fetch_block == Some(FetchBlock::Indirect) {
                    self.stats.record_stall(StallCause::UnresolvedBranch);
                }
                break;
            };
            if let Some(cause) = self.resource_shortfall(entry) {
                trace!("DE stall {cause} at {:#x}", entry.fetched.pc);
                self.stats.record_stall(cause);
                break;
            }
            let Some(entry) = self.fetch_queue.pop_front() else {
                break;
            };
            self.decode_one(entry)?;
            self.stats.decoded += 1;
        }
        Ok(())
    }

    /// First missing resource for `entry`, without side effects.
    fn resource_shortfall(&self, entry: &FetchEntry) -> Option<StallCause> {
        if self.active.is_full() {
            return Some(StallCause::ReorderBufferFull);
        }
        if decode_fault(entry, self.pstate.privileged).is_some() {
            return None;
        }
        let dests = entry.fetched.inst.dest_parts();
        for file in RegFile::ALL {
            let needed = dests.iter().filter(|d| d.reg.file == file).count();
            if needed > self.regs.free_count(file) {
                return Some(StallCause::Rename);
            }
        }
        if entry.prediction.is_some_and(|p| p.needs_checkpoint()) && !self.branches.has_slot() {
            return Some(StallCause::ShadowMapperExhausted);
        }
        if entry.fetched.inst.op.is_memory() && !self.memq.has_slot() {
            return Some(StallCause::MemQueueFull);
        }
        None
    }

    fn decode_one(&mut self, entry: FetchEntry) -> Result<(), EngineError> {
        let fault = decode_fault(&entry, self.pstate.privileged);
        let FetchEntry { fetched, prediction } = entry;
        let tag = self.tags.next_tag();
        let timing = fetched.inst.op.category().timing(&self.latency);
        let mut instance = Instance::new(tag, fetched.pc, fetched.inst, timing);
        instance.prediction = prediction;
        instance.exception = fault;
        let handle = self.arena.insert(instance);
        self.tags.register(tag, handle)?;

        if fault.is_some() {
            trace!("DE {tag} {:#x} faults with {fault}", fetched.pc);
            self.insert_active(ActiveEntry::new(tag, handle, fetched.pc, DestList::default()))?;
            self.active.mark_done(tag, fault, self.cycle)?;
            return Ok(());
        }

        let srcs = self.read_sources(&fetched.inst, handle, tag);
        let mut dest_list = DestList::default();
        let mut dests = Vec::with_capacity(2);
        for dest in fetched.inst.dest_parts() {
            let (new, old) = self.regs.rename(dest.reg)?;
            dest_list.push(DestWrite {
                logical: dest.reg,
                new,
                old,
            })?;
            dests.push(DestSlot { dest, phys: new });
        }
        {
            let inst = self.instance_mut(handle, tag)?;
            inst.srcs = srcs;
            inst.dests = dests;
        }
        self.insert_active(ActiveEntry::new(tag, handle, fetched.pc, dest_list))?;

        if prediction.is_some_and(|p| p.needs_checkpoint()) {
            self.branches.push(tag, self.regs.snapshot())?;
        }

        trace!("DE {tag} {:#x} {:?}", fetched.pc, fetched.inst.op);
        match fetched.inst.op.category() {
            OpCategory::Nop => {
                self.instance_mut(handle, tag)?.progress.done = true;
                self.active.mark_done(tag, ExceptionCode::Ok, self.cycle)?;
            }
            OpCategory::Barrier => {
                if let Opcode::Membar(mask) = fetched.inst.op {
                    self.memq.insert_barrier(tag, handle, mask);
                }
            }
            OpCategory::Memory => {
                let (kind, signed) = mem_kind(fetched.inst.op)
                    .ok_or_else(|| EngineError::Invariant(format!("{tag} is not a memory opcode")))?;
                let width = fetched
                    .inst
                    .op
                    .mem_width()
                    .ok_or_else(|| EngineError::Invariant(format!("{tag} has no access width")))?;
                self.memq.insert(MemEntry::new(tag, handle, kind, width, signed))?;
                self.dispatch(handle, tag)?;
            }
            _ => self.dispatch(handle, tag)?,
        }
        Ok(())
    }

    fn insert_active(&mut self, entry: ActiveEntry) -> Result<(), EngineError> {
        self.active.insert(entry).map_err(|e| {
            EngineError::Invariant(format!("{} inserted into a full active list", e.tag))
        })
    }

    /// Renames and captures source parts, attaching busy ones to stall queues.
    fn read_sources(&mut self, inst: &StaticInst, handle: InstHandle, tag: Tag) -> Vec<SrcSlot> {
        let mut srcs = Vec::with_capacity(4);
        for (i, src) in inst.source_parts().into_iter().enumerate() {
            if src.reg.is_zero() {
                srcs.push(SrcSlot {
                    src,
                    phys: PhysReg(0),
                    value: 0,
                    ready: true,
                });
                continue;
            }
            let phys = self.regs.lookup(src.reg);
            let file = self.regs.file(src.reg.file);
            let ready = !file.phys.is_busy(phys);
            let value = if ready { file.phys.value(phys) } else { 0 };
            if !ready {
                self.stalls.attach(
                    src.reg.file,
                    phys,
                    StallEntry {
                        handle,
                        tag,
                        operand: i as u8,
                    },
                );
            }
            srcs.push(SrcSlot {
                src,
                phys,
                value,
                ready,
            });
        }
        srcs
    }

    /// Moves an instruction whose operands became ready to its ready queue.
    ///
    /// Memory operations go to the address unit as soon as their address
    /// operands are ready; store and atomic data is handed to the memory
    /// queue whenever it arrives.
    pub(super) fn dispatch(&mut self, handle: InstHandle, tag: Tag) -> Result<(), EngineError> {
        let inst = self.instance(handle, tag)?;
        if inst.progress.done || inst.exception.is_some() {
            return Ok(());
        }
        if inst.category == OpCategory::Memory {
            let data = if inst.progress.mem_ready || !inst.data_ready() {
                None
            } else {
                Some(store_data(inst))
            };
            let to_addr = !inst.progress.queued && !inst.progress.addr_ready && inst.address_ready();
            if let Some(data) = data {
                if let Some((value, compare)) = data {
                    self.memq.set_data(tag, value, compare)?;
                }
                self.instance_mut(handle, tag)?.progress.mem_ready = true;
            }
            if to_addr {
                self.instance_mut(handle, tag)?.progress.queued = true;
                self.units.enqueue(UnitType::Addr, handle, tag);
            }
            return Ok(());
        }
        let Some(unit) = inst.unit else {
            return Ok(());
        };
        if inst.progress.queued || !inst.all_ready() {
            return Ok(());
        }
        self.instance_mut(handle, tag)?.progress.queued = true;
        self.units.enqueue(unit, handle, tag);
        Ok(())
    }

    /// Captures a value written by a producer into a waiting source.
    pub(super) fn capture(&mut self, waiter: StallEntry, value: u64) -> Result<(), EngineError> {
        let Ok(inst) = self.instance_mut(waiter.handle, waiter.tag) else {
            return Ok(());
        };
        let Some(slot) = inst.srcs.get_mut(usize::from(waiter.operand)) else {
            return Err(EngineError::Invariant(format!(
                "{} has no source operand {}",
                waiter.tag, waiter.operand
            )));
        };
        slot.value = value;
        slot.ready = true;
        self.dispatch(waiter.handle, waiter.tag)
    }
}
