//! Reference Instruction Supply.
//!
//! Serves already-decoded instructions from segments placed at word-aligned
//! base addresses. A segment may be restricted to privileged mode, which is
//! how trap handlers are protected from user code.

use std::collections::BTreeMap;

use crate::common::error::ExceptionCode;
use crate::isa::StaticInst;
use crate::soc::traits::{FetchedInst, InstructionSupply};

#[derive(Clone, Copy, Debug)]
struct Slot {
    inst: StaticInst,
    privileged: bool,
}

/// Instruction memory built from program segments.
#[derive(Clone, Debug, Default)]
pub struct ProgramSupply {
    slots: BTreeMap<u64, Slot>,
}

impl ProgramSupply {
    /// Creates an empty supply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `insts` at consecutive words starting at `base`.
    ///
    /// # Arguments
    ///
    /// * `base` - Address of the first instruction.
    /// * `insts` - Instructions in address order.
    /// * `privileged` - Only fetchable in privileged mode.
    pub fn add_segment(&mut self, base: u64, insts: &[StaticInst], privileged: bool) {
        for (i, inst) in insts.iter().enumerate() {
            let _ = self.slots.insert(
                base.wrapping_add(4 * i as u64),
                Slot {
                    inst: *inst,
                    privileged,
                },
            );
        }
    }

    /// Number of instructions held.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no instruction is held.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl InstructionSupply for ProgramSupply {
    fn fetch(&mut self, pc: u64, privileged: bool) -> FetchedInst {
        let fault = |exception| FetchedInst {
            inst: StaticInst::default(),
            pc,
            exception,
        };
        if pc % 4 != 0 {
            return fault(ExceptionCode::Alignment);
        }
        match self.slots.get(&pc) {
            Some(slot) if slot.privileged && !privileged => fault(ExceptionCode::InstrAccessFault),
            Some(slot) => FetchedInst {
                inst: slot.inst,
                pc,
                exception: ExceptionCode::Ok,
            },
            None => fault(ExceptionCode::InstrAccessFault),
        }
    }
}
