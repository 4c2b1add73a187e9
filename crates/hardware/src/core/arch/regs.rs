//! Architectural register file.
//!
//! Holds the committed value of every logical register. Graduation copies the
//! physical value of each destination here; nothing else writes it.

use std::fmt::Write as _;

use crate::common::reg::{FP_LOGICAL_REGS, INT_LOGICAL_REGS, LogicalReg, RegFile};

/// Committed logical register values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchRegisters {
    int: [u64; INT_LOGICAL_REGS],
    fp: [u64; FP_LOGICAL_REGS],
}

impl Default for ArchRegisters {
    fn default() -> Self {
        Self {
            int: [0; INT_LOGICAL_REGS],
            fp: [0; FP_LOGICAL_REGS],
        }
    }
}

impl ArchRegisters {
    /// Reads a logical register. Integer register 0 always reads zero.
    pub fn read(&self, reg: LogicalReg) -> u64 {
        match reg.file {
            RegFile::Int if reg.index == 0 => 0,
            RegFile::Int => self.int[reg.idx()],
            RegFile::Fp => self.fp[reg.idx()],
        }
    }

    /// Writes a logical register. Writes to integer register 0 are ignored.
    pub fn write(&mut self, reg: LogicalReg, value: u64) {
        match reg.file {
            RegFile::Int if reg.index == 0 => {}
            RegFile::Int => self.int[reg.idx()] = value,
            RegFile::Fp => self.fp[reg.idx()] = value,
        }
    }

    /// Formats the non-zero registers for diagnostics.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let int = self.int.iter().enumerate().map(|(i, v)| (LogicalReg::int(i as u16), *v));
        let fp = self.fp.iter().enumerate().map(|(i, v)| (LogicalReg::fp(i as u16), *v));
        for (reg, v) in int.chain(fp).filter(|(_, v)| *v != 0) {
            let _ = writeln!(out, "  {reg:>5} = {v:#018x}");
        }
        out
    }
}
