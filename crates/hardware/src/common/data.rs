//! Memory access types.
//!
//! This module classifies data-memory references used throughout the simulator:
//! 1. **Access kind:** Read, write, or atomic read-modify-write.
//! 2. **Width:** Byte, half, word, or doubleword, with sign/zero extension helpers.
//! 3. **Overlap tests:** Byte-range intersection used by disambiguation.

use serde::Deserialize;

/// Atomic read-modify-write operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum RmwOp {
    /// Exchange the register value with memory.
    Swap,
    /// Compare-and-swap: write the new value only if memory equals the compare value.
    Cas,
    /// Load an unsigned byte and set it to all ones.
    Ldstub,
}

impl RmwOp {
    /// Computes the value written back to memory.
    pub const fn apply(self, old: u64, data: u64, compare: u64) -> u64 {
        match self {
            Self::Swap => data,
            Self::Cas => {
                if old == compare {
                    data
                } else {
                    old
                }
            }
            Self::Ldstub => 0xFF,
        }
    }
}

/// Type of data memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Data read (loads).
    Read,
    /// Data write (stores).
    Write,
    /// Atomic read-modify-write; the reply carries the old value.
    Rmw(RmwOp),
}

/// Width of a memory reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum MemWidth {
    /// 1 byte.
    Byte,
    /// 2 bytes.
    Half,
    /// 4 bytes.
    Word,
    /// 8 bytes.
    #[default]
    Double,
}

impl MemWidth {
    /// Size in bytes.
    #[inline]
    pub const fn bytes(self) -> u64 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
            Self::Double => 8,
        }
    }

    /// Mask selecting the low `bytes()` bytes of a register value.
    #[inline]
    pub const fn mask(self) -> u64 {
        match self {
            Self::Double => u64::MAX,
            w => (1u64 << (w.bytes() * 8)) - 1,
        }
    }

    /// Truncates `value` to this width and extends it back to 64 bits.
    pub const fn extend(self, value: u64, signed: bool) -> u64 {
        let raw = value & self.mask();
        if !signed {
            return raw;
        }
        match self {
            Self::Byte => raw as u8 as i8 as i64 as u64,
            Self::Half => raw as u16 as i16 as i64 as u64,
            Self::Word => raw as u32 as i32 as i64 as u64,
            Self::Double => raw,
        }
    }

    /// True if `addr` is naturally aligned for this width.
    #[inline]
    pub const fn is_aligned(self, addr: u64) -> bool {
        addr % self.bytes() == 0
    }
}

/// True if the byte ranges `[a, a + wa)` and `[b, b + wb)` intersect.
#[inline]
pub const fn overlaps(a: u64, wa: MemWidth, b: u64, wb: MemWidth) -> bool {
    a < b + wb.bytes() && b < a + wa.bytes()
}
