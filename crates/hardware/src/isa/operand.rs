//! Instruction operands.
//!
//! An operand names one architectural value in one of five classes. Each
//! operand expands into one or two register *parts*, the unit that gets a
//! physical register and a busy bit:
//! 1. **Int / Fp / Cc:** one part.
//! 2. **IntPair:** the even register holds the low word, the odd register the high word.
//! 3. **FpHalf:** a single-precision view of one FP register (low 32 bits).

use serde::Deserialize;

use crate::common::reg::{FCC_COUNT, LogicalReg};

/// An architectural operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum Operand {
    /// 64-bit integer register.
    Int(u8),
    /// Even/odd integer register pair.
    IntPair(u8),
    /// Double-precision FP register.
    Fp(u8),
    /// Single-precision FP register.
    FpHalf(u8),
    /// Integer condition code.
    Icc,
    /// Floating-point condition code `n`.
    Fcc(u8),
}

/// Which half of an operand value a register part carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Part {
    /// The whole value.
    Whole,
    /// Bits 0..32 of a pair.
    Low,
    /// Bits 32..64 of a pair.
    High,
}

impl Part {
    /// Places a register value into its position of the operand value.
    #[inline]
    pub const fn assemble(self, acc: u64, reg: u64) -> u64 {
        match self {
            Self::Whole => reg,
            Self::Low => (acc & !0xFFFF_FFFF) | (reg & 0xFFFF_FFFF),
            Self::High => (acc & 0xFFFF_FFFF) | (reg << 32),
        }
    }

    /// Extracts this part's register value from a full operand value.
    #[inline]
    pub const fn extract(self, value: u64) -> u64 {
        match self {
            Self::Whole => value,
            Self::Low => value & 0xFFFF_FFFF,
            Self::High => value >> 32,
        }
    }
}

impl Operand {
    /// Expands the operand into `(logical register, part)` pairs.
    ///
    /// Returns an empty list for register indices outside the class.
    pub fn parts(self) -> Vec<(LogicalReg, Part)> {
        match self {
            Self::Int(r) if r < 32 => vec![(LogicalReg::int(u16::from(r)), Part::Whole)],
            Self::IntPair(r) if r % 2 == 0 && r < 31 => vec![
                (LogicalReg::int(u16::from(r)), Part::Low),
                (LogicalReg::int(u16::from(r) + 1), Part::High),
            ],
            Self::Fp(r) | Self::FpHalf(r) if r < 32 => {
                vec![(LogicalReg::fp(u16::from(r)), Part::Whole)]
            }
            Self::Icc => vec![(LogicalReg::icc(), Part::Whole)],
            Self::Fcc(n) if u16::from(n) < FCC_COUNT => {
                vec![(LogicalReg::fcc(u16::from(n)), Part::Whole)]
            }
            _ => Vec::new(),
        }
    }

    /// True if the operand names a register that exists.
    pub fn is_valid(self) -> bool {
        !self.parts().is_empty()
    }

    /// True for single-precision FP operands.
    #[inline]
    pub const fn is_half(self) -> bool {
        matches!(self, Self::FpHalf(_))
    }

    /// True for FP registers of either precision.
    #[inline]
    pub const fn is_fp(self) -> bool {
        matches!(self, Self::Fp(_) | Self::FpHalf(_))
    }
}
