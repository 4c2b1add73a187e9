//! Register naming.
//!
//! The machine has two physical register files. Logical (architectural)
//! registers of every operand class are folded onto them:
//! 1. **Integer file:** general registers `0..32` and the integer condition code at [`ICC`].
//! 2. **Floating-point file:** registers `0..32` and four FP condition codes from [`FCC_BASE`].
//!
//! Integer logical register 0 is hardwired to zero and never renamed.

use std::fmt;

/// Number of logical registers mapped onto the integer file.
pub const INT_LOGICAL_REGS: usize = 33;

/// Number of logical registers mapped onto the floating-point file.
pub const FP_LOGICAL_REGS: usize = 36;

/// Logical index of the integer condition code.
pub const ICC: u16 = 32;

/// Logical index of the first floating-point condition code.
pub const FCC_BASE: u16 = 32;

/// Number of floating-point condition codes.
pub const FCC_COUNT: u16 = 4;

/// One of the two physical register files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegFile {
    /// Integer registers and the integer condition code.
    Int,
    /// Floating-point registers and the FP condition codes.
    Fp,
}

impl RegFile {
    /// Both files, in index order.
    pub const ALL: [Self; 2] = [Self::Int, Self::Fp];

    /// Dense index for per-file arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Int => 0,
            Self::Fp => 1,
        }
    }

    /// Number of logical registers folded onto this file.
    #[inline]
    pub const fn logical_count(self) -> usize {
        match self {
            Self::Int => INT_LOGICAL_REGS,
            Self::Fp => FP_LOGICAL_REGS,
        }
    }
}

impl fmt::Display for RegFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "integer"),
            Self::Fp => write!(f, "floating-point"),
        }
    }
}

/// A physical register number within one file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PhysReg(pub u16);

impl PhysReg {
    /// Index for direct array access.
    #[inline]
    pub const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PhysReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// An architectural register: file plus logical index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LogicalReg {
    /// File the register lives in.
    pub file: RegFile,
    /// Logical index within the file.
    pub index: u16,
}

impl LogicalReg {
    /// Integer register `index`.
    #[inline]
    pub const fn int(index: u16) -> Self {
        Self {
            file: RegFile::Int,
            index,
        }
    }

    /// Floating-point register `index`.
    #[inline]
    pub const fn fp(index: u16) -> Self {
        Self {
            file: RegFile::Fp,
            index,
        }
    }

    /// The integer condition code.
    #[inline]
    pub const fn icc() -> Self {
        Self::int(ICC)
    }

    /// Floating-point condition code `n`.
    #[inline]
    pub const fn fcc(n: u16) -> Self {
        Self::fp(FCC_BASE + n)
    }

    /// True for integer register 0, which reads as zero and ignores writes.
    #[inline]
    pub const fn is_zero(self) -> bool {
        matches!(self.file, RegFile::Int) && self.index == 0
    }

    /// Index for direct array access.
    #[inline]
    pub const fn idx(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for LogicalReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.file, self.index) {
            (RegFile::Int, ICC) => write!(f, "icc"),
            (RegFile::Int, i) => write!(f, "r{i}"),
            (RegFile::Fp, i) if i >= FCC_BASE => write!(f, "fcc{}", i - FCC_BASE),
            (RegFile::Fp, i) => write!(f, "f{i}"),
        }
    }
}
