//! Opcodes and their categories.
//!
//! Opcodes fall into a closed set of categories. Each category carries the
//! functional unit it runs on and the latency/repeat rule used by the
//! scheduler, resolved once at decode.

use serde::Deserialize;

use crate::common::data::{MemWidth, RmwOp};
use crate::config::{LatencyConfig, Timing};

/// Integer ALU operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum AluOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Shift left logical.
    Sll,
    /// Shift right logical.
    Srl,
    /// Shift right arithmetic.
    Sra,
    /// Move the second operand.
    Mov,
}

/// Floating-point operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum FpOp {
    /// Addition.
    FAdd,
    /// Subtraction.
    FSub,
    /// Multiplication.
    FMul,
    /// Division.
    FDiv,
    /// Square root of the first operand.
    FSqrt,
    /// Register move.
    FMov,
    /// Compare, writing an FP condition code.
    FCmp,
    /// Convert FP to a signed integer.
    FtoI,
    /// Convert a signed integer to FP.
    ItoF,
}

/// Branch condition.
///
/// Integer conditions test the integer condition code; FP conditions test an
/// FP condition code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum Cond {
    /// Unconditionally taken.
    Always,
    /// Never taken.
    Never,
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Signed less than.
    Lt,
    /// Signed less or equal.
    Le,
    /// Signed greater than.
    Gt,
    /// Signed greater or equal.
    Ge,
    /// Unsigned less than.
    Ltu,
    /// Unsigned greater or equal.
    Geu,
    /// FP equal.
    FEq,
    /// FP not equal or unordered.
    FNe,
    /// FP less than.
    FLt,
    /// FP less or equal.
    FLe,
    /// FP greater than.
    FGt,
    /// FP greater or equal.
    FGe,
    /// FP unordered.
    FUn,
}

/// Condition code flag: negative / FP less.
pub const FLAG_N: u64 = 8;
/// Condition code flag: zero / FP equal.
pub const FLAG_Z: u64 = 4;
/// Condition code flag: overflow / FP unordered.
pub const FLAG_V: u64 = 2;
/// Condition code flag: carry / FP greater.
pub const FLAG_C: u64 = 1;

impl Cond {
    /// True for conditions that read an FP condition code.
    pub const fn is_fp(self) -> bool {
        matches!(
            self,
            Self::FEq | Self::FNe | Self::FLt | Self::FLe | Self::FGt | Self::FGe | Self::FUn
        )
    }

    /// True for conditions that do not depend on any condition code.
    pub const fn is_unconditional(self) -> bool {
        matches!(self, Self::Always | Self::Never)
    }

    /// Evaluates the condition against a condition-code value.
    pub const fn eval(self, cc: u64) -> bool {
        let n = cc & FLAG_N != 0;
        let z = cc & FLAG_Z != 0;
        let v = cc & FLAG_V != 0;
        let c = cc & FLAG_C != 0;
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Eq | Self::FEq => z,
            Self::Ne | Self::FNe => !z,
            Self::Lt => n != v,
            Self::Ge => n == v,
            Self::Le => z || n != v,
            Self::Gt => !(z || n != v),
            Self::Ltu => c,
            Self::Geu => !c,
            Self::FLt => n,
            Self::FLe => n || z,
            Self::FGt => c,
            Self::FGe => c || z,
            Self::FUn => v,
        }
    }
}

/// One ordering relation enforced by a memory barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum BarrierKind {
    /// Older stores before younger stores.
    StoreStore,
    /// Older loads before younger stores.
    LoadStore,
    /// Older stores before younger loads.
    StoreLoad,
    /// Older loads before younger loads.
    LoadLoad,
    /// All older references before any younger reference.
    MemIssue,
    /// Full synchronization.
    Sync,
}

/// Set of ordering relations enforced by a barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "Vec<BarrierKind>")]
pub struct BarrierMask(u8);

impl BarrierMask {
    const fn bit(kind: BarrierKind) -> u8 {
        match kind {
            BarrierKind::StoreStore => 1,
            BarrierKind::LoadStore => 2,
            BarrierKind::StoreLoad => 4,
            BarrierKind::LoadLoad => 8,
            BarrierKind::MemIssue => 16,
            BarrierKind::Sync => 32,
        }
    }

    const FULL: u8 = 16 | 32;

    /// Builds a mask from a list of relations.
    pub fn of(kinds: &[BarrierKind]) -> Self {
        Self(kinds.iter().fold(0, |m, k| m | Self::bit(*k)))
    }

    /// True if the relation is part of the mask.
    #[inline]
    pub const fn contains(self, kind: BarrierKind) -> bool {
        self.0 & Self::bit(kind) != 0
    }

    const fn any(self, bits: u8) -> bool {
        self.0 & (bits | Self::FULL) != 0
    }

    /// Older loads must complete before the barrier is done.
    pub const fn orders_older_loads(self) -> bool {
        self.any(Self::bit(BarrierKind::LoadLoad) | Self::bit(BarrierKind::LoadStore))
    }

    /// Older stores must complete before the barrier is done.
    pub const fn orders_older_stores(self) -> bool {
        self.any(Self::bit(BarrierKind::StoreStore) | Self::bit(BarrierKind::StoreLoad))
    }

    /// Younger loads may not issue until the barrier graduates.
    pub const fn blocks_younger_loads(self) -> bool {
        self.any(Self::bit(BarrierKind::LoadLoad) | Self::bit(BarrierKind::StoreLoad))
    }

    /// Younger stores may not become ready to retire until the barrier graduates.
    pub const fn blocks_younger_stores(self) -> bool {
        self.any(Self::bit(BarrierKind::StoreStore) | Self::bit(BarrierKind::LoadStore))
    }
}

impl From<Vec<BarrierKind>> for BarrierMask {
    fn from(kinds: Vec<BarrierKind>) -> Self {
        Self::of(&kinds)
    }
}

/// Processor-state register written by `Wrpr`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum PstateField {
    /// The processor state word (privilege and interrupt-enable bits).
    Pstate,
    /// Processor interrupt level; interrupts at or below it are masked.
    Pil,
}

/// Operation performed by an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Opcode {
    /// No operation.
    #[default]
    Nop,
    /// Integer ALU operation.
    Alu(AluOp),
    /// Integer multiply.
    Mul,
    /// Integer divide.
    Div {
        /// Signed division.
        #[serde(default)]
        signed: bool,
    },
    /// Floating-point operation.
    Fp(FpOp),
    /// Conditional or unconditional branch to `target`.
    Branch(Cond),
    /// Call to `target`, writing the return address to `dst`.
    Call,
    /// Indirect jump to `src1 + imm`, writing the return address to `dst`.
    Jmpl {
        /// Marks a function return, predicted by the return-address stack.
        #[serde(default)]
        ret: bool,
    },
    /// Load from `src1 + (src2 | imm)`.
    Load {
        /// Access width.
        width: MemWidth,
        /// Sign-extend the loaded value.
        #[serde(default)]
        signed: bool,
    },
    /// Store `src2` to `src1 + imm`.
    Store {
        /// Access width.
        width: MemWidth,
    },
    /// Atomic read-modify-write at `src1 + imm`.
    Rmw {
        /// Operation.
        op: RmwOp,
        /// Access width.
        width: MemWidth,
    },
    /// Memory barrier.
    Membar(BarrierMask),
    /// Software trap.
    Trap(u8),
    /// Return from trap, resuming at the saved next PC.
    Done,
    /// Return from trap, re-executing the saved PC.
    Retry,
    /// Write a processor-state register with `src1 ^ imm`.
    Wrpr(PstateField),
    /// Stop the processor.
    Halt,
}

/// Functional unit type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitType {
    /// Integer ALU (also branches and system instructions).
    IntAlu,
    /// Floating-point unit.
    Fpu,
    /// Address generation.
    Addr,
    /// Memory port.
    Mem,
}

impl UnitType {
    /// All unit types in index order.
    pub const ALL: [Self; 4] = [Self::IntAlu, Self::Fpu, Self::Addr, Self::Mem];

    /// Dense index for per-unit arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::IntAlu => 0,
            Self::Fpu => 1,
            Self::Addr => 2,
            Self::Mem => 3,
        }
    }
}

/// Closed set of opcode categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpCategory {
    /// Completes at decode.
    Nop,
    /// Integer add, logic, moves.
    IntAlu,
    /// Shifts.
    Shift,
    /// Integer multiply.
    IntMul,
    /// Integer divide.
    IntDiv,
    /// FP add, subtract, compare.
    FpAdd,
    /// FP multiply.
    FpMul,
    /// FP divide.
    FpDiv,
    /// FP square root.
    FpSqrt,
    /// FP conversions.
    FpConv,
    /// FP moves.
    FpMove,
    /// Branches, calls and jumps.
    Branch,
    /// Loads, stores and atomics.
    Memory,
    /// Memory barriers.
    Barrier,
    /// Traps and serializing instructions.
    System,
}

impl OpCategory {
    /// Unit the category executes on; `None` for instructions that never issue.
    pub const fn unit(self) -> Option<UnitType> {
        match self {
            Self::Nop | Self::Barrier => None,
            Self::IntAlu | Self::Shift | Self::IntMul | Self::IntDiv | Self::Branch | Self::System => {
                Some(UnitType::IntAlu)
            }
            Self::FpAdd | Self::FpMul | Self::FpDiv | Self::FpSqrt | Self::FpConv | Self::FpMove => {
                Some(UnitType::Fpu)
            }
            Self::Memory => Some(UnitType::Addr),
        }
    }

    /// Latency and repeat rate on the category's unit.
    pub const fn timing(self, lat: &LatencyConfig) -> Timing {
        match self {
            Self::Nop | Self::Barrier | Self::IntAlu | Self::System => lat.int_alu,
            Self::Shift => lat.shift,
            Self::IntMul => lat.int_mul,
            Self::IntDiv => lat.int_div,
            Self::FpAdd => lat.fp_add,
            Self::FpMul => lat.fp_mul,
            Self::FpDiv => lat.fp_div,
            Self::FpSqrt => lat.fp_sqrt,
            Self::FpConv => lat.fp_conv,
            Self::FpMove => lat.fp_move,
            Self::Branch => lat.branch,
            Self::Memory => lat.addr,
        }
    }
}

impl Opcode {
    /// Category of this opcode.
    pub const fn category(self) -> OpCategory {
        match self {
            Self::Nop => OpCategory::Nop,
            Self::Alu(AluOp::Sll | AluOp::Srl | AluOp::Sra) => OpCategory::Shift,
            Self::Alu(_) => OpCategory::IntAlu,
            Self::Mul => OpCategory::IntMul,
            Self::Div { .. } => OpCategory::IntDiv,
            Self::Fp(FpOp::FAdd | FpOp::FSub | FpOp::FCmp) => OpCategory::FpAdd,
            Self::Fp(FpOp::FMul) => OpCategory::FpMul,
            Self::Fp(FpOp::FDiv) => OpCategory::FpDiv,
            Self::Fp(FpOp::FSqrt) => OpCategory::FpSqrt,
            Self::Fp(FpOp::FtoI | FpOp::ItoF) => OpCategory::FpConv,
            Self::Fp(FpOp::FMov) => OpCategory::FpMove,
            Self::Branch(_) | Self::Call | Self::Jmpl { .. } => OpCategory::Branch,
            Self::Load { .. } | Self::Store { .. } | Self::Rmw { .. } => OpCategory::Memory,
            Self::Membar(_) => OpCategory::Barrier,
            Self::Trap(_) | Self::Done | Self::Retry | Self::Wrpr(_) | Self::Halt => {
                OpCategory::System
            }
        }
    }

    /// True for opcodes that may only execute in privileged mode.
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Done | Self::Retry | Self::Wrpr(_))
    }

    /// True for opcodes applied at the head of the active list.
    pub const fn is_serializing(self) -> bool {
        matches!(self, Self::Done | Self::Retry | Self::Wrpr(_) | Self::Halt)
    }

    /// True for loads, stores and atomics.
    pub const fn is_memory(self) -> bool {
        matches!(self, Self::Load { .. } | Self::Store { .. } | Self::Rmw { .. })
    }

    /// Access width of a memory opcode.
    pub const fn mem_width(self) -> Option<MemWidth> {
        match self {
            Self::Load { width, .. } | Self::Store { width } | Self::Rmw { width, .. } => {
                Some(width)
            }
            _ => None,
        }
    }
}
