//! Instruction Set Architecture (ISA) Definitions.
//!
//! The pipeline consumes already-decoded instructions from an instruction
//! supply, so this module models instructions structurally rather than by
//! encoding:
//!
//! * `operand`: operand classes and their register parts.
//! * `opcode`: opcodes, categories, units, conditions and barrier masks.
//! * `inst`: static instructions and their source/destination expansion.
//! * `exec`: the execution effect of each opcode.

/// Execution effects.
pub mod exec;

/// Static instructions.
pub mod inst;

/// Opcodes and categories.
pub mod opcode;

/// Operand classes.
pub mod operand;

pub use exec::{BranchOutcome, ExecOutcome, Operands, execute};
pub use inst::{DestPart, MAX_DESTS, MAX_SRCS, SourcePart, SrcRole, StaticInst};
pub use opcode::{
    AluOp, BarrierKind, BarrierMask, Cond, FpOp, OpCategory, Opcode, PstateField, UnitType,
};
pub use operand::{Operand, Part};
