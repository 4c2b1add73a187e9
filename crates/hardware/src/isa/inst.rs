//! Static (decoded) instructions.
//!
//! A [`StaticInst`] is what the instruction supply hands to fetch. It names
//! its operands by role; decode expands them into register parts and renames
//! each part separately.

use serde::Deserialize;

use super::opcode::{Cond, Opcode};
use super::operand::{Operand, Part};
use crate::common::data::RmwOp;
use crate::common::reg::LogicalReg;

/// Maximum number of source register parts per instruction.
pub const MAX_SRCS: usize = 4;

/// Maximum number of destination register writes per instruction.
pub const MAX_DESTS: usize = 2;

/// Role of a source operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SrcRole {
    /// First source (`src1`).
    Rs1,
    /// Second source (`src2`).
    Rs2,
    /// Destination register read as a source (atomic data).
    Rd,
    /// Condition code tested by a branch.
    Cc,
}

impl SrcRole {
    /// Dense index for per-role arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Rs1 => 0,
            Self::Rs2 => 1,
            Self::Rd => 2,
            Self::Cc => 3,
        }
    }
}

/// One renamed source part of an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourcePart {
    /// Operand role.
    pub role: SrcRole,
    /// Logical register read.
    pub reg: LogicalReg,
    /// Position within the operand value.
    pub part: Part,
}

/// One destination part of an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DestPart {
    /// Logical register written.
    pub reg: LogicalReg,
    /// Position within the result value.
    pub part: Part,
    /// True for the condition code written by `set_cc`.
    pub is_cc: bool,
}

/// A decoded instruction as supplied by the instruction-supply model.
#[derive(Clone, Copy, Debug, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct StaticInst {
    /// Operation.
    pub op: Opcode,
    /// Destination operand.
    pub dst: Option<Operand>,
    /// First source operand.
    pub src1: Option<Operand>,
    /// Second source operand; `imm` is used when absent.
    pub src2: Option<Operand>,
    /// Immediate.
    pub imm: i64,
    /// Also write the integer condition code.
    pub set_cc: bool,
    /// Absolute branch or call target.
    pub target: Option<u64>,
}

impl StaticInst {
    /// Creates an instruction with no operands.
    pub const fn new(op: Opcode) -> Self {
        Self {
            op,
            dst: None,
            src1: None,
            src2: None,
            imm: 0,
            set_cc: false,
            target: None,
        }
    }

    /// Condition code a branch tests, if it tests one.
    pub fn cc_operand(&self) -> Option<Operand> {
        match self.op {
            Opcode::Branch(cond) if cond.is_unconditional() => None,
            Opcode::Branch(cond) => match self.src1 {
                Some(cc @ (Operand::Icc | Operand::Fcc(_))) => Some(cc),
                _ if cond.is_fp() => Some(Operand::Fcc(0)),
                _ => Some(Operand::Icc),
            },
            _ => None,
        }
    }

    /// Source operands by role.
    pub fn source_operands(&self) -> Vec<(SrcRole, Operand)> {
        let mut out = Vec::with_capacity(3);
        let mut push = |role, op: Option<Operand>| {
            if let Some(op) = op {
                out.push((role, op));
            }
        };
        match self.op {
            Opcode::Nop
            | Opcode::Call
            | Opcode::Membar(_)
            | Opcode::Trap(_)
            | Opcode::Done
            | Opcode::Retry
            | Opcode::Halt => {}
            Opcode::Branch(_) => push(SrcRole::Cc, self.cc_operand()),
            Opcode::Wrpr(_) => push(SrcRole::Rs1, self.src1),
            Opcode::Store { .. } => {
                push(SrcRole::Rs1, self.src1);
                push(SrcRole::Rs2, self.src2);
            }
            Opcode::Rmw { op, .. } => {
                push(SrcRole::Rs1, self.src1);
                if op == RmwOp::Cas {
                    push(SrcRole::Rs2, self.src2);
                }
                if op != RmwOp::Ldstub {
                    push(SrcRole::Rd, self.dst);
                }
            }
            Opcode::Alu(_)
            | Opcode::Mul
            | Opcode::Div { .. }
            | Opcode::Fp(_)
            | Opcode::Jmpl { .. }
            | Opcode::Load { .. } => {
                push(SrcRole::Rs1, self.src1);
                push(SrcRole::Rs2, self.src2);
            }
        }
        out
    }

    /// Source operands expanded into register parts.
    pub fn source_parts(&self) -> Vec<SourcePart> {
        self.source_operands()
            .into_iter()
            .flat_map(|(role, op)| {
                op.parts()
                    .into_iter()
                    .map(move |(reg, part)| SourcePart { role, reg, part })
            })
            .collect()
    }

    /// Destination parts, excluding the hardwired zero register.
    pub fn dest_parts(&self) -> Vec<DestPart> {
        let mut out = Vec::with_capacity(MAX_DESTS + 1);
        let writes_dst = !matches!(
            self.op,
            Opcode::Store { .. }
                | Opcode::Branch(_)
                | Opcode::Membar(_)
                | Opcode::Nop
                | Opcode::Trap(_)
                | Opcode::Done
                | Opcode::Retry
                | Opcode::Wrpr(_)
                | Opcode::Halt
        );
        if writes_dst {
            if let Some(dst) = self.dst {
                out.extend(
                    dst.parts()
                        .into_iter()
                        .filter(|(reg, _)| !reg.is_zero())
                        .map(|(reg, part)| DestPart {
                            reg,
                            part,
                            is_cc: false,
                        }),
                );
            }
        }
        if self.set_cc && matches!(self.op, Opcode::Alu(_) | Opcode::Mul | Opcode::Div { .. }) {
            out.push(DestPart {
                reg: LogicalReg::icc(),
                part: Part::Whole,
                is_cc: true,
            });
        }
        out
    }

    /// True if a source role feeds address generation of a memory opcode.
    pub const fn is_address_role(&self, role: SrcRole) -> bool {
        match self.op {
            Opcode::Load { .. } => matches!(role, SrcRole::Rs1 | SrcRole::Rs2),
            Opcode::Store { .. } | Opcode::Rmw { .. } => matches!(role, SrcRole::Rs1),
            _ => true,
        }
    }

    /// True if the instruction is well formed.
    pub fn is_well_formed(&self) -> bool {
        let operands_valid = [self.dst, self.src1, self.src2]
            .into_iter()
            .flatten()
            .all(Operand::is_valid);
        if !operands_valid {
            return false;
        }
        if self.dest_parts().len() > MAX_DESTS || self.source_parts().len() > MAX_SRCS {
            return false;
        }
        match self.op {
            Opcode::Load { .. } | Opcode::Store { .. } | Opcode::Rmw { .. } => {
                let addr_ok = matches!(self.src1, Some(Operand::Int(_)));
                let data_ok = match self.op {
                    Opcode::Store { .. } => self.src2.is_some(),
                    Opcode::Rmw { op, .. } => {
                        op == RmwOp::Ldstub || matches!(self.dst, Some(Operand::Int(_)))
                    }
                    _ => self.dst.is_some(),
                };
                addr_ok && data_ok
            }
            Opcode::Branch(Cond::Always | Cond::Never) | Opcode::Call => self.target.is_some(),
            Opcode::Branch(cond) => {
                self.target.is_some()
                    && match self.cc_operand() {
                        Some(Operand::Fcc(_)) => cond.is_fp(),
                        Some(Operand::Icc) => !cond.is_fp(),
                        _ => false,
                    }
            }
            Opcode::Jmpl { .. } => matches!(self.src1, Some(Operand::Int(_))),
            Opcode::Wrpr(_) => self.src1.is_some(),
            _ => true,
        }
    }
}
