//! Execution effects of each opcode category.
//!
//! Arithmetic here is deliberately small: it is enough to drive data-dependent
//! control flow and addresses through the pipeline, not a full ISA model.

use super::inst::StaticInst;
use super::opcode::{AluOp, FLAG_C, FLAG_N, FLAG_V, FLAG_Z, FpOp, Opcode};
use super::operand::Operand;
use crate::common::error::ExceptionCode;

/// Assembled source operand values, indexed by role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Operands {
    /// First source.
    pub rs1: u64,
    /// Second source.
    pub rs2: u64,
    /// Destination read as a source.
    pub rd: u64,
    /// Condition code.
    pub cc: u64,
}

/// Resolved control transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchOutcome {
    /// Whether control left the sequential path.
    pub taken: bool,
    /// Next PC after the instruction.
    pub next_pc: u64,
}

/// Result of executing an instruction on its functional unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Primary result value.
    pub result: u64,
    /// Integer condition code, when `set_cc` is requested.
    pub cc: Option<u64>,
    /// Exception raised by execution.
    pub exception: ExceptionCode,
    /// Control transfer for branches, calls and jumps.
    pub branch: Option<BranchOutcome>,
    /// Effective virtual address for memory operations.
    pub address: Option<u64>,
}

fn int_flags(result: u64, carry: bool, overflow: bool) -> u64 {
    let mut cc = 0;
    if result as i64 >> 63 != 0 {
        cc |= FLAG_N;
    }
    if result == 0 {
        cc |= FLAG_Z;
    }
    if overflow {
        cc |= FLAG_V;
    }
    if carry {
        cc |= FLAG_C;
    }
    cc
}

fn alu(op: AluOp, a: u64, b: u64) -> (u64, u64) {
    match op {
        AluOp::Add => {
            let (r, carry) = a.overflowing_add(b);
            let overflow = (a as i64).overflowing_add(b as i64).1;
            (r, int_flags(r, carry, overflow))
        }
        AluOp::Sub => {
            let (r, borrow) = a.overflowing_sub(b);
            let overflow = (a as i64).overflowing_sub(b as i64).1;
            (r, int_flags(r, borrow, overflow))
        }
        AluOp::And => logic(a & b),
        AluOp::Or => logic(a | b),
        AluOp::Xor => logic(a ^ b),
        AluOp::Sll => logic(a << (b & 63)),
        AluOp::Srl => logic(a >> (b & 63)),
        AluOp::Sra => logic(((a as i64) >> (b & 63)) as u64),
        AluOp::Mov => logic(b),
    }
}

fn logic(r: u64) -> (u64, u64) {
    (r, int_flags(r, false, false))
}

fn fp_flags(a: f64, b: f64) -> u64 {
    match a.partial_cmp(&b) {
        Some(std::cmp::Ordering::Equal) => FLAG_Z,
        Some(std::cmp::Ordering::Less) => FLAG_N,
        Some(std::cmp::Ordering::Greater) => FLAG_C,
        None => FLAG_V,
    }
}

/// Reads an FP operand of either precision as `f64`.
fn fp_in(op: Option<Operand>, bits: u64) -> f64 {
    match op {
        Some(Operand::FpHalf(_)) => f64::from(f32::from_bits(bits as u32)),
        _ => f64::from_bits(bits),
    }
}

/// Encodes an FP result in the destination's precision.
fn fp_out(dst: Option<Operand>, value: f64) -> u64 {
    match dst {
        Some(Operand::FpHalf(_)) => u64::from((value as f32).to_bits()),
        _ => value.to_bits(),
    }
}

fn fp(inst: &StaticInst, op: FpOp, ops: &Operands) -> (u64, ExceptionCode) {
    let half = inst.dst.is_some_and(Operand::is_half);
    let a = fp_in(inst.src1, ops.rs1);
    let b = fp_in(inst.src2, ops.rs2);
    // Single-precision destinations compute in f32 so rounding matches.
    let round = |v: f64| if half { f64::from(v as f32) } else { v };
    let value = match op {
        FpOp::FAdd => round(a + b),
        FpOp::FSub => round(a - b),
        FpOp::FMul => round(a * b),
        FpOp::FDiv => round(a / b),
        FpOp::FSqrt => {
            if a < 0.0 {
                return (0, ExceptionCode::FpError);
            }
            round(a.sqrt())
        }
        FpOp::FMov => a,
        FpOp::FCmp => return (fp_flags(a, b), ExceptionCode::Ok),
        FpOp::FtoI => {
            if a.is_nan() {
                return (0, ExceptionCode::FpError);
            }
            return (a as i64 as u64, ExceptionCode::Ok);
        }
        FpOp::ItoF => ops.rs1 as i64 as f64,
    };
    (fp_out(inst.dst, value), ExceptionCode::Ok)
}

/// Executes `inst` at `pc` with assembled operand values.
pub fn execute(inst: &StaticInst, pc: u64, ops: &Operands) -> ExecOutcome {
    let mut out = ExecOutcome::default();
    let b_or_imm = if inst.src2.is_some() {
        ops.rs2
    } else {
        inst.imm as u64
    };
    let fallthrough = pc.wrapping_add(4);
    match inst.op {
        Opcode::Nop | Opcode::Membar(_) | Opcode::Done | Opcode::Retry | Opcode::Halt => {}
        Opcode::Alu(op) => {
            let (r, cc) = alu(op, ops.rs1, b_or_imm);
            out.result = r;
            out.cc = inst.set_cc.then_some(cc);
        }
        Opcode::Mul => {
            let r = ops.rs1.wrapping_mul(b_or_imm);
            out.result = r;
            out.cc = inst.set_cc.then(|| int_flags(r, false, false));
        }
        Opcode::Div { signed } => {
            if b_or_imm == 0 {
                out.exception = ExceptionCode::DivideByZero;
            } else {
                let r = if signed {
                    (ops.rs1 as i64).wrapping_div(b_or_imm as i64) as u64
                } else {
                    ops.rs1 / b_or_imm
                };
                out.result = r;
                out.cc = inst.set_cc.then(|| int_flags(r, false, false));
            }
        }
        Opcode::Fp(op) => {
            let (r, exc) = fp(inst, op, ops);
            out.result = r;
            out.exception = exc;
        }
        Opcode::Branch(cond) => {
            let taken = cond.eval(ops.cc);
            let target = inst.target.unwrap_or_else(|| pc.wrapping_add(inst.imm as u64));
            out.branch = Some(BranchOutcome {
                taken,
                next_pc: if taken { target } else { fallthrough },
            });
        }
        Opcode::Call => {
            out.result = pc;
            out.branch = Some(BranchOutcome {
                taken: true,
                next_pc: inst.target.unwrap_or_else(|| pc.wrapping_add(inst.imm as u64)),
            });
        }
        Opcode::Jmpl { .. } => {
            let target = ops.rs1.wrapping_add(b_or_imm);
            out.result = pc;
            if target % 4 == 0 {
                out.branch = Some(BranchOutcome {
                    taken: true,
                    next_pc: target,
                });
            } else {
                out.exception = ExceptionCode::Alignment;
            }
        }
        Opcode::Load { .. } => out.address = Some(ops.rs1.wrapping_add(b_or_imm)),
        Opcode::Store { .. } | Opcode::Rmw { .. } => {
            out.address = Some(ops.rs1.wrapping_add(inst.imm as u64));
        }
        Opcode::Trap(n) => out.exception = ExceptionCode::SysTrap(n),
        Opcode::Wrpr(_) => out.result = ops.rs1 ^ inst.imm as u64,
    }
    out
}
