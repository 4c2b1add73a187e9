//! Instruction constructors.
//!
//! Each helper returns a ready-to-run [`StaticInst`]; registers are integer
//! registers unless the name says otherwise.

use mcsim_core::common::data::{MemWidth, RmwOp};
use mcsim_core::isa::{AluOp, BarrierKind, BarrierMask, Cond, Opcode, Operand, StaticInst};

fn base(op: Opcode) -> StaticInst {
    StaticInst::new(op)
}

/// `rd = rs + imm`.
pub fn addi(rd: u8, rs: u8, imm: i64) -> StaticInst {
    StaticInst {
        dst: Some(Operand::Int(rd)),
        src1: Some(Operand::Int(rs)),
        imm,
        ..base(Opcode::Alu(AluOp::Add))
    }
}

/// `rd = imm`.
pub fn li(rd: u8, imm: i64) -> StaticInst {
    addi(rd, 0, imm)
}

/// `rd = a + b`.
pub fn add(rd: u8, a: u8, b: u8) -> StaticInst {
    StaticInst {
        dst: Some(Operand::Int(rd)),
        src1: Some(Operand::Int(a)),
        src2: Some(Operand::Int(b)),
        ..base(Opcode::Alu(AluOp::Add))
    }
}

/// Compares `a` with `b`, setting the integer condition code only.
pub fn cmp(a: u8, b: u8) -> StaticInst {
    StaticInst {
        src1: Some(Operand::Int(a)),
        src2: Some(Operand::Int(b)),
        set_cc: true,
        ..base(Opcode::Alu(AluOp::Sub))
    }
}

/// `rd = rs / imm`, unsigned. Slow, used to delay a dependent address.
pub fn divi(rd: u8, rs: u8, imm: i64) -> StaticInst {
    StaticInst {
        dst: Some(Operand::Int(rd)),
        src1: Some(Operand::Int(rs)),
        imm,
        ..base(Opcode::Div { signed: false })
    }
}

/// 64-bit load `rd = [rs + off]`.
pub fn ld(rd: u8, rs: u8, off: i64) -> StaticInst {
    StaticInst {
        dst: Some(Operand::Int(rd)),
        src1: Some(Operand::Int(rs)),
        imm: off,
        ..base(Opcode::Load {
            width: MemWidth::Double,
            signed: false,
        })
    }
}

/// 64-bit store `[rs + off] = data`.
pub fn st(data: u8, rs: u8, off: i64) -> StaticInst {
    StaticInst {
        src1: Some(Operand::Int(rs)),
        src2: Some(Operand::Int(data)),
        imm: off,
        ..base(Opcode::Store {
            width: MemWidth::Double,
        })
    }
}

/// Load-store-unsigned-byte `rd = [rs]; [rs] = 0xff`.
pub fn ldstub(rd: u8, rs: u8) -> StaticInst {
    StaticInst {
        dst: Some(Operand::Int(rd)),
        src1: Some(Operand::Int(rs)),
        ..base(Opcode::Rmw {
            op: RmwOp::Ldstub,
            width: MemWidth::Byte,
        })
    }
}

/// Store-load barrier.
pub fn membar_store_load() -> StaticInst {
    base(Opcode::Membar(BarrierMask::of(&[BarrierKind::StoreLoad])))
}

/// Conditional branch on the integer condition code.
pub fn branch(cond: Cond, target: u64) -> StaticInst {
    StaticInst {
        target: Some(target),
        ..base(Opcode::Branch(cond))
    }
}

/// No operation.
pub fn nop() -> StaticInst {
    base(Opcode::Nop)
}

/// Stops the processor.
pub fn halt() -> StaticInst {
    base(Opcode::Halt)
}

/// Returns from a trap, re-executing the trapped instruction.
pub fn retry() -> StaticInst {
    base(Opcode::Retry)
}

/// Returns from a trap to the instruction after the trapped one.
pub fn done() -> StaticInst {
    base(Opcode::Done)
}

/// Software trap `n`.
pub fn trap(n: u8) -> StaticInst {
    base(Opcode::Trap(n))
}
