//! Trap, Interrupt and Serializing Instruction Tests.
//!
//! Verifies precise trap entry through the trap table, the ordering of hard
//! faults behind older stores, `Done`/`Retry` returns, interrupt masking and
//! privilege checks.

use mcsim_core::common::data::MemWidth;
use mcsim_core::common::error::ExceptionCode;
use mcsim_core::core::pipeline::memq::MemKind;
use mcsim_core::isa::{Opcode, Operand, PstateField, StaticInst};
use pretty_assertions::assert_eq;

use crate::common::builder::instruction::{
    divi, done, halt, ld, ldstub, li, nop, retry, st, trap,
};
use crate::common::builder::program::ProgramBuilder;
use crate::common::harness::{TestContext, fast_config};

fn tt(code: ExceptionCode) -> u16 {
    code.trap_type().expect("hard exception")
}

fn wrpr_pil(level: i64) -> StaticInst {
    StaticInst {
        src1: Some(Operand::Int(0)),
        imm: level,
        ..StaticInst::new(Opcode::Wrpr(PstateField::Pil))
    }
}

/// A data TLB miss at the head must not vector until every older store has
/// been sent to memory.
#[test]
fn hard_fault_waits_for_older_store_issue() {
    let program = ProgramBuilder::new(vec![
        li(1, 0x200),
        li(2, 7),
        st(2, 1, 0),
        li(5, 0x4000_0000),
        ld(3, 5, 0),
        li(6, 1),
        halt(),
    ])
    .page(0, 0, true)
    .handler(tt(ExceptionCode::DataTlbMiss), vec![halt()])
    .build();
    let mut tc = TestContext::new(program);

    tc.run_until(|p| p.stats().traps == 1);
    let cpu = tc.cpu(0);
    assert!(
        cpu.memory_queue()
            .iter()
            .all(|e| !e.kind.is_store() || e.has_issued()),
        "store still unissued when the trap was taken"
    );
    assert_eq!(cpu.trap_level(), 1);

    let _ = tc.run();
    assert_eq!(tc.memory().read(0x200, MemWidth::Double), 7);
    assert_eq!(tc.reg(3), 0);
    assert_eq!(tc.reg(6), 0, "younger instructions are discarded");
    assert_eq!(tc.stats().hard_exceptions, 1);
}

#[test]
fn write_to_read_only_page_raises_protection_fault() {
    let program = ProgramBuilder::new(vec![li(1, 0x40), st(1, 1, 0), halt()])
        .page(0, 0, false)
        .handler(tt(ExceptionCode::DataProtection), vec![halt()])
        .build();
    let mut tc = TestContext::new(program);
    let _ = tc.run();
    assert_eq!(tc.stats().traps, 1);
    assert_eq!(tc.memory().read(0x40, MemWidth::Double), 0);
}

#[test]
fn software_trap_returns_with_done() {
    let program = ProgramBuilder::new(vec![li(1, 1), trap(5), li(2, 2), halt()])
        .handler(tt(ExceptionCode::SysTrap(5)), vec![li(7, 9), done()])
        .build();
    let mut tc = TestContext::new(program);
    let _ = tc.run();

    assert_eq!((tc.reg(1), tc.reg(7), tc.reg(2)), (1, 9, 2));
    assert_eq!(tc.cpu(0).trap_level(), 0);
    assert!(!tc.cpu(0).pstate().privileged);
    assert_eq!(tc.stats().traps, 1);
}

#[test]
fn divide_by_zero_is_precise() {
    let program = ProgramBuilder::new(vec![li(1, 10), li(2, 4), divi(3, 1, 0), li(4, 1), halt()])
        .handler(tt(ExceptionCode::DivideByZero), vec![done()])
        .build();
    let mut tc = TestContext::new(program);
    let _ = tc.run();
    assert_eq!(tc.reg(2), 4);
    assert_eq!(tc.reg(3), 0);
    assert_eq!(tc.reg(4), 1, "execution resumes after the faulting divide");
}

#[test]
fn retry_in_user_mode_is_privileged() {
    let program = ProgramBuilder::new(vec![nop(), retry(), halt()])
        .handler(tt(ExceptionCode::Privileged), vec![halt()])
        .build();
    let mut tc = TestContext::new(program);
    let _ = tc.run();
    assert_eq!(tc.cpu(0).trap_level(), 1);
    assert_eq!(tc.stats().traps, 1);
}

#[test]
fn retry_at_trap_level_zero_is_illegal() {
    let program = ProgramBuilder::new(vec![retry(), halt()])
        .handler(tt(ExceptionCode::Illegal), vec![halt()])
        .build();
    let mut config = fast_config();
    config.trap.start_privileged = true;
    let mut tc = TestContext::with_config(&config, &[program]);
    let _ = tc.run();
    assert_eq!(tc.cpu(0).trap_level(), 1);
    assert_eq!(tc.stats().traps, 1);
}

#[test]
fn interrupt_is_taken_and_retried() {
    let mut code: Vec<StaticInst> = (1..=12).map(|r| li(r, i64::from(r) * 3)).collect();
    code.push(halt());
    let program = ProgramBuilder::new(code)
        .handler(tt(ExceptionCode::Interrupt(3)), vec![li(20, 0x99), retry()])
        .build();
    let mut config = fast_config();
    config.trap.interrupts_enabled = true;
    let mut tc = TestContext::with_config(&config, &[program]);
    tc.system.post_interrupt(0, 3);
    let _ = tc.run();

    assert_eq!(tc.stats().interrupts, 1);
    assert_eq!(tc.reg(20), 0x99);
    for r in 1..=12u8 {
        assert_eq!(tc.reg(u16::from(r)), u64::from(r) * 3);
    }
    assert_eq!(tc.cpu(0).trap_level(), 0);
    assert!(tc.cpu(0).pstate().interrupts_enabled);
}

#[test]
fn interrupt_at_or_below_pil_is_masked() {
    let program = ProgramBuilder::new(vec![wrpr_pil(5), li(1, 1), li(2, 2), li(3, 3), halt()])
        .handler(tt(ExceptionCode::Interrupt(4)), vec![halt()])
        .build();
    let mut config = fast_config();
    config.trap.interrupts_enabled = true;
    config.trap.start_privileged = true;
    let mut tc = TestContext::with_config(&config, &[program]);
    tc.run_until(|p| p.stats().graduated >= 1);
    tc.system.post_interrupt(0, 4);
    let _ = tc.run();

    assert_eq!(tc.stats().interrupts, 0);
    assert_eq!(tc.reg(3), 3);
}

/// An interrupt arriving while the head atomic is out in memory must wait for
/// it, so the retried program never sees the atomic's own write.
#[test]
fn interrupt_waits_for_issued_atomic() {
    let program = ProgramBuilder::new(vec![li(1, 0xA00), ldstub(2, 1), divi(3, 2, 1), halt()])
        .handler(tt(ExceptionCode::Interrupt(3)), vec![retry()])
        .build();
    let mut config = fast_config();
    config.trap.interrupts_enabled = true;
    let mut tc = TestContext::with_config(&config, &[program]);

    tc.run_until(|p| {
        p.memory_queue()
            .iter()
            .any(|e| matches!(e.kind, MemKind::Rmw(_)) && e.has_issued())
    });
    tc.system.post_interrupt(0, 3);
    let _ = tc.run();

    assert_eq!(tc.stats().interrupts, 1);
    assert_eq!(tc.reg(2), 0, "ldstub observed its own write");
    assert_eq!(tc.reg(3), 0);
    assert_eq!(tc.memory().read(0xA00, MemWidth::Byte), 0xFF);
    assert_eq!(tc.stats().rmws, 1);
}
