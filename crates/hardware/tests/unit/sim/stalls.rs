//! Decode Stall Classification.
//!
//! Each scenario shrinks one window resource until decode runs out of it,
//! then checks the stall is counted under the right cause and that the
//! program still commits the right values.

use mcsim_core::common::reg::RegFile;
use mcsim_core::isa::{Cond, Opcode, Operand, StaticInst};
use pretty_assertions::assert_eq;

use crate::common::builder::instruction::{add, branch, cmp, halt, ld, li};
use crate::common::builder::program::{CODE_BASE, ProgramBuilder};
use crate::common::harness::{TestContext, fast_config};

#[test]
fn small_active_list_stalls_on_full_window() {
    let mut config = fast_config();
    config.pipeline.active_list_size = 2;
    let program =
        ProgramBuilder::new(vec![li(1, 1), li(2, 2), li(3, 3), add(4, 1, 3), halt()]).build();
    let mut tc = TestContext::with_config(&config, &[program]);
    let _ = tc.run();

    assert!(tc.stats().stall_rob_full >= 1);
    assert_eq!(tc.reg(2), 2);
    assert_eq!(tc.reg(4), 4);
    assert_eq!(tc.stats().graduated, 5);
}

#[test]
fn second_branch_waits_for_a_shadow_mapper() {
    let mut config = fast_config();
    config.pipeline.shadow_mappers = 1;
    let program = ProgramBuilder::new(vec![
        li(1, 1),
        cmp(1, 0),
        branch(Cond::Eq, CODE_BASE + 0x100),
        branch(Cond::Eq, CODE_BASE + 0x100),
        li(2, 5),
        halt(),
    ])
    .build();
    let mut tc = TestContext::with_config(&config, &[program]);
    let _ = tc.run();

    assert!(tc.stats().stall_shadow >= 1);
    assert_eq!(tc.stats().branches, 2);
    assert_eq!(tc.reg(2), 5);
    assert!(tc.cpu(0).branch_queue().is_empty());
}

#[test]
fn single_entry_memory_queue_stalls_second_reference() {
    let mut config = fast_config();
    config.memory.queue_size = 1;
    let program = ProgramBuilder::new(vec![li(1, 0x400), ld(2, 1, 0), ld(3, 1, 8), halt()])
        .data(0x400, 7)
        .data(0x408, 9)
        .build();
    let mut tc = TestContext::with_config(&config, &[program]);
    let _ = tc.run();

    assert!(tc.stats().stall_memq_full >= 1);
    assert_eq!(tc.reg(2), 7);
    assert_eq!(tc.reg(3), 9);
}

/// A plain indirect jump has no predicted target, so decode starves until
/// it resolves.
#[test]
fn indirect_jump_starves_decode_until_resolved() {
    let target = CODE_BASE + 4 * 4;
    let jump = StaticInst {
        op: Opcode::Jmpl { ret: false },
        dst: Some(Operand::Int(15)),
        src1: Some(Operand::Int(1)),
        ..StaticInst::default()
    };
    let program = ProgramBuilder::new(vec![
        li(1, i64::try_from(target).expect("code address fits")),
        jump,
        li(2, 99),
        li(3, 77),
        li(4, 1),
        halt(),
    ])
    .build();
    let mut tc = TestContext::new(program);
    let _ = tc.run();

    assert!(tc.stats().stall_unresolved_branch >= 1);
    assert_eq!(tc.reg(2), 0);
    assert_eq!(tc.reg(3), 0);
    assert_eq!(tc.reg(4), 1);
}

#[test]
fn one_spare_register_serializes_renames() {
    let mut config = fast_config();
    config.pipeline.int_phys_regs = RegFile::Int.logical_count() + 1;
    let program =
        ProgramBuilder::new(vec![li(1, 3), li(2, 4), add(3, 1, 2), halt()]).build();
    let mut tc = TestContext::with_config(&config, &[program]);
    let _ = tc.run();

    assert!(tc.stats().stall_rename >= 1);
    assert_eq!(tc.reg(3), 7);
    assert_eq!(tc.cpu(0).registers().free_count(RegFile::Int), 1);
}
