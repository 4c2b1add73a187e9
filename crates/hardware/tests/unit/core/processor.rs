//! Processor Tests Against Mocked Collaborators.
//!
//! Drives a single `Processor` with `mockall` doubles for the instruction
//! supply, memory system and TLB, checking what the pipeline asks of them.

use std::sync::{Arc, Mutex};

use mcsim_core::common::data::AccessType;
use mcsim_core::common::error::ExceptionCode;
use mcsim_core::common::reg::LogicalReg;
use mcsim_core::config::Config;
use mcsim_core::core::{Ports, Processor};
use mcsim_core::isa::StaticInst;
use mcsim_core::soc::traits::{FetchedInst, MemEvent, MemRequest, TlbOutcome};

use crate::common::builder::instruction::{halt, ld, nop};
use crate::common::mocks::memory::{MockMemory, MockSupply, MockTranslator};

const ENTRY: u64 = 0x1000;

/// Supply serving `code` at [`ENTRY`] and nops everywhere else.
fn supply(code: Vec<StaticInst>) -> MockSupply {
    let mut s = MockSupply::new();
    s.expect_fetch().returning(move |pc, _| {
        let index = pc.checked_sub(ENTRY).map(|o| (o / 4) as usize);
        FetchedInst {
            inst: index.and_then(|i| code.get(i).copied()).unwrap_or_else(nop),
            pc,
            exception: ExceptionCode::Ok,
        }
    });
    s
}

/// Memory that answers every read with `value` one poll after submission.
fn answering_memory(value: u64) -> (MockMemory, Arc<Mutex<Vec<MemRequest>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let pending = Arc::new(Mutex::new(Vec::<MemRequest>::new()));
    let mut m = MockMemory::new();
    m.expect_line_size().return_const(64u64);
    let (seen_w, pending_w) = (Arc::clone(&seen), Arc::clone(&pending));
    m.expect_submit().returning(move |_, req, _| {
        seen_w.lock().unwrap().push(req);
        pending_w.lock().unwrap().push(req);
    });
    m.expect_poll().returning(move |_, _| {
        pending
            .lock()
            .unwrap()
            .drain(..)
            .map(|r| MemEvent::Reply { id: r.id, value })
            .collect()
    });
    (m, seen)
}

fn run(
    cpu: &mut Processor,
    supply: &mut MockSupply,
    memory: &mut MockMemory,
    tlb: &mut MockTranslator,
    cycles: usize,
) {
    let mut ports = Ports {
        supply,
        memory,
        translator: tlb,
    };
    for _ in 0..cycles {
        cpu.cycle(&mut ports).unwrap();
    }
}

#[test]
fn data_tlb_miss_traps_without_touching_memory() {
    let mut cpu = Processor::new(0, &Config::default(), ENTRY);
    let mut s = supply(vec![ld(1, 0, 0x40)]);
    let mut m = MockMemory::new();
    m.expect_line_size().return_const(64u64);
    m.expect_poll().returning(|_, _| Vec::new());
    m.expect_submit().never();
    let mut tlb = MockTranslator::new();
    tlb.expect_lookup()
        .withf(|req| req.vaddr == 0x40 && !req.is_write)
        .times(1)
        .return_const(TlbOutcome::Miss);

    run(&mut cpu, &mut s, &mut m, &mut tlb, 20);

    assert_eq!(cpu.stats().traps, 1);
    assert_eq!(cpu.trap_level(), 1);
    assert!(cpu.pstate().privileged);
    assert!(!cpu.pstate().interrupts_enabled);
}

#[test]
fn load_uses_translated_address_and_commits_reply() {
    let mut cpu = Processor::new(0, &Config::default(), ENTRY);
    let mut s = supply(vec![ld(3, 0, 0x48), halt()]);
    let (mut m, seen) = answering_memory(0x1234);
    let mut tlb = MockTranslator::new();
    tlb.expect_lookup()
        .returning(|req| TlbOutcome::Hit(req.vaddr + 0x10_0000));

    run(&mut cpu, &mut s, &mut m, &mut tlb, 30);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].paddr, 0x10_0048);
    assert_eq!(seen[0].access, AccessType::Read);
    assert!(cpu.is_halted());
    assert_eq!(cpu.arch_reg(LogicalReg::int(3)), 0x1234);
    assert_eq!(cpu.stats().loads, 1);
}

#[test]
fn halted_processor_stops_cycling() {
    let mut cpu = Processor::new(0, &Config::default(), ENTRY);
    let mut s = supply(vec![halt()]);
    let (mut m, _) = answering_memory(0);
    let mut tlb = MockTranslator::new();

    run(&mut cpu, &mut s, &mut m, &mut tlb, 10);
    let cycles = cpu.cycle;
    assert!(cpu.is_halted());
    assert!(cpu.is_drained());

    run(&mut cpu, &mut s, &mut m, &mut tlb, 10);
    assert_eq!(cpu.cycle, cycles);
    assert_eq!(cpu.stats().graduated, 1);
}
