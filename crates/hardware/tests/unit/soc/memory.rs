//! Reference Memory Tests.

use mcsim_core::common::data::{AccessType, MemWidth, RmwOp};
use mcsim_core::common::tag::Tag;
use mcsim_core::soc::FlatMemory;
use mcsim_core::soc::traits::{MemEvent, MemRequest, MemorySystem};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn req(id: u64, paddr: u64, access: AccessType, data: u64, compare: u64) -> MemRequest {
    MemRequest {
        id,
        tag: Tag(id + 1),
        paddr,
        width: MemWidth::Double,
        access,
        data,
        compare,
    }
}

#[rstest]
#[case::hit(5, 9, 9)]
#[case::miss(4, 9, 5)]
fn compare_and_swap(#[case] compare: u64, #[case] data: u64, #[case] after: u64) {
    let mut mem = FlatMemory::new(1, 1, 1, 64);
    mem.write(0x10, MemWidth::Double, 5);
    mem.submit(0, req(0, 0x10, AccessType::Rmw(RmwOp::Cas), data, compare), 0);
    assert_eq!(mem.poll(0, 1), vec![MemEvent::Reply { id: 0, value: 5 }]);
    assert_eq!(mem.read(0x10, MemWidth::Double), after);
}

#[test]
fn requests_perform_in_submission_order() {
    let mut mem = FlatMemory::new(1, 3, 3, 64);
    mem.submit(0, req(0, 0x20, AccessType::Write, 1, 0), 0);
    mem.submit(0, req(1, 0x20, AccessType::Read, 0, 0), 0);
    assert!(mem.busy(0));
    assert_eq!(
        mem.poll(0, 3),
        vec![
            MemEvent::Reply { id: 0, value: 0 },
            MemEvent::Reply { id: 1, value: 1 }
        ]
    );
    assert!(!mem.busy(0));
}

#[test]
fn writes_invalidate_only_other_processors() {
    let mut mem = FlatMemory::new(3, 1, 1, 32);
    mem.submit(1, req(0, 0x47, AccessType::Write, 2, 0), 0);
    let _ = mem.poll(1, 1);
    assert_eq!(mem.poll(0, 1), vec![MemEvent::Invalidate { line: 0x40 }]);
    assert_eq!(mem.poll(2, 1), vec![MemEvent::Invalidate { line: 0x40 }]);
    assert!(mem.poll(1, 2).is_empty());
    assert_eq!(mem.line_size(), 32);
}

#[test]
fn loaded_image_reads_little_endian() {
    let mut mem = FlatMemory::new(1, 1, 1, 64);
    mem.load(0x100, &[0x78, 0x56, 0x34, 0x12]);
    assert_eq!(mem.read(0x100, MemWidth::Word), 0x1234_5678);
    assert_eq!(mem.read(0x102, MemWidth::Half), 0x1234);
    assert_eq!(mem.read(0x104, MemWidth::Byte), 0);
}
