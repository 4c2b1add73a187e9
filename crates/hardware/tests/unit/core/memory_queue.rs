//! Memory Queue Tests.
//!
//! Exercises the disambiguation engine directly: speculation under each
//! consistency model, store forwarding, partial overlaps, store readiness,
//! barriers, atomics and coherence restarts.

use mcsim_core::common::data::{AccessType, MemWidth, RmwOp};
use mcsim_core::common::error::ExceptionCode;
use mcsim_core::common::tag::Tag;
use mcsim_core::config::{ConsistencyModel, MemoryConfig};
use mcsim_core::core::arena::Arena;
use mcsim_core::core::pipeline::memq::{MemEntry, MemKind, MemoryQueue, ReplyOutcome, Restart};
use mcsim_core::soc::traits::MemRequest;
use mcsim_core::isa::{BarrierKind, BarrierMask};
use mcsim_core::stats::PipelineStats;
use pretty_assertions::assert_eq;
use rstest::rstest;

struct Fixture {
    arena: Arena<()>,
    q: MemoryQueue,
    stats: PipelineStats,
}

impl Fixture {
    fn new(model: ConsistencyModel) -> Self {
        Self {
            arena: Arena::new(),
            q: MemoryQueue::new(&MemoryConfig {
                model,
                ..MemoryConfig::default()
            }),
            stats: PipelineStats::default(),
        }
    }

    fn push(&mut self, tag: u64, kind: MemKind, width: MemWidth) {
        let h = self.arena.insert(());
        self.q.insert(MemEntry::new(Tag(tag), h, kind, width, false)).unwrap();
    }

    fn load(&mut self, tag: u64, addr: u64) {
        self.push(tag, MemKind::Load, MemWidth::Double);
        self.resolve(tag, addr);
    }

    fn store(&mut self, tag: u64, addr: u64, data: u64) {
        self.push(tag, MemKind::Store, MemWidth::Double);
        self.resolve(tag, addr);
        self.q.set_data(Tag(tag), data, 0).unwrap();
    }

    fn resolve(&mut self, tag: u64, addr: u64) {
        let _ = self.q.resolve_address(Tag(tag), addr, addr, &mut self.stats).unwrap();
    }

    fn issue(&mut self, head: u64) -> Vec<MemRequest> {
        self.q.issue(Some(Tag(head)), 4, &mut self.stats)
    }

    fn finalized(&mut self) -> Vec<Tag> {
        self.q.finalize().iter().map(|f| f.tag).collect()
    }
}

#[rstest]
#[case::sequential(ConsistencyModel::Sequential, vec![])]
#[case::processor(ConsistencyModel::Processor, vec![])]
#[case::release(ConsistencyModel::Release, vec![Tag(2)])]
fn load_behind_unperformed_load(#[case] model: ConsistencyModel, #[case] early: Vec<Tag>) {
    let mut f = Fixture::new(model);
    f.load(1, 0x100);
    f.load(2, 0x200);
    let reqs = f.issue(1);
    assert_eq!(reqs.len(), 2);

    assert_eq!(f.q.complete(reqs[1].id, 7, &mut f.stats), Some(ReplyOutcome::Bound(Tag(2))));
    assert_eq!(f.finalized(), early);

    let _ = f.q.complete(reqs[0].id, 3, &mut f.stats);
    let rest = f.finalized();
    assert_eq!(rest.len() + early.len(), 2);
}

#[rstest]
#[case::sequential(ConsistencyModel::Sequential, false)]
#[case::processor(ConsistencyModel::Processor, true)]
#[case::release(ConsistencyModel::Release, true)]
fn load_behind_unperformed_store(#[case] model: ConsistencyModel, #[case] released: bool) {
    let mut f = Fixture::new(model);
    f.store(1, 0x300, 5);
    f.load(2, 0x200);
    let reqs = f.issue(1);
    assert_eq!(reqs.len(), 1, "ungraduated store must not issue");
    assert_eq!(reqs[0].access, AccessType::Read);
    let _ = f.q.complete(reqs[0].id, 9, &mut f.stats);
    assert_eq!(f.finalized() == vec![Tag(2)], released);
}

#[rstest]
#[case::sequential(ConsistencyModel::Sequential, false)]
#[case::processor(ConsistencyModel::Processor, false)]
#[case::release(ConsistencyModel::Release, true)]
fn store_readiness_waits_for_older_load_issue(#[case] model: ConsistencyModel, #[case] ready: bool) {
    let mut f = Fixture::new(model);
    f.push(1, MemKind::Load, MemWidth::Double);
    f.store(2, 0x300, 5);
    assert_eq!(!f.q.mark_ready_stores().is_empty(), ready);
    assert_eq!(f.q.can_graduate(Tag(2)), ready);

    f.resolve(1, 0x100);
    let _ = f.issue(1);
    assert!(f.q.can_graduate(Tag(2)) || !f.q.mark_ready_stores().is_empty());
}

#[test]
fn store_forwards_whole_and_half_values() {
    let mut f = Fixture::new(ConsistencyModel::Release);
    f.store(1, 0x80, 0x1111_2222_3333_4444);
    f.load(2, 0x80);
    f.push(3, MemKind::Load, MemWidth::Word);
    f.resolve(3, 0x84);

    assert!(f.issue(1).is_empty(), "forwarded loads take no port");
    assert_eq!(f.stats.forwards, 2);
    let values: Vec<u64> = f.q.finalize().iter().map(|v| v.value).collect();
    assert_eq!(values, vec![0x1111_2222_3333_4444, 0x1111_2222]);
}

#[test]
fn partial_overlap_waits_for_store_to_leave() {
    let mut f = Fixture::new(ConsistencyModel::Release);
    f.push(1, MemKind::Store, MemWidth::Word);
    f.resolve(1, 0x80);
    f.q.set_data(Tag(1), 0xAA, 0).unwrap();
    f.load(2, 0x80);

    assert!(f.issue(1).is_empty());
    assert!(f.issue(1).is_empty());
    assert_eq!(f.stats.partial_overlaps, 1);

    assert_eq!(f.q.mark_ready_stores().len(), 1);
    f.q.graduate(Tag(1));
    let reqs = f.issue(2);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].access, AccessType::Write);
    assert_eq!(f.q.complete(reqs[0].id, 0, &mut f.stats), Some(ReplyOutcome::StoreDone(Tag(1))));

    let reqs = f.issue(2);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].tag, Tag(2));
}

#[test]
fn unresolved_store_puts_load_in_limbo() {
    let mut f = Fixture::new(ConsistencyModel::Release);
    f.push(1, MemKind::Store, MemWidth::Double);
    f.load(2, 0x40);
    let reqs = f.issue(1);
    let _ = f.q.complete(reqs[0].id, 1, &mut f.stats);
    assert_eq!(f.q.get(Tag(2)).unwrap().limbo, vec![Tag(1)]);
    assert!(f.finalized().is_empty());

    let kills = f.q.resolve_address(Tag(1), 0x40, 0x40, &mut f.stats).unwrap();
    assert_eq!(kills.len(), 1);
    assert_eq!(kills[0].restart, Restart::Reissue);
    assert_eq!(f.stats.reexecutions, 1);
    let again = f.issue(1);
    assert_eq!(again.len(), 0, "store data not ready yet, so the load waits");
    f.q.set_data(Tag(1), 42, 0).unwrap();
    assert!(f.issue(1).is_empty());
    assert_eq!(f.q.finalize().first().map(|v| v.value), Some(42));
}

#[test]
fn store_load_barrier_blocks_younger_loads() {
    let mut f = Fixture::new(ConsistencyModel::Release);
    let h = f.arena.insert(());
    f.q.insert_barrier(Tag(1), h, BarrierMask::of(&[BarrierKind::StoreLoad]));
    f.load(2, 0x40);
    assert!(f.issue(1).is_empty());
    assert_eq!(f.q.mark_barriers().len(), 1);

    f.q.graduate_barrier(Tag(1));
    assert_eq!(f.issue(2).len(), 1);
}

#[test]
fn atomic_issues_only_at_head() {
    let mut f = Fixture::new(ConsistencyModel::Sequential);
    f.push(1, MemKind::Rmw(RmwOp::Ldstub), MemWidth::Byte);
    f.resolve(1, 0x10);
    assert!(f.q.issue(None, 4, &mut f.stats).is_empty());
    let reqs = f.issue(1);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].access, AccessType::Rmw(RmwOp::Ldstub));
    let _ = f.q.complete(reqs[0].id, 0x1FF, &mut f.stats);
    assert_eq!(f.q.finalize().first().map(|v| v.value), Some(0xFF));
}

#[test]
fn remote_write_restarts_held_load() {
    let mut f = Fixture::new(ConsistencyModel::Sequential);
    f.load(1, 0x1000);
    f.load(2, 0x2008);
    let reqs = f.issue(1);
    let _ = f.q.complete(reqs[1].id, 4, &mut f.stats);

    assert!(f.q.invalidate(0x3000, 64, &mut f.stats).is_empty());
    let kills = f.q.invalidate(0x2000, 64, &mut f.stats);
    assert_eq!(kills.len(), 1);
    assert_eq!(kills[0].tag, Tag(2));
    assert_eq!(kills[0].restart, Restart::Retranslate(ExceptionCode::SoftCoherence));
    assert_eq!(f.stats.coherence_restarts, 1);
    assert!(!f.q.get(Tag(2)).unwrap().addr_ready);
}

#[test]
fn atomic_counts_as_issued_until_it_graduates() {
    let mut f = Fixture::new(ConsistencyModel::Sequential);
    f.push(1, MemKind::Rmw(RmwOp::Ldstub), MemWidth::Byte);
    f.resolve(1, 0x10);
    assert!(!f.q.atomic_issued(Tag(1)));
    let reqs = f.issue(1);
    assert!(f.q.atomic_issued(Tag(1)));
    assert!(f.q.atomic_in_flight(Tag(1)));
    let _ = f.q.complete(reqs[0].id, 0, &mut f.stats);
    assert_eq!(f.finalized(), vec![Tag(1)]);
    assert!(f.q.atomic_issued(Tag(1)));
    assert!(!f.q.atomic_in_flight(Tag(1)));
    f.q.graduate(Tag(1));
    assert!(!f.q.atomic_issued(Tag(1)));
}

#[test]
fn issued_load_is_not_an_issued_atomic() {
    let mut f = Fixture::new(ConsistencyModel::Sequential);
    f.load(1, 0x100);
    let _ = f.issue(1);
    assert!(!f.q.atomic_issued(Tag(1)));
}

#[test]
fn zero_line_size_matches_exact_address() {
    let mut f = Fixture::new(ConsistencyModel::Sequential);
    f.store(1, 0x500, 1);
    f.load(2, 0x2008);
    let reqs = f.issue(1);
    let _ = f.q.complete(reqs[0].id, 4, &mut f.stats);

    assert!(f.q.invalidate(0x2000, 0, &mut f.stats).is_empty());
    assert_eq!(f.q.invalidate(0x2008, 0, &mut f.stats).len(), 1);
}
