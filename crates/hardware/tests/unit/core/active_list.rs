//! Active List Tests.
//!
//! Verifies in-order retirement, exception blocking at the head, and flush
//! restoration of rename state.

use mcsim_core::common::error::ExceptionCode;
use mcsim_core::common::reg::{LogicalReg, RegFile};
use mcsim_core::common::tag::Tag;
use mcsim_core::core::arch::ArchRegisters;
use mcsim_core::core::arena::Arena;
use mcsim_core::core::pipeline::{ActiveEntry, ActiveList, DestList, DestWrite, RegisterState};
use pretty_assertions::assert_eq;

struct Fixture {
    arena: Arena<()>,
    active: ActiveList,
    regs: RegisterState,
    arch: ArchRegisters,
}

impl Fixture {
    fn new(capacity: usize) -> Self {
        Self {
            arena: Arena::new(),
            active: ActiveList::new(capacity),
            regs: RegisterState::new(48, 48),
            arch: ArchRegisters::default(),
        }
    }

    fn push(&mut self, tag: u64, dest: Option<LogicalReg>) {
        let mut dests = DestList::default();
        if let Some(logical) = dest {
            let (new, old) = self.regs.rename(logical).unwrap();
            dests.push(DestWrite { logical, new, old }).unwrap();
        }
        let handle = self.arena.insert(());
        self.active
            .insert(ActiveEntry::new(Tag(tag), handle, 0x1000 + 4 * tag, dests))
            .unwrap();
    }

    fn retire_all(&mut self) -> Vec<Tag> {
        self.active
            .retire(8, &mut self.regs, &mut self.arch, |_| true)
            .unwrap()
            .iter()
            .map(|e| e.tag)
            .collect()
    }
}

#[test]
fn insert_fails_when_full() {
    let mut f = Fixture::new(2);
    f.push(1, None);
    f.push(2, None);
    assert!(f.active.is_full());
    let h = f.arena.insert(());
    assert!(f.active.insert(ActiveEntry::new(Tag(3), h, 0, DestList::default())).is_err());
}

#[test]
fn exception_at_head_blocks_retirement() {
    let mut f = Fixture::new(4);
    f.push(1, Some(LogicalReg::int(3)));
    f.push(2, None);
    f.active.mark_done(Tag(1), ExceptionCode::DivideByZero, 5).unwrap();
    f.active.mark_done(Tag(2), ExceptionCode::Ok, 5).unwrap();
    assert!(f.retire_all().is_empty());
    assert_eq!(f.active.head().map(|e| e.exception), Some(ExceptionCode::DivideByZero));
}

#[test]
fn first_exception_is_kept() {
    let mut f = Fixture::new(4);
    f.push(1, None);
    f.active.mark_done(Tag(1), ExceptionCode::Alignment, 1).unwrap();
    f.active.mark_done(Tag(1), ExceptionCode::DataTlbMiss, 2).unwrap();
    assert_eq!(f.active.get(Tag(1)).map(|e| e.exception), Some(ExceptionCode::Alignment));

    f.active.reopen(Tag(1)).unwrap();
    let entry = f.active.get(Tag(1)).unwrap();
    assert!(!entry.done);
    assert_eq!(entry.exception, ExceptionCode::Ok);
}

#[test]
fn gate_holds_back_retirement() {
    let mut f = Fixture::new(4);
    for t in 1..=3 {
        f.push(t, None);
        f.active.mark_done(Tag(t), ExceptionCode::Ok, 1).unwrap();
    }
    let retired = f
        .active
        .retire(8, &mut f.regs, &mut f.arch, |e| e.tag != Tag(2))
        .unwrap();
    assert_eq!(retired.len(), 1);
    assert_eq!(f.active.head().map(|e| e.tag), Some(Tag(2)));
}

#[test]
fn retire_commits_destination_and_frees_previous_mapping() {
    let mut f = Fixture::new(4);
    let r5 = LogicalReg::int(5);
    let before = f.regs.free_count(RegFile::Int);
    let old = f.regs.lookup(r5);
    f.push(1, Some(r5));
    let new = f.regs.lookup(r5);
    f.regs.file_mut(RegFile::Int).phys.write(new, 77);
    f.active.mark_done(Tag(1), ExceptionCode::Ok, 2).unwrap();

    assert_eq!(f.retire_all(), vec![Tag(1)]);
    assert_eq!(f.arch.read(r5), 77);
    assert_eq!(f.regs.free_count(RegFile::Int), before);
    assert!(f.regs.file(RegFile::Int).free.contains(old));
}

#[test]
fn flush_restores_rename_map_youngest_first() {
    let mut f = Fixture::new(8);
    let r1 = LogicalReg::int(1);
    let original = f.regs.lookup(r1);
    let free = f.regs.free_count(RegFile::Int);
    f.push(1, None);
    f.push(2, Some(r1));
    f.push(3, Some(r1));

    let removed = f.active.flush(Tag(1), &mut f.regs).unwrap();
    assert_eq!(removed.iter().map(|e| e.tag).collect::<Vec<_>>(), vec![Tag(3), Tag(2)]);
    assert_eq!(f.regs.lookup(r1), original);
    assert_eq!(f.regs.free_count(RegFile::Int), free);
    assert_eq!(f.active.len(), 1);
}
