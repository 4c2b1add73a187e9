//! Rename and Graduation Properties.
//!
//! Random sequences of decode, completion, retirement, checkpointing and
//! flushing are applied to the active list and rename state. After every step:
//! - every physical register is either free, mapped, or held as the previous
//!   mapping of an in-flight destination (conservation);
//! - retirement is in program order;
//! - repeating a flush at the same cutoff is a no-op.

use mcsim_core::common::error::ExceptionCode;
use mcsim_core::common::reg::{INT_LOGICAL_REGS, LogicalReg, RegFile};
use mcsim_core::common::tag::Tag;
use mcsim_core::core::arch::ArchRegisters;
use mcsim_core::core::arena::Arena;
use mcsim_core::core::pipeline::{
    ActiveEntry, ActiveList, BranchQueue, DestList, DestWrite, RegisterState,
};
use proptest::prelude::*;

const PHYS: usize = 48;

#[derive(Clone, Debug)]
enum Op {
    /// Decode an instruction writing integer register `n`, or nothing.
    Decode(Option<u16>),
    /// Decode a branch that takes a checkpoint.
    Branch,
    /// Complete the `n`-th oldest in-flight instruction.
    Complete(usize),
    /// Retire up to `n` instructions.
    Retire(usize),
    /// Resolve the `n`-th oldest branch as mispredicted.
    Mispredict(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => proptest::option::of(1u16..32).prop_map(Op::Decode),
        1 => Just(Op::Branch),
        3 => (0usize..16).prop_map(Op::Complete),
        2 => (1usize..5).prop_map(Op::Retire),
        1 => (0usize..4).prop_map(Op::Mispredict),
    ]
}

struct Model {
    arena: Arena<()>,
    active: ActiveList,
    regs: RegisterState,
    arch: ArchRegisters,
    branches: BranchQueue,
    branch_tags: Vec<Tag>,
    next: u64,
    last_retired: Tag,
}

impl Model {
    fn new() -> Self {
        Self {
            arena: Arena::new(),
            active: ActiveList::new(16),
            regs: RegisterState::new(PHYS, PHYS),
            arch: ArchRegisters::default(),
            branches: BranchQueue::new(3),
            branch_tags: Vec::new(),
            next: 1,
            last_retired: Tag(0),
        }
    }

    fn decode(&mut self, dest: Option<u16>) {
        if self.active.is_full() || self.regs.free_count(RegFile::Int) == 0 {
            return;
        }
        let mut dests = DestList::default();
        if let Some(n) = dest {
            let logical = LogicalReg::int(n);
            let (new, old) = self.regs.rename(logical).unwrap();
            dests.push(DestWrite { logical, new, old }).unwrap();
        }
        let tag = Tag(self.next);
        self.next += 1;
        let h = self.arena.insert(());
        self.active.insert(ActiveEntry::new(tag, h, 0, dests)).unwrap();
    }

    fn branch(&mut self) {
        if self.active.is_full() || !self.branches.has_slot() {
            return;
        }
        let tag = Tag(self.next);
        self.decode(None);
        self.branches.push(tag, self.regs.snapshot()).unwrap();
        self.branch_tags.push(tag);
    }

    fn flush(&mut self, cutoff: Tag) {
        let _ = self.active.flush(cutoff, &mut self.regs).unwrap();
        self.branches.flush(cutoff);
        self.branch_tags.retain(|t| *t <= cutoff);
        self.next = cutoff.0 + 1;
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Decode(d) => self.decode(d),
            Op::Branch => self.branch(),
            Op::Complete(n) => {
                let picked = self.active.iter().nth(n).map(|e| e.tag);
                if let Some(tag) = picked {
                    self.active.mark_done(tag, ExceptionCode::Ok, 0).unwrap();
                }
            }
            Op::Retire(n) => {
                let retired = self
                    .active
                    .retire(n, &mut self.regs, &mut self.arch, |_| true)
                    .unwrap();
                for e in retired {
                    assert!(e.tag > self.last_retired, "retired out of order");
                    self.last_retired = e.tag;
                    let _ = self.branches.take(e.tag);
                    self.branch_tags.retain(|t| *t != e.tag);
                }
            }
            Op::Mispredict(n) => {
                let Some(&tag) = self.branch_tags.get(n) else {
                    return;
                };
                let cp = self.branches.take(tag).unwrap();
                self.branch_tags.retain(|t| *t != tag);
                self.flush(tag);
                self.regs.restore(&cp.maps);
            }
        }
    }

    fn held(&self) -> usize {
        self.active.iter().map(|e| e.dests.len()).sum()
    }
}

proptest! {
    #[test]
    fn physical_registers_are_conserved(ops in prop::collection::vec(op(), 1..200)) {
        let mut m = Model::new();
        for op in &ops {
            m.apply(op);
            prop_assert_eq!(
                m.regs.free_count(RegFile::Int) + INT_LOGICAL_REGS + m.held(),
                PHYS
            );
        }
    }

    #[test]
    fn graduation_is_fifo(ops in prop::collection::vec(op(), 1..200)) {
        let mut m = Model::new();
        for op in &ops {
            m.apply(op);
            let tags: Vec<Tag> = m.active.iter().map(|e| e.tag).collect();
            prop_assert!(tags.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(tags.first().is_none_or(|t| *t > m.last_retired));
        }
    }

    #[test]
    fn flush_is_idempotent(ops in prop::collection::vec(op(), 1..100), back in 0u64..8) {
        let mut m = Model::new();
        for op in &ops {
            m.apply(op);
        }
        let cutoff = Tag(m.next.saturating_sub(back + 1));
        m.flush(cutoff);
        let free = m.regs.free_count(RegFile::Int);
        let snapshot = m.regs.snapshot();
        let len = m.active.len();

        let removed = m.active.flush(cutoff, &mut m.regs).unwrap();
        prop_assert!(removed.is_empty());
        prop_assert_eq!(m.regs.free_count(RegFile::Int), free);
        prop_assert_eq!(m.regs.snapshot(), snapshot);
        prop_assert_eq!(m.active.len(), len);
    }
}
