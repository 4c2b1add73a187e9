//! Functional-unit scheduler.
//!
//! Each unit type has a number of slots and a FIFO ready queue. Issuing takes
//! a slot; the slot returns `repeat` cycles later through the release event
//! queue. Completion events are owned by the processor.

use std::collections::VecDeque;

use crate::common::tag::Tag;
use crate::config::UnitConfig;
use crate::core::arena::InstHandle;
use crate::core::pipeline::events::EventQueue;
use crate::isa::UnitType;

const UNIT_TYPES: usize = UnitType::ALL.len();

/// Slots, ready queues and pending slot releases of every unit type.
#[derive(Debug)]
pub struct FunctionalUnits {
    total: [usize; UNIT_TYPES],
    free: [usize; UNIT_TYPES],
    ready: [VecDeque<(InstHandle, Tag)>; UNIT_TYPES],
    releases: EventQueue<UnitType>,
}

impl FunctionalUnits {
    /// Creates units with the configured slot counts.
    pub fn new(cfg: &UnitConfig) -> Self {
        let total = [cfg.int_alu, cfg.fpu, cfg.addr, cfg.mem_ports];
        Self {
            total,
            free: total,
            ready: Default::default(),
            releases: EventQueue::new(),
        }
    }

    /// Frees the slots whose repeat interval ends at or before `now`.
    pub fn tick(&mut self, now: u64) {
        self.releases.set_now(now);
        while let Some(unit) = self.releases.pop_due() {
            let i = unit.index();
            self.free[i] = (self.free[i] + 1).min(self.total[i]);
        }
    }

    /// Appends an instruction to a ready queue.
    pub fn enqueue(&mut self, unit: UnitType, handle: InstHandle, tag: Tag) {
        self.ready[unit.index()].push_back((handle, tag));
    }

    /// Oldest-queued instruction of a unit type.
    pub fn peek_ready(&self, unit: UnitType) -> Option<(InstHandle, Tag)> {
        self.ready[unit.index()].front().copied()
    }

    /// Removes the oldest-queued instruction of a unit type.
    pub fn pop_ready(&mut self, unit: UnitType) -> Option<(InstHandle, Tag)> {
        self.ready[unit.index()].pop_front()
    }

    /// Number of instructions waiting for a unit type.
    pub fn ready_len(&self, unit: UnitType) -> usize {
        self.ready[unit.index()].len()
    }

    /// Free slots of a unit type.
    #[inline]
    pub const fn free(&self, unit: UnitType) -> usize {
        self.free[unit.index()]
    }

    /// Takes a slot for `repeat` cycles. Returns false if none is free.
    pub fn acquire(&mut self, unit: UnitType, repeat: u64) -> bool {
        let i = unit.index();
        if self.free[i] == 0 {
            return false;
        }
        self.free[i] -= 1;
        let _ = self.releases.schedule(unit, repeat.max(1));
        true
    }

    /// Drops queued instructions younger than `cutoff`. Busy slots are kept
    /// until their repeat interval ends.
    pub fn flush(&mut self, cutoff: Tag) {
        for queue in &mut self.ready {
            queue.retain(|&(_, tag)| tag <= cutoff);
        }
    }

    /// True if no instruction waits in any ready queue.
    pub fn is_idle(&self) -> bool {
        self.ready.iter().all(VecDeque::is_empty)
    }
}
