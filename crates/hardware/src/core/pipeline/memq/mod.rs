//! Memory disambiguation engine.
//!
//! The memory queue holds every in-flight load, store and atomic in tag order,
//! plus the barrier queue. It decides when each reference may issue to the
//! memory system and when its result may be released:
//! 1. **Address Resolution:** A resolving store re-validates younger loads that
//!    speculated past it, killing those that overlap.
//! 2. **Forwarding:** Exact-match, width-compatible stores feed younger loads;
//!    other overlaps make the load wait.
//! 3. **Consistency:** Loads hold their value while speculative with respect to
//!    the configured model; stores become ready to retire once ordered.
//! 4. **Store Drain:** Graduated stores issue in program order.
//! 5. **Atomics:** Read-modify-writes issue only at the head with nothing older pending.

/// Barrier queue.
pub mod barrier;

/// Queue entries and progress states.
pub mod entry;

/// Forwarding scan.
pub mod forward;

use std::collections::VecDeque;

use tracing::trace;

use crate::common::data::{AccessType, overlaps};
use crate::common::error::{EngineError, ExceptionCode};
use crate::common::tag::Tag;
use crate::config::{AliasRecovery, ConsistencyModel, MemoryConfig};
use crate::core::arena::InstHandle;
use crate::isa::BarrierMask;
use crate::soc::traits::MemRequest;
use crate::stats::PipelineStats;

pub use barrier::{BarrierQueue, BarrierRecord};
pub use entry::{Finalized, LimboKill, MemEntry, MemKind, MemProgress, Restart};
pub use forward::{ForwardResult, forward_value, scan};

/// Outcome of a memory-system reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A load or atomic value was bound.
    Bound(Tag),
    /// A store performed and left the queue.
    StoreDone(Tag),
    /// A load killed while outstanding was reset.
    Restarted(LimboKill),
}

/// The memory queue.
#[derive(Debug)]
pub struct MemoryQueue {
    entries: VecDeque<MemEntry>,
    capacity: usize,
    model: ConsistencyModel,
    speculative_loads: bool,
    speculative_disambiguation: bool,
    alias_recovery: AliasRecovery,
    barriers: BarrierQueue,
    next_request: u64,
    stores_in_flight: usize,
}

impl MemoryQueue {
    /// Creates an empty queue.
    pub fn new(cfg: &MemoryConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(cfg.queue_size),
            capacity: cfg.queue_size,
            model: cfg.model,
            speculative_loads: cfg.speculative_loads,
            speculative_disambiguation: cfg.speculative_disambiguation,
            alias_recovery: cfg.alias_recovery,
            barriers: BarrierQueue::default(),
            next_request: 0,
            stores_in_flight: 0,
        }
    }

    /// Consistency model in force.
    #[inline]
    pub const fn model(&self) -> ConsistencyModel {
        self.model
    }

    /// True if another reference can be inserted.
    #[inline]
    pub fn has_slot(&self) -> bool {
        self.entries.len() < self.capacity
    }

    /// Free slots.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.capacity - self.entries.len()
    }

    /// Number of queued references.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no reference and no barrier is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.barriers.is_empty()
    }

    /// Queued references, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MemEntry> {
        self.entries.iter()
    }

    /// Queued barriers.
    pub const fn barriers(&self) -> &BarrierQueue {
        &self.barriers
    }

    fn position(&self, tag: Tag) -> Option<usize> {
        self.entries.binary_search_by_key(&tag, |e| e.tag).ok()
    }

    /// Entry of a queued reference.
    pub fn get(&self, tag: Tag) -> Option<&MemEntry> {
        self.position(tag).map(|i| &self.entries[i])
    }

    fn entry_mut(&mut self, tag: Tag) -> Result<&mut MemEntry, EngineError> {
        let i = self
            .position(tag)
            .ok_or_else(|| EngineError::Invariant(format!("{tag} not in the memory queue")))?;
        Ok(&mut self.entries[i])
    }

    /// Appends a reference decoded in program order.
    pub fn insert(&mut self, entry: MemEntry) -> Result<(), EngineError> {
        if !self.has_slot() {
            return Err(EngineError::Invariant(format!(
                "{} inserted into a full memory queue",
                entry.tag
            )));
        }
        if self.entries.back().is_some_and(|e| e.tag >= entry.tag) {
            return Err(EngineError::Invariant(format!("{} out of order", entry.tag)));
        }
        self.entries.push_back(entry);
        Ok(())
    }

    /// Appends a barrier.
    pub fn insert_barrier(&mut self, tag: Tag, handle: InstHandle, mask: BarrierMask) {
        self.barriers.insert(tag, handle, mask);
    }

    /// Records store, swap or compare data.
    pub fn set_data(&mut self, tag: Tag, data: u64, compare: u64) -> Result<(), EngineError> {
        let e = self.entry_mut(tag)?;
        e.data = data;
        e.compare = compare;
        e.data_ready = true;
        Ok(())
    }

    /// Marks a reference whose address faulted. It never issues.
    pub fn set_exception(&mut self, tag: Tag) -> Result<(), EngineError> {
        self.entry_mut(tag)?.excepted = true;
        Ok(())
    }

    /// Records a translated address.
    ///
    /// For a write, every younger load that counted it as unresolved drops it
    /// from its limbo set; an overlapping load with a bound or outstanding
    /// value is killed. Kills applied immediately are returned; a kill of an
    /// outstanding load is applied when its reply arrives.
    pub fn resolve_address(
        &mut self,
        tag: Tag,
        vaddr: u64,
        paddr: u64,
        stats: &mut PipelineStats,
    ) -> Result<Vec<LimboKill>, EngineError> {
        let index = self
            .position(tag)
            .ok_or_else(|| EngineError::Invariant(format!("{tag} not in the memory queue")))?;
        let (kind, width) = {
            let e = &mut self.entries[index];
            e.vaddr = vaddr;
            e.paddr = paddr;
            e.addr_ready = true;
            (e.kind, e.width)
        };
        if !kind.writes() {
            return Ok(Vec::new());
        }
        let restart = match self.alias_recovery {
            AliasRecovery::Reexecute => Restart::Reissue,
            AliasRecovery::SoftException => Restart::Retranslate(ExceptionCode::SoftLimbo),
        };
        let mut kills = Vec::new();
        for load in self.entries.range_mut(index + 1..) {
            let Some(pos) = load.limbo.iter().position(|&t| t == tag) else {
                continue;
            };
            let _ = load.limbo.swap_remove(pos);
            if !overlaps(paddr, width, load.paddr, load.width) {
                continue;
            }
            if matches!(load.progress, MemProgress::Forwarded(from) if from > tag) {
                continue;
            }
            stats.limbo_kills += 1;
            trace!("UP {} kills load {} at {:#x}", tag, load.tag, load.paddr);
            if load.outstanding.is_some() {
                load.killed = Some(restart);
            } else {
                load.reset(restart);
                kills.push(LimboKill {
                    tag: load.tag,
                    handle: load.handle,
                    restart,
                });
            }
        }
        for k in &kills {
            Self::count_restart(k.restart, stats);
        }
        Ok(kills)
    }

    const fn count_restart(restart: Restart, stats: &mut PipelineStats) {
        match restart {
            Restart::Reissue => stats.reexecutions += 1,
            Restart::Retranslate(_) => stats.soft_exceptions += 1,
        }
    }

    fn is_speculative(&self, index: usize) -> bool {
        let mut older = self.entries.range(..index);
        match self.model {
            ConsistencyModel::Sequential => older.any(|e| !e.is_performed()),
            ConsistencyModel::Processor => older.any(|e| e.kind.reads() && !e.is_performed()),
            ConsistencyModel::Release => false,
        }
    }

    fn request(&mut self, index: usize, access: AccessType) -> MemRequest {
        let id = self.next_request;
        self.next_request += 1;
        let e = &mut self.entries[index];
        e.progress = MemProgress::Issued;
        e.outstanding = Some(id);
        MemRequest {
            id,
            tag: e.tag,
            paddr: e.paddr,
            width: e.width,
            access,
            data: e.data,
            compare: e.compare,
        }
    }

    /// Selects references to send to memory this cycle, using at most `ports`
    /// requests. `head` is the tag at the head of the active list.
    ///
    /// Graduated stores go first, in program order. An atomic issues when it
    /// is the head instruction and the oldest queued reference. Loads issue in
    /// program order of readiness; a forwarded load takes no port.
    pub fn issue(&mut self, head: Option<Tag>, ports: usize, stats: &mut PipelineStats) -> Vec<MemRequest> {
        let mut out = Vec::new();
        self.issue_stores(ports, &mut out);
        self.issue_atomic(head, ports, &mut out);
        self.issue_loads(ports, &mut out, stats);
        out
    }

    fn issue_stores(&mut self, ports: usize, out: &mut Vec<MemRequest>) {
        let mut index = 0;
        while index < self.entries.len() && out.len() < ports {
            let e = &self.entries[index];
            index += 1;
            if !e.kind.is_store() || e.has_issued() {
                continue;
            }
            if !e.graduated || e.excepted {
                break;
            }
            if self.model != ConsistencyModel::Release && self.stores_in_flight > 0 {
                break;
            }
            self.stores_in_flight += 1;
            let req = self.request(index - 1, AccessType::Write);
            trace!("IS store {} -> {:#x}", req.tag, req.paddr);
            out.push(req);
        }
    }

    fn issue_atomic(&mut self, head: Option<Tag>, ports: usize, out: &mut Vec<MemRequest>) {
        let Some(e) = self.entries.front() else {
            return;
        };
        let MemKind::Rmw(op) = e.kind else {
            return;
        };
        if out.len() >= ports
            || Some(e.tag) != head
            || e.has_issued()
            || e.excepted
            || !e.addr_ready
            || !e.data_ready
        {
            return;
        }
        let req = self.request(0, AccessType::Rmw(op));
        trace!("IS atomic {} -> {:#x}", req.tag, req.paddr);
        out.push(req);
    }

    fn issue_loads(&mut self, ports: usize, out: &mut Vec<MemRequest>, stats: &mut PipelineStats) {
        for index in 0..self.entries.len() {
            let e = &self.entries[index];
            if !e.kind.is_load() || e.has_issued() || !e.addr_ready || e.excepted {
                continue;
            }
            if let Some(store) = e.partial_wait {
                if self.position(store).is_some() {
                    continue;
                }
                self.entries[index].partial_wait = None;
            }
            let tag = self.entries[index].tag;
            if self.barriers.blocks_load(tag) {
                continue;
            }
            if !self.speculative_loads && self.is_speculative(index) {
                continue;
            }
            let result = scan(
                &self.entries[index],
                self.entries.range(..index),
                self.speculative_disambiguation,
            );
            match result {
                ForwardResult::Hit { value, from, limbo } => {
                    let e = &mut self.entries[index];
                    e.progress = MemProgress::Forwarded(from);
                    e.value = Some(value);
                    e.limbo = limbo;
                    stats.forwards += 1;
                    trace!("IS load {} forwarded from {}", tag, from);
                }
                ForwardResult::Miss { limbo } => {
                    if out.len() >= ports {
                        continue;
                    }
                    self.entries[index].limbo = limbo;
                    let req = self.request(index, AccessType::Read);
                    trace!("IS load {} -> {:#x}", tag, req.paddr);
                    out.push(req);
                }
                ForwardResult::Wait => {}
                ForwardResult::Partial(store) => {
                    let e = &mut self.entries[index];
                    if e.partial_wait != Some(store) {
                        e.partial_wait = Some(store);
                        stats.partial_overlaps += 1;
                        trace!("IS load {} waits on partial overlap with {}", tag, store);
                    }
                }
            }
        }
    }

    /// Applies a memory-system reply. Replies for flushed references are ignored.
    pub fn complete(&mut self, id: u64, value: u64, stats: &mut PipelineStats) -> Option<ReplyOutcome> {
        let index = self.entries.iter().position(|e| e.outstanding == Some(id))?;
        let e = &mut self.entries[index];
        e.outstanding = None;
        match e.kind {
            MemKind::Load => {
                if let Some(restart) = e.killed.take() {
                    e.reset(restart);
                    let kill = LimboKill {
                        tag: e.tag,
                        handle: e.handle,
                        restart,
                    };
                    Self::count_restart(restart, stats);
                    return Some(ReplyOutcome::Restarted(kill));
                }
                e.value = Some(e.width.extend(value & e.width.mask(), e.signed));
                e.progress = MemProgress::Completed;
                Some(ReplyOutcome::Bound(e.tag))
            }
            MemKind::Rmw(_) => {
                e.value = Some(value & e.width.mask());
                e.progress = MemProgress::Completed;
                Some(ReplyOutcome::Bound(e.tag))
            }
            MemKind::Store => {
                let tag = e.tag;
                let _ = self.entries.remove(index);
                self.stores_in_flight = self.stores_in_flight.saturating_sub(1);
                Some(ReplyOutcome::StoreDone(tag))
            }
        }
    }

    /// Restarts held loads from a line written by another processor.
    pub fn invalidate(&mut self, line: u64, line_size: u64, stats: &mut PipelineStats) -> Vec<LimboKill> {
        let restart = Restart::Retranslate(ExceptionCode::SoftCoherence);
        let mut kills = Vec::new();
        for e in &mut self.entries {
            if !e.kind.is_load() || e.finalized || e.value.is_none() {
                continue;
            }
            if e.paddr - e.paddr.checked_rem(line_size).unwrap_or(0) != line {
                continue;
            }
            e.reset(restart);
            stats.coherence_restarts += 1;
            stats.soft_exceptions += 1;
            kills.push(LimboKill {
                tag: e.tag,
                handle: e.handle,
                restart,
            });
        }
        kills
    }

    /// Releases load and atomic values that are no longer provisional.
    ///
    /// A load value is released once its limbo set is empty and it is not
    /// speculative under the consistency model. Atomics release as soon as
    /// they complete.
    pub fn finalize(&mut self) -> Vec<Finalized> {
        let mut out = Vec::new();
        for index in 0..self.entries.len() {
            let e = &self.entries[index];
            if !e.kind.reads() || e.finalized || e.excepted || !e.limbo.is_empty() {
                continue;
            }
            let Some(value) = e.value else {
                continue;
            };
            if e.kind.is_load() && self.is_speculative(index) {
                continue;
            }
            let e = &mut self.entries[index];
            e.finalized = true;
            out.push(Finalized {
                tag: e.tag,
                handle: e.handle,
                value,
            });
        }
        out
    }

    /// Marks stores that may graduate and returns them.
    ///
    /// A store needs its address and data and no blocking barrier. Under
    /// sequential and processor consistency every older load and atomic must
    /// also have issued and every older store must already be ready.
    pub fn mark_ready_stores(&mut self) -> Vec<(Tag, InstHandle)> {
        let mut out = Vec::new();
        for index in 0..self.entries.len() {
            let e = &self.entries[index];
            if !e.kind.is_store() || e.ready_to_retire || e.excepted || !e.addr_ready || !e.data_ready {
                continue;
            }
            if self.barriers.blocks_store(e.tag) {
                continue;
            }
            let ordered = self.model == ConsistencyModel::Release
                || self.entries.range(..index).all(|o| match o.kind {
                    MemKind::Store => o.ready_to_retire,
                    MemKind::Load | MemKind::Rmw(_) => o.has_issued(),
                });
            if !ordered {
                continue;
            }
            let e = &mut self.entries[index];
            e.ready_to_retire = true;
            out.push((e.tag, e.handle));
        }
        out
    }

    /// Marks barriers whose before side has performed.
    pub fn mark_barriers(&mut self) -> Vec<(Tag, InstHandle)> {
        self.barriers.mark_done(self.entries.iter())
    }

    /// True if the reference `tag` may leave the active list.
    pub fn can_graduate(&self, tag: Tag) -> bool {
        self.get(tag).is_none_or(|e| match e.kind {
            MemKind::Store => e.ready_to_retire,
            MemKind::Load | MemKind::Rmw(_) => e.finalized,
        })
    }

    /// Records graduation. Stores stay queued until they perform; loads and
    /// atomics leave the queue.
    pub fn graduate(&mut self, tag: Tag) {
        let Some(index) = self.position(tag) else {
            return;
        };
        if self.entries[index].kind.is_store() {
            self.entries[index].graduated = true;
        } else {
            let _ = self.entries.remove(index);
        }
    }

    /// Removes a graduating barrier.
    pub fn graduate_barrier(&mut self, tag: Tag) {
        let _ = self.barriers.remove(tag);
    }

    /// True if every store older than `tag` has at least issued.
    pub fn older_stores_issued(&self, tag: Tag) -> bool {
        !self
            .entries
            .iter()
            .take_while(|e| e.tag < tag)
            .any(|e| e.kind.is_store() && !e.has_issued())
    }

    /// True if `tag` is an atomic sent to memory that has not yet performed.
    pub fn atomic_in_flight(&self, tag: Tag) -> bool {
        self.atomic_issued(tag) && self.get(tag).is_some_and(|e| !e.is_performed())
    }

    /// True if `tag` is an atomic already sent to memory.
    ///
    /// Memory applies such a reference exactly once, so it must graduate
    /// rather than be flushed and replayed.
    pub fn atomic_issued(&self, tag: Tag) -> bool {
        self.entries
            .iter()
            .find(|e| e.tag == tag)
            .is_some_and(|e| matches!(e.kind, MemKind::Rmw(_)) && e.has_issued())
    }

    /// True if no reference older than `tag` is still queued.
    pub fn drained_before(&self, tag: Tag) -> bool {
        self.entries.front().is_none_or(|e| e.tag > tag)
    }

    /// Removes references and barriers younger than `cutoff`.
    ///
    /// Returns the removed entries, marked flushed, youngest first.
    pub fn flush(&mut self, cutoff: Tag) -> Vec<MemEntry> {
        let mut removed = Vec::new();
        while self.entries.back().is_some_and(|e| e.tag > cutoff) {
            if let Some(mut e) = self.entries.pop_back() {
                e.progress = MemProgress::Flushed;
                removed.push(e);
            }
        }
        self.barriers.flush(cutoff);
        removed
    }
}
