//! Active list (reorder buffer).
//!
//! The active list holds one entry per decoded instruction in program order.
//! It provides:
//! 1. **Allocation:** An entry per instruction with up to two destination writes.
//! 2. **Completion:** Marks entries done, optionally with an exception.
//! 3. **In-order Retirement:** Pops done, exception-free entries from the head,
//!    committing architectural registers and freeing the previous mappings.
//! 4. **Flush:** Pops entries from the tail, undoing their renames youngest first.
//!
//! Tags in the list are contiguous, so an entry is found by its offset from the
//! head tag.

use std::collections::VecDeque;

use crate::common::error::{EngineError, ExceptionCode};
use crate::common::reg::{LogicalReg, PhysReg};
use crate::common::tag::Tag;
use crate::core::arch::ArchRegisters;
use crate::core::arena::InstHandle;
use crate::core::pipeline::rename::RegisterState;
use crate::isa::MAX_DESTS;

/// A renamed destination: the logical register and both mappings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DestWrite {
    /// Logical register written.
    pub logical: LogicalReg,
    /// Register allocated at decode.
    pub new: PhysReg,
    /// Register mapped before decode; freed at retirement.
    pub old: PhysReg,
}

/// Fixed-capacity list of destination writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DestList {
    writes: [Option<DestWrite>; MAX_DESTS],
}

impl DestList {
    /// Appends a write. Fails if the list already holds two.
    pub fn push(&mut self, write: DestWrite) -> Result<(), EngineError> {
        let slot = self
            .writes
            .iter_mut()
            .find(|w| w.is_none())
            .ok_or_else(|| EngineError::Invariant("more than two destination writes".into()))?;
        *slot = Some(write);
        Ok(())
    }

    /// Writes in decode order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DestWrite> {
        self.writes.iter().flatten()
    }

    /// Number of writes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True if the instruction writes nothing.
    pub fn is_empty(&self) -> bool {
        self.writes[0].is_none()
    }
}

/// One active-list entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveEntry {
    /// Program-order tag.
    pub tag: Tag,
    /// Arena handle of the instance.
    pub handle: InstHandle,
    /// Fetch PC.
    pub pc: u64,
    /// Destination writes.
    pub dests: DestList,
    /// Execution has finished.
    pub done: bool,
    /// Exception raised, if any.
    pub exception: ExceptionCode,
    /// Cycle the entry was marked done.
    pub completed_at: Option<u64>,
}

impl ActiveEntry {
    /// Creates a not-yet-done entry.
    pub fn new(tag: Tag, handle: InstHandle, pc: u64, dests: DestList) -> Self {
        Self {
            tag,
            handle,
            pc,
            dests,
            done: false,
            exception: ExceptionCode::Ok,
            completed_at: None,
        }
    }
}

/// The active list.
#[derive(Debug)]
pub struct ActiveList {
    entries: VecDeque<ActiveEntry>,
    capacity: usize,
}

impl ActiveList {
    /// Creates an empty list with room for `capacity` instructions.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of entries.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no instruction is in flight.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if another instruction cannot be inserted.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Free slots.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.capacity - self.entries.len()
    }

    /// Appends an entry. Returns the entry back if the list is full.
    pub fn insert(&mut self, entry: ActiveEntry) -> Result<(), ActiveEntry> {
        if self.is_full() {
            return Err(entry);
        }
        self.entries.push_back(entry);
        Ok(())
    }

    fn index_of(&self, tag: Tag) -> Option<usize> {
        let head = self.entries.front()?.tag;
        let index = tag.offset_from(head)?;
        (self.entries.get(index)?.tag == tag).then_some(index)
    }

    /// Entry for a live tag.
    pub fn get(&self, tag: Tag) -> Option<&ActiveEntry> {
        self.index_of(tag).and_then(|i| self.entries.get(i))
    }

    /// Oldest entry.
    pub fn head(&self) -> Option<&ActiveEntry> {
        self.entries.front()
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveEntry> {
        self.entries.iter()
    }

    /// Marks an instruction done. An exception already recorded is kept.
    pub fn mark_done(
        &mut self,
        tag: Tag,
        exception: ExceptionCode,
        cycle: u64,
    ) -> Result<(), EngineError> {
        let index = self.index_of(tag).ok_or(EngineError::TagNotFound(tag))?;
        let entry = &mut self.entries[index];
        entry.done = true;
        if !entry.exception.is_some() {
            entry.exception = exception;
        }
        entry.completed_at = Some(cycle);
        Ok(())
    }

    /// Clears the done flag and exception of an instruction being restarted.
    pub fn reopen(&mut self, tag: Tag) -> Result<(), EngineError> {
        let index = self.index_of(tag).ok_or(EngineError::TagNotFound(tag))?;
        let entry = &mut self.entries[index];
        entry.done = false;
        entry.exception = ExceptionCode::Ok;
        entry.completed_at = None;
        Ok(())
    }

    /// Retires up to `rate` instructions from the head.
    ///
    /// An entry retires when it is done, carries no exception and `gate`
    /// accepts it. Its destinations are committed to `arch` from the physical
    /// file and the previous mappings return to the free lists. Retired
    /// entries are returned oldest first.
    pub fn retire(
        &mut self,
        rate: usize,
        regs: &mut RegisterState,
        arch: &mut ArchRegisters,
        mut gate: impl FnMut(&ActiveEntry) -> bool,
    ) -> Result<Vec<ActiveEntry>, EngineError> {
        let mut retired = Vec::new();
        while retired.len() < rate {
            let Some(head) = self.entries.front() else {
                break;
            };
            if !head.done || head.exception.is_some() || !gate(head) {
                break;
            }
            let Some(entry) = self.entries.pop_front() else {
                break;
            };
            Self::commit(&entry, regs, arch)?;
            retired.push(entry);
        }
        Ok(retired)
    }

    /// Retires the head unconditionally. Used when a serializing instruction
    /// completes its effect.
    pub fn retire_head(
        &mut self,
        regs: &mut RegisterState,
        arch: &mut ArchRegisters,
    ) -> Result<Option<ActiveEntry>, EngineError> {
        let Some(entry) = self.entries.pop_front() else {
            return Ok(None);
        };
        Self::commit(&entry, regs, arch)?;
        Ok(Some(entry))
    }

    fn commit(
        entry: &ActiveEntry,
        regs: &mut RegisterState,
        arch: &mut ArchRegisters,
    ) -> Result<(), EngineError> {
        for w in entry.dests.iter() {
            arch.write(w.logical, regs.file(w.logical.file).phys.value(w.new));
            regs.release(w.logical.file, w.old)?;
        }
        Ok(())
    }

    /// Removes every entry with a tag greater than `cutoff`, youngest first,
    /// restoring the previous mappings and freeing the new registers.
    pub fn flush(
        &mut self,
        cutoff: Tag,
        regs: &mut RegisterState,
    ) -> Result<Vec<ActiveEntry>, EngineError> {
        let mut removed = Vec::new();
        while self.entries.back().is_some_and(|e| e.tag > cutoff) {
            let Some(entry) = self.entries.pop_back() else {
                break;
            };
            for w in entry.dests.iter().rev() {
                regs.unrename(w.logical, w.new, w.old)?;
            }
            removed.push(entry);
        }
        Ok(removed)
    }
}
