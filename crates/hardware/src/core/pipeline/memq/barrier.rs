//! Memory barriers.
//!
//! Barriers sit in their own queue in tag order. A barrier is done once every
//! older reference on its "before" side has performed. Until it graduates it
//! keeps younger references on its "after" side from issuing.

use std::collections::VecDeque;

use crate::common::tag::Tag;
use crate::core::arena::InstHandle;
use crate::isa::BarrierMask;

use super::entry::MemEntry;

/// A decoded barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierRecord {
    /// Barrier tag.
    pub tag: Tag,
    /// Barrier instance.
    pub handle: InstHandle,
    /// Ordering relations.
    pub mask: BarrierMask,
    /// Every older reference on the before side has performed.
    pub done: bool,
}

/// Barriers not yet graduated.
#[derive(Debug, Default)]
pub struct BarrierQueue {
    records: VecDeque<BarrierRecord>,
}

impl BarrierQueue {
    /// Appends a barrier.
    pub fn insert(&mut self, tag: Tag, handle: InstHandle, mask: BarrierMask) {
        self.records.push_back(BarrierRecord {
            tag,
            handle,
            mask,
            done: false,
        });
    }

    /// True if an older barrier keeps the load `tag` from issuing.
    pub fn blocks_load(&self, tag: Tag) -> bool {
        self.records
            .iter()
            .take_while(|b| b.tag < tag)
            .any(|b| b.mask.blocks_younger_loads())
    }

    /// True if an older barrier keeps the store `tag` from becoming ready to retire.
    pub fn blocks_store(&self, tag: Tag) -> bool {
        self.records
            .iter()
            .take_while(|b| b.tag < tag)
            .any(|b| b.mask.blocks_younger_stores())
    }

    /// Marks barriers whose before side has performed and returns them.
    pub fn mark_done<'a>(
        &mut self,
        refs: impl Iterator<Item = &'a MemEntry> + Clone,
    ) -> Vec<(Tag, InstHandle)> {
        let mut newly = Vec::new();
        for b in self.records.iter_mut().filter(|b| !b.done) {
            let mut older = refs.clone().take_while(|e| e.tag < b.tag);
            let blocked = older.any(|e| {
                !e.is_performed()
                    && ((e.kind.reads() && b.mask.orders_older_loads())
                        || (e.kind.writes() && b.mask.orders_older_stores()))
            });
            if !blocked {
                b.done = true;
                newly.push((b.tag, b.handle));
            }
        }
        newly
    }

    /// Removes a graduating barrier.
    pub fn remove(&mut self, tag: Tag) -> Option<BarrierRecord> {
        let index = self.records.iter().position(|b| b.tag == tag)?;
        self.records.remove(index)
    }

    /// Drops barriers younger than `cutoff`.
    pub fn flush(&mut self, cutoff: Tag) {
        while self.records.back().is_some_and(|b| b.tag > cutoff) {
            let _ = self.records.pop_back();
        }
    }

    /// Number of queued barriers.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no barrier is queued.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
