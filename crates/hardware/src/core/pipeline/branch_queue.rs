//! Branch queue.
//!
//! Holds a rename-map checkpoint ("shadow mapper") for every unresolved
//! branch whose prediction can be wrong. Capacity is fixed; decode stalls with
//! `ShadowMapperExhausted` when no slot is left.

use std::collections::VecDeque;

use crate::common::error::EngineError;
use crate::common::tag::Tag;
use crate::core::pipeline::rename::MapSnapshot;

/// A rename-map checkpoint taken after a branch renamed its own destinations.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    /// Branch tag.
    pub tag: Tag,
    /// Both maps as of the branch.
    pub maps: MapSnapshot,
}

/// Fixed-capacity set of outstanding checkpoints, in tag order.
#[derive(Debug)]
pub struct BranchQueue {
    entries: VecDeque<Checkpoint>,
    capacity: usize,
}

impl BranchQueue {
    /// Creates a queue with `capacity` shadow mappers.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// True if another checkpoint can be taken.
    #[inline]
    pub fn has_slot(&self) -> bool {
        self.entries.len() < self.capacity
    }

    /// Number of free shadow mappers.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.capacity - self.entries.len()
    }

    /// Records a checkpoint.
    pub fn push(&mut self, tag: Tag, maps: MapSnapshot) -> Result<(), EngineError> {
        if !self.has_slot() {
            return Err(EngineError::Invariant(format!(
                "checkpoint for {tag} with no free shadow mapper"
            )));
        }
        if self.entries.back().is_some_and(|c| c.tag >= tag) {
            return Err(EngineError::Invariant(format!("checkpoint for {tag} out of order")));
        }
        self.entries.push_back(Checkpoint { tag, maps });
        Ok(())
    }

    /// Removes and returns the checkpoint of a resolved branch.
    pub fn take(&mut self, tag: Tag) -> Option<Checkpoint> {
        let index = self.entries.binary_search_by_key(&tag, |c| c.tag).ok()?;
        self.entries.remove(index)
    }

    /// True if `tag` holds a checkpoint.
    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.binary_search_by_key(&tag, |c| c.tag).is_ok()
    }

    /// Drops checkpoints of branches younger than `cutoff`.
    pub fn flush(&mut self, cutoff: Tag) {
        while self.entries.back().is_some_and(|c| c.tag > cutoff) {
            let _ = self.entries.pop_back();
        }
    }

    /// Number of outstanding checkpoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no branch is outstanding.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
