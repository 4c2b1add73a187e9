//! Generation-checked arena for dynamic instructions.
//!
//! Slots are reused after removal, but every reuse bumps the slot's
//! generation. A handle taken before the reuse no longer resolves, so late
//! events for flushed instructions are detected instead of touching the
//! slot's new occupant.

use std::fmt;

/// Index into an [`Arena`] plus the generation it was issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstHandle {
    index: u32,
    generation: u32,
}

impl fmt::Display for InstHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slab of values addressed by generation-checked handles.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Creates an arena with room for `capacity` values before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// Stores `value` and returns its handle.
    pub fn insert(&mut self, value: T) -> InstHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            InstHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            InstHandle {
                index,
                generation: 0,
            }
        }
    }

    /// Resolves a handle, or `None` if it is stale.
    pub fn get(&self, handle: InstHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_ref())
    }

    /// Resolves a handle mutably, or `None` if it is stale.
    pub fn get_mut(&mut self, handle: InstHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    /// True if the handle still resolves.
    pub fn contains(&self, handle: InstHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Removes and returns the value, invalidating every copy of the handle.
    pub fn remove(&mut self, handle: InstHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(value)
    }

    /// Number of live values.
    #[inline]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// True if no values are live.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }
}
