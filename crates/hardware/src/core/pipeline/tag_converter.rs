//! Tag converter.
//!
//! Maps live tags to arena handles across the speculation window. Tags in the
//! window are contiguous, so lookup by tag is an offset from the head.

use std::collections::VecDeque;

use crate::common::error::EngineError;
use crate::common::tag::Tag;
use crate::core::arena::InstHandle;

/// Ordered tag → instance map for the live window.
#[derive(Debug)]
pub struct TagConverter {
    window: VecDeque<(Tag, InstHandle)>,
    next_tag: Tag,
}

impl Default for TagConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl TagConverter {
    /// Creates an empty converter; the first tag handed out is [`Tag::FIRST`].
    pub const fn new() -> Self {
        Self {
            window: VecDeque::new(),
            next_tag: Tag::FIRST,
        }
    }

    /// Tag the next decoded instruction will receive.
    #[inline]
    pub const fn next_tag(&self) -> Tag {
        self.next_tag
    }

    /// Registers the next tag for `handle` and returns it.
    pub fn allocate(&mut self, handle: InstHandle) -> Tag {
        let tag = self.next_tag;
        self.window.push_back((tag, handle));
        self.next_tag = tag.next();
        tag
    }

    /// Registers `handle` under an explicit tag, which must be the next tag.
    pub fn register(&mut self, tag: Tag, handle: InstHandle) -> Result<(), EngineError> {
        if tag != self.next_tag {
            return Err(EngineError::Invariant(format!(
                "registered {tag} while expecting {}",
                self.next_tag
            )));
        }
        let _ = self.allocate(handle);
        Ok(())
    }

    /// Looks up a live tag.
    pub fn lookup(&self, tag: Tag) -> Option<InstHandle> {
        let head = self.window.front()?.0;
        self.lookup_at(head, tag.offset_from(head)?)
    }

    /// Looks up the entry `offset` positions after `base`, checking it is the expected tag.
    pub fn lookup_at(&self, base: Tag, offset: usize) -> Option<InstHandle> {
        let head = self.window.front()?.0;
        let index = base.offset_from(head)? + offset;
        let &(tag, handle) = self.window.get(index)?;
        (tag.0 == base.0 + offset as u64).then_some(handle)
    }

    /// Looks up a tag that must be live.
    pub fn require(&self, tag: Tag) -> Result<InstHandle, EngineError> {
        self.lookup(tag).ok_or(EngineError::TagNotFound(tag))
    }

    /// Oldest live entry.
    pub fn head(&self) -> Option<(Tag, InstHandle)> {
        self.window.front().copied()
    }

    /// Youngest live entry.
    pub fn tail(&self) -> Option<(Tag, InstHandle)> {
        self.window.back().copied()
    }

    /// Removes the oldest entry at graduation.
    pub fn pop_head(&mut self) -> Option<(Tag, InstHandle)> {
        self.window.pop_front()
    }

    /// Removes every tag greater than `min_tag` and returns the removed
    /// entries, youngest first. The next tag becomes `min_tag + 1`.
    pub fn flush(&mut self, min_tag: Tag) -> Vec<(Tag, InstHandle)> {
        let mut removed = Vec::new();
        while let Some(&(tag, handle)) = self.window.back() {
            if tag <= min_tag {
                break;
            }
            removed.push((tag, handle));
            let _ = self.window.pop_back();
        }
        if min_tag.next() < self.next_tag {
            self.next_tag = min_tag.next();
        }
        removed
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// True if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
