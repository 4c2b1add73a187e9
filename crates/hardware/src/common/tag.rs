//! Instruction tags.
//!
//! Every decoded instruction receives a tag from a monotonically increasing
//! counter. Tags define program order for every speculation and rollback
//! decision in the pipeline:
//! 1. **Ordering:** `a < b` means `a` was decoded before `b` in the live window.
//! 2. **Flush cutoffs:** A flush at tag `T` discards every tag strictly greater than `T`.
//! 3. **Reuse:** After a flush at `T` the next decoded instruction receives `T + 1`,
//!    so a tag alone never identifies an instance across flushes. Stale references
//!    are caught by the generation-checked handles in [`crate::core::arena`].

use std::fmt;

/// Program-order identifier of a decoded instruction.
///
/// Tag `0` is never handed out; it is the flush cutoff that empties the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tag(pub u64);

impl Tag {
    /// The first tag assigned after reset.
    pub const FIRST: Self = Self(1);

    /// Returns the tag that follows this one.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the tag before this one, saturating at zero.
    #[inline]
    pub const fn prev(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// Distance in tags from `base` to `self`, or `None` if `self` is older.
    #[inline]
    pub fn offset_from(self, base: Self) -> Option<usize> {
        self.0.checked_sub(base.0).map(|d| d as usize)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
