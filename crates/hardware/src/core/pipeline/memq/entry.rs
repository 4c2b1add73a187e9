//! Memory-queue entries.

use crate::common::data::{MemWidth, RmwOp};
use crate::common::error::ExceptionCode;
use crate::common::tag::Tag;
use crate::core::arena::InstHandle;

/// Kind of memory reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemKind {
    /// Load.
    Load,
    /// Store.
    Store,
    /// Atomic read-modify-write.
    Rmw(RmwOp),
}

impl MemKind {
    /// True for loads.
    #[inline]
    pub const fn is_load(self) -> bool {
        matches!(self, Self::Load)
    }

    /// True for stores.
    #[inline]
    pub const fn is_store(self) -> bool {
        matches!(self, Self::Store)
    }

    /// True for references that read memory.
    #[inline]
    pub const fn reads(self) -> bool {
        matches!(self, Self::Load | Self::Rmw(_))
    }

    /// True for references that write memory.
    #[inline]
    pub const fn writes(self) -> bool {
        matches!(self, Self::Store | Self::Rmw(_))
    }
}

/// Memory-system progress of a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MemProgress {
    /// Not yet sent to memory.
    #[default]
    Unissued,
    /// Request outstanding.
    Issued,
    /// Value taken from the store with the given tag.
    Forwarded(Tag),
    /// Performed in memory.
    Completed,
    /// Removed by a flush.
    Flushed,
}

/// How a killed load recovers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Restart {
    /// Reissue from the memory queue with the same address.
    Reissue,
    /// Soft exception: recompute and re-translate the address.
    Retranslate(ExceptionCode),
}

/// A load whose value was discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimboKill {
    /// Load tag.
    pub tag: Tag,
    /// Load instance.
    pub handle: InstHandle,
    /// Recovery applied.
    pub restart: Restart,
}

/// A load or atomic value released to dependents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Finalized {
    /// Reference tag.
    pub tag: Tag,
    /// Instance.
    pub handle: InstHandle,
    /// Extended value.
    pub value: u64,
}

/// One in-flight memory reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemEntry {
    /// Tag.
    pub tag: Tag,
    /// Instance.
    pub handle: InstHandle,
    /// Kind.
    pub kind: MemKind,
    /// Access width.
    pub width: MemWidth,
    /// Sign-extend loaded values.
    pub signed: bool,
    /// Virtual address.
    pub vaddr: u64,
    /// Physical address, valid once `addr_ready`.
    pub paddr: u64,
    /// Address computed and translated.
    pub addr_ready: bool,
    /// Store or swap data captured.
    pub data_ready: bool,
    /// Store or swap data.
    pub data: u64,
    /// Compare value for compare-and-swap.
    pub compare: u64,
    /// Memory-system progress.
    pub progress: MemProgress,
    /// Store may graduate.
    pub ready_to_retire: bool,
    /// Store has graduated and waits to issue.
    pub graduated: bool,
    /// Older writes whose address was unknown when this load issued.
    pub limbo: Vec<Tag>,
    /// Set when the load was killed while its request was outstanding.
    pub killed: Option<Restart>,
    /// Bound value of a load or the old value of an atomic.
    pub value: Option<u64>,
    /// Value released to dependents.
    pub finalized: bool,
    /// Older store this load overlaps partially and must wait for.
    pub partial_wait: Option<Tag>,
    /// Id of the outstanding request.
    pub outstanding: Option<u64>,
    /// Address generation or translation faulted.
    pub excepted: bool,
}

impl MemEntry {
    /// Creates an entry with nothing resolved.
    pub const fn new(tag: Tag, handle: InstHandle, kind: MemKind, width: MemWidth, signed: bool) -> Self {
        Self {
            tag,
            handle,
            kind,
            width,
            signed,
            vaddr: 0,
            paddr: 0,
            addr_ready: false,
            data_ready: matches!(kind, MemKind::Load | MemKind::Rmw(RmwOp::Ldstub)),
            data: 0,
            compare: 0,
            progress: MemProgress::Unissued,
            ready_to_retire: false,
            graduated: false,
            limbo: Vec::new(),
            killed: None,
            value: None,
            finalized: false,
            partial_wait: None,
            outstanding: None,
            excepted: false,
        }
    }

    /// True once the reference left the `Unissued` state.
    #[inline]
    pub const fn has_issued(&self) -> bool {
        !matches!(self.progress, MemProgress::Unissued)
    }

    /// True once the reference is globally performed from this processor's
    /// point of view: a load or atomic whose value is final, or a completed store.
    #[inline]
    pub const fn is_performed(&self) -> bool {
        match self.kind {
            MemKind::Store => matches!(self.progress, MemProgress::Completed),
            MemKind::Load | MemKind::Rmw(_) => self.finalized,
        }
    }

    /// Discards the bound value so the load issues again.
    pub(super) fn reset(&mut self, restart: Restart) {
        self.progress = MemProgress::Unissued;
        self.value = None;
        self.finalized = false;
        self.limbo.clear();
        self.partial_wait = None;
        self.killed = None;
        self.outstanding = None;
        if matches!(restart, Restart::Retranslate(_)) {
            self.addr_ready = false;
        }
    }
}
