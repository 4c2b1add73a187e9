//! Collaborator interfaces consumed by the processor.
//!
//! The pipeline never owns instruction memory, data memory or the TLB. It talks
//! to them through three narrow traits:
//! 1. **Instruction Supply:** Returns the decoded instruction at a PC.
//! 2. **Memory System:** Accepts requests and reports replies and invalidations asynchronously.
//! 3. **Address Translator:** Maps a virtual data address to a physical one.
//!
//! Reference implementations live in [`crate::soc::memory`], [`crate::soc::tlb`]
//! and [`crate::soc::supply`].

use crate::common::data::{AccessType, MemWidth};
use crate::common::error::ExceptionCode;
use crate::common::tag::Tag;
use crate::isa::StaticInst;

/// An instruction returned by an [`InstructionSupply`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FetchedInst {
    /// Decoded instruction.
    pub inst: StaticInst,
    /// Address it was fetched from.
    pub pc: u64,
    /// Fetch-time fault, if any.
    pub exception: ExceptionCode,
}

/// Source of decoded instructions.
pub trait InstructionSupply {
    /// Returns the instruction at `pc`.
    ///
    /// A fault is reported through [`FetchedInst::exception`]; the pipeline
    /// turns it into a precise trap when the instruction reaches the head.
    fn fetch(&mut self, pc: u64, privileged: bool) -> FetchedInst;
}

/// A memory request submitted by the disambiguation engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemRequest {
    /// Request id, echoed in the reply.
    pub id: u64,
    /// Tag of the issuing instruction.
    pub tag: Tag,
    /// Physical address.
    pub paddr: u64,
    /// Access width.
    pub width: MemWidth,
    /// Kind of access.
    pub access: AccessType,
    /// Store or swap data.
    pub data: u64,
    /// Compare value for compare-and-swap.
    pub compare: u64,
}

/// Asynchronous notification from the memory system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemEvent {
    /// A request has performed. `value` is the (zero-extended) loaded or old value.
    Reply {
        /// Request id.
        id: u64,
        /// Loaded value; zero for plain writes.
        value: u64,
    },
    /// Another processor wrote the line starting at `line`.
    Invalidate {
        /// Line-aligned physical address.
        line: u64,
    },
}

/// Data memory hierarchy shared by all processors.
pub trait MemorySystem {
    /// Accepts a request from processor `cpu` at cycle `now`.
    fn submit(&mut self, cpu: usize, req: MemRequest, now: u64);

    /// Returns every event for processor `cpu` that is due at or before `now`.
    fn poll(&mut self, cpu: usize, now: u64) -> Vec<MemEvent>;

    /// Coherence line size in bytes.
    fn line_size(&self) -> u64;

    /// True while requests are still in flight for processor `cpu`.
    fn busy(&self, cpu: usize) -> bool {
        let _ = cpu;
        false
    }
}

/// Data TLB lookup request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslationRequest {
    /// Virtual address.
    pub vaddr: u64,
    /// Access width.
    pub width: MemWidth,
    /// True for stores and atomics.
    pub is_write: bool,
    /// Privileged mode at translation time.
    pub privileged: bool,
    /// Tag of the requesting instruction.
    pub tag: Tag,
    /// Processor index.
    pub context: usize,
}

/// Result of a TLB lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlbOutcome {
    /// Physical address.
    Hit(u64),
    /// No translation; raises a data TLB miss.
    Miss,
    /// Protection violation; raises a data protection fault.
    Fault,
}

/// Data address translation.
pub trait AddressTranslator {
    /// Translates a data address.
    fn lookup(&mut self, req: &TranslationRequest) -> TlbOutcome;
}
