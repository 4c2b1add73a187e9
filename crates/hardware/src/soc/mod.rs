//! System-on-Chip (SoC) Components.
//!
//! This module holds the collaborators a processor is wired to: the interface
//! traits, and reference implementations of instruction supply, shared data
//! memory and data address translation.

/// Reference shared data memory.
pub mod memory;

/// Reference instruction supply.
pub mod supply;

/// Reference data TLB.
pub mod tlb;

/// Collaborator interfaces.
pub mod traits;

pub use memory::FlatMemory;
pub use supply::ProgramSupply;
pub use tlb::{PageEntry, PageTranslator};
pub use traits::{AddressTranslator, InstructionSupply, MemorySystem};
