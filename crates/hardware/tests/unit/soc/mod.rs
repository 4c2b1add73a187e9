//! Reference collaborator tests.

/// Shared memory timing and coherence.
pub mod memory;

/// Page translation.
pub mod tlb;
