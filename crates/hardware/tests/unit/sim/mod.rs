//! System-level tests.



/// Decode stalls by cause.
pub mod stalls;

/// Traps, interrupts and serializing instructions.
pub mod traps;
