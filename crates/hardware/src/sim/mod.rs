//! Simulation driver and program loading.
//!
//! Provides the JSON program format and the multiprocessor [`System`] that
//! ties processors, instruction supplies, TLBs and shared memory together.

/// Program images.
pub mod program;

/// Multiprocessor system.
pub mod system;

pub use program::Program;
pub use system::{RunOutcome, System};
