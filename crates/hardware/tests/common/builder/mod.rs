//! Builders for test inputs.

/// Instruction constructors.
pub mod instruction;

/// Program images.
pub mod program;
