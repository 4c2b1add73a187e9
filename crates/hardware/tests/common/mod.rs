//! Shared test infrastructure.

/// Instruction and program builders.
pub mod builder;

/// System harness.
pub mod harness;

/// Collaborator doubles.
pub mod mocks;
