//! Collaborator doubles.

/// `mockall` doubles for memory and translation.
pub mod memory;
