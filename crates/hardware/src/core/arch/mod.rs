//! Architectural state.
//!
//! This module contains the state a program can observe:
//! 1. **Registers:** Committed logical register values.
//! 2. **Traps:** Processor state word, trap stack and trap vectoring.

/// Committed register file.
pub mod regs;

/// Processor state and trap stack.
pub mod trap;

pub use regs::ArchRegisters;
pub use trap::{Pstate, TrapStack, TrapState, trap_vector};
