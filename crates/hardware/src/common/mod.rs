//! Common types shared by every part of the simulator.
//!
//! This module provides the fundamental building blocks used across components:
//! 1. **Tags:** Program-order identifiers for dynamic instructions.
//! 2. **Registers:** Register files, physical and logical register names.
//! 3. **Memory Access:** Access kinds, widths, and overlap tests.
//! 4. **Error Handling:** Exception codes, engine errors, and configuration errors.

/// Memory access type definitions.
pub mod data;

/// Exception codes and error types.
pub mod error;

/// Register naming.
pub mod reg;

/// Instruction tags.
pub mod tag;

pub use data::{AccessType, MemWidth, RmwOp};
pub use error::{ConfigError, EngineError, ExceptionClass, ExceptionCode, SimError};
pub use reg::{LogicalReg, PhysReg, RegFile};
pub use tag::Tag;
