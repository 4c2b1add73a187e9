//! Core processor implementation.
//!
//! This module contains the out-of-order processor model: the architectural
//! state, the dynamic instruction arena, the pipeline bookkeeping structures,
//! the prediction units, and the per-processor context that drives them.

/// Architectural registers, processor state and the trap stack.
pub mod arch;

/// Generation-checked storage for dynamic instructions.
pub mod arena;

/// Dynamic instruction instances.
pub mod instance;

/// Out-of-order pipeline structures (active list, rename, memory queue, ...).
pub mod pipeline;

/// Per-processor context and pipeline stages.
pub mod processor;

/// Branch prediction units.
pub mod units;

pub use self::processor::{Ports, Processor};
