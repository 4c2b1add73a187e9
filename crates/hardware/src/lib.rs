//! Out-of-order processor simulator library.
//!
//! This crate implements a cycle-level model of a dynamically scheduled
//! superscalar processor for memory-consistency studies:
//! 1. **Core:** Register renaming, stall queues, the active list, functional-unit
//!    scheduling, branch checkpoints and precise exceptions.
//! 2. **Memory:** A speculative disambiguation engine under sequential,
//!    processor or release consistency.
//! 3. **ISA:** A structural instruction model with categories, operands and execution effects.
//! 4. **SoC:** Collaborator traits with reference memory, TLB and instruction supply.
//! 5. **Simulation:** Programs, the multiprocessor system, configuration and statistics.

/// Common types (tags, registers, access kinds, errors).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Processor core (arch state, pipeline structures, stages, predictors).
pub mod core;
/// Instruction model (operands, opcodes, static instructions, execution).
pub mod isa;
/// Programs and the multiprocessor system.
pub mod sim;
/// Collaborator traits and reference implementations.
pub mod soc;
/// Pipeline statistics.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Per-processor pipeline context.
pub use crate::core::Processor;
/// Multiprocessor system; construct with `System::new`.
pub use crate::sim::System;
