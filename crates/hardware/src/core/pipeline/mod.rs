//! Out-of-order pipeline structures.
//!
//! This module contains the bookkeeping structures shared by the pipeline
//! stages in [`crate::core::processor`]:
//! 1. **Tags:** The tag converter mapping live tags to instances.
//! 2. **Renaming:** Free lists, rename maps, physical values and busy bits.
//! 3. **Dependencies:** Per-register stall queues.
//! 4. **Ordering:** The active list and the branch queue of rename checkpoints.
//! 5. **Scheduling:** Functional-unit slots, ready queues and the event queue.
//! 6. **Memory:** The memory disambiguation engine.

/// Active list (reorder buffer).
pub mod active_list;

/// Rename checkpoints for unresolved branches.
pub mod branch_queue;

/// Per-processor event queue.
pub mod events;

/// Memory disambiguation engine.
pub mod memq;

/// Free lists, rename maps and physical register files.
pub mod rename;

/// Per-register wait lists.
pub mod stall_queue;

/// Tag to instance map.
pub mod tag_converter;

/// Functional-unit scheduler.
pub mod units;

pub use active_list::{ActiveEntry, ActiveList, DestList, DestWrite};
pub use branch_queue::{BranchQueue, Checkpoint};
pub use events::{EventId, EventQueue};
pub use memq::MemoryQueue;
pub use rename::{MapSnapshot, RegisterState};
pub use stall_queue::{StallEntry, StallQueues};
pub use tag_converter::TagConverter;
pub use units::FunctionalUnits;
