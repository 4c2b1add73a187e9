//! Execution units and functional components.
//!
//! Execution itself is modelled by [`crate::isa::execute`]; this module holds
//! the stateful units that sit beside the pipeline.

/// Branch prediction unit: direction predictors and return address stack.
pub mod bru;
