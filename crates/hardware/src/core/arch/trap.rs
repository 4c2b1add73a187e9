//! Processor state and trap stack.
//!
//! This module implements the architectural state touched by traps:
//! 1. **Processor State:** Privilege and interrupt-enable bits, and the interrupt level.
//! 2. **Trap Stack:** Saved `(pc, npc, pstate, tt)` per nesting level.
//! 3. **Vectoring:** Trap table address computation.

use crate::common::error::EngineError;

/// Processor state word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Pstate {
    /// Privileged mode.
    pub privileged: bool,
    /// Interrupts enabled.
    pub interrupts_enabled: bool,
}

impl Pstate {
    /// Interrupt-enable bit in the packed word.
    pub const IE: u64 = 1 << 1;
    /// Privilege bit in the packed word.
    pub const PRIV: u64 = 1 << 2;

    /// Packs the state into a register value.
    pub const fn bits(self) -> u64 {
        (if self.privileged { Self::PRIV } else { 0 })
            | (if self.interrupts_enabled { Self::IE } else { 0 })
    }

    /// Unpacks a register value.
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            privileged: bits & Self::PRIV != 0,
            interrupts_enabled: bits & Self::IE != 0,
        }
    }
}

/// State saved on trap entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapState {
    /// PC of the trapping instruction.
    pub pc: u64,
    /// Its sequential successor.
    pub npc: u64,
    /// Processor state before the trap.
    pub pstate: Pstate,
    /// Trap type.
    pub tt: u16,
}

/// Stack of saved trap states, one per nesting level.
#[derive(Clone, Debug)]
pub struct TrapStack {
    levels: Vec<TrapState>,
    max_level: usize,
}

impl TrapStack {
    /// Creates an empty stack allowing `max_level` nested traps.
    pub fn new(max_level: usize) -> Self {
        Self {
            levels: Vec::with_capacity(max_level),
            max_level,
        }
    }

    /// Current trap level.
    pub fn level(&self) -> usize {
        self.levels.len()
    }

    /// Saves state for a new trap level.
    pub fn push(&mut self, state: TrapState) -> Result<(), EngineError> {
        if self.levels.len() >= self.max_level {
            return Err(EngineError::TrapLevelOverflow {
                level: self.levels.len(),
            });
        }
        self.levels.push(state);
        Ok(())
    }

    /// Restores the innermost saved state.
    pub fn pop(&mut self) -> Option<TrapState> {
        self.levels.pop()
    }

    /// Innermost saved state.
    pub fn top(&self) -> Option<&TrapState> {
        self.levels.last()
    }
}

/// Address of the trap table entry for trap type `tt`.
#[inline]
pub const fn trap_vector(table_base: u64, tt: u16) -> u64 {
    table_base + ((tt as u64) << 5)
}
