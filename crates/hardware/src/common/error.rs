//! Exception codes and engine error types.
//!
//! This module defines the error handling vocabulary of the simulator. It provides:
//! 1. **Exception Codes:** Architectural and speculative faults carried by dynamic instructions.
//! 2. **Engine Errors:** Internal invariant violations that abort a processor.
//! 3. **Configuration Errors:** Failures while loading configuration or program files.
//! 4. **Simulation Errors:** What a whole-system run reports to its driver.

use std::fmt;
use std::path::PathBuf;

use super::reg::{PhysReg, RegFile};
use super::tag::Tag;

/// Exception code attached to a dynamic instruction.
///
/// Hard codes are taken precisely at the head of the active list and vector
/// into the trap table. Soft codes restart a single instruction in place.
/// [`ExceptionCode::Serialize`] marks instructions whose effect is applied at
/// the head after all younger work is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ExceptionCode {
    /// No exception.
    #[default]
    Ok,
    /// Serializing instruction (done, retry, privileged-register write, halt).
    Serialize,
    /// Instruction TLB miss.
    InstrTlbMiss,
    /// Instruction fetch from an unmapped or protected address.
    InstrAccessFault,
    /// Data TLB miss.
    DataTlbMiss,
    /// Data access violated page protection.
    DataProtection,
    /// Misaligned data or jump address.
    Alignment,
    /// Privileged instruction executed in user mode.
    Privileged,
    /// Malformed or unsupported instruction.
    Illegal,
    /// Integer division by zero.
    DivideByZero,
    /// Floating-point exception.
    FpError,
    /// Register window overflow.
    WindowOverflow,
    /// Register window underflow.
    WindowUnderflow,
    /// External interrupt at the given level.
    Interrupt(u8),
    /// Software trap instruction with the given number.
    SysTrap(u8),
    /// A load speculated past an older store that turned out to alias it.
    SoftLimbo,
    /// A held load value was invalidated by another processor's write.
    SoftCoherence,
}

/// Handling class of an [`ExceptionCode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExceptionClass {
    /// Nothing to handle.
    None,
    /// Locally recoverable; restarts only the offending instruction.
    Soft,
    /// Applied at the head without vectoring.
    Serialize,
    /// Architectural trap through the trap table.
    Hard,
}

impl ExceptionCode {
    /// Returns the handling class of this code.
    pub const fn class(self) -> ExceptionClass {
        match self {
            Self::Ok => ExceptionClass::None,
            Self::Serialize => ExceptionClass::Serialize,
            Self::SoftLimbo | Self::SoftCoherence => ExceptionClass::Soft,
            _ => ExceptionClass::Hard,
        }
    }

    /// True for codes that trap through the trap table.
    #[inline]
    pub const fn is_hard(self) -> bool {
        matches!(self.class(), ExceptionClass::Hard)
    }

    /// True if any exception is present.
    #[inline]
    pub const fn is_some(self) -> bool {
        !matches!(self, Self::Ok)
    }

    /// Trap type used to index the trap table, for hard exceptions.
    pub const fn trap_type(self) -> Option<u16> {
        let tt = match self {
            Self::InstrAccessFault => 0x08,
            Self::Illegal => 0x10,
            Self::Privileged => 0x11,
            Self::FpError => 0x21,
            Self::DivideByZero => 0x28,
            Self::DataProtection => 0x30,
            Self::Alignment => 0x34,
            Self::Interrupt(level) => 0x40 + level as u16,
            Self::InstrTlbMiss => 0x64,
            Self::DataTlbMiss => 0x68,
            Self::WindowOverflow => 0x80,
            Self::WindowUnderflow => 0xC0,
            Self::SysTrap(n) => 0x100 + n as u16,
            Self::Ok | Self::Serialize | Self::SoftLimbo | Self::SoftCoherence => return None,
        };
        Some(tt)
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt(level) => write!(f, "Interrupt({level})"),
            Self::SysTrap(n) => write!(f, "SysTrap({n})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Fatal engine error: an internal invariant was violated.
///
/// There is no defined recovery; the owning [`crate::sim::System`] stops and
/// reports a diagnostic dump.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An instruction that must be live was not found in the tag converter.
    #[error("tag {0} not found in the tag converter")]
    TagNotFound(Tag),

    /// An arena handle referred to a freed or reused slot.
    #[error("stale instance handle for tag {0}")]
    StaleHandle(Tag),

    /// A physical register was returned to a free list twice.
    #[error("double free of {file} register {reg}")]
    DoubleFree {
        /// Register file.
        file: RegFile,
        /// Register freed twice.
        reg: PhysReg,
    },

    /// A free list ran dry after the decode-time resource check passed.
    #[error("{0} free list exhausted after reservation")]
    FreeListEmpty(RegFile),

    /// A trap was taken at the maximum trap level.
    #[error("trap level overflow at level {level}")]
    TrapLevelOverflow {
        /// Trap level at the time of the trap.
        level: usize,
    },

    /// An exception reached the handler without a defined treatment.
    #[error("unhandled exception {code} at tag {tag}")]
    UnhandledException {
        /// Offending instruction.
        tag: Tag,
        /// Exception code.
        code: ExceptionCode,
    },

    /// Any other internal consistency failure.
    #[error("pipeline invariant violated: {0}")]
    Invariant(String),
}

/// Errors raised while loading configuration or program files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The contents were not valid JSON for the expected schema.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A value was out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Error returned by [`crate::sim::System`].
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A processor hit an engine error. The run cannot continue.
    #[error("cpu{cpu} failed at cycle {cycle}: {source}")]
    Fatal {
        /// Failing processor.
        cpu: usize,
        /// Global cycle of the failure.
        cycle: u64,
        /// Engine error.
        #[source]
        source: EngineError,
        /// Pipeline dump taken at the failure.
        diagnostics: String,
    },

    /// The configuration or a program could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
