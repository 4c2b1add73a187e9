//! Program Images.
//!
//! A program is a JSON document describing what one processor runs:
//! 1. **Code:** Instructions at `base`, plus optional extra segments (for
//!    example privileged trap handlers).
//! 2. **Data:** Initial values placed in shared memory.
//! 3. **Pages:** Optional data page mappings; without them addresses translate to themselves.
//!
//! ```json
//! {
//!   "base": 4096,
//!   "instructions": [
//!     { "op": { "Alu": "Add" }, "dst": { "Int": 1 }, "src1": { "Int": 0 }, "imm": 64 },
//!     { "op": "Halt" }
//!   ],
//!   "memory": [ { "addr": 64, "width": "Double", "value": 7 } ]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::common::data::MemWidth;
use crate::common::error::ConfigError;
use crate::isa::StaticInst;
use crate::soc::memory::FlatMemory;
use crate::soc::supply::ProgramSupply;
use crate::soc::tlb::{PageEntry, PageTranslator};

/// An additional code segment.
#[derive(Clone, Debug, Deserialize)]
pub struct Segment {
    /// Address of the first instruction.
    pub base: u64,
    /// Instructions in address order.
    pub instructions: Vec<StaticInst>,
    /// Only fetchable in privileged mode.
    #[serde(default)]
    pub privileged: bool,
}

/// An initial memory value.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct MemInit {
    /// Physical address.
    pub addr: u64,
    /// Width written.
    #[serde(default)]
    pub width: MemWidth,
    /// Value written.
    pub value: u64,
}

/// A data page mapping.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PageMap {
    /// Virtual page number.
    pub vpn: u64,
    /// Mapping.
    #[serde(flatten)]
    pub entry: PageEntry,
}

/// Program image for one processor.
#[derive(Clone, Debug, Deserialize)]
pub struct Program {
    /// Address of the first instruction.
    pub base: u64,
    /// Initial fetch address; defaults to `base`.
    #[serde(default)]
    pub entry: Option<u64>,
    /// Main code segment.
    pub instructions: Vec<StaticInst>,
    /// Further code segments.
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// Initial shared-memory contents.
    #[serde(default)]
    pub memory: Vec<MemInit>,
    /// Data page mappings.
    #[serde(default)]
    pub pages: Vec<PageMap>,
}

impl Program {
    /// Creates a program with a single code segment.
    pub fn new(base: u64, instructions: Vec<StaticInst>) -> Self {
        Self {
            base,
            entry: None,
            instructions,
            segments: Vec::new(),
            memory: Vec::new(),
            pages: Vec::new(),
        }
    }

    /// Parses a program from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON program file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Initial fetch address.
    pub fn entry_point(&self) -> u64 {
        self.entry.unwrap_or(self.base)
    }

    /// Builds the instruction supply holding every code segment.
    pub fn supply(&self) -> ProgramSupply {
        let mut supply = ProgramSupply::new();
        supply.add_segment(self.base, &self.instructions, false);
        for seg in &self.segments {
            supply.add_segment(seg.base, &seg.instructions, seg.privileged);
        }
        supply
    }

    /// Builds the data translator.
    pub fn translator(&self, page_shift: u32) -> PageTranslator {
        let mut tlb = PageTranslator::identity(page_shift);
        for page in &self.pages {
            tlb.map(page.vpn, page.entry);
        }
        tlb
    }

    /// Writes the initial data into `memory`.
    pub fn load_data(&self, memory: &mut FlatMemory) {
        for init in &self.memory {
            memory.write(init.addr, init.width, init.value);
        }
    }
}
