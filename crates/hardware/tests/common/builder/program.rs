//! Program image builder.

use mcsim_core::common::data::MemWidth;
use mcsim_core::config::Config;
use mcsim_core::core::arch::trap_vector;
use mcsim_core::isa::StaticInst;
use mcsim_core::sim::Program;
use mcsim_core::sim::program::{MemInit, PageMap, Segment};
use mcsim_core::soc::PageEntry;

/// Address the main segment of every test program starts at.
pub const CODE_BASE: u64 = 0x1000;

/// Fluent [`Program`] builder.
#[derive(Debug)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    /// Starts a program whose main segment holds `code` at [`CODE_BASE`].
    pub fn new(code: Vec<StaticInst>) -> Self {
        Self {
            program: Program::new(CODE_BASE, code),
        }
    }

    /// Installs a privileged handler at the trap table entry for `tt`.
    pub fn handler(mut self, tt: u16, code: Vec<StaticInst>) -> Self {
        self.program.segments.push(Segment {
            base: trap_vector(Config::default().trap.table_base, tt),
            instructions: code,
            privileged: true,
        });
        self
    }

    /// Places a 64-bit value in shared memory.
    pub fn data(mut self, addr: u64, value: u64) -> Self {
        self.program.memory.push(MemInit {
            addr,
            width: MemWidth::Double,
            value,
        });
        self
    }

    /// Maps virtual page `vpn` onto physical page `ppn`.
    pub fn page(mut self, vpn: u64, ppn: u64, writable: bool) -> Self {
        self.program.pages.push(PageMap {
            vpn,
            entry: PageEntry {
                ppn,
                writable,
                user: true,
            },
        });
        self
    }

    /// Finishes the program.
    pub fn build(self) -> Program {
        self.program
    }
}
