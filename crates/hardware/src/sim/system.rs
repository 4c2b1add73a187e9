//! Multiprocessor System.
//!
//! The system owns every processor together with its instruction supply and
//! data TLB, and the shared memory they all talk to. It performs:
//! 1. **Stepping:** Ticks each processor once per global cycle, in index order.
//! 2. **Termination:** Stops once every processor has halted and its memory
//!    traffic has drained, or when the cycle limit is reached.
//! 3. **Failure Reporting:** Wraps an engine error with a pipeline dump.

use tracing::{info, warn};

use crate::common::error::{ConfigError, SimError};
use crate::config::Config;
use crate::core::processor::{Ports, Processor};
use crate::sim::program::Program;
use crate::soc::memory::FlatMemory;
use crate::soc::supply::ProgramSupply;
use crate::soc::tlb::PageTranslator;
use crate::soc::traits::MemorySystem;
use crate::stats::PipelineStats;

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every processor halted.
    Halted {
        /// Global cycles simulated.
        cycles: u64,
    },
    /// The cycle limit was reached first.
    CycleLimit {
        /// Global cycles simulated.
        cycles: u64,
    },
}

/// A set of processors sharing one memory.
#[derive(Debug)]
pub struct System {
    processors: Vec<Processor>,
    supplies: Vec<ProgramSupply>,
    translators: Vec<PageTranslator>,
    memory: FlatMemory,
    cycle: u64,
}

impl System {
    /// Builds a system running one program per processor.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration; validated here.
    /// * `programs` - One program per processor. Their data images are all
    ///   loaded into the shared memory, in order.
    pub fn new(config: &Config, programs: &[Program]) -> Result<Self, SimError> {
        config.validate()?;
        if programs.is_empty() {
            return Err(ConfigError::Invalid("at least one program is required".into()).into());
        }
        if programs.len() != config.system.processors {
            warn!(
                "configured for {} processors but {} programs given; using {}",
                config.system.processors,
                programs.len(),
                programs.len()
            );
        }
        let mut memory = FlatMemory::new(
            programs.len(),
            config.system.read_latency,
            config.system.write_latency,
            config.system.line_size,
        );
        for program in programs {
            program.load_data(&mut memory);
        }
        Ok(Self {
            processors: programs
                .iter()
                .enumerate()
                .map(|(id, p)| Processor::new(id, config, p.entry_point()))
                .collect(),
            supplies: programs.iter().map(Program::supply).collect(),
            translators: programs
                .iter()
                .map(|p| p.translator(config.system.page_shift))
                .collect(),
            memory,
            cycle: 0,
        })
    }

    /// Advances every processor by one cycle.
    pub fn step(&mut self) -> Result<(), SimError> {
        self.cycle += 1;
        let cycle = self.cycle;
        for ((cpu, supply), translator) in self
            .processors
            .iter_mut()
            .zip(self.supplies.iter_mut())
            .zip(self.translators.iter_mut())
        {
            let mut ports = Ports {
                supply,
                memory: &mut self.memory,
                translator,
            };
            if let Err(source) = cpu.cycle(&mut ports) {
                let diagnostics = cpu.diagnostics();
                warn!("cpu{} fatal at cycle {cycle}: {source}\n{diagnostics}", cpu.id);
                return Err(SimError::Fatal {
                    cpu: cpu.id,
                    cycle,
                    source,
                    diagnostics,
                });
            }
        }
        Ok(())
    }

    /// True once every processor has halted and its memory traffic drained.
    pub fn is_finished(&self) -> bool {
        self.processors
            .iter()
            .all(|p| p.is_halted() && !self.memory.busy(p.id))
    }

    /// Runs until every processor halts or `max_cycles` global cycles pass.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<RunOutcome, SimError> {
        while !self.is_finished() {
            if max_cycles.is_some_and(|m| self.cycle >= m) {
                info!("cycle limit reached at {}", self.cycle);
                return Ok(RunOutcome::CycleLimit { cycles: self.cycle });
            }
            self.step()?;
        }
        info!("all processors halted after {} cycles", self.cycle);
        Ok(RunOutcome::Halted { cycles: self.cycle })
    }

    /// Posts an external interrupt to processor `cpu`.
    pub fn post_interrupt(&mut self, cpu: usize, level: u8) {
        if let Some(p) = self.processors.get_mut(cpu) {
            p.post_interrupt(level);
        }
    }

    /// Global cycles simulated.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// All processors.
    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }

    /// Processor `cpu`.
    pub fn processor(&self, cpu: usize) -> Option<&Processor> {
        self.processors.get(cpu)
    }

    /// Shared memory.
    pub const fn memory(&self) -> &FlatMemory {
        &self.memory
    }

    /// Counters summed over all processors.
    pub fn stats(&self) -> PipelineStats {
        let mut total = PipelineStats::default();
        for p in &self.processors {
            total += p.stats();
        }
        total
    }
}
