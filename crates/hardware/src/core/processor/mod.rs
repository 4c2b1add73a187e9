//! Processor Context and Cycle Driver.
//!
//! This module defines the `Processor` structure, which owns every piece of
//! per-processor pipeline state. Each simulated cycle runs the stages in a
//! fixed order:
//! 1. **Update:** Apply results completed last cycle and release held load values.
//! 2. **Graduate:** Retire in order, take exceptions at the head, mark stores and barriers ready.
//! 3. **Decode:** Rename and dependency-check the next fetch group.
//! 4. **Fetch:** Pull instructions from the supply and predict control flow.
//! 5. **Issue:** Move ready instructions to functional units and references to memory.
//! 6. **Complete:** Collect unit and memory outputs for the next update.

/// Collection of unit and memory outputs.
pub mod complete;

/// Decode, rename and dispatch.
pub mod decode;

/// Trap entry and serializing instructions.
pub mod exception;

/// Instruction fetch and control-flow prediction.
pub mod fetch;

/// In-order graduation.
pub mod graduate;

/// Functional-unit and memory issue.
pub mod issue;

/// Branch recovery and pipeline flush.
pub mod recovery;

/// Writeback of completed results.
pub mod update;

use std::collections::VecDeque;
use std::fmt::Write as _;

use crate::common::error::EngineError;
use crate::common::reg::LogicalReg;
use crate::common::tag::Tag;
use crate::config::{Config, LatencyConfig};
use crate::core::arch::{ArchRegisters, Pstate, TrapStack};
use crate::core::arena::{Arena, InstHandle};
use crate::core::instance::{Instance, Prediction};
use crate::core::pipeline::{
    ActiveList, BranchQueue, EventQueue, FunctionalUnits, MemoryQueue, RegisterState, StallQueues,
    TagConverter,
};
use crate::core::units::bru::Predictor;
use crate::soc::traits::{AddressTranslator, FetchedInst, InstructionSupply, MemorySystem};
use crate::stats::PipelineStats;

/// Collaborators a processor talks to during a cycle.
pub struct Ports<'a> {
    /// Instruction source.
    pub supply: &'a mut dyn InstructionSupply,
    /// Shared data memory.
    pub memory: &'a mut dyn MemorySystem,
    /// Data TLB.
    pub translator: &'a mut dyn AddressTranslator,
}

impl std::fmt::Debug for Ports<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ports").finish_non_exhaustive()
    }
}

/// An instruction waiting in the fetch queue.
#[derive(Clone, Copy, Debug)]
pub struct FetchEntry {
    /// Instruction as returned by the supply.
    pub fetched: FetchedInst,
    /// Prediction made for control transfers.
    pub prediction: Option<Prediction>,
}

/// Reason fetch is stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchBlock {
    /// An indirect jump whose target fetch could not predict.
    Indirect,
    /// A fetch fault; the trap at graduation redirects fetch.
    Fault,
}

/// Sizes and rates copied out of the configuration.
#[derive(Clone, Debug)]
struct Widths {
    decode: usize,
    issue: usize,
    graduation: usize,
    fetch_queue: usize,
}

/// Per-processor simulation context.
///
/// All pipeline state for one processor lives here; nothing is shared with
/// other processors except through the [`MemorySystem`].
#[derive(Debug)]
pub struct Processor {
    /// Processor index within the system.
    pub id: usize,
    /// Cycles simulated.
    pub cycle: u64,

    widths: Widths,
    latency: LatencyConfig,
    trap_table_base: u64,

    /// Dynamic instructions, indexed by generation-checked handles.
    arena: Arena<Instance>,
    /// Live tag window.
    tags: TagConverter,
    /// Reorder buffer.
    active: ActiveList,
    /// Free lists, rename maps and physical values.
    regs: RegisterState,
    /// Waiters per physical register.
    stalls: StallQueues,
    /// Rename checkpoints for unresolved branches.
    branches: BranchQueue,
    /// Unit slots and ready queues.
    units: FunctionalUnits,
    /// Pending unit completions.
    completions: EventQueue<(InstHandle, Tag)>,
    /// Completed this cycle; applied by the next update.
    done_list: Vec<(InstHandle, Tag)>,
    /// Memory disambiguation engine.
    memq: MemoryQueue,

    fetch_queue: VecDeque<FetchEntry>,
    fetch_pc: u64,
    fetch_block: Option<FetchBlock>,
    predictor: Predictor,

    /// Committed register state.
    arch: ArchRegisters,
    /// Processor state word.
    pstate: Pstate,
    /// Processor interrupt level.
    pil: u8,
    /// Saved trap states.
    traps: TrapStack,
    pending_interrupt: Option<u8>,
    halted: bool,

    /// Counters.
    stats: PipelineStats,
}

impl Processor {
    /// Creates a processor that starts fetching at `entry`.
    ///
    /// # Arguments
    ///
    /// * `id` - Index of the processor in the system.
    /// * `config` - Validated configuration.
    /// * `entry` - Initial fetch address.
    pub fn new(id: usize, config: &Config, entry: u64) -> Self {
        let p = &config.pipeline;
        Self {
            id,
            cycle: 0,
            widths: Widths {
                decode: p.decode_width,
                issue: p.issue_width,
                graduation: p.graduation_width,
                fetch_queue: p.fetch_queue_size,
            },
            latency: config.latency.clone(),
            trap_table_base: config.trap.table_base,
            arena: Arena::with_capacity(p.active_list_size),
            tags: TagConverter::new(),
            active: ActiveList::new(p.active_list_size),
            regs: RegisterState::new(p.int_phys_regs, p.fp_phys_regs),
            stalls: StallQueues::new(p.int_phys_regs, p.fp_phys_regs),
            branches: BranchQueue::new(p.shadow_mappers),
            units: FunctionalUnits::new(&config.units),
            completions: EventQueue::new(),
            done_list: Vec::new(),
            memq: MemoryQueue::new(&config.memory),
            fetch_queue: VecDeque::with_capacity(p.fetch_queue_size),
            fetch_pc: entry,
            fetch_block: None,
            predictor: Predictor::new(p),
            arch: ArchRegisters::default(),
            pstate: Pstate {
                privileged: config.trap.start_privileged,
                interrupts_enabled: config.trap.interrupts_enabled,
            },
            pil: 0,
            traps: TrapStack::new(config.trap.max_trap_level),
            pending_interrupt: None,
            halted: false,
            stats: PipelineStats::default(),
        }
    }

    /// Simulates one cycle.
    ///
    /// A halted processor does nothing. Any error is fatal: the pipeline state
    /// is left as it was when the invariant broke, for [`Self::diagnostics`].
    pub fn cycle(&mut self, ports: &mut Ports<'_>) -> Result<(), EngineError> {
        if self.halted {
            return Ok(());
        }
        self.cycle += 1;
        self.stats.cycles = self.cycle;
        self.completions.set_now(self.cycle);
        self.units.tick(self.cycle);

        self.update(ports)?;
        self.graduate()?;
        if self.halted {
            return Ok(());
        }
        self.decode()?;
        self.fetch(ports);
        self.issue(ports)?;
        self.complete(ports)?;
        Ok(())
    }

    /// Posts an external interrupt at `level`. The highest pending level wins.
    pub fn post_interrupt(&mut self, level: u8) {
        let level = level & 0xF;
        self.pending_interrupt = Some(self.pending_interrupt.map_or(level, |p| p.max(level)));
    }

    /// True once a `Halt` instruction has graduated.
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// True if nothing is left in flight.
    pub fn is_drained(&self) -> bool {
        self.active.is_empty() && self.memq.is_empty() && self.completions.is_empty()
    }

    /// Counters collected so far.
    pub const fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Committed value of a logical register.
    pub fn arch_reg(&self, reg: LogicalReg) -> u64 {
        self.arch.read(reg)
    }

    /// Current processor state word.
    pub const fn pstate(&self) -> Pstate {
        self.pstate
    }

    /// Current trap level.
    pub fn trap_level(&self) -> usize {
        self.traps.level()
    }

    /// Next fetch address.
    pub const fn fetch_pc(&self) -> u64 {
        self.fetch_pc
    }

    /// Reorder buffer.
    pub const fn active_list(&self) -> &ActiveList {
        &self.active
    }

    /// Rename state.
    pub const fn registers(&self) -> &RegisterState {
        &self.regs
    }

    /// Memory disambiguation engine.
    pub const fn memory_queue(&self) -> &MemoryQueue {
        &self.memq
    }

    /// Tag converter.
    pub const fn tag_converter(&self) -> &TagConverter {
        &self.tags
    }

    /// Branch checkpoints.
    pub const fn branch_queue(&self) -> &BranchQueue {
        &self.branches
    }

    /// Human-readable dump of the pipeline, for fatal-error reports.
    pub fn diagnostics(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "cpu{} cycle {} fetch_pc {:#x} block {:?} halted {}",
            self.id, self.cycle, self.fetch_pc, self.fetch_block, self.halted
        );
        let _ = writeln!(
            out,
            "pstate {:#x} pil {} tl {} next tag {}",
            self.pstate.bits(),
            self.pil,
            self.traps.level(),
            self.tags.next_tag()
        );
        let _ = writeln!(
            out,
            "active {}/{} memq {} branches {} stalls {} fetchq {}",
            self.active.len(),
            self.active.capacity(),
            self.memq.len(),
            self.branches.len(),
            self.stalls.len(),
            self.fetch_queue.len()
        );
        for e in self.active.iter().take(8) {
            let op = self.arena.get(e.handle).map(|i| i.inst.op);
            let _ = writeln!(
                out,
                "  {} pc {:#x} {:?} done {} exc {}",
                e.tag, e.pc, op, e.done, e.exception
            );
        }
        for e in self.memq.iter().take(8) {
            let _ = writeln!(
                out,
                "  mem {} {:?} {:?} addr {:#x} ready {} retire {} limbo {:?}",
                e.tag, e.kind, e.progress, e.paddr, e.addr_ready, e.ready_to_retire, e.limbo
            );
        }
        out.push_str(&self.arch.dump());
        out
    }

    /// Instance behind a live handle.
    fn instance(&self, handle: InstHandle, tag: Tag) -> Result<&Instance, EngineError> {
        self.arena
            .get(handle)
            .filter(|i| i.tag == tag)
            .ok_or(EngineError::StaleHandle(tag))
    }

    fn instance_mut(&mut self, handle: InstHandle, tag: Tag) -> Result<&mut Instance, EngineError> {
        self.arena
            .get_mut(handle)
            .filter(|i| i.tag == tag)
            .ok_or(EngineError::StaleHandle(tag))
    }
}
