//! Pipeline statistics collection and reporting.
//!
//! This module tracks per-processor event counts. It provides:
//! 1. **Throughput:** Cycles, fetched, decoded and graduated instructions, and IPC.
//! 2. **Stalls:** Decode stall cycles by cause.
//! 3. **Branches:** Resolved branches and mispredictions.
//! 4. **Memory:** Forwards, partial overlaps, limbo kills, re-executions and coherence restarts.
//! 5. **Exceptions:** Soft and hard exceptions, traps and interrupts.

use std::fmt;
use std::ops::AddAssign;

use serde::Serialize;

/// Reason decode could not accept the next instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StallCause {
    /// A physical register file has no free register.
    Rename,
    /// The active list is full.
    ReorderBufferFull,
    /// No shadow mapper is free for a predicted branch.
    ShadowMapperExhausted,
    /// Fetch is blocked on an unpredicted indirect jump.
    UnresolvedBranch,
    /// The memory queue is full.
    MemQueueFull,
}

impl fmt::Display for StallCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rename => "rename",
            Self::ReorderBufferFull => "reorder-buffer-full",
            Self::ShadowMapperExhausted => "shadow-mapper-exhausted",
            Self::UnresolvedBranch => "unresolved-branch",
            Self::MemQueueFull => "mem-queue-full",
        };
        f.write_str(s)
    }
}

/// Event counters of one processor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Cycles simulated.
    pub cycles: u64,
    /// Instructions fetched.
    pub fetched: u64,
    /// Instructions decoded.
    pub decoded: u64,
    /// Instructions graduated.
    pub graduated: u64,

    /// Decode stalls: no free physical register.
    pub stall_rename: u64,
    /// Decode stalls: active list full.
    pub stall_rob_full: u64,
    /// Decode stalls: no free shadow mapper.
    pub stall_shadow: u64,
    /// Decode stalls: fetch blocked on an indirect jump.
    pub stall_unresolved_branch: u64,
    /// Decode stalls: memory queue full.
    pub stall_memq_full: u64,

    /// Control transfers resolved.
    pub branches: u64,
    /// Control transfers resolved against their prediction.
    pub mispredictions: u64,

    /// Loads satisfied by store forwarding.
    pub forwards: u64,
    /// Loads delayed by a partially overlapping older store.
    pub partial_overlaps: u64,
    /// Loads invalidated when an older store resolved to an overlapping address.
    pub limbo_kills: u64,
    /// Loads reissued from the memory queue after a kill.
    pub reexecutions: u64,
    /// Soft exceptions taken.
    pub soft_exceptions: u64,
    /// Loads restarted by a remote write to their line.
    pub coherence_restarts: u64,

    /// Hard exceptions reaching the head of the active list.
    pub hard_exceptions: u64,
    /// Traps vectored through the trap table.
    pub traps: u64,
    /// External interrupts taken.
    pub interrupts: u64,

    /// Loads graduated.
    pub loads: u64,
    /// Stores graduated.
    pub stores: u64,
    /// Read-modify-write operations graduated.
    pub rmws: u64,
}

impl PipelineStats {
    /// Counts one decode stall.
    pub const fn record_stall(&mut self, cause: StallCause) {
        match cause {
            StallCause::Rename => self.stall_rename += 1,
            StallCause::ReorderBufferFull => self.stall_rob_full += 1,
            StallCause::ShadowMapperExhausted => self.stall_shadow += 1,
            StallCause::UnresolvedBranch => self.stall_unresolved_branch += 1,
            StallCause::MemQueueFull => self.stall_memq_full += 1,
        }
    }

    /// Graduated instructions per cycle.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.graduated as f64 / self.cycles as f64
        }
    }

    /// Fraction of resolved branches that were predicted correctly.
    pub fn branch_accuracy(&self) -> f64 {
        if self.branches == 0 {
            1.0
        } else {
            1.0 - self.mispredictions as f64 / self.branches as f64
        }
    }
}

impl AddAssign<&Self> for PipelineStats {
    fn add_assign(&mut self, o: &Self) {
        self.cycles = self.cycles.max(o.cycles);
        self.fetched += o.fetched;
        self.decoded += o.decoded;
        self.graduated += o.graduated;
        self.stall_rename += o.stall_rename;
        self.stall_rob_full += o.stall_rob_full;
        self.stall_shadow += o.stall_shadow;
        self.stall_unresolved_branch += o.stall_unresolved_branch;
        self.stall_memq_full += o.stall_memq_full;
        self.branches += o.branches;
        self.mispredictions += o.mispredictions;
        self.forwards += o.forwards;
        self.partial_overlaps += o.partial_overlaps;
        self.limbo_kills += o.limbo_kills;
        self.reexecutions += o.reexecutions;
        self.soft_exceptions += o.soft_exceptions;
        self.coherence_restarts += o.coherence_restarts;
        self.hard_exceptions += o.hard_exceptions;
        self.traps += o.traps;
        self.interrupts += o.interrupts;
        self.loads += o.loads;
        self.stores += o.stores;
        self.rmws += o.rmws;
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==========================================================")?;
        writeln!(f, "CORE")?;
        writeln!(f, "  cycles                   {}", self.cycles)?;
        writeln!(f, "  fetched                  {}", self.fetched)?;
        writeln!(f, "  decoded                  {}", self.decoded)?;
        writeln!(f, "  graduated                {}", self.graduated)?;
        writeln!(f, "  ipc                      {:.4}", self.ipc())?;
        writeln!(f, "DECODE STALLS")?;
        writeln!(f, "  {:<24} {}", StallCause::Rename, self.stall_rename)?;
        writeln!(f, "  {:<24} {}", StallCause::ReorderBufferFull, self.stall_rob_full)?;
        writeln!(f, "  {:<24} {}", StallCause::ShadowMapperExhausted, self.stall_shadow)?;
        writeln!(f, "  {:<24} {}", StallCause::UnresolvedBranch, self.stall_unresolved_branch)?;
        writeln!(f, "  {:<24} {}", StallCause::MemQueueFull, self.stall_memq_full)?;
        writeln!(f, "BRANCHES")?;
        writeln!(f, "  resolved                 {}", self.branches)?;
        writeln!(f, "  mispredicted             {}", self.mispredictions)?;
        writeln!(f, "  accuracy                 {:.2}%", self.branch_accuracy() * 100.0)?;
        writeln!(f, "MEMORY")?;
        writeln!(f, "  loads / stores / rmws    {} / {} / {}", self.loads, self.stores, self.rmws)?;
        writeln!(f, "  forwards                 {}", self.forwards)?;
        writeln!(f, "  partial overlaps         {}", self.partial_overlaps)?;
        writeln!(f, "  limbo kills              {}", self.limbo_kills)?;
        writeln!(f, "  re-executions            {}", self.reexecutions)?;
        writeln!(f, "  coherence restarts       {}", self.coherence_restarts)?;
        writeln!(f, "EXCEPTIONS")?;
        writeln!(f, "  soft                     {}", self.soft_exceptions)?;
        writeln!(f, "  hard                     {}", self.hard_exceptions)?;
        writeln!(f, "  traps                    {}", self.traps)?;
        writeln!(f, "  interrupts               {}", self.interrupts)?;
        write!(f, "==========================================================")
    }
}
