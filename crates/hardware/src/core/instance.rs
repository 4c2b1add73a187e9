//! Dynamic instruction instances.
//!
//! An [`Instance`] is created at decode, lives in the processor's arena and is
//! reachable through the tag converter until it graduates or is flushed. It
//! carries the renamed operands, the execution outcome and the progress flags
//! consulted by every stage.

use crate::common::error::ExceptionCode;
use crate::common::reg::PhysReg;
use crate::common::tag::Tag;
use crate::config::Timing;
use crate::core::pipeline::events::EventId;
use crate::isa::{DestPart, ExecOutcome, OpCategory, Operands, SourcePart, SrcRole, StaticInst, UnitType};

/// A renamed source part.
#[derive(Clone, Copy, Debug)]
pub struct SrcSlot {
    /// Role, logical register and part.
    pub src: SourcePart,
    /// Physical register read.
    pub phys: PhysReg,
    /// Value once ready.
    pub value: u64,
    /// True once the value has been captured.
    pub ready: bool,
}

/// A renamed destination part.
#[derive(Clone, Copy, Debug)]
pub struct DestSlot {
    /// Logical register, part, and condition-code marker.
    pub dest: DestPart,
    /// Newly allocated physical register.
    pub phys: PhysReg,
}

/// How fetch predicted a control transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchKind {
    /// Conditional branch predicted by the direction predictor.
    Conditional,
    /// Branch that cannot be mispredicted.
    Unconditional,
    /// Call with a static target.
    Call,
    /// Return predicted by the return-address stack.
    Return,
    /// Indirect jump that fetch could not predict.
    Indirect,
}

/// Prediction made at fetch for a control-transfer instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prediction {
    /// Prediction source.
    pub kind: BranchKind,
    /// Predicted direction.
    pub taken: bool,
    /// PC fetch continued at.
    pub next_pc: u64,
}

impl Prediction {
    /// True if the prediction can be wrong and needs a checkpoint.
    pub const fn needs_checkpoint(&self) -> bool {
        matches!(self.kind, BranchKind::Conditional | BranchKind::Return)
    }
}

/// Progress flags of a dynamic instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Sitting in a unit ready queue or executing.
    pub queued: bool,
    /// Effective address computed (memory operations).
    pub addr_ready: bool,
    /// Data operands captured (stores and atomics).
    pub mem_ready: bool,
    /// Result written back.
    pub done: bool,
}

/// A dynamic instruction.
#[derive(Clone, Debug)]
pub struct Instance {
    /// Program-order tag.
    pub tag: Tag,
    /// Fetch address.
    pub pc: u64,
    /// Decoded static instruction.
    pub inst: StaticInst,
    /// Opcode category resolved at decode.
    pub category: OpCategory,
    /// Unit the instruction executes on, if any.
    pub unit: Option<UnitType>,
    /// Latency and repeat rate on that unit.
    pub timing: Timing,
    /// Renamed sources.
    pub srcs: Vec<SrcSlot>,
    /// Renamed destinations.
    pub dests: Vec<DestSlot>,
    /// Exception code.
    pub exception: ExceptionCode,
    /// Execution outcome once issued.
    pub outcome: ExecOutcome,
    /// Fetch-time prediction for control transfers.
    pub prediction: Option<Prediction>,
    /// Progress flags.
    pub progress: Progress,
    /// Pending completion event, cancelled on flush.
    pub completion: Option<EventId>,
}

impl Instance {
    /// Creates an instance with no renamed operands.
    pub fn new(tag: Tag, pc: u64, inst: StaticInst, timing: Timing) -> Self {
        let category = inst.op.category();
        Self {
            tag,
            pc,
            inst,
            category,
            unit: category.unit(),
            timing,
            srcs: Vec::new(),
            dests: Vec::new(),
            exception: ExceptionCode::Ok,
            outcome: ExecOutcome::default(),
            prediction: None,
            progress: Progress::default(),
            completion: None,
        }
    }

    /// Sequential successor PC.
    #[inline]
    pub const fn npc(&self) -> u64 {
        self.pc.wrapping_add(4)
    }

    /// True once every source whose role satisfies `filter` is ready.
    pub fn sources_ready(&self, filter: impl Fn(SrcRole) -> bool) -> bool {
        self.srcs.iter().filter(|s| filter(s.src.role)).all(|s| s.ready)
    }

    /// True once every address source is ready.
    pub fn address_ready(&self) -> bool {
        self.sources_ready(|r| self.inst.is_address_role(r))
    }

    /// True once every data (non-address) source is ready.
    pub fn data_ready(&self) -> bool {
        self.sources_ready(|r| !self.inst.is_address_role(r))
    }

    /// True once every source is ready.
    pub fn all_ready(&self) -> bool {
        self.srcs.iter().all(|s| s.ready)
    }

    /// Assembles captured source values by role.
    pub fn operands(&self) -> Operands {
        let mut vals = [0u64; 4];
        for s in &self.srcs {
            let i = s.src.role.index();
            vals[i] = s.src.part.assemble(vals[i], s.value);
        }
        Operands {
            rs1: vals[SrcRole::Rs1.index()],
            rs2: vals[SrcRole::Rs2.index()],
            rd: vals[SrcRole::Rd.index()],
            cc: vals[SrcRole::Cc.index()],
        }
    }

    /// Value written to each destination, in destination order.
    pub fn dest_values(&self, result: u64) -> Vec<(DestSlot, u64)> {
        self.dests
            .iter()
            .map(|d| {
                let v = if d.dest.is_cc {
                    self.outcome.cc.unwrap_or(0)
                } else {
                    d.dest.part.extract(result)
                };
                (*d, v)
            })
            .collect()
    }
}
