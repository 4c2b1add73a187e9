//! Functional-Unit and Memory Issue.
//!
//! Each cycle the oldest ready instruction across the integer, floating-point
//! and address queues is issued while issue width and unit slots remain. The
//! execution effect is computed at issue and completion is scheduled after
//! the category's latency; the slot stays busy for its repeat rate. The memory
//! queue then selects references for the free memory ports.

use tracing::trace;

use super::{Ports, Processor};
use crate::common::error::EngineError;
use crate::isa::{UnitType, execute};

/// Units fed from decode; `Mem` is fed by the memory queue.
const ISSUE_UNITS: [UnitType; 3] = [UnitType::IntAlu, UnitType::Fpu, UnitType::Addr];

impl Processor {
    /// Issues ready instructions and memory references.
    pub(super) fn issue(&mut self, ports: &mut Ports<'_>) -> Result<(), EngineError> {
        let mut budget = self.widths.issue;
        while budget > 0 {
            let oldest = ISSUE_UNITS
                .into_iter()
                .filter(|&u| self.units.free(u) > 0)
                .filter_map(|u| self.units.peek_ready(u).map(|(h, t)| (u, h, t)))
                .min_by_key(|&(_, _, tag)| tag);
            let Some((unit, handle, tag)) = oldest else {
                break;
            };
            let _ = self.units.pop_ready(unit);
            let Ok(inst) = self.instance_mut(handle, tag) else {
                continue;
            };
            let repeat = inst.timing.repeat;
            let latency = inst.timing.latency;
            inst.outcome = execute(&inst.inst, inst.pc, &inst.operands());
            if !self.units.acquire(unit, repeat) {
                return Err(EngineError::Invariant(format!("{unit:?} had no free slot for {tag}")));
            }
            let id = self.completions.schedule((handle, tag), latency);
            self.instance_mut(handle, tag)?.completion = Some(id);
            trace!("IS {tag} on {unit:?}, done in {latency}");
            budget -= 1;
        }

        let head = self.active.head().map(|e| e.tag);
        let ports_free = self.units.free(UnitType::Mem);
        let requests = self.memq.issue(head, ports_free, &mut self.stats);
        for req in requests {
            if !self.units.acquire(UnitType::Mem, self.latency.mem_port.repeat) {
                return Err(EngineError::Invariant(format!("memory port overcommitted by {}", req.tag)));
            }
            ports.memory.submit(self.id, req, self.cycle);
        }
        Ok(())
    }
}
