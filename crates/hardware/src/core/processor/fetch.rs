//! Instruction Fetch.
//!
//! Fetch pulls up to a decode group of instructions per cycle from the
//! instruction supply into the fetch queue and predicts control flow:
//! 1. **Direct Branches:** Conditional branches ask the direction predictor;
//!    `Always`/`Never` and calls cannot be mispredicted.
//! 2. **Returns:** Predicted from the return-address stack.
//! 3. **Indirect Jumps:** Stop fetch until the jump resolves.
//!
//! A predicted-taken transfer ends the fetch group; a fetch fault stops
//! fetch until the trap redirects it.

use tracing::trace;

use super::{FetchBlock, FetchEntry, Processor};
use crate::core::instance::{BranchKind, Prediction};
use crate::core::units::bru::BranchPredictor;
use crate::isa::{Cond, Opcode, StaticInst};
use crate::soc::traits::FetchedInst;

/// Static target of a direct branch or call.
fn direct_target(inst: &StaticInst, pc: u64) -> u64 {
    inst.target.unwrap_or_else(|| pc.wrapping_add(inst.imm as u64))
}

impl Processor {
    /// Fetches the next group of instructions.
    pub(super) fn fetch(&mut self, ports: &mut super::Ports<'_>) {
        if self.fetch_block.is_some() {
            return;
        }
        let privileged = self.pstate.privileged;
        for _ in 0..self.widths.decode {
            if self.fetch_queue.len() >= self.widths.fetch_queue {
                break;
            }
            let pc = self.fetch_pc;
            let fetched = ports.supply.fetch(pc, privileged);
            self.stats.fetched += 1;

            if fetched.exception.is_some() {
                trace!("FE {pc:#x} fault {}", fetched.exception);
                self.fetch_queue.push_back(FetchEntry {
                    fetched,
                    prediction: None,
                });
                self.fetch_block = Some(FetchBlock::Fault);
                break;
            }

            let prediction = self.predict(&fetched);
            trace!("FE {pc:#x} {:?} {:?}", fetched.inst.op, prediction.map(|p| p.kind));
            self.fetch_queue.push_back(FetchEntry { fetched, prediction });

            match prediction {
                Some(p) if p.kind == BranchKind::Indirect => {
                    self.fetch_block = Some(FetchBlock::Indirect);
                    break;
                }
                Some(p) => {
                    self.fetch_pc = p.next_pc;
                    if p.taken {
                        break;
                    }
                }
                None => self.fetch_pc = pc.wrapping_add(4),
            }
        }
    }

    /// Predicts a control transfer; `None` for anything else.
    fn predict(&mut self, fetched: &FetchedInst) -> Option<Prediction> {
        let pc = fetched.pc;
        let npc = pc.wrapping_add(4);
        let inst = &fetched.inst;
        let prediction = match inst.op {
            Opcode::Branch(cond) if cond.is_unconditional() => {
                let taken = cond != Cond::Never;
                Prediction {
                    kind: BranchKind::Unconditional,
                    taken,
                    next_pc: if taken { direct_target(inst, pc) } else { npc },
                }
            }
            Opcode::Branch(_) => {
                let taken = self.predictor.predict(pc);
                Prediction {
                    kind: BranchKind::Conditional,
                    taken,
                    next_pc: if taken { direct_target(inst, pc) } else { npc },
                }
            }
            Opcode::Call => {
                self.predictor.push_return(npc);
                Prediction {
                    kind: BranchKind::Call,
                    taken: true,
                    next_pc: direct_target(inst, pc),
                }
            }
            Opcode::Jmpl { ret: true } => self.predictor.pop_return().map_or(
                Prediction {
                    kind: BranchKind::Indirect,
                    taken: true,
                    next_pc: npc,
                },
                |target| Prediction {
                    kind: BranchKind::Return,
                    taken: true,
                    next_pc: target,
                },
            ),
            Opcode::Jmpl { ret: false } => Prediction {
                kind: BranchKind::Indirect,
                taken: true,
                next_pc: npc,
            },
            _ => return None,
        };
        Some(prediction)
    }
}
