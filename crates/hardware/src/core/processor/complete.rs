//! Completion.
//!
//! Collects the outputs of the cycle: unit completions that fall due are
//! moved to the done list consumed by the next update, and memory-system
//! events are applied to the memory queue.

use tracing::{debug, trace};

use super::{Ports, Processor};
use crate::common::error::EngineError;
use crate::core::pipeline::memq::{LimboKill, ReplyOutcome, Restart};
use crate::soc::traits::MemEvent;

impl Processor {
    /// Gathers unit completions and memory replies.
    pub(super) fn complete(&mut self, ports: &mut Ports<'_>) -> Result<(), EngineError> {
        while let Some((handle, tag)) = self.completions.pop_due() {
            if let Ok(inst) = self.instance_mut(handle, tag) {
                inst.completion = None;
                trace!("CO {tag}");
                self.done_list.push((handle, tag));
            }
        }

        for event in ports.memory.poll(self.id, self.cycle) {
            match event {
                MemEvent::Reply { id, value } => match self.memq.complete(id, value, &mut self.stats) {
                    Some(ReplyOutcome::Bound(tag)) => trace!("CO {tag} bound {value:#x}"),
                    Some(ReplyOutcome::StoreDone(tag)) => trace!("CO {tag} store performed"),
                    Some(ReplyOutcome::Restarted(kill)) => self.restart_reference(kill)?,
                    None => trace!("CO reply {id} for a flushed reference"),
                },
                MemEvent::Invalidate { line } => {
                    let kills = self.memq.invalidate(line, ports.memory.line_size(), &mut self.stats);
                    for kill in kills {
                        self.restart_reference(kill)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Restarts a load killed by the memory queue.
    ///
    /// A reissued load keeps its address and goes back to memory from the
    /// queue. A soft exception also recomputes and retranslates the address.
    pub(super) fn restart_reference(&mut self, kill: LimboKill) -> Result<(), EngineError> {
        match kill.restart {
            Restart::Reissue => {
                trace!("CO {} reissues", kill.tag);
                Ok(())
            }
            Restart::Retranslate(code) => {
                debug!("EX soft {code} restarts {}", kill.tag);
                let Ok(inst) = self.instance_mut(kill.handle, kill.tag) else {
                    return Ok(());
                };
                inst.progress.addr_ready = false;
                inst.progress.queued = false;
                self.dispatch(kill.handle, kill.tag)
            }
        }
    }
}
