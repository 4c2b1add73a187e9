//! Reference Shared Memory.
//!
//! This module implements a flat, sparse, little-endian data memory shared by
//! every processor. It provides:
//! 1. **Storage:** Byte-granular backing store; untouched bytes read as zero.
//! 2. **Timing:** Fixed read and write latencies per request.
//! 3. **Ordering:** Requests perform when their reply is delivered, in
//!    submission order among requests due in the same cycle.
//! 4. **Coherence:** Every performed write invalidates the line in all other
//!    processors. The invalidation is only sent once the write has performed.

use std::collections::{HashMap, VecDeque};

use tracing::trace;

use crate::common::data::{AccessType, MemWidth};
use crate::config::SystemConfig;
use crate::soc::traits::{MemEvent, MemRequest, MemorySystem};

/// A request waiting for its latency to elapse.
#[derive(Clone, Copy, Debug)]
struct Pending {
    due: u64,
    req: MemRequest,
}

/// Flat shared memory with fixed latencies.
#[derive(Debug)]
pub struct FlatMemory {
    bytes: HashMap<u64, u8>,
    read_latency: u64,
    write_latency: u64,
    line_size: u64,
    pending: Vec<VecDeque<Pending>>,
    invalidations: Vec<Vec<u64>>,
}

impl FlatMemory {
    /// Creates an empty memory for `processors` processors.
    ///
    /// # Arguments
    ///
    /// * `processors` - Number of processors that submit requests.
    /// * `read_latency` - Cycles from submission to the reply of a read or atomic.
    /// * `write_latency` - Cycles from submission to the reply of a write.
    /// * `line_size` - Coherence granule in bytes.
    pub fn new(processors: usize, read_latency: u64, write_latency: u64, line_size: u64) -> Self {
        Self {
            bytes: HashMap::new(),
            read_latency,
            write_latency,
            line_size: line_size.max(1),
            pending: vec![VecDeque::new(); processors],
            invalidations: vec![Vec::new(); processors],
        }
    }

    /// Creates a memory from the system section of the configuration.
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self::new(cfg.processors, cfg.read_latency, cfg.write_latency, cfg.line_size)
    }

    /// Reads `width` bytes at `addr`, zero-extended.
    pub fn read(&self, addr: u64, width: MemWidth) -> u64 {
        (0..width.bytes()).fold(0, |acc, i| {
            let byte = self.bytes.get(&addr.wrapping_add(i)).copied().unwrap_or(0);
            acc | (u64::from(byte) << (8 * i))
        })
    }

    /// Writes the low `width` bytes of `value` at `addr`.
    pub fn write(&mut self, addr: u64, width: MemWidth, value: u64) {
        for i in 0..width.bytes() {
            let _ = self.bytes.insert(addr.wrapping_add(i), (value >> (8 * i)) as u8);
        }
    }

    /// Copies a byte image into memory at `addr`.
    pub fn load(&mut self, addr: u64, data: &[u8]) {
        for (i, &b) in data.iter().enumerate() {
            let _ = self.bytes.insert(addr.wrapping_add(i as u64), b);
        }
    }

    fn line_of(&self, addr: u64) -> u64 {
        addr - addr % self.line_size
    }

    /// Performs a request and returns the reply value.
    fn perform(&mut self, cpu: usize, req: &MemRequest) -> u64 {
        let old = self.read(req.paddr, req.width);
        let new = match req.access {
            AccessType::Read => return old,
            AccessType::Write => req.data,
            AccessType::Rmw(op) => op.apply(old, req.data, req.compare),
        };
        self.write(req.paddr, req.width, new);
        let line = self.line_of(req.paddr);
        for (other, queue) in self.invalidations.iter_mut().enumerate() {
            if other != cpu {
                queue.push(line);
            }
        }
        trace!("cpu{cpu} {} wrote {new:#x} at {:#x}", req.tag, req.paddr);
        if matches!(req.access, AccessType::Write) { 0 } else { old }
    }
}

impl MemorySystem for FlatMemory {
    fn submit(&mut self, cpu: usize, req: MemRequest, now: u64) {
        let latency = match req.access {
            AccessType::Write => self.write_latency,
            AccessType::Read | AccessType::Rmw(_) => self.read_latency,
        };
        if cpu >= self.pending.len() {
            self.pending.resize_with(cpu + 1, VecDeque::new);
            self.invalidations.resize_with(cpu + 1, Vec::new);
        }
        self.pending[cpu].push_back(Pending {
            due: now + latency.max(1),
            req,
        });
    }

    fn poll(&mut self, cpu: usize, now: u64) -> Vec<MemEvent> {
        let mut events: Vec<MemEvent> = self
            .invalidations
            .get_mut(cpu)
            .map(std::mem::take)
            .unwrap_or_default()
            .into_iter()
            .map(|line| MemEvent::Invalidate { line })
            .collect();
        let Some(queue) = self.pending.get_mut(cpu) else {
            return events;
        };
        let mut due = Vec::new();
        let mut i = 0;
        while i < queue.len() {
            if queue[i].due <= now {
                if let Some(p) = queue.remove(i) {
                    due.push(p);
                }
            } else {
                i += 1;
            }
        }
        for p in due {
            let value = self.perform(cpu, &p.req);
            events.push(MemEvent::Reply { id: p.req.id, value });
        }
        events
    }

    fn line_size(&self) -> u64 {
        self.line_size
    }

    fn busy(&self, cpu: usize) -> bool {
        self.pending.get(cpu).is_some_and(|q| !q.is_empty())
    }
}
