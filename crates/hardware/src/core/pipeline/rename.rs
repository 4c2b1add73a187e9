//! Register renaming.
//!
//! Each physical register file has a free list, a logical→physical map and
//! the physical values with their busy bits:
//! 1. **Allocation:** A destination takes a register from the free list and marks it busy.
//! 2. **Release:** Graduation frees the previous mapping; a flush frees the new one.
//! 3. **Checkpoints:** The maps of both files can be snapshotted and restored as values.
//!
//! At reset logical register `i` maps to physical register `i` and the rest
//! of the file is free.

use std::collections::VecDeque;

use crate::common::error::EngineError;
use crate::common::reg::{LogicalReg, PhysReg, RegFile};

/// Free list of one physical register file.
#[derive(Debug, Clone)]
pub struct FreeList {
    file: RegFile,
    free: VecDeque<PhysReg>,
    is_free: Vec<bool>,
}

impl FreeList {
    /// Creates a free list over `total` registers with the first `reserved` in use.
    pub fn new(file: RegFile, total: usize, reserved: usize) -> Self {
        let mut is_free = vec![false; total];
        let mut free = VecDeque::with_capacity(total);
        for (r, slot) in is_free.iter_mut().enumerate().skip(reserved) {
            *slot = true;
            free.push_back(PhysReg(r as u16));
        }
        Self {
            file,
            free,
            is_free,
        }
    }

    /// Takes a register, or `None` if the list is empty.
    pub fn allocate(&mut self) -> Option<PhysReg> {
        let reg = self.free.pop_front()?;
        self.is_free[reg.idx()] = false;
        Some(reg)
    }

    /// Returns a register to the list.
    pub fn release(&mut self, reg: PhysReg) -> Result<(), EngineError> {
        match self.is_free.get_mut(reg.idx()) {
            Some(slot) if !*slot => {
                *slot = true;
                self.free.push_back(reg);
                Ok(())
            }
            _ => Err(EngineError::DoubleFree {
                file: self.file,
                reg,
            }),
        }
    }

    /// Number of free registers.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// True if no register is free.
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// True if `reg` is currently free.
    pub fn contains(&self, reg: PhysReg) -> bool {
        self.is_free.get(reg.idx()).copied().unwrap_or(false)
    }
}

/// Logical → physical map of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameMap {
    map: Vec<PhysReg>,
}

impl RenameMap {
    /// Identity map over `logical` registers.
    pub fn identity(logical: usize) -> Self {
        Self {
            map: (0..logical).map(|i| PhysReg(i as u16)).collect(),
        }
    }

    /// Current mapping of a logical register.
    #[inline]
    pub fn get(&self, logical: u16) -> PhysReg {
        self.map[logical as usize]
    }

    /// Replaces a mapping and returns the previous one.
    #[inline]
    pub fn set(&mut self, logical: u16, phys: PhysReg) -> PhysReg {
        std::mem::replace(&mut self.map[logical as usize], phys)
    }

    /// Every mapping in logical order.
    pub fn as_slice(&self) -> &[PhysReg] {
        &self.map
    }
}

/// Physical register values and busy bits of one file.
#[derive(Debug, Clone)]
pub struct PhysFile {
    values: Vec<u64>,
    busy: Vec<bool>,
}

impl PhysFile {
    /// Creates `total` ready registers holding zero.
    pub fn new(total: usize) -> Self {
        Self {
            values: vec![0; total],
            busy: vec![false; total],
        }
    }

    /// Register value.
    #[inline]
    pub fn value(&self, reg: PhysReg) -> u64 {
        self.values[reg.idx()]
    }

    /// True while the producer has not written the register.
    #[inline]
    pub fn is_busy(&self, reg: PhysReg) -> bool {
        self.busy[reg.idx()]
    }

    /// Marks a freshly allocated register busy.
    #[inline]
    pub fn set_busy(&mut self, reg: PhysReg) {
        self.busy[reg.idx()] = true;
    }

    /// Writes a value and clears the busy bit.
    #[inline]
    pub fn write(&mut self, reg: PhysReg, value: u64) {
        self.values[reg.idx()] = value;
        self.busy[reg.idx()] = false;
    }
}

/// Rename state of one register file.
#[derive(Debug, Clone)]
pub struct RegFileState {
    /// Free registers.
    pub free: FreeList,
    /// Current speculative map.
    pub map: RenameMap,
    /// Values and busy bits.
    pub phys: PhysFile,
}

/// Snapshot of both rename maps, taken for branch checkpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSnapshot {
    maps: [RenameMap; 2],
}

/// Rename state of both register files.
#[derive(Debug, Clone)]
pub struct RegisterState {
    files: [RegFileState; 2],
}

impl RegisterState {
    /// Creates identity-mapped files with `int_phys` and `fp_phys` registers.
    pub fn new(int_phys: usize, fp_phys: usize) -> Self {
        let make = |file: RegFile, total: usize| {
            let logical = file.logical_count();
            RegFileState {
                free: FreeList::new(file, total, logical),
                map: RenameMap::identity(logical),
                phys: PhysFile::new(total),
            }
        };
        Self {
            files: [make(RegFile::Int, int_phys), make(RegFile::Fp, fp_phys)],
        }
    }

    /// State of one file.
    #[inline]
    pub fn file(&self, file: RegFile) -> &RegFileState {
        &self.files[file.index()]
    }

    /// Mutable state of one file.
    #[inline]
    pub fn file_mut(&mut self, file: RegFile) -> &mut RegFileState {
        &mut self.files[file.index()]
    }

    /// Current mapping of a logical register.
    pub fn lookup(&self, reg: LogicalReg) -> PhysReg {
        self.file(reg.file).map.get(reg.index)
    }

    /// Renames `reg` to a fresh busy register, returning `(new, old)`.
    pub fn rename(&mut self, reg: LogicalReg) -> Result<(PhysReg, PhysReg), EngineError> {
        let state = self.file_mut(reg.file);
        let new = state
            .free
            .allocate()
            .ok_or(EngineError::FreeListEmpty(reg.file))?;
        state.phys.set_busy(new);
        let old = state.map.set(reg.index, new);
        Ok((new, old))
    }

    /// Undoes a rename: restores `old` and frees `new`.
    pub fn unrename(&mut self, reg: LogicalReg, new: PhysReg, old: PhysReg) -> Result<(), EngineError> {
        let state = self.file_mut(reg.file);
        let _ = state.map.set(reg.index, old);
        state.free.release(new)
    }

    /// Frees a register.
    pub fn release(&mut self, file: RegFile, reg: PhysReg) -> Result<(), EngineError> {
        self.file_mut(file).free.release(reg)
    }

    /// Number of free registers in a file.
    pub fn free_count(&self, file: RegFile) -> usize {
        self.file(file).free.len()
    }

    /// Snapshot of both maps.
    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            maps: [self.files[0].map.clone(), self.files[1].map.clone()],
        }
    }

    /// Restores both maps from a snapshot.
    pub fn restore(&mut self, snap: &MapSnapshot) {
        for (state, map) in self.files.iter_mut().zip(snap.maps.iter()) {
            state.map.clone_from(map);
        }
    }
}
