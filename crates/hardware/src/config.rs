//! Configuration system for the simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline pipeline sizes, unit counts, and latencies.
//! 2. **Structures:** Hierarchical config for general, pipeline, units, latency, memory,
//!    trap, and system settings.
//! 3. **Enums:** Consistency model, alias-recovery policy, and branch predictor types.
//!
//! Configuration is read once at startup from JSON, or built with `Config::default()`.

use std::path::Path;

use serde::Deserialize;

use crate::common::error::ConfigError;
use crate::common::reg::{FP_LOGICAL_REGS, INT_LOGICAL_REGS};

/// Default configuration constants for the simulator.
mod defaults {
    /// Active list (reorder buffer) depth.
    pub const ACTIVE_LIST_SIZE: usize = 64;

    /// Fetch queue depth.
    pub const FETCH_QUEUE_SIZE: usize = 8;

    /// Instructions decoded per cycle.
    pub const DECODE_WIDTH: usize = 4;

    /// Instructions issued to functional units per cycle.
    pub const ISSUE_WIDTH: usize = 4;

    /// Instructions graduated per cycle.
    pub const GRADUATION_WIDTH: usize = 4;

    /// Integer physical registers.
    pub const INT_PHYS_REGS: usize = 96;

    /// Floating-point physical registers.
    pub const FP_PHYS_REGS: usize = 96;

    /// Branch checkpoints (shadow mappers).
    pub const SHADOW_MAPPERS: usize = 8;

    /// Bimodal predictor table size.
    pub const BHT_SIZE: usize = 512;

    /// Return address stack depth.
    pub const RAS_SIZE: usize = 8;

    /// Integer ALUs.
    pub const INT_ALUS: usize = 2;

    /// Floating-point units.
    pub const FPUS: usize = 2;

    /// Address generation units.
    pub const ADDR_UNITS: usize = 2;

    /// Memory ports (submissions per cycle).
    pub const MEM_PORTS: usize = 2;

    /// Memory queue depth.
    pub const MEM_QUEUE_SIZE: usize = 32;

    /// Maximum trap nesting level.
    pub const MAX_TRAP_LEVEL: usize = 4;

    /// Base address of the trap table.
    pub const TRAP_TABLE_BASE: u64 = 0x0001_0000;

    /// Memory read latency in cycles.
    pub const READ_LATENCY: u64 = 10;

    /// Memory write latency in cycles.
    pub const WRITE_LATENCY: u64 = 10;

    /// Coherence line size in bytes.
    pub const LINE_SIZE: u64 = 64;

    /// Page size as a shift (8 KiB pages).
    pub const PAGE_SHIFT: u32 = 13;
}

/// Memory consistency model enforced by the disambiguation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ConsistencyModel {
    /// Sequential consistency.
    ///
    /// A load stays speculative until every older memory reference has completed.
    #[default]
    #[serde(alias = "SC")]
    Sequential,
    /// Processor consistency.
    ///
    /// A load stays speculative until every older load has completed.
    #[serde(alias = "PC")]
    Processor,
    /// Release consistency.
    ///
    /// Loads are never speculative; only barriers order references.
    #[serde(alias = "RC")]
    Release,
}

/// Recovery taken when a resolved store aliases an already-issued load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AliasRecovery {
    /// Reset the load and issue it again.
    #[default]
    Reexecute,
    /// Raise a soft exception that restarts the load from address generation.
    SoftException,
}

/// Branch prediction algorithm types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BranchPredictor {
    /// Always predict not-taken.
    #[default]
    Static,
    /// Table of 2-bit saturating counters indexed by PC.
    Bimodal,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use mcsim_core::config::{Config, ConsistencyModel};
///
/// let json = r#"{
///     "pipeline": { "active_list_size": 32, "decode_width": 2 },
///     "memory": { "model": "Release" }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.pipeline.active_list_size, 32);
/// assert_eq!(config.memory.model, ConsistencyModel::Release);
/// assert_eq!(config.units.int_alu, 2);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Pipeline structure sizes and widths
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Functional unit counts
    #[serde(default)]
    pub units: UnitConfig,
    /// Per-category latency and repeat rates
    #[serde(default)]
    pub latency: LatencyConfig,
    /// Memory disambiguation settings
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Trap handling settings
    #[serde(default)]
    pub trap: TrapConfig,
    /// Multiprocessor and memory-system settings
    #[serde(default)]
    pub system: SystemConfig,
}

impl Config {
    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks that every size and width is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        let nonzero = [
            ("pipeline.active_list_size", p.active_list_size),
            ("pipeline.fetch_queue_size", p.fetch_queue_size),
            ("pipeline.decode_width", p.decode_width),
            ("pipeline.issue_width", p.issue_width),
            ("pipeline.graduation_width", p.graduation_width),
            ("pipeline.shadow_mappers", p.shadow_mappers),
            ("pipeline.bht_size", p.bht_size),
            ("units.int_alu", self.units.int_alu),
            ("units.fpu", self.units.fpu),
            ("units.addr", self.units.addr),
            ("units.mem_ports", self.units.mem_ports),
            ("memory.queue_size", self.memory.queue_size),
            ("trap.max_trap_level", self.trap.max_trap_level),
            ("system.processors", self.system.processors),
        ];
        if let Some((name, _)) = nonzero.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be non-zero")));
        }
        if p.int_phys_regs <= INT_LOGICAL_REGS {
            return Err(ConfigError::Invalid(format!(
                "pipeline.int_phys_regs must exceed {INT_LOGICAL_REGS}"
            )));
        }
        if p.fp_phys_regs <= FP_LOGICAL_REGS {
            return Err(ConfigError::Invalid(format!(
                "pipeline.fp_phys_regs must exceed {FP_LOGICAL_REGS}"
            )));
        }
        if p.int_phys_regs > usize::from(u16::MAX) || p.fp_phys_regs > usize::from(u16::MAX) {
            return Err(ConfigError::Invalid(
                "physical register counts must fit in 16 bits".to_string(),
            ));
        }
        if !self.system.line_size.is_power_of_two() || self.system.line_size < 8 {
            return Err(ConfigError::Invalid(
                "system.line_size must be a power of two of at least 8".to_string(),
            ));
        }
        if self.latency.all().iter().any(|t| t.latency == 0 || t.repeat == 0) {
            return Err(ConfigError::Invalid(
                "latency and repeat rates must be at least one cycle".to_string(),
            ));
        }
        Ok(())
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Emit per-event pipeline tracing
    #[serde(default)]
    pub trace: bool,

    /// Stop after this many cycles (unbounded if absent)
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

/// Pipeline structure sizes and widths.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Active list depth
    #[serde(default = "PipelineConfig::default_active_list")]
    pub active_list_size: usize,

    /// Fetch queue depth
    #[serde(default = "PipelineConfig::default_fetch_queue")]
    pub fetch_queue_size: usize,

    /// Instructions fetched and decoded per cycle
    #[serde(default = "PipelineConfig::default_decode_width")]
    pub decode_width: usize,

    /// Instructions issued to functional units per cycle
    #[serde(default = "PipelineConfig::default_issue_width")]
    pub issue_width: usize,

    /// Instructions graduated per cycle
    #[serde(default = "PipelineConfig::default_graduation_width")]
    pub graduation_width: usize,

    /// Integer physical registers
    #[serde(default = "PipelineConfig::default_int_regs")]
    pub int_phys_regs: usize,

    /// Floating-point physical registers
    #[serde(default = "PipelineConfig::default_fp_regs")]
    pub fp_phys_regs: usize,

    /// Branch checkpoints available to predicted branches
    #[serde(default = "PipelineConfig::default_shadow_mappers")]
    pub shadow_mappers: usize,

    /// Branch predictor type
    #[serde(default)]
    pub branch_predictor: BranchPredictor,

    /// Bimodal predictor table size
    #[serde(default = "PipelineConfig::default_bht_size")]
    pub bht_size: usize,

    /// Return Address Stack size
    #[serde(default = "PipelineConfig::default_ras_size")]
    pub ras_size: usize,
}

impl PipelineConfig {
    fn default_active_list() -> usize {
        defaults::ACTIVE_LIST_SIZE
    }

    fn default_fetch_queue() -> usize {
        defaults::FETCH_QUEUE_SIZE
    }

    fn default_decode_width() -> usize {
        defaults::DECODE_WIDTH
    }

    fn default_issue_width() -> usize {
        defaults::ISSUE_WIDTH
    }

    fn default_graduation_width() -> usize {
        defaults::GRADUATION_WIDTH
    }

    fn default_int_regs() -> usize {
        defaults::INT_PHYS_REGS
    }

    fn default_fp_regs() -> usize {
        defaults::FP_PHYS_REGS
    }

    fn default_shadow_mappers() -> usize {
        defaults::SHADOW_MAPPERS
    }

    fn default_bht_size() -> usize {
        defaults::BHT_SIZE
    }

    fn default_ras_size() -> usize {
        defaults::RAS_SIZE
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            active_list_size: defaults::ACTIVE_LIST_SIZE,
            fetch_queue_size: defaults::FETCH_QUEUE_SIZE,
            decode_width: defaults::DECODE_WIDTH,
            issue_width: defaults::ISSUE_WIDTH,
            graduation_width: defaults::GRADUATION_WIDTH,
            int_phys_regs: defaults::INT_PHYS_REGS,
            fp_phys_regs: defaults::FP_PHYS_REGS,
            shadow_mappers: defaults::SHADOW_MAPPERS,
            branch_predictor: BranchPredictor::default(),
            bht_size: defaults::BHT_SIZE,
            ras_size: defaults::RAS_SIZE,
        }
    }
}

/// Functional unit counts.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    /// Integer ALUs
    #[serde(default = "UnitConfig::default_int_alu")]
    pub int_alu: usize,

    /// Floating-point units
    #[serde(default = "UnitConfig::default_fpu")]
    pub fpu: usize,

    /// Address generation units
    #[serde(default = "UnitConfig::default_addr")]
    pub addr: usize,

    /// Memory ports
    #[serde(default = "UnitConfig::default_mem_ports")]
    pub mem_ports: usize,
}

impl UnitConfig {
    fn default_int_alu() -> usize {
        defaults::INT_ALUS
    }

    fn default_fpu() -> usize {
        defaults::FPUS
    }

    fn default_addr() -> usize {
        defaults::ADDR_UNITS
    }

    fn default_mem_ports() -> usize {
        defaults::MEM_PORTS
    }
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            int_alu: defaults::INT_ALUS,
            fpu: defaults::FPUS,
            addr: defaults::ADDR_UNITS,
            mem_ports: defaults::MEM_PORTS,
        }
    }
}

/// Latency and repeat (occupancy) rate of one opcode category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Timing {
    /// Cycles from issue to result
    pub latency: u64,
    /// Cycles before the unit slot can accept another instruction
    pub repeat: u64,
}

impl Timing {
    /// Creates a timing pair.
    pub const fn new(latency: u64, repeat: u64) -> Self {
        Self { latency, repeat }
    }
}

/// Per-category latency and repeat rates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    /// Integer add, logic and moves
    pub int_alu: Timing,
    /// Shifts
    pub shift: Timing,
    /// Integer multiply
    pub int_mul: Timing,
    /// Integer divide
    pub int_div: Timing,
    /// FP add, subtract and compare
    pub fp_add: Timing,
    /// FP multiply
    pub fp_mul: Timing,
    /// FP divide
    pub fp_div: Timing,
    /// FP square root
    pub fp_sqrt: Timing,
    /// FP/integer conversions
    pub fp_conv: Timing,
    /// FP register moves
    pub fp_move: Timing,
    /// Branches, calls and jumps
    pub branch: Timing,
    /// Address generation
    pub addr: Timing,
    /// Memory port occupancy per submission
    pub mem_port: Timing,
}

impl LatencyConfig {
    /// Every timing entry, for validation.
    pub const fn all(&self) -> [Timing; 13] {
        [
            self.int_alu,
            self.shift,
            self.int_mul,
            self.int_div,
            self.fp_add,
            self.fp_mul,
            self.fp_div,
            self.fp_sqrt,
            self.fp_conv,
            self.fp_move,
            self.branch,
            self.addr,
            self.mem_port,
        ]
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            int_alu: Timing::new(1, 1),
            shift: Timing::new(1, 1),
            int_mul: Timing::new(3, 1),
            int_div: Timing::new(9, 9),
            fp_add: Timing::new(3, 1),
            fp_mul: Timing::new(5, 1),
            fp_div: Timing::new(10, 6),
            fp_sqrt: Timing::new(10, 6),
            fp_conv: Timing::new(4, 1),
            fp_move: Timing::new(1, 1),
            branch: Timing::new(1, 1),
            addr: Timing::new(1, 1),
            mem_port: Timing::new(1, 1),
        }
    }
}

/// Memory disambiguation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Memory queue depth
    #[serde(default = "MemoryConfig::default_queue_size")]
    pub queue_size: usize,

    /// Consistency model
    #[serde(default)]
    pub model: ConsistencyModel,

    /// Allow loads to issue while still speculative under the model
    #[serde(default = "MemoryConfig::default_true")]
    pub speculative_loads: bool,

    /// Allow loads to issue past older stores with unresolved addresses
    #[serde(default = "MemoryConfig::default_true")]
    pub speculative_disambiguation: bool,

    /// Recovery taken when a resolved store aliases an issued load
    #[serde(default)]
    pub alias_recovery: AliasRecovery,
}

impl MemoryConfig {
    fn default_queue_size() -> usize {
        defaults::MEM_QUEUE_SIZE
    }

    fn default_true() -> bool {
        true
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            queue_size: defaults::MEM_QUEUE_SIZE,
            model: ConsistencyModel::default(),
            speculative_loads: true,
            speculative_disambiguation: true,
            alias_recovery: AliasRecovery::default(),
        }
    }
}

/// Trap handling settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TrapConfig {
    /// Base address of the trap table; entries are 32 bytes apart
    #[serde(default = "TrapConfig::default_table_base")]
    pub table_base: u64,

    /// Maximum trap nesting level
    #[serde(default = "TrapConfig::default_max_level")]
    pub max_trap_level: usize,

    /// Start in privileged mode
    #[serde(default)]
    pub start_privileged: bool,

    /// Start with interrupts enabled
    #[serde(default)]
    pub interrupts_enabled: bool,
}

impl TrapConfig {
    fn default_table_base() -> u64 {
        defaults::TRAP_TABLE_BASE
    }

    fn default_max_level() -> usize {
        defaults::MAX_TRAP_LEVEL
    }
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            table_base: defaults::TRAP_TABLE_BASE,
            max_trap_level: defaults::MAX_TRAP_LEVEL,
            start_privileged: false,
            interrupts_enabled: false,
        }
    }
}

/// Multiprocessor and reference memory-system settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Number of processors
    #[serde(default = "SystemConfig::default_processors")]
    pub processors: usize,

    /// Read latency in cycles
    #[serde(default = "SystemConfig::default_read_latency")]
    pub read_latency: u64,

    /// Write latency in cycles
    #[serde(default = "SystemConfig::default_write_latency")]
    pub write_latency: u64,

    /// Coherence line size in bytes
    #[serde(default = "SystemConfig::default_line_size")]
    pub line_size: u64,

    /// Page size as a power-of-two shift
    #[serde(default = "SystemConfig::default_page_shift")]
    pub page_shift: u32,
}

impl SystemConfig {
    fn default_processors() -> usize {
        1
    }

    fn default_read_latency() -> u64 {
        defaults::READ_LATENCY
    }

    fn default_write_latency() -> u64 {
        defaults::WRITE_LATENCY
    }

    fn default_line_size() -> u64 {
        defaults::LINE_SIZE
    }

    fn default_page_shift() -> u32 {
        defaults::PAGE_SHIFT
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            processors: 1,
            read_latency: defaults::READ_LATENCY,
            write_latency: defaults::WRITE_LATENCY,
            line_size: defaults::LINE_SIZE,
            page_shift: defaults::PAGE_SHIFT,
        }
    }
}
