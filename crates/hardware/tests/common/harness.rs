use mcsim_core::System;
use mcsim_core::common::reg::LogicalReg;
use mcsim_core::config::{Config, ConsistencyModel};
use mcsim_core::core::Processor;
use mcsim_core::sim::{Program, RunOutcome};
use mcsim_core::soc::FlatMemory;
use mcsim_core::stats::PipelineStats;

/// Cycle budget every scenario must finish within.
pub const MAX_CYCLES: u64 = 20_000;

/// Owns a [`System`] built from test programs and steps it.
pub struct TestContext {
    pub system: System,
}

/// Configuration with short memory latencies, so scenarios finish quickly.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.system.read_latency = 4;
    config.system.write_latency = 4;
    config
}

impl TestContext {
    /// Builds a system running `programs` under `config`.
    pub fn with_config(config: &Config, programs: &[Program]) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("mcsim_core=debug")
            .try_init();
        let system = System::new(config, programs).expect("system builds");
        Self { system }
    }

    /// Single processor with the fast configuration.
    pub fn new(program: Program) -> Self {
        Self::with_config(&fast_config(), &[program])
    }

    /// Single processor with the fast configuration under `model`.
    pub fn with_model(program: Program, model: ConsistencyModel) -> Self {
        let mut config = fast_config();
        config.memory.model = model;
        Self::with_config(&config, &[program])
    }

    /// Runs until every processor halts; panics on the cycle limit.
    pub fn run(&mut self) -> u64 {
        match self.system.run(Some(MAX_CYCLES)).expect("no engine error") {
            RunOutcome::Halted { cycles } => cycles,
            RunOutcome::CycleLimit { cycles } => {
                panic!(
                    "no halt after {cycles} cycles\n{}",
                    self.cpu(0).diagnostics()
                )
            }
        }
    }

    /// Steps until `pred` holds for processor 0; panics on the cycle limit.
    pub fn run_until(&mut self, pred: impl Fn(&Processor) -> bool) {
        while !pred(self.cpu(0)) {
            assert!(self.system.cycle() < MAX_CYCLES, "condition never held");
            self.system.step().expect("no engine error");
        }
    }

    pub fn cpu(&self, id: usize) -> &Processor {
        self.system.processor(id).expect("processor exists")
    }

    /// Committed integer register of processor 0.
    pub fn reg(&self, r: u16) -> u64 {
        self.cpu(0).arch_reg(LogicalReg::int(r))
    }

    pub fn stats(&self) -> &PipelineStats {
        self.cpu(0).stats()
    }

    pub fn memory(&self) -> &FlatMemory {
        self.system.memory()
    }
}
