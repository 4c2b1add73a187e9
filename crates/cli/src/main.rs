//! Out-of-order simulator CLI.
//!
//! This binary drives a multiprocessor [`System`]. It performs:
//! 1. **Configuration:** Loads a JSON config (or the defaults) and applies command-line overrides.
//! 2. **Programs:** Loads one JSON program per processor.
//! 3. **Run:** Steps the system until every processor halts or the cycle limit is hit,
//!    then prints per-processor and aggregate statistics.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mcsim_core::common::error::{ConfigError, SimError};
use mcsim_core::config::{Config, ConsistencyModel};
use mcsim_core::sim::{Program, RunOutcome, System};

#[derive(Parser, Debug)]
#[command(
    name = "mcsim",
    author,
    version,
    about = "Cycle-level out-of-order superscalar simulator",
    long_about = "Run one program per processor on a shared memory and report pipeline statistics.\n\nExamples:\n  mcsim run -p prog.json\n  mcsim run -c config.json -p cpu0.json -p cpu1.json --model processor\n  mcsim config"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate programs until every processor halts.
    Run {
        /// JSON configuration file; defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// JSON program, one per processor (repeatable).
        #[arg(short, long = "program", required = true)]
        programs: Vec<PathBuf>,

        /// Stop after this many cycles.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Override the memory consistency model.
        #[arg(long, value_enum)]
        model: Option<ModelArg>,

        /// Emit per-event pipeline tracing.
        #[arg(long)]
        trace: bool,

        /// Print statistics as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration file, or the defaults.
    Config {
        /// JSON configuration file.
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelArg {
    Sequential,
    Processor,
    Release,
}

impl From<ModelArg> for ConsistencyModel {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Sequential => Self::Sequential,
            ModelArg::Processor => Self::Processor,
            ModelArg::Release => Self::Release,
        }
    }
}

/// Options of the `run` subcommand.
struct RunArgs {
    config: Option<PathBuf>,
    programs: Vec<PathBuf>,
    max_cycles: Option<u64>,
    model: Option<ModelArg>,
    trace: bool,
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            config,
            programs,
            max_cycles,
            model,
            trace,
            json,
        } => cmd_run(&RunArgs {
            config,
            programs,
            max_cycles,
            model,
            trace,
            json,
        }),
        Commands::Config { path } => cmd_config(path.as_ref()),
    };
    if let Err(e) = result {
        error!("{e}");
        eprintln!("\n[!] {e}");
        if let SimError::Fatal { diagnostics, .. } = &e {
            eprintln!("{diagnostics}");
        }
        process::exit(1);
    }
}

/// Installs the tracing subscriber; `RUST_LOG` overrides the default level.
fn init_tracing(trace: bool) {
    let default = if trace { "mcsim_core=trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, ConfigError> {
    path.map_or_else(|| Ok(Config::default()), Config::from_json_file)
}

/// Loads the configuration and programs, runs the system, and prints statistics.
fn cmd_run(args: &RunArgs) -> Result<(), SimError> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(model) = args.model {
        config.memory.model = model.into();
    }
    config.general.trace |= args.trace;
    if args.max_cycles.is_some() {
        config.general.max_cycles = args.max_cycles;
    }
    init_tracing(config.general.trace);

    let programs = args
        .programs
        .iter()
        .map(Program::from_json_file)
        .collect::<Result<Vec<_>, _>>()?;
    config.system.processors = programs.len();

    info!(
        "{} processor(s), model {:?}, alias recovery {:?}",
        programs.len(),
        config.memory.model,
        config.memory.alias_recovery
    );
    let mut system = System::new(&config, &programs)?;
    let outcome = system.run(config.general.max_cycles)?;

    if args.json {
        let per_cpu: Vec<_> = system.processors().iter().map(|p| p.stats()).collect();
        let report = serde_json::json!({
            "outcome": match outcome {
                RunOutcome::Halted { .. } => "halted",
                RunOutcome::CycleLimit { .. } => "cycle_limit",
            },
            "cycles": system.cycle(),
            "processors": per_cpu,
            "total": system.stats(),
        });
        println!("{report:#}");
        return Ok(());
    }

    match outcome {
        RunOutcome::Halted { cycles } => println!("[*] All processors halted after {cycles} cycles"),
        RunOutcome::CycleLimit { cycles } => println!("[*] Cycle limit reached after {cycles} cycles"),
    }
    for p in system.processors() {
        println!("\n== cpu{} ==", p.id);
        println!("{}", p.stats());
    }
    if system.processors().len() > 1 {
        println!("\n== total ==");
        println!("{}", system.stats());
    }
    Ok(())
}

fn cmd_config(path: Option<&PathBuf>) -> Result<(), SimError> {
    let config = load_config(path)?;
    config.validate()?;
    println!("configuration ok: {config:#?}");
    Ok(())
}
