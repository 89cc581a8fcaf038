//! flowray - CLI

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flowray::util::config::EngineConfig;
use flowray::util::logger::{self, LogLevel};
use flowray::walkthrough::{self, Aggregation, MessageRun};
use flowray::{Engine, ShutdownMode, NAME, VERSION};

/// In-process task and actor execution engine
#[derive(Parser, Debug)]
#[command(name = "flowray")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Worker threads (overrides the config file and FLOWRAY_NUM_WORKERS)
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Engine config file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sleep inside each walkthrough task, in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    delay_ms: u64,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run four sleeping tasks in parallel and gather the results
    Parallel,

    /// Multiply two random matrices in a task depending on both
    Deps {
        /// Matrix dimension
        #[arg(long, default_value_t = 100)]
        size: usize,
    },

    /// Sum 1..=8 with delayed add tasks
    Aggregate {
        /// Graph shape
        #[arg(value_enum, default_value_t = Strategy::Tree)]
        strategy: Strategy,
    },

    /// Increment a counter actor
    Counter,

    /// Feed a message actor from worker tasks sharing its handle
    Messages {
        /// Worker tasks
        #[arg(long, default_value_t = 3)]
        tasks: usize,

        /// Messages per worker task
        #[arg(long, default_value_t = 10)]
        per_task: usize,
    },

    /// Run every pattern and print engine statistics
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Strategy {
    Linear,
    Tree,
    Loop,
    /// Every strategy, one after another
    All,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => {
            let mut config = EngineConfig::default();
            config.apply_env()?;
            config
        }
    };
    if let Some(workers) = args.workers {
        config.num_workers = workers;
        config.validate()?;
    }
    Ok(config)
}

fn strategies(strategy: Strategy) -> Vec<Aggregation> {
    match strategy {
        Strategy::Linear => vec![Aggregation::Linear],
        Strategy::Tree => vec![Aggregation::Tree],
        Strategy::Loop => vec![Aggregation::Loop],
        Strategy::All => vec![Aggregation::Linear, Aggregation::Tree, Aggregation::Loop],
    }
}

fn run_aggregate(engine: &Engine, strategy: Strategy, delay: Duration) -> Result<()> {
    for strategy in strategies(strategy) {
        let report =
            walkthrough::aggregate(engine, strategy, &walkthrough::AGGREGATE_INPUTS, delay)?;
        println!(
            "{:?}: {} in {:.2?}",
            strategy, report.result, report.elapsed
        );
    }
    Ok(())
}

fn run_messages(engine: &Engine, tasks: usize, per_task: usize, delay: Duration) -> Result<()> {
    let run = MessageRun {
        workers: tasks,
        per_worker: per_task,
        delay,
        poll_interval: delay,
    };
    let received = walkthrough::messages(engine, run, |batch| {
        let batch: Vec<String> = batch.iter().map(ToString::to_string).collect();
        println!("new messages [{}]", batch.join(", "));
    })?;
    println!("received {} messages", received.len());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_with_level(LogLevel::from_verbosity(args.verbose));

    let config = load_config(&args)?;
    let engine = Engine::init(config).context("Failed to start engine")?;
    let delay = Duration::from_millis(args.delay_ms);

    match args.command {
        Commands::Parallel => {
            let report = walkthrough::parallel(&engine, delay)?;
            let values: Vec<String> = report.result.iter().map(ToString::to_string).collect();
            println!("[{}] in {:.2?}", values.join(", "), report.elapsed);
        }
        Commands::Deps { size } => {
            let report = walkthrough::dependent_matrices(&engine, size)?;
            println!(
                "z = x . y: {}x{} matrix in {:.2?}",
                report.result.rows(),
                report.result.cols(),
                report.elapsed
            );
        }
        Commands::Aggregate { strategy } => run_aggregate(&engine, strategy, delay)?,
        Commands::Counter => {
            let report = walkthrough::counter(&engine)?;
            println!("{}", report.initial);
            println!("{}", report.after_two_increments);
        }
        Commands::Messages { tasks, per_task } => run_messages(&engine, tasks, per_task, delay)?,
        Commands::Stats { json } => {
            walkthrough::parallel(&engine, delay)?;
            walkthrough::dependent_matrices(&engine, 32)?;
            run_aggregate(&engine, Strategy::All, delay)?;
            walkthrough::counter(&engine)?;

            let stats = engine.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{stats:#?}");
            }
        }
    }

    engine.shutdown(ShutdownMode::Drain);
    Ok(())
}
