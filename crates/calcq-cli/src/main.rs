use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use calcq_core::prelude::*;
use clap::{Args, Parser, Subcommand};
use log::info;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(
    name = "calcq",
    version,
    about = "Run computations in parallel, collect results in submission order"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit a batch of squaring tasks with random delays and print the results.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Number of tasks to submit.
    #[arg(long, default_value_t = 20)]
    tasks: u64,

    /// Upper bound for each task's random delay.
    #[arg(long, default_value_t = 200)]
    max_delay_ms: u64,

    /// Make every K-th task fail (0 = never).
    #[arg(long, default_value_t = 0)]
    fail_every: u64,

    /// Threads retrieving results concurrently.
    #[arg(long, default_value_t = 1)]
    retrievers: usize,

    /// JSON pool config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured max worker threads.
    #[arg(long)]
    max_threads: Option<usize>,
}

/// One retrieved result, printed as a JSON line.
#[derive(Debug, Serialize)]
struct ResultLine {
    retriever: usize,
    kind: RetrievalKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ResultLine {
    fn new(retriever: usize, retrieval: &Retrieval<(u64, u64)>) -> Self {
        let (index, value) = match retrieval {
            Retrieval::Value((index, value)) => (Some(*index), Some(*value)),
            _ => (None, None),
        };
        Self {
            retriever,
            kind: retrieval.kind(),
            index,
            value,
            error: retrieval.failure().map(ToString::to_string),
        }
    }
}

/// Final line: manager counters after every result was collected.
#[derive(Debug, Serialize)]
struct StatsLine {
    stats: ManagerStats,
}

fn load_config(args: &RunArgs) -> anyhow::Result<PoolConfig> {
    let mut config = match &args.config {
        Some(path) => PoolConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PoolConfig::default(),
    };
    if let Some(max_threads) = args.max_threads {
        config = config.with_max_threads(max_threads);
    }
    Ok(config)
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let manager = ConcurrentCalculationManager::<(u64, u64)>::builder()
        .config(config)
        .build()?;

    let start = Instant::now();
    let mut rng = rand::thread_rng();
    for n in 0..args.tasks {
        let delay = Duration::from_millis(rng.gen_range(0..=args.max_delay_ms));
        let fails = args.fail_every > 0 && (n + 1) % args.fail_every == 0;
        manager.submit_fallible(move || {
            thread::sleep(delay);
            if fails {
                Err(format!("task {n} rejected"))
            } else {
                Ok((n, n * n))
            }
        });
    }
    info!("submitted {} tasks in {:?}", args.tasks, start.elapsed());

    let retrievers: Vec<_> = (0..args.retrievers.max(1))
        .map(|retriever| {
            let manager = manager.clone();
            thread::spawn(move || -> anyhow::Result<()> {
                loop {
                    let retrieval = manager.retrieve_outcome();
                    if retrieval.kind() == RetrievalKind::Empty {
                        return Ok(());
                    }
                    println!("{}", serde_json::to_string(&ResultLine::new(retriever, &retrieval))?);
                }
            })
        })
        .collect();

    for retriever in retrievers {
        retriever
            .join()
            .map_err(|_| anyhow::anyhow!("retriever thread panicked"))??;
    }
    info!("retrieved everything after {:?}", start.elapsed());

    let summary = StatsLine {
        stats: manager.stats(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
    }
}
