//! # ticksim Driver
//!
//! Command-line front end for the scheduler simulator.
//!
//! `run` loads a task set from CSV, runs the simulation to completion and
//! prints the summary table; the per-tick metrics CSV and the priority-advice
//! CSV paths are configurable. `demo` is a small producer/consumer
//! message-passing exercise over the bounded FIFO and the per-task countdown
//! timers.
//!
//! Task file layout, one task per line after a header row:
//!
//! ```text
//! id,priority,arrival,burst
//! 1,5,0,4
//! 2,1,2,2
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use ticksim::config::{
    ADVICE_WAIT_BUDGET, DEFAULT_ADVICE_PATH, DEFAULT_METRICS_PATH, DEMO_PERIOD, DEMO_TICKS,
    IPC_QUEUE_CAPACITY, QUANTUM,
};
use ticksim::ipc::MessageQueue;
use ticksim::timers::TimerSet;
use ticksim::{CsvAdvisor, Scheduler, SchedulerConfig};

#[derive(Parser)]
#[command(name = "ticksim", version, about = "Deterministic preemptive scheduler simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scheduling simulation from a task file.
    Run(RunArgs),
    /// Producer/consumer message-passing demo.
    Demo(DemoArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Task set CSV (header: id,priority,arrival,burst).
    #[arg(long)]
    tasks: PathBuf,

    /// Per-tick metrics CSV destination.
    #[arg(long, default_value = DEFAULT_METRICS_PATH)]
    metrics: PathBuf,

    /// Priority-advice CSV polled each tick.
    #[arg(long, default_value = DEFAULT_ADVICE_PATH)]
    advice: PathBuf,

    /// Time quantum in cycles.
    #[arg(long, default_value_t = QUANTUM)]
    quantum: u32,

    /// Advice wait budget per tick (0 = single immediate poll).
    #[arg(long, default_value_t = ADVICE_WAIT_BUDGET)]
    advice_wait: u32,
}

#[derive(Args)]
struct DemoArgs {
    /// Number of ticks to run.
    #[arg(long, default_value_t = DEMO_TICKS)]
    ticks: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    match Cli::parse().command {
        Command::Run(args) => cmd_run(args),
        Command::Demo(args) => cmd_demo(args),
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn cmd_run(args: RunArgs) -> Result<()> {
    let specs = load_tasks(&args.tasks)?;
    if specs.is_empty() {
        bail!("task file {} contains no tasks", args.tasks.display());
    }

    let config = SchedulerConfig {
        quantum: args.quantum,
        advice_wait_budget: args.advice_wait,
        metrics_path: Some(args.metrics),
    };
    let mut sched = Scheduler::with_config(specs.len(), config);
    sched.set_advisor(Box::new(CsvAdvisor::new(&args.advice)));

    for (id, priority, arrival, burst) in specs {
        sched
            .add_task(id, priority, arrival, burst)
            .with_context(|| format!("failed to add task {id}"))?;
    }

    info!("starting priority-based preemptive scheduling simulation");
    sched.run();
    sched.print_stats();
    Ok(())
}

type TaskSpec = (i32, i32, u64, u32);

/// Parse the task CSV. Unlike the advice side-channel, the task set is the
/// simulation's ground truth, so a malformed row is a hard error rather than
/// a skip.
fn load_tasks(path: &Path) -> Result<Vec<TaskSpec>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open task file {}", path.display()))?;

    let mut specs = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("bad record in {}", path.display()))?;
        let spec = parse_task_row(&row)
            .with_context(|| format!("{} row {}", path.display(), index + 2))?;
        specs.push(spec);
    }
    Ok(specs)
}

fn parse_task_row(row: &csv::StringRecord) -> Result<TaskSpec> {
    let id = parse_field(row, 0, "task id")?;
    let priority = parse_field(row, 1, "priority")?;
    let arrival = parse_field(row, 2, "arrival time")?;
    let burst = parse_field(row, 3, "burst time")?;
    Ok((id, priority, arrival, burst))
}

fn parse_field<T>(row: &csv::StringRecord, index: usize, what: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = row
        .get(index)
        .with_context(|| format!("missing {what}"))?;
    raw.trim()
        .parse()
        .with_context(|| format!("bad {what}: {raw:?}"))
}

// ---------------------------------------------------------------------------
// demo
// ---------------------------------------------------------------------------

const PRODUCER_ID: i32 = 0;
const CONSUMER_ID: i32 = 1;

/// Producer/consumer over the bounded FIFO, paced by countdown timers. The
/// producer emits the values 1..=10 on a fixed cadence; the consumer drains
/// on the same cadence, offset by one period.
fn cmd_demo(args: DemoArgs) -> Result<()> {
    let mut queue: MessageQueue<u32> = MessageQueue::with_capacity(IPC_QUEUE_CAPACITY);
    let mut timers = TimerSet::new();
    timers.set(PRODUCER_ID, 0);
    timers.set(CONSUMER_ID, DEMO_PERIOD);

    let mut next_value = 1u32;
    for _ in 0..args.ticks {
        timers.tick();

        if timers.expired(PRODUCER_ID) && next_value <= 10 {
            match queue.send(next_value) {
                Ok(()) => {
                    info!("[task {PRODUCER_ID}] producer: sent message {next_value}");
                    next_value += 1;
                    timers.set(PRODUCER_ID, DEMO_PERIOD);
                }
                Err(full) => {
                    info!("[task {PRODUCER_ID}] producer: queue full, retrying ({})", full.0);
                }
            }
        }

        if timers.expired(CONSUMER_ID) {
            if let Some(msg) = queue.recv() {
                info!("[task {CONSUMER_ID}] consumer: received message {msg}");
                timers.set(CONSUMER_ID, DEMO_PERIOD);
            }
        }
    }

    info!("demo finished: {} message(s) left in queue", queue.len());
    Ok(())
}
