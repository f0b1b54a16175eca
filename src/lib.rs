//! # ticksim: Deterministic Preemptive Scheduler Simulator
//!
//! A priority-based preemptive task scheduler on a single simulated CPU,
//! built for replaying real-time workloads deterministically. A fixed set of
//! tasks, each with a priority (lower value = higher priority), an arrival
//! tick and a CPU burst, runs under a fixed time quantum, producing per-tick
//! CSV metrics and a final turnaround/waiting summary. A side-channel lets an
//! external advisor rewrite task priorities at specific ticks, and the
//! scheduler reacts within the same tick.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Driver (main.rs)                      │
//! │            run · demo  ·  clap CLI, env_logger           │
//! ├──────────────────────────────────────────────────────────┤
//! │                 Engine (scheduler.rs)                     │
//! │   admit → consult advisor → reselect → execute → emit    │
//! ├──────────────┬──────────────────┬────────────────────────┤
//! │  Ready Queue │  Advisor Adapter │     Metrics Sink       │
//! │  queue.rs    │  advice.rs       │     metrics.rs         │
//! │  (prio, id)  │  CSV / in-memory │     CSV, 1 row per     │
//! │  ascending   │  replay-gated    │     (tick, task)       │
//! ├──────────────┴──────────────────┴────────────────────────┤
//! │                 Task Model (task.rs)                      │
//! │        Task record · bounded TaskTable · stats.rs        │
//! ├──────────────────────────────────────────────────────────┤
//! │        Demo Utilities: ipc.rs (bounded FIFO),            │
//! │                timers.rs (id → countdown)                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The engine is single-threaded with no suspension; one tick is one call of
//! the internal step function, and steps run strictly in order. Given the
//! same task set and no advice, the schedule is a pure function of
//! `(priority, id, arrival, burst)`. The only wall-clock interaction is the
//! bounded advisor wait, which collapses to a single poll when the budget is
//! zero, and that is how every test runs.
//!
//! ## Example
//!
//! ```no_run
//! use ticksim::{Scheduler, SchedulerConfig};
//!
//! let mut sched = Scheduler::with_config(2, SchedulerConfig::default());
//! sched.add_task(1, 5, 0, 4).unwrap();
//! sched.add_task(2, 1, 2, 2).unwrap();
//! sched.run();
//! sched.print_stats();
//! ```

pub mod advice;
pub mod config;
pub mod ipc;
pub mod metrics;
pub mod queue;
pub mod scheduler;
pub mod stats;
pub mod task;
pub mod timers;

pub use advice::{CsvAdvisor, PriorityAdvice, PriorityAdvisor, StaticAdvisor};
pub use metrics::MetricsSink;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use stats::TaskStats;
pub use task::{AdmissionError, Task, TaskTable};
