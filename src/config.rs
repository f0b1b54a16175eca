//! # Configuration
//!
//! Build-time constants governing the simulation. Runtime knobs
//! (`SchedulerConfig`) default to these values and may be overridden by the
//! driver; tests override the advice wait budget with 0.

/// Time quantum in cycles. A dispatched task runs at most this many
/// consecutive cycles before the scheduler forces a reselection.
pub const QUANTUM: u32 = 2;

/// Total advice wait budget per tick, in abstract units. The engine polls the
/// advisor in `ADVICE_POLL_INCREMENT` steps until the budget is spent or an
/// applicable record lands.
pub const ADVICE_WAIT_BUDGET: u32 = 100;

/// Budget consumed per advisor poll. Also the sleep between unsuccessful
/// polls, in milliseconds, when the budget allows further attempts.
pub const ADVICE_POLL_INCREMENT: u32 = 10;

/// Default path of the per-tick metrics CSV.
pub const DEFAULT_METRICS_PATH: &str = "metrics.csv";

/// Default path of the priority-advice CSV the advisor re-reads each poll.
pub const DEFAULT_ADVICE_PATH: &str = "new_priorities.csv";

/// Capacity of the bounded message queue used by the IPC demo.
pub const IPC_QUEUE_CAPACITY: usize = 16;

/// Number of ticks the producer/consumer demo runs by default.
pub const DEMO_TICKS: u32 = 30;

/// Producer/consumer cadence in the demo, in ticks.
pub const DEMO_PERIOD: u32 = 3;
