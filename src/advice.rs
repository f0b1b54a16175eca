//! # Priority Advice
//!
//! The side-channel through which an external advisor rewrites task
//! priorities at specific ticks.
//!
//! The engine consults the [`AdvisorAdapter`] once per tick, between arrival
//! admission and reselection. The adapter polls an abstract
//! [`PriorityAdvisor`] source inside a bounded wait window and applies every
//! record addressed to the current tick, guarded against replay by
//! `last_applied_advice_tick`.
//!
//! Two sources are built in: [`CsvAdvisor`] re-reads a CSV file on every poll
//! (the file may be rewritten between ticks by the external advisor), and
//! [`StaticAdvisor`] serves a fixed in-memory record list for tests and
//! embedding.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use log::debug;

use crate::config::ADVICE_POLL_INCREMENT;
use crate::task::TaskTable;

// ---------------------------------------------------------------------------
// Advice records and sources
// ---------------------------------------------------------------------------

/// One priority-override instruction: at `tick`, set the priority of the task
/// with id `task_id` to `new_priority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityAdvice {
    pub tick: u64,
    pub task_id: i32,
    pub new_priority: i32,
}

/// A source of priority-override records.
///
/// `poll(tick)` returns the records addressed to exactly that tick; records
/// for other ticks are never returned. A poll is a point-in-time query; the
/// bounded waiting is the adapter's job, not the source's.
pub trait PriorityAdvisor {
    fn poll(&mut self, tick: u64) -> Vec<PriorityAdvice>;
}

/// Fixed in-memory record list. The deterministic source used by tests.
#[derive(Debug, Default)]
pub struct StaticAdvisor {
    records: Vec<PriorityAdvice>,
}

impl StaticAdvisor {
    pub fn new(records: Vec<PriorityAdvice>) -> Self {
        Self { records }
    }
}

impl PriorityAdvisor for StaticAdvisor {
    fn poll(&mut self, tick: u64) -> Vec<PriorityAdvice> {
        self.records.iter().copied().filter(|r| r.tick == tick).collect()
    }
}

/// CSV-file source. Layout, one record per line after a header row:
///
/// ```text
/// tick,task_id,new_priority
/// 2,2,1
/// ```
///
/// The file is reopened and fully re-read on every poll. A missing file means
/// no advice; rows that do not parse as three integers are skipped.
#[derive(Debug)]
pub struct CsvAdvisor {
    path: PathBuf,
}

impl CsvAdvisor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_record(record: &csv::StringRecord) -> Option<PriorityAdvice> {
        let tick = record.get(0)?.trim().parse().ok()?;
        let task_id = record.get(1)?.trim().parse().ok()?;
        let new_priority = record.get(2)?.trim().parse().ok()?;
        Some(PriorityAdvice {
            tick,
            task_id,
            new_priority,
        })
    }
}

impl PriorityAdvisor for CsvAdvisor {
    fn poll(&mut self, tick: u64) -> Vec<PriorityAdvice> {
        let mut reader = match csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
        {
            Ok(reader) => reader,
            // No file yet (or unreadable): the advisor simply has nothing
            // to say this poll.
            Err(_) => return Vec::new(),
        };

        reader
            .records()
            .filter_map(|row| row.ok())
            .filter_map(|row| Self::parse_record(&row))
            .filter(|advice| advice.tick == tick)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Adapter: bounded wait + replay gate + application
// ---------------------------------------------------------------------------

/// Pulls records for the current tick from a [`PriorityAdvisor`] and applies
/// them to the task table.
///
/// Owns the per-tick wait budget and `last_applied_advice_tick`, the
/// monotone high-water mark that prevents a record batch from being absorbed
/// twice.
pub struct AdvisorAdapter {
    source: Box<dyn PriorityAdvisor>,
    wait_budget: u32,
    last_applied_tick: Option<u64>,
}

impl AdvisorAdapter {
    /// `wait_budget` is consumed in [`ADVICE_POLL_INCREMENT`] steps; 0 means
    /// a single immediate poll with no sleeping.
    pub fn new(source: Box<dyn PriorityAdvisor>, wait_budget: u32) -> Self {
        Self {
            source,
            wait_budget,
            last_applied_tick: None,
        }
    }

    /// Largest tick for which advice has been absorbed, if any.
    pub fn last_applied_tick(&self) -> Option<u64> {
        self.last_applied_tick
    }

    /// Give the advisor its bounded window for `tick` and apply whatever
    /// arrives. Returns the number of records applied.
    ///
    /// Polls at least once. Stops as soon as a poll applies any record, or
    /// once the budget is spent; between unsuccessful polls it sleeps one
    /// increment (the only wall-clock interaction in the whole engine).
    pub fn consult(&mut self, tick: u64, table: &mut TaskTable) -> usize {
        let mut spent = 0u32;
        loop {
            let applied = self.apply_batch(tick, table);
            if applied > 0 {
                return applied;
            }
            spent = spent.saturating_add(ADVICE_POLL_INCREMENT);
            if spent >= self.wait_budget {
                return 0;
            }
            thread::sleep(Duration::from_millis(u64::from(ADVICE_POLL_INCREMENT)));
        }
    }

    /// One poll-and-apply pass. A record is applied when its tick equals the
    /// current tick and is strictly newer than `last_applied_tick`; a record
    /// naming an unknown task id is dropped without poisoning the batch.
    fn apply_batch(&mut self, tick: u64, table: &mut TaskTable) -> usize {
        let mut applied = 0usize;
        let mut freshest: Option<u64> = None;

        for advice in self.source.poll(tick) {
            if advice.tick != tick {
                continue;
            }
            if self.last_applied_tick.is_some_and(|last| advice.tick <= last) {
                debug!(
                    "tick {tick}: ignoring stale advice for task {} (advice tick {})",
                    advice.task_id, advice.tick
                );
                continue;
            }

            match table.find_by_id(advice.task_id) {
                Some(index) => {
                    let task = table.get_mut(index);
                    let old = task.priority;
                    task.priority = advice.new_priority;
                    debug!(
                        "tick {tick}: task {} priority {old} -> {}",
                        advice.task_id, advice.new_priority
                    );
                    applied += 1;
                    freshest = freshest.max(Some(advice.tick));
                }
                None => {
                    debug!(
                        "tick {tick}: advice for unknown task {} dropped",
                        advice.task_id
                    );
                }
            }
        }

        if applied > 0 {
            self.last_applied_tick = self.last_applied_tick.max(freshest);
        }
        applied
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
