//! # Task Model
//!
//! Defines the task record and the bounded task table the scheduler owns.
//! A task is created before the simulation starts, mutated only by the engine
//! and the advisor adapter, and lives until the scheduler is dropped.
//!
//! ## Lifecycle
//!
//! ```text
//!   add()            arrival_time <= sim_time        remaining_time == 0
//!  ────────► waiting ─────────────────────► admitted ───────────────────► finished
//!            (enqueued = false)             (enqueued = true,             (completion_time set)
//!                                            in ready queue or current)
//! ```
//!
//! `enqueued` is a one-way latch: it records that the task has been admitted
//! to the ready queue at least once and prevents double admission.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons `TaskTable::add` can refuse a task. The table is unchanged on
/// failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// The table already holds `capacity` tasks.
    #[error("task table is full (capacity {capacity})")]
    CapacityExhausted { capacity: usize },

    /// A task must need at least one cycle of CPU.
    #[error("task {id} has zero burst time")]
    ZeroBurst { id: i32 },
}

// ---------------------------------------------------------------------------
// Task record
// ---------------------------------------------------------------------------

/// One simulated task.
///
/// `priority` follows the classic convention: **lower value means higher
/// priority**. It is the only field the advisor adapter may rewrite; the
/// engine owns every other mutation.
#[derive(Debug, Clone)]
pub struct Task {
    /// Stable identifier, unique within the run by caller convention.
    /// Duplicates are not rejected; they degrade the ordering tie-break
    /// but do not corrupt state.
    pub id: i32,

    /// Scheduling priority, lower = higher. Mutable via priority advice.
    pub priority: i32,

    /// Tick at which the task becomes eligible for admission.
    pub arrival_time: u64,

    /// Total cycles the task requires. Immutable after `add`.
    pub burst_time: u32,

    /// Cycles left; the task is finished when this reaches 0.
    pub remaining_time: u32,

    /// Tick at which the final cycle ended. `None` until the task finishes,
    /// written exactly once.
    pub completion_time: Option<u64>,

    /// Whether the task has ever been admitted to the ready queue.
    pub enqueued: bool,

    /// Cumulative ticks spent admitted and eligible but not running.
    pub waiting_time: u64,
}

impl Task {
    /// Ordering key used by the ready queue: `(priority, id)` ascending,
    /// lexicographic.
    #[inline]
    pub fn key(&self) -> (i32, i32) {
        (self.priority, self.id)
    }

    /// True once the task has consumed its whole burst.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.remaining_time == 0
    }
}

// ---------------------------------------------------------------------------
// Task table
// ---------------------------------------------------------------------------

/// Contiguous, bounded-capacity registry of task records.
///
/// Indices handed out by `add` are stable for the lifetime of the table and
/// are what the ready queue stores. Capacity is fixed at construction;
/// additions beyond it fail.
#[derive(Debug)]
pub struct TaskTable {
    tasks: Vec<Task>,
    capacity: usize,
}

impl TaskTable {
    /// Create an empty table that can hold up to `capacity` tasks.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Register a task.
    ///
    /// # Returns
    /// - `Ok(index)`: the task's stable index in the table
    /// - `Err(AdmissionError)`: table full or zero burst; no state change
    pub fn add(
        &mut self,
        id: i32,
        priority: i32,
        arrival_time: u64,
        burst_time: u32,
    ) -> Result<usize, AdmissionError> {
        if self.tasks.len() >= self.capacity {
            return Err(AdmissionError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        if burst_time == 0 {
            return Err(AdmissionError::ZeroBurst { id });
        }

        self.tasks.push(Task {
            id,
            priority,
            arrival_time,
            burst_time,
            remaining_time: burst_time,
            completion_time: None,
            enqueued: false,
            waiting_time: 0,
        });
        Ok(self.tasks.len() - 1)
    }

    /// Number of registered tasks.
    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Configured capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn get(&self, index: usize) -> &Task {
        &self.tasks[index]
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut Task {
        &mut self.tasks[index]
    }

    /// Iterate tasks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Index of the first task with the given id, in insertion order.
    pub fn find_by_id(&self, id: i32) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// True once every task has consumed its burst. An empty table counts
    /// as finished.
    pub fn all_finished(&self) -> bool {
        self.tasks.iter().all(Task::is_finished)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
