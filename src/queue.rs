//! # Ready Queue
//!
//! Ordered sequence of task-table indices, sorted by `(priority, id)`
//! ascending. Insertion is a linear scan: the queue is small and priorities
//! change under it at advice time, which would invalidate a heap's internal
//! order anyway. After advice mutates priorities the engine calls `resort`.
//!
//! Membership invariants (maintained by the engine, checked in tests):
//! every member has `remaining_time > 0` and `enqueued = true`, and the
//! currently running task is never in the queue.

use crate::task::TaskTable;

/// Sorted sequence of indices into the task table.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    slots: Vec<usize>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `index`, keeping `(priority, id)` ascending order. Equal keys
    /// place the newcomer after existing entries, so the id tie-break decides
    /// and insertion order never matters for distinct keys.
    pub fn push(&mut self, table: &TaskTable, index: usize) {
        let key = table.get(index).key();
        let pos = self
            .slots
            .iter()
            .position(|&i| key < table.get(i).key())
            .unwrap_or(self.slots.len());
        self.slots.insert(pos, index);
    }

    /// Remove and return the smallest element.
    pub fn pop_front(&mut self) -> Option<usize> {
        if self.slots.is_empty() {
            None
        } else {
            Some(self.slots.remove(0))
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True when the queue is non-empty and its front strictly outranks
    /// `current` by `(priority, id)`. With no current task, any non-empty
    /// queue outranks it.
    pub fn front_outranks(&self, table: &TaskTable, current: Option<usize>) -> bool {
        let Some(&front) = self.slots.first() else {
            return false;
        };
        match current {
            None => true,
            Some(cur) => table.get(front).key() < table.get(cur).key(),
        }
    }

    /// Stable re-sort by `(priority, id)`. Called after priority advice has
    /// mutated tasks already in the queue.
    pub fn resort(&mut self, table: &TaskTable) {
        self.slots.sort_by_key(|&i| table.get(i).key());
    }

    /// Members in queue order, front first.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().copied()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
