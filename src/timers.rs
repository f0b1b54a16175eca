//! # Task Timers
//!
//! Per-task countdown timers, a mapping from task id to remaining ticks.
//! `tick()` is the simulated time source; a timer reaching zero stays
//! expired until re-armed. An id that was never armed counts as expired, so
//! a task can run immediately on its first activation.

use std::collections::BTreeMap;

/// Countdown timers keyed by task id.
#[derive(Debug, Default)]
pub struct TimerSet {
    timers: BTreeMap<i32, u32>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer for `task_id`.
    pub fn set(&mut self, task_id: i32, ticks: u32) {
        self.timers.insert(task_id, ticks);
    }

    /// Remove the timer for `task_id`; it reads as expired afterwards.
    pub fn cancel(&mut self, task_id: i32) {
        self.timers.remove(&task_id);
    }

    /// Remaining ticks, or `None` when never armed.
    pub fn remaining(&self, task_id: i32) -> Option<u32> {
        self.timers.get(&task_id).copied()
    }

    /// True when the timer has run down, or was never armed.
    pub fn expired(&self, task_id: i32) -> bool {
        self.timers.get(&task_id).map_or(true, |&t| t == 0)
    }

    /// Advance simulated time: decrement every running timer by one tick.
    pub fn tick(&mut self) {
        for t in self.timers.values_mut() {
            *t = t.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_and_expiry() {
        let mut timers = TimerSet::new();
        timers.set(1, 2);

        assert!(!timers.expired(1));
        timers.tick();
        assert_eq!(timers.remaining(1), Some(1));
        timers.tick();
        assert!(timers.expired(1));

        // Expired timers stay at zero.
        timers.tick();
        assert_eq!(timers.remaining(1), Some(0));
    }

    #[test]
    fn test_unarmed_id_is_expired() {
        let timers = TimerSet::new();
        assert!(timers.expired(42));
        assert_eq!(timers.remaining(42), None);
    }

    #[test]
    fn test_rearm_and_cancel() {
        let mut timers = TimerSet::new();
        timers.set(1, 1);
        timers.tick();
        assert!(timers.expired(1));

        timers.set(1, 3);
        assert!(!timers.expired(1));

        timers.cancel(1);
        assert!(timers.expired(1));
    }
}
