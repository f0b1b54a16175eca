//! # Stats Reporter
//!
//! Derives per-task turnaround and wait times from the task table after a run
//! and renders the summary table.

use std::io::{self, Write};

use crate::task::TaskTable;

/// Summary figures for one task. `turnaround` and `wait` are `None` for a
/// task that never completed (an empty or aborted run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStats {
    pub id: i32,
    pub arrival: u64,
    pub burst: u32,
    pub completion: Option<u64>,
    pub turnaround: Option<i64>,
    pub wait: Option<i64>,
}

/// Derive stats for every task, in table insertion order.
///
/// `turnaround = completion - arrival`, `wait = turnaround - burst`.
pub fn collect(table: &TaskTable) -> Vec<TaskStats> {
    table
        .iter()
        .map(|t| {
            let turnaround = t
                .completion_time
                .map(|c| c as i64 - t.arrival_time as i64);
            let wait = turnaround.map(|turn| turn - i64::from(t.burst_time));
            TaskStats {
                id: t.id,
                arrival: t.arrival_time,
                burst: t.burst_time,
                completion: t.completion_time,
                turnaround,
                wait,
            }
        })
        .collect()
}

/// Render the summary table, one row per task.
pub fn render<W: Write>(table: &TaskTable, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Task statistics:")?;
    writeln!(out, "ID\tArr\tBurst\tCompl\tTurn\tWait")?;
    for s in collect(table) {
        match (s.completion, s.turnaround, s.wait) {
            (Some(compl), Some(turn), Some(wait)) => writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                s.id, s.arrival, s.burst, compl, turn, wait
            )?,
            _ => writeln!(out, "{}\t{}\t{}\t-\t-\t-", s.id, s.arrival, s.burst)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_derives_turnaround_and_wait() {
        let mut table = TaskTable::with_capacity(2);
        table.add(1, 0, 2, 3).unwrap();
        table.add(2, 0, 0, 4).unwrap();
        table.get_mut(0).completion_time = Some(7);
        table.get_mut(1).completion_time = Some(8);

        let stats = collect(&table);
        assert_eq!(stats[0].turnaround, Some(5));
        assert_eq!(stats[0].wait, Some(2));
        assert_eq!(stats[1].turnaround, Some(8));
        assert_eq!(stats[1].wait, Some(4));
    }

    #[test]
    fn test_render_marks_unfinished_tasks() {
        let mut table = TaskTable::with_capacity(1);
        table.add(3, 1, 0, 2).unwrap();

        let mut out = Vec::new();
        render(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("3\t0\t2\t-\t-\t-"));
    }
}
