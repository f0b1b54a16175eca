//! # Metrics Sink
//!
//! Structured per-tick CSV output. One header row, then one data row per
//! (tick, task) in task-table insertion order:
//!
//! ```text
//! tick,task_id,current_priority,remaining_time,waiting_time,queue_len,cpu_usage,is_running
//! ```
//!
//! The sink is flushed after every tick so an external reader (the advisor)
//! can follow the run live. Write failures are reported on the error log
//! channel and never interrupt the simulation.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::error;

use crate::task::TaskTable;

/// CSV row writer the engine emits to once per tick.
pub struct MetricsSink<W: Write> {
    writer: csv::Writer<W>,
}

impl MetricsSink<File> {
    /// Open (truncating) the metrics file and write the header row.
    pub fn create(path: &Path) -> Result<Self, csv::Error> {
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> MetricsSink<W> {
    /// Wrap an arbitrary writer; the header row is written immediately.
    pub fn from_writer(writer: W) -> Result<Self, csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record([
            "tick",
            "task_id",
            "current_priority",
            "remaining_time",
            "waiting_time",
            "queue_len",
            "cpu_usage",
            "is_running",
        ])?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Emit one row per task for `tick`. `running_id` is the id of the task
    /// that is still current after this tick's cycle executed, if any; it
    /// drives both `cpu_usage` (two-decimal 1.00/0.00) and `is_running`.
    pub fn log_tick(
        &mut self,
        tick: u64,
        table: &TaskTable,
        queue_len: usize,
        running_id: Option<i32>,
    ) {
        let cpu_usage = if running_id.is_some() { 1.0f64 } else { 0.0 };

        for task in table.iter() {
            let is_running = u8::from(running_id == Some(task.id));
            let row = [
                tick.to_string(),
                task.id.to_string(),
                task.priority.to_string(),
                task.remaining_time.to_string(),
                task.waiting_time.to_string(),
                queue_len.to_string(),
                format!("{cpu_usage:.2}"),
                is_running.to_string(),
            ];
            if let Err(e) = self.writer.write_record(&row) {
                error!("metrics row write failed: {e}");
            }
        }

        if let Err(e) = self.writer.flush() {
            error!("metrics flush failed: {e}");
        }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W, csv::IntoInnerError<csv::Writer<W>>> {
        self.writer.into_inner()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_rows() {
        let mut table = TaskTable::with_capacity(2);
        table.add(1, 5, 0, 4).unwrap();
        table.add(2, 9, 0, 3).unwrap();
        table.get_mut(0).remaining_time = 3;
        table.get_mut(1).waiting_time = 1;

        let mut sink = MetricsSink::from_writer(Vec::new()).unwrap();
        sink.log_tick(0, &table, 1, Some(1));
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "tick,task_id,current_priority,remaining_time,waiting_time,queue_len,cpu_usage,is_running",
                "0,1,5,3,0,1,1.00,1",
                "0,2,9,3,1,1,1.00,0",
            ]
        );
    }

    #[test]
    fn test_idle_tick_rows() {
        let mut table = TaskTable::with_capacity(1);
        table.add(7, 0, 3, 2).unwrap();

        let mut sink = MetricsSink::from_writer(Vec::new()).unwrap();
        sink.log_tick(0, &table, 0, None);
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();

        assert_eq!(out.lines().nth(1), Some("0,7,0,2,0,0,0.00,0"));
    }
}
