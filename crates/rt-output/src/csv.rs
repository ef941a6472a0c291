//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `platform_arrivals.csv`
//! - `tick_summaries.csv`
//! - `train_snapshots.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OutputResult, PlatformArrivalRow, TickSummaryRow, TrainSnapshotRow};

pub const ARRIVAL_HEADERS: [&str; 11] = [
    "train_line", "train_id", "line", "trip", "platform", "time",
    "boarded", "alighted", "denied", "occupancy", "dwell_secs",
];

pub const SUMMARY_HEADERS: [&str; 7] = [
    "tick", "time", "active", "dispatched", "removed", "faulted", "waiting",
];

pub const SNAPSHOT_HEADERS: [&str; 9] = [
    "tick", "train_line", "train_id", "line", "phase", "position_m", "speed_mps", "occupancy",
    "next_platform",
];

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    arrivals:  Writer<File>,
    summaries: Writer<File>,
    snapshots: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut arrivals = Writer::from_path(dir.join("platform_arrivals.csv"))?;
        arrivals.write_record(ARRIVAL_HEADERS)?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(SUMMARY_HEADERS)?;

        let mut snapshots = Writer::from_path(dir.join("train_snapshots.csv"))?;
        snapshots.write_record(SNAPSHOT_HEADERS)?;

        Ok(Self {
            arrivals,
            summaries,
            snapshots,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_arrivals(&mut self, rows: &[PlatformArrivalRow]) -> OutputResult<()> {
        for row in rows {
            self.arrivals.write_record(&[
                row.train_line.to_string(),
                row.train_id.to_string(),
                row.line.to_string(),
                row.trip.to_string(),
                row.platform.to_string(),
                row.time.to_string(),
                row.boarded.to_string(),
                row.alighted.to_string(),
                row.denied.to_string(),
                row.occupancy.to_string(),
                format!("{:.2}", row.dwell_secs),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.time.to_string(),
            row.active.to_string(),
            row.dispatched.to_string(),
            row.removed.to_string(),
            row.faulted.to_string(),
            row.waiting.to_string(),
        ])?;
        Ok(())
    }

    fn write_snapshots(&mut self, rows: &[TrainSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record(&[
                row.tick.to_string(),
                row.train_line.to_string(),
                row.train_id.to_string(),
                row.line.to_string(),
                row.phase.to_string(),
                format!("{:.2}", row.position_m),
                format!("{:.2}", row.speed_mps),
                row.occupancy.to_string(),
                row.next_platform.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.arrivals.flush()?;
        self.summaries.flush()?;
        self.snapshots.flush()?;
        Ok(())
    }
}
