//! `rt-output` — simulation output writers for the rail_twin core.
//!
//! | Backend | Files created                                                      |
//! |---------|--------------------------------------------------------------------|
//! | CSV     | `platform_arrivals.csv`, `tick_summaries.csv`, `train_snapshots.csv` |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `rt_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rt_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output")).unwrap();
//! let mut obs = SimOutputObserver::new(writer);
//! sim.run(&mut obs).unwrap();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{PlatformArrivalRow, TickSummaryRow, TrainSnapshotRow};
pub use writer::OutputWriter;
