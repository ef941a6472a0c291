//! `SimOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use rt_control::{ArrivalRecord, RailContext};
use rt_core::{PlatformId, Tick};
use rt_sim::{SimObserver, TickSummary};

use crate::row::{PlatformArrivalRow, TickSummaryRow, TrainSnapshotRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes arrivals, tick summaries and train
/// snapshots to any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl From<&ArrivalRecord> for PlatformArrivalRow {
    fn from(r: &ArrivalRecord) -> Self {
        Self {
            train_line: r.train.line.0,
            train_id:   r.train.train.0,
            line:       r.line.0,
            trip:       r.trip.0,
            platform:   r.platform.0,
            time:       r.time,
            boarded:    r.boarded,
            alighted:   r.alighted,
            denied:     r.denied,
            occupancy:  r.occupancy,
            dwell_secs: r.dwell_secs,
        }
    }
}

impl From<&TickSummary> for TickSummaryRow {
    fn from(s: &TickSummary) -> Self {
        Self {
            tick:       s.tick.0,
            time:       s.time,
            active:     s.active as u64,
            dispatched: s.dispatched as u64,
            removed:    s.removed as u64,
            faulted:    s.faulted as u64,
            waiting:    s.waiting as u64,
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_arrivals(&mut self, _tick: Tick, arrivals: &[ArrivalRecord]) {
        let rows: Vec<PlatformArrivalRow> = arrivals.iter().map(PlatformArrivalRow::from).collect();
        let result = self.writer.write_arrivals(&rows);
        self.store_err(result);
    }

    fn on_tick_end(&mut self, summary: &TickSummary) {
        let result = self.writer.write_tick_summary(&TickSummaryRow::from(summary));
        self.store_err(result);
    }

    fn on_snapshot(&mut self, summary: &TickSummary, rail: &RailContext) {
        let rows: Vec<TrainSnapshotRow> = rail
            .controller
            .drivers()
            .iter()
            .map(|(_, driver)| {
                let snap = driver.snapshot();
                TrainSnapshotRow {
                    tick:          summary.tick.0,
                    train_line:    snap.key.line.0,
                    train_id:      snap.key.train.0,
                    line:          snap.line.0,
                    phase:         snap.phase.as_str(),
                    position_m:    snap.position_m,
                    speed_mps:     snap.speed_mps,
                    occupancy:     driver.occupancy(),
                    next_platform: snap.next_platform.unwrap_or(PlatformId::INVALID).0,
                }
            })
            .collect();

        if !rows.is_empty() {
            let result = self.writer.write_snapshots(&rows);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
