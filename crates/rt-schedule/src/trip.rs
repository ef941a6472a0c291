//! Trips and headway-based trip composition.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use rt_core::{DailyTime, LineId, PlatformId, TripId};
use rt_network::RailNetwork;

use crate::{ScheduleError, ScheduleResult};

// ── HeadwayWindow ─────────────────────────────────────────────────────────────

/// "Run a train on `line` every `headway_secs` from `start` to `end`."
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeadwayWindow {
    pub line:         LineId,
    pub start:        DailyTime,
    pub end:          DailyTime,
    pub headway_secs: u32,
}

impl HeadwayWindow {
    /// Start times `start, start + h, start + 2h, …` up to and including `end`.
    pub fn departures(&self) -> impl Iterator<Item = DailyTime> + '_ {
        let step = self.headway_secs.max(1) as usize;
        (self.start.secs()..=self.end.secs())
            .step_by(step)
            .map(DailyTime)
    }

    fn validate(&self) -> ScheduleResult<()> {
        if self.headway_secs == 0 {
            return Err(ScheduleError::ZeroHeadway(self.line));
        }
        if self.end < self.start {
            return Err(ScheduleError::InvertedWindow {
                line:  self.line,
                start: self.start,
                end:   self.end,
            });
        }
        Ok(())
    }
}

// ── TrainTrip ─────────────────────────────────────────────────────────────────

/// One run of one train over a line.
///
/// Created at composition time or by an operator at run time, and consumed
/// exactly once when dispatched.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainTrip {
    pub id:          TripId,
    pub line:        LineId,
    pub start:       DailyTime,
    /// Platforms to serve, in route order.  The train starts at the first.
    pub platforms:   Vec<PlatformId>,
    pub unscheduled: bool,
}

impl TrainTrip {
    /// Remove disrupted platforms from a trip that has not left yet.
    ///
    /// Trains cannot run through a disrupted region, so the trip keeps the
    /// platforms before the first disrupted one.  If the origin itself is
    /// disrupted, it keeps the platforms after the region instead.
    ///
    /// Returns `false` if fewer than two platforms remain after trimming
    /// and the trip should not run.
    pub fn trim_disrupted(&mut self, disrupted: &BTreeSet<PlatformId>) -> bool {
        let Some(first) = self.platforms.iter().position(|p| disrupted.contains(p)) else {
            return true;
        };
        if first > 0 {
            self.platforms.truncate(first);
        } else {
            let after = self
                .platforms
                .iter()
                .position(|p| !disrupted.contains(p))
                .unwrap_or(self.platforms.len());
            self.platforms.drain(..after);
            if let Some(next) = self.platforms.iter().position(|p| disrupted.contains(p)) {
                self.platforms.truncate(next);
            }
        }
        self.platforms.len() >= 2
    }
}

// ── TripIdGen ─────────────────────────────────────────────────────────────────

/// Source of globally unique, increasing trip ids.
///
/// Shared between composition and run-time insertion.
#[derive(Debug)]
pub struct TripIdGen(AtomicU64);

impl TripIdGen {
    pub fn new(first: u64) -> Self {
        Self(AtomicU64::new(first))
    }

    #[inline]
    pub fn next_id(&self) -> TripId {
        TripId(self.0.fetch_add(1, Ordering::Relaxed))
    }

    /// The id the next call to `next_id` will return.
    pub fn peek(&self) -> TripId {
        TripId(self.0.load(Ordering::Relaxed))
    }
}

impl Default for TripIdGen {
    fn default() -> Self {
        Self::new(1)
    }
}

// ── Composition ───────────────────────────────────────────────────────────────

/// Expand headway windows into trips over each line's full platform list.
///
/// Windows are processed in the order given; trip ids increase in that
/// order.
pub fn compose_trips(
    network: &RailNetwork,
    windows: &[HeadwayWindow],
    ids:     &TripIdGen,
) -> ScheduleResult<Vec<TrainTrip>> {
    let mut trips = Vec::new();
    for window in windows {
        window.validate()?;
        let route = network
            .line(window.line)
            .ok_or(ScheduleError::LineNotInNetwork(window.line))?;
        for start in window.departures() {
            trips.push(TrainTrip {
                id:          ids.next_id(),
                line:        window.line,
                start,
                platforms:   route.platforms.clone(),
                unscheduled: false,
            });
        }
    }
    tracing::debug!(windows = windows.len(), trips = trips.len(), "trips composed");
    Ok(trips)
}
