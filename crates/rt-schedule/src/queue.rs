//! `TrainScheduleQueue` — per-line queue of trips waiting for dispatch.
//!
//! Each line keeps two lists:
//!
//! - timetabled trips in a `BTreeMap` keyed by `(start, trip id)`, so the
//!   head is always the earliest trip and ties break by composition order;
//! - operator-inserted trips in a start-sorted `Vec`.  Insertion goes after
//!   any trip with the same start time, keeping ties in insertion order.
//!
//! The dispatcher asks for the due head of a line: whichever list's head
//! starts earlier, the unscheduled one on a tie.

use std::collections::BTreeMap;

use rt_core::{DailyTime, LineId, TripId};

use crate::TrainTrip;

#[derive(Default, Debug)]
struct LineQueue {
    scheduled:   BTreeMap<(DailyTime, TripId), TrainTrip>,
    unscheduled: Vec<TrainTrip>,
}

impl LineQueue {
    fn len(&self) -> usize {
        self.scheduled.len() + self.unscheduled.len()
    }

    /// `true` if the head comes from the unscheduled list.
    fn head_is_unscheduled(&self) -> Option<bool> {
        let s = self.scheduled.keys().next().map(|(t, _)| *t);
        let u = self.unscheduled.first().map(|t| t.start);
        match (s, u) {
            (None, None)         => None,
            (Some(_), None)      => Some(false),
            (None, Some(_))      => Some(true),
            (Some(s), Some(u))   => Some(u <= s),
        }
    }

    fn head(&self) -> Option<&TrainTrip> {
        match self.head_is_unscheduled()? {
            true  => self.unscheduled.first(),
            false => self.scheduled.values().next(),
        }
    }

    fn pop_head(&mut self) -> Option<TrainTrip> {
        match self.head_is_unscheduled()? {
            true  => Some(self.unscheduled.remove(0)),
            false => self.scheduled.pop_first().map(|(_, trip)| trip),
        }
    }
}

/// Trips waiting for dispatch, grouped by line.
#[derive(Default, Debug)]
pub struct TrainScheduleQueue {
    lines: BTreeMap<LineId, LineQueue>,
}

impl TrainScheduleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue holding `trips` as timetabled trips.
    pub fn from_trips(trips: impl IntoIterator<Item = TrainTrip>) -> Self {
        let mut queue = Self::new();
        for trip in trips {
            queue.push_scheduled(trip);
        }
        queue
    }

    pub fn push_scheduled(&mut self, trip: TrainTrip) {
        self.lines
            .entry(trip.line)
            .or_default()
            .scheduled
            .insert((trip.start, trip.id), trip);
    }

    /// Insert an operator trip, keeping the line's list sorted by start.
    pub fn insert_unscheduled(&mut self, trip: TrainTrip) {
        let list = &mut self.lines.entry(trip.line).or_default().unscheduled;
        let at = list.partition_point(|t| t.start <= trip.start);
        list.insert(at, trip);
    }

    /// The line's next trip if it is due at `now`.
    pub fn peek_due(&self, line: LineId, now: DailyTime) -> Option<&TrainTrip> {
        self.lines
            .get(&line)?
            .head()
            .filter(|trip| trip.start <= now)
    }

    /// Remove and return the line's next trip if it is due at `now`.
    pub fn pop_due(&mut self, line: LineId, now: DailyTime) -> Option<TrainTrip> {
        self.peek_due(line, now)?;
        self.lines.get_mut(&line)?.pop_head()
    }

    /// Start time of the line's next trip, due or not.
    pub fn next_start(&self, line: LineId) -> Option<DailyTime> {
        self.lines.get(&line)?.head().map(|t| t.start)
    }

    /// Discard every remaining trip of `line`; returns how many were dropped.
    pub fn drop_line(&mut self, line: LineId) -> usize {
        self.lines.remove(&line).map_or(0, |q| q.len())
    }

    /// Lines with at least one queued trip, in ascending order.
    pub fn lines(&self) -> Vec<LineId> {
        self.lines
            .iter()
            .filter(|(_, q)| q.len() > 0)
            .map(|(&l, _)| l)
            .collect()
    }

    pub fn line_len(&self, line: LineId) -> usize {
        self.lines.get(&line).map_or(0, LineQueue::len)
    }

    pub fn len(&self) -> usize {
        self.lines.values().map(LineQueue::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
