//! Operator-declared disruptions.
//!
//! A disruption names a station range on one line.  It covers that line
//! and, when one exists, the opposite line over the same stations.  Without
//! a window it stays until cleared; with one it is active inside
//! `[start, end)` and dropped once `end` has passed.

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use rt_core::{DailyTime, LineId, PlatformId, StationId};
use rt_network::RailNetwork;

use crate::{ControlError, ControlResult};

#[derive(Clone, Debug, PartialEq)]
pub struct DisruptionEntity {
    pub line:          LineId,
    pub start_station: StationId,
    pub end_station:   StationId,
    pub window:        Option<(DailyTime, DailyTime)>,
    /// Disrupted platforms per affected line, in route order.
    pub platforms:     BTreeMap<LineId, Vec<PlatformId>>,
}

impl DisruptionEntity {
    /// Resolve a station range into platforms on `line` and its opposite.
    pub fn compute(
        network: &RailNetwork,
        line:    LineId,
        start:   StationId,
        end:     StationId,
        window:  Option<(DailyTime, DailyTime)>,
    ) -> ControlResult<Self> {
        network.line(line).ok_or(ControlError::UnknownLine(line))?;
        let own = network
            .platforms_between(line, start, end)
            .ok_or(ControlError::StationOffLine { station: start, line })?;
        let mut platforms = BTreeMap::new();
        platforms.insert(line, own);
        if let Some(opposite) = network.opposite_line(line) {
            if let Some(list) = network.platforms_between(opposite, start, end) {
                platforms.insert(opposite, list);
            }
        }
        Ok(Self {
            line,
            start_station: start,
            end_station: end,
            window,
            platforms,
        })
    }

    pub fn is_active(&self, now: DailyTime) -> bool {
        self.window.is_none_or(|(start, end)| start <= now && now < end)
    }

    pub fn is_expired(&self, now: DailyTime) -> bool {
        self.window.is_some_and(|(_, end)| now >= end)
    }

    pub fn affects(&self, line: LineId) -> bool {
        self.platforms.contains_key(&line)
    }
}

#[derive(Debug, Default)]
pub struct DisruptionBook {
    entries: Vec<DisruptionEntity>,
}

impl DisruptionBook {
    pub fn add(&mut self, entity: DisruptionEntity) {
        info!(
            line = %entity.line,
            from = %entity.start_station,
            to = %entity.end_station,
            timed = entity.window.is_some(),
            "disruption declared"
        );
        self.entries.push(entity);
    }

    /// Drop every disruption affecting `line`.  Returns the lines that were
    /// affected by what was dropped.
    pub fn clear_line(&mut self, line: LineId) -> BTreeSet<LineId> {
        let mut lines = BTreeSet::new();
        self.entries.retain(|e| {
            if e.affects(line) {
                lines.extend(e.platforms.keys().copied());
                false
            } else {
                true
            }
        });
        lines
    }

    /// Remove timed disruptions whose window has passed.  Returns the lines
    /// they affected.
    pub fn expire(&mut self, now: DailyTime) -> BTreeSet<LineId> {
        let mut lines = BTreeSet::new();
        self.entries.retain(|e| {
            if e.is_expired(now) {
                info!(line = %e.line, "disruption window over");
                lines.extend(e.platforms.keys().copied());
                false
            } else {
                true
            }
        });
        lines
    }

    /// Disrupted platforms per line at `now`.
    pub fn active(&self, now: DailyTime) -> BTreeMap<LineId, BTreeSet<PlatformId>> {
        let mut out: BTreeMap<LineId, BTreeSet<PlatformId>> = BTreeMap::new();
        for e in self.entries.iter().filter(|e| e.is_active(now)) {
            for (&line, list) in &e.platforms {
                out.entry(line).or_default().extend(list.iter().copied());
            }
        }
        out
    }

    /// Disrupted platforms of `line` at `now`, in route order.
    pub fn platforms_for(&self, network: &RailNetwork, line: LineId, now: DailyTime) -> Vec<PlatformId> {
        let active = self.active(now);
        let Some(set) = active.get(&line) else { return Vec::new() };
        network
            .line(line)
            .map(|route| route.platforms.iter().copied().filter(|p| set.contains(p)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
