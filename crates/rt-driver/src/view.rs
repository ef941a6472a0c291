//! Frozen, read-only world state handed to every train for one tick.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use rt_core::{DailyTime, LineId, PlatformId, TrainKey, TrainRef};
use rt_network::{BlockLimits, RailNetwork};

use crate::DriverPhase;

/// What other trains may know about a train during a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainSnapshot {
    pub key:           TrainKey,
    /// Line the train currently operates on.
    pub line:          LineId,
    pub position_m:    f64,
    pub speed_mps:     f64,
    pub phase:         DriverPhase,
    pub next_platform: Option<PlatformId>,
    pub at_platform:   Option<PlatformId>,
}

pub struct TickView<'a> {
    pub network:    &'a RailNetwork,
    pub limits:     &'a BlockLimits,
    pub now:        DailyTime,
    pub dt_secs:    f64,
    pub trains:     &'a FxHashMap<TrainRef, TrainSnapshot>,
    pub disrupted:  &'a BTreeMap<LineId, BTreeSet<PlatformId>>,
    pub terminated: &'a BTreeSet<LineId>,
}

impl TickView<'_> {
    /// Disrupted platforms of `line`, `None` when the line is clear.
    pub fn disrupted_on(&self, line: LineId) -> Option<&BTreeSet<PlatformId>> {
        self.disrupted.get(&line).filter(|set| !set.is_empty())
    }

    #[inline]
    pub fn is_terminated(&self, line: LineId) -> bool {
        self.terminated.contains(&line)
    }
}
