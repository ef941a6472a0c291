//! Operator overrides attached to one train.
//!
//! Written by operator commands from any thread, read by the train's own
//! tick.  The driver guards them with their own lock, always taken before
//! the state lock.

use std::collections::{BTreeMap, BTreeSet};

use rt_core::PlatformId;

use crate::PassengerRestriction;
use crate::movement::ARRIVAL_EPSILON_M;

/// A forced stop at an absolute line-frame position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StopPoint {
    pub position_m:     f64,
    pub duration_secs:  f64,
    /// Braking rate used to approach this stop; `None` = the block's rate.
    pub max_decel_mps2: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct DriverOverrides {
    /// Exact dwell per platform.  Consumed when used.
    pub holding:      BTreeMap<PlatformId, f64>,
    pub max_holding:  BTreeMap<PlatformId, f64>,
    pub min_holding:  BTreeMap<PlatformId, f64>,
    pub restrictions: BTreeMap<PlatformId, PassengerRestriction>,
    /// Platforms the train runs through without stopping.
    pub ignore_platforms: BTreeSet<PlatformId>,
    /// Sorted by position.
    pub stop_points: Vec<StopPoint>,

    pub ignore_safe_distance: bool,
    pub ignore_safe_headway:  bool,
    pub uturn:                bool,
    pub terminate:            bool,
    /// Put everyone off at the next platform.
    pub force_alight:         bool,
}

impl DriverOverrides {
    /// Record an exact holding time for `platform`.
    ///
    /// Rejected (returns `false`) when it exceeds a max-holding override or
    /// falls below a min-holding override for the same platform.
    pub fn insert_holding(&mut self, platform: PlatformId, secs: f64) -> bool {
        if !secs.is_finite() || secs < 0.0 {
            return false;
        }
        if self.max_holding.get(&platform).is_some_and(|&max| secs > max) {
            return false;
        }
        if self.min_holding.get(&platform).is_some_and(|&min| secs < min) {
            return false;
        }
        self.holding.insert(platform, secs);
        true
    }

    pub fn insert_stop_point(&mut self, point: StopPoint) {
        let at = self
            .stop_points
            .partition_point(|p| p.position_m <= point.position_m);
        self.stop_points.insert(at, point);
    }

    /// First stop point at or ahead of `from_m`.
    pub fn next_stop_point(&self, from_m: f64) -> Option<&StopPoint> {
        self.stop_points
            .iter()
            .find(|p| p.position_m >= from_m - ARRIVAL_EPSILON_M)
    }

    /// Drop stop points at or behind `position_m`.
    pub fn discard_stop_points_behind(&mut self, position_m: f64) {
        self.stop_points
            .retain(|p| p.position_m > position_m + ARRIVAL_EPSILON_M);
    }
}
