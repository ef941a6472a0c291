//! `ServiceController` — the operator command surface.
//!
//! Commands address a train by `(line, train id)`.  A command naming an
//! unknown train is a no-op: setters return `false`, queries `None`, and
//! the miss is logged at debug level.
//!
//! Trains are registered under the line that owns their id.  After a
//! U-turn a train operates on the opposite line; a lookup by its
//! operating line finds it too.
//!
//! | Group       | Commands                                                          |
//! |-------------|-------------------------------------------------------------------|
//! | Kinematics  | `reset_speed_limit`, `reset_acceleration`, `reset_safe_*`, `set_ignore_*`, `insert_stop_point`, `clear_stop_points` |
//! | Dwell       | `reset_holding_time_at_station`, `reset_maximum/minimum_holding_time`, `set/clear_dwell_time_scaling` |
//! | Passengers  | `restrict_passengers`, `force_release_passengers`                 |
//! | Service     | `insert_unscheduled_train`, `terminate_*`, `update_platform_list`, `set_uturn_flag` |
//! | Disruption  | `perform_disruption`, `set_disrupted_platforms`, `clear_disruption` |
//! | Pool        | `push_train_into_inactive_pool`, `pull_out_train_from_inactive_pool` |
//! | Queries     | `get_*`, `is_stranded_during_disruption`                          |

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use rt_core::{DailyTime, LineId, PlatformId, StationId, TrainId, TripId, read, write};
use rt_driver::{DwellScaling, PassengerRestriction, TrainDriver};

use crate::TrainController;

pub struct ServiceController {
    controller: Arc<TrainController>,
    registry:   RwLock<BTreeMap<LineId, BTreeMap<TrainId, Arc<TrainDriver>>>>,
}

impl ServiceController {
    pub fn new(controller: Arc<TrainController>) -> Self {
        Self {
            controller,
            registry: RwLock::new(BTreeMap::new()),
        }
    }

    // ── Registry ──────────────────────────────────────────────────────────

    /// Register a dispatched train.  Refused if its key is already taken.
    pub fn register(&self, driver: Arc<TrainDriver>) -> bool {
        let key = driver.key();
        let mut reg = write(&self.registry);
        let line = reg.entry(key.line).or_default();
        if line.contains_key(&key.train) {
            warn!(train = %key, "already registered");
            return false;
        }
        line.insert(key.train, driver);
        true
    }

    pub fn deregister(&self, driver: &TrainDriver) -> bool {
        let key = driver.key();
        let mut reg = write(&self.registry);
        let Some(line) = reg.get_mut(&key.line) else { return false };
        match line.get(&key.train) {
            Some(d) if d.train_ref() == driver.train_ref() => line.remove(&key.train).is_some(),
            _ => false,
        }
    }

    pub fn registered(&self) -> usize {
        read(&self.registry).values().map(BTreeMap::len).sum()
    }

    /// Find `(line, train)`: first under its owning line, then among trains
    /// operating on `line`.  The hit is checked against the request.
    pub fn resolve(&self, line: LineId, train: TrainId) -> Option<Arc<TrainDriver>> {
        let reg = read(&self.registry);
        let found = reg.get(&line).and_then(|m| m.get(&train)).cloned().or_else(|| {
            reg.values()
                .filter_map(|m| m.get(&train))
                .find(|d| d.operating_line() == line)
                .cloned()
        });
        let verified = found.filter(|d| {
            d.key().train == train && (d.key().line == line || d.operating_line() == line)
        });
        if verified.is_none() {
            debug!(%line, %train, "command for unknown train ignored");
        }
        verified
    }

    fn with<T>(&self, line: LineId, train: TrainId, f: impl FnOnce(&TrainDriver) -> T) -> Option<T> {
        self.resolve(line, train).map(|d| f(d.as_ref()))
    }

    // ── Kinematics ────────────────────────────────────────────────────────

    /// Cap speed on the blocks from `start` to `end` station between
    /// `start_time` and `end_time`.
    pub fn reset_speed_limit(
        &self,
        speed_mps:  f64,
        start:      StationId,
        end:        StationId,
        line:       LineId,
        start_time: DailyTime,
        end_time:   DailyTime,
    ) -> bool {
        self.controller
            .reset_speed_limit(speed_mps, start, end, line, start_time, end_time)
            .inspect_err(|e| debug!(%line, error = %e, "speed limit reset ignored"))
            .is_ok()
    }

    pub fn reset_acceleration(&self, accel_mps2: f64, line: LineId) -> bool {
        self.controller.reset_acceleration(line, accel_mps2).is_ok()
    }

    pub fn reset_safe_headway_sec(&self, line: LineId, train: TrainId, secs: f64) -> bool {
        self.with(line, train, |d| d.set_safe_headway(secs)).is_some()
    }

    pub fn reset_safe_operation_distance(&self, line: LineId, train: TrainId, metres: f64) -> bool {
        self.with(line, train, |d| d.set_safe_distance(metres)).is_some()
    }

    pub fn set_ignore_safe_distance(&self, line: LineId, train: TrainId, ignore: bool) -> bool {
        self.with(line, train, |d| d.set_ignore_safe_distance(ignore)).is_some()
    }

    pub fn set_ignore_safe_headway(&self, line: LineId, train: TrainId, ignore: bool) -> bool {
        self.with(line, train, |d| d.set_ignore_safe_headway(ignore)).is_some()
    }

    /// Stop `distance_m` ahead of the train's current position for
    /// `duration_secs`.
    pub fn insert_stop_point(
        &self,
        line:           LineId,
        train:          TrainId,
        distance_m:     f64,
        duration_secs:  f64,
        max_decel_mps2: Option<f64>,
    ) -> bool {
        self.with(line, train, |d| d.insert_stop_point(distance_m, duration_secs, max_decel_mps2))
            .unwrap_or(false)
    }

    pub fn clear_stop_points(&self, line: LineId, train: TrainId) -> bool {
        self.with(line, train, TrainDriver::clear_stop_points).is_some()
    }

    // ── Dwell ─────────────────────────────────────────────────────────────

    pub fn reset_holding_time_at_station(
        &self,
        line:     LineId,
        train:    TrainId,
        platform: PlatformId,
        secs:     f64,
    ) -> bool {
        self.with(line, train, |d| d.reset_holding(platform, secs)).unwrap_or(false)
    }

    pub fn reset_maximum_holding_time(&self, line: LineId, train: TrainId, platform: PlatformId, secs: f64) -> bool {
        self.with(line, train, |d| d.reset_max_holding(platform, secs)).is_some()
    }

    pub fn reset_minimum_holding_time(&self, line: LineId, train: TrainId, platform: PlatformId, secs: f64) -> bool {
        self.with(line, train, |d| d.reset_min_holding(platform, secs)).is_some()
    }

    pub fn set_dwell_time_scaling(&self, line: LineId, scaling: DwellScaling) {
        self.controller.set_dwell_scaling(line, scaling);
    }

    pub fn clear_dwell_time_scaling(&self, line: LineId) {
        self.controller.clear_dwell_scaling(line);
    }

    // ── Passengers ────────────────────────────────────────────────────────

    pub fn restrict_passengers(
        &self,
        line:        LineId,
        train:       TrainId,
        platform:    PlatformId,
        restriction: PassengerRestriction,
    ) -> bool {
        self.with(line, train, |d| d.restrict_passengers(platform, restriction)).is_some()
    }

    pub fn force_release_passengers(&self, line: LineId, train: TrainId) -> bool {
        self.with(line, train, TrainDriver::force_release).is_some()
    }

    pub fn get_force_alight_status(&self, line: LineId, train: TrainId) -> Option<bool> {
        self.with(line, train, TrainDriver::force_alight_status)
    }

    // ── Service ───────────────────────────────────────────────────────────

    pub fn insert_unscheduled_train(
        &self,
        line:          LineId,
        start:         DailyTime,
        start_station: Option<StationId>,
    ) -> Option<TripId> {
        self.controller
            .insert_unscheduled(line, start, start_station)
            .inspect_err(|e| debug!(%line, error = %e, "unscheduled trip refused"))
            .ok()
    }

    pub fn terminate_train_service(&self, line: LineId) {
        self.controller.terminate_line(line);
    }

    pub fn terminate_single_train_service(&self, line: LineId, train: TrainId) -> bool {
        self.with(line, train, TrainDriver::terminate).is_some()
    }

    /// Replace the train's ignore-platform list.
    pub fn update_platform_list(&self, line: LineId, train: TrainId, ignore: &[PlatformId]) -> bool {
        self.with(line, train, |d| d.set_ignore_platforms(ignore.iter().copied())).is_some()
    }

    pub fn set_uturn_flag(&self, line: LineId, train: TrainId, flag: bool) -> bool {
        self.with(line, train, |d| d.set_uturn(flag)).is_some()
    }

    // ── Disruption ────────────────────────────────────────────────────────

    pub fn perform_disruption(
        &self,
        line:          LineId,
        start:         StationId,
        end:           StationId,
        start_time:    DailyTime,
        duration_secs: u32,
    ) -> bool {
        self.controller
            .perform_disruption(line, start, end, start_time, duration_secs)
            .inspect_err(|e| debug!(%line, error = %e, "disruption refused"))
            .is_ok()
    }

    pub fn set_disrupted_platforms(&self, line: LineId, start: StationId, end: StationId) -> bool {
        self.controller
            .set_disrupted_platforms(line, start, end)
            .inspect_err(|e| debug!(%line, error = %e, "disruption refused"))
            .is_ok()
    }

    pub fn clear_disruption(&self, line: LineId) {
        for affected in self.controller.clear_disruption(line) {
            self.controller.rechain(affected);
        }
    }

    pub fn get_disrupted_platforms(&self, line: LineId) -> Vec<PlatformId> {
        self.controller.disrupted_platforms(line, self.controller.now())
    }

    pub fn is_stranded_during_disruption(&self, line: LineId, train: TrainId) -> Option<bool> {
        let driver = self.resolve(line, train)?;
        let disrupted = self
            .controller
            .is_line_disrupted(driver.operating_line(), self.controller.now());
        Some(driver.is_stranded(disrupted))
    }

    pub fn get_disrupted_state(&self, line: LineId, train: TrainId) -> Option<bool> {
        self.with(line, train, TrainDriver::disrupted_state)
    }

    // ── Pool ──────────────────────────────────────────────────────────────

    pub fn push_train_into_inactive_pool(&self, line: LineId, train: TrainId) -> bool {
        self.controller.push_into_inactive_pool(line, train)
    }

    pub fn pull_out_train_from_inactive_pool(&self, line: LineId) -> Option<TrainId> {
        self.controller.pull_out(line)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn get_dwell_time(&self, line: LineId, train: TrainId) -> Option<f64> {
        self.with(line, train, TrainDriver::dwell_time).flatten()
    }

    pub fn get_opposite_line_id(&self, line: LineId) -> Option<LineId> {
        self.controller.network().opposite_line(line)
    }

    pub fn get_distance_to_next_platform(&self, line: LineId, train: TrainId) -> Option<f64> {
        let network = self.controller.network();
        self.with(line, train, |d| d.distance_to_next_platform(network)).flatten()
    }

    pub fn get_next_platform(&self, line: LineId, train: TrainId) -> Option<PlatformId> {
        self.with(line, train, TrainDriver::next_platform).flatten()
    }

    pub fn get_platform_by_offset(&self, line: LineId, train: TrainId, offset: usize) -> Option<PlatformId> {
        self.with(line, train, |d| d.platform_by_offset(offset)).flatten()
    }

    /// Ids of the trains operating on `line`, leader first.
    pub fn get_active_train_ids(&self, line: LineId) -> Vec<TrainId> {
        self.controller.active_train_ids(line)
    }

    pub fn get_train_id_of_train_ahead(&self, line: LineId, train: TrainId) -> Option<TrainId> {
        let ahead = self.resolve(line, train)?.next_ahead()?;
        Some(self.controller.driver(ahead)?.key().train)
    }
}
