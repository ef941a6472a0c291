//! `TrainController` — dispatch and line-level state.
//!
//! # Lock order
//!
//! `queue → pool` and `arena → active`.  Driver locks are leaves: they may
//! be taken while holding any controller lock, never the other way round.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info, instrument, warn};

use rt_core::{DailyTime, LineId, PlatformId, StationId, TrainId, TrainKey, TrainRef, TripId, lock, read, write};
use rt_driver::{DwellModel, DwellScaling, TrainDriver, TrainMovement};
use rt_network::{BlockLimits, RailNetwork};
use rt_schedule::{TrainScheduleQueue, TrainTrip, TripIdGen};

use crate::{
    ControlError, ControlResult, DepotMessage, DisruptionBook, DisruptionEntity, MessageBus,
    Restrictions, SpeedRestriction, TrainArena, TrainIdPool,
};

pub struct TrainController {
    network:        Arc<RailNetwork>,
    pool:           TrainIdPool,
    queue:          Mutex<TrainScheduleQueue>,
    trip_ids:       TripIdGen,
    arena:          RwLock<TrainArena>,
    /// Live trains per operating line.
    active:         Mutex<BTreeMap<LineId, Vec<TrainRef>>>,
    terminated:     RwLock<BTreeSet<LineId>>,
    disruptions:    Mutex<DisruptionBook>,
    restrictions:   Mutex<Restrictions>,
    scaling:        Mutex<BTreeMap<LineId, DwellScaling>>,
    /// Trains to park instead of release when they next return.
    park_on_return: Mutex<BTreeSet<TrainKey>>,
    dwell_models:   BTreeMap<LineId, DwellModel>,
    now:            RwLock<DailyTime>,
}

impl TrainController {
    /// `trip_ids` must continue after the ids already used by `trips`.
    pub fn new(network: Arc<RailNetwork>, trips: Vec<TrainTrip>, trip_ids: TripIdGen) -> Self {
        let dwell_models = network
            .line_ids()
            .filter_map(|l| network.props(l).map(|p| (l, DwellModel::from_properties(p))))
            .collect();
        Self {
            pool: TrainIdPool::from_network(&network),
            queue: Mutex::new(TrainScheduleQueue::from_trips(trips)),
            trip_ids,
            arena: RwLock::new(TrainArena::new()),
            active: Mutex::new(BTreeMap::new()),
            terminated: RwLock::new(BTreeSet::new()),
            disruptions: Mutex::new(DisruptionBook::default()),
            restrictions: Mutex::new(Restrictions::default()),
            scaling: Mutex::new(BTreeMap::new()),
            park_on_return: Mutex::new(BTreeSet::new()),
            dwell_models,
            now: RwLock::new(DailyTime::MIDNIGHT),
            network,
        }
    }

    pub fn network(&self) -> &Arc<RailNetwork> {
        &self.network
    }

    pub fn pool(&self) -> &TrainIdPool {
        &self.pool
    }

    pub fn now(&self) -> DailyTime {
        *read(&self.now)
    }

    pub fn set_now(&self, now: DailyTime) {
        *write(&self.now) = now;
    }

    pub fn queued_trips(&self, line: LineId) -> usize {
        lock(&self.queue).line_len(line)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Dispatch every trip due at `now`, line by line, in start-time order.
    ///
    /// A line with no free train id stops for this tick and retries on the
    /// next.  Trips of a terminated line are dropped.  Trips still waiting
    /// are trimmed against the disruptions active now.
    #[instrument(level = "debug", skip_all, fields(%now))]
    pub fn dispatch_due(&self, now: DailyTime) -> Vec<Arc<TrainDriver>> {
        let disrupted = self.disrupted(now);
        let mut spawned = Vec::new();
        let mut queue = lock(&self.queue);

        for line in queue.lines() {
            if self.is_terminated(line) {
                let dropped = queue.drop_line(line);
                if dropped > 0 {
                    info!(%line, dropped, "line terminated, future trips dropped");
                }
                continue;
            }
            while queue.peek_due(line, now).is_some() {
                let Some(id) = self.pool.acquire(line) else {
                    debug!(%line, "no free train id, dispatch deferred");
                    break;
                };
                let Some(mut trip) = queue.pop_due(line, now) else {
                    self.pool.release(line, id);
                    break;
                };
                if let Some(set) = disrupted.get(&line) {
                    if !trip.trim_disrupted(set) {
                        info!(%line, trip = %trip.id, "trip cancelled by disruption");
                        self.pool.release(line, id);
                        continue;
                    }
                }
                let key = TrainKey::new(line, id);
                match self.instantiate(key, &trip) {
                    Ok(driver) => spawned.push(driver),
                    Err(e) => {
                        warn!(train = %key, trip = %trip.id, error = %e, "dispatch failed");
                        self.pool.release(line, id);
                    }
                }
            }
        }
        spawned
    }

    fn instantiate(&self, key: TrainKey, trip: &TrainTrip) -> ControlResult<Arc<TrainDriver>> {
        let props = self.network.props(key.line).ok_or(ControlError::UnknownLine(key.line))?;
        let movement = TrainMovement::at_first_platform(&self.network, trip.line, trip.platforms.clone())?;
        let mut arena = write(&self.arena);
        let tref = arena.insert_with(|tref| TrainDriver::new(key, tref, trip.id, movement, props));
        let driver = arena
            .get(tref)
            .cloned()
            .ok_or_else(|| ControlError::Config(format!("train {key} vanished on insert")))?;
        lock(&self.active).entry(trip.line).or_default().push(tref);
        info!(train = %key, trip = %trip.id, start = %trip.start, "dispatched");
        Ok(driver)
    }

    // ── Arena and chains ──────────────────────────────────────────────────

    pub fn driver(&self, tref: TrainRef) -> Option<Arc<TrainDriver>> {
        read(&self.arena).get(tref).cloned()
    }

    /// Every live train, ascending by key.
    pub fn drivers(&self) -> Vec<(TrainRef, Arc<TrainDriver>)> {
        read(&self.arena).sorted()
    }

    pub fn active_count(&self) -> usize {
        read(&self.arena).len()
    }

    pub fn active_refs(&self, line: LineId) -> Vec<TrainRef> {
        lock(&self.active).get(&line).cloned().unwrap_or_default()
    }

    pub fn active_train_ids(&self, line: LineId) -> Vec<TrainId> {
        let arena = read(&self.arena);
        let active = lock(&self.active);
        active
            .get(&line)
            .map(|refs| refs.iter().filter_map(|&r| arena.get(r)).map(|d| d.key().train).collect())
            .unwrap_or_default()
    }

    /// Order `line`'s trains by position, leader first, and point each at
    /// the one in front.  The leader has nobody ahead, so the chain has no
    /// cycle.
    pub fn rechain(&self, line: LineId) {
        let arena = read(&self.arena);
        let mut active = lock(&self.active);
        let Some(list) = active.get_mut(&line) else { return };
        let mut ordered: Vec<(f64, TrainRef)> = list
            .iter()
            .filter_map(|&r| arena.get(r).map(|d| (d.position(), r)))
            .collect();
        ordered.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        let mut ahead = None;
        for &(_, r) in &ordered {
            if let Some(d) = arena.get(r) {
                d.set_next_ahead(ahead);
            }
            ahead = Some(r);
        }
        *list = ordered.into_iter().map(|(_, r)| r).collect();
    }

    pub fn rechain_all(&self) {
        for line in self.network.line_ids() {
            self.rechain(line);
        }
    }

    /// Point every train whose train ahead is in `removed` at the first
    /// train further ahead that is staying.
    pub fn relink_around(&self, removed: &BTreeSet<TrainRef>) {
        let arena = read(&self.arena);
        let all = arena.sorted();
        for (tref, driver) in &all {
            if removed.contains(tref) {
                continue;
            }
            let mut next = driver.next_ahead();
            let mut hops = 0;
            while let Some(r) = next.filter(|r| removed.contains(r)) {
                next = arena.get(r).and_then(|d| d.next_ahead());
                hops += 1;
                if hops > all.len() {
                    next = None;
                    break;
                }
            }
            driver.set_next_ahead(next.filter(|r| r != tref));
        }
        drop(arena);
        self.break_cycles();
    }

    /// Cut any chain that loops back on itself.
    fn break_cycles(&self) {
        let arena = read(&self.arena);
        let all = arena.sorted();
        for (tref, driver) in &all {
            let mut seen = BTreeSet::from([*tref]);
            let mut cur = driver.next_ahead();
            while let Some(r) = cur {
                if !seen.insert(r) {
                    warn!(train = %driver.key(), "cycle in train chain, cut");
                    driver.set_next_ahead(None);
                    break;
                }
                cur = arena.get(r).and_then(|d| d.next_ahead());
            }
        }
    }

    /// Move a live train between operating lines' active lists.
    pub fn move_active(&self, tref: TrainRef, from: LineId, to: LineId) {
        let mut active = lock(&self.active);
        if let Some(list) = active.get_mut(&from) {
            list.retain(|&r| r != tref);
        }
        active.entry(to).or_default().push(tref);
    }

    /// Free `tref`'s slot and drop it from every active list.
    pub fn deregister(&self, tref: TrainRef) -> Option<Arc<TrainDriver>> {
        let mut arena = write(&self.arena);
        let driver = arena.remove(tref)?;
        for list in lock(&self.active).values_mut() {
            list.retain(|&r| r != tref);
        }
        Some(driver)
    }

    // ── Depot ─────────────────────────────────────────────────────────────

    /// Cycle returned ids: release them to the owning line's pool, or park
    /// them if requested.
    pub fn handle_depot_messages(&self, bus: &MessageBus) -> usize {
        let msgs = bus.drain();
        for msg in &msgs {
            let DepotMessage::TrainReturned { key, park } = *msg;
            let park = park || lock(&self.park_on_return).remove(&key);
            let ok = if park {
                self.pool.retire(key.line, key.train)
            } else {
                self.pool.release(key.line, key.train)
            };
            if !ok {
                warn!(train = %key, "returned train id was not in use");
            }
            debug!(train = %key, park, "train back in depot");
        }
        msgs.len()
    }

    /// Park `train`'s id now if it is idle, or when it next returns.
    pub fn push_into_inactive_pool(&self, line: LineId, train: TrainId) -> bool {
        if self.pool.park(line, train) {
            return true;
        }
        if self.pool.state_of(line, train) == Some(crate::IdState::InUse) {
            lock(&self.park_on_return).insert(TrainKey::new(line, train));
            return true;
        }
        false
    }

    pub fn pull_out(&self, line: LineId) -> Option<TrainId> {
        self.pool.unpark(line)
    }

    // ── Schedule changes ──────────────────────────────────────────────────

    /// Add an operator trip starting at `start`, optionally from a station
    /// other than the line's origin.
    pub fn insert_unscheduled(
        &self,
        line:          LineId,
        start:         DailyTime,
        start_station: Option<StationId>,
    ) -> ControlResult<TripId> {
        let route = self.network.line(line).ok_or(ControlError::UnknownLine(line))?;
        let platforms = match start_station {
            Some(station) => {
                let origin = self
                    .network
                    .platform_at(line, station)
                    .ok_or(ControlError::StationOffLine { station, line })?;
                self.network
                    .platforms_from(line, origin)
                    .ok_or(ControlError::StationOffLine { station, line })?
            }
            None => route.platforms.clone(),
        };
        if platforms.len() < 2 {
            return Err(ControlError::Config(format!(
                "trip on {line} needs at least two platforms"
            )));
        }
        let id = self.trip_ids.next_id();
        lock(&self.queue).insert_unscheduled(TrainTrip {
            id,
            line,
            start,
            platforms,
            unscheduled: true,
        });
        info!(%line, trip = %id, %start, "unscheduled trip inserted");
        Ok(id)
    }

    /// Stop dispatching on `line`.  Running trains end at their next platform.
    pub fn terminate_line(&self, line: LineId) {
        write(&self.terminated).insert(line);
        let dropped = lock(&self.queue).drop_line(line);
        info!(%line, dropped, "train service terminated");
    }

    pub fn is_terminated(&self, line: LineId) -> bool {
        read(&self.terminated).contains(&line)
    }

    pub fn terminated_lines(&self) -> BTreeSet<LineId> {
        read(&self.terminated).clone()
    }

    // ── Disruptions ───────────────────────────────────────────────────────

    /// Timed disruption of `start..=end` on `line` for `duration_secs` from
    /// `start_time`.
    pub fn perform_disruption(
        &self,
        line:          LineId,
        start:         StationId,
        end:           StationId,
        start_time:    DailyTime,
        duration_secs: u32,
    ) -> ControlResult<()> {
        let window = Some((start_time, start_time.add_secs(duration_secs)));
        let entity = DisruptionEntity::compute(&self.network, line, start, end, window)?;
        lock(&self.disruptions).add(entity);
        Ok(())
    }

    /// Open-ended disruption of `start..=end` on `line`.
    pub fn set_disrupted_platforms(&self, line: LineId, start: StationId, end: StationId) -> ControlResult<()> {
        let entity = DisruptionEntity::compute(&self.network, line, start, end, None)?;
        lock(&self.disruptions).add(entity);
        Ok(())
    }

    /// Returns the lines whose disruption state changed.
    pub fn clear_disruption(&self, line: LineId) -> BTreeSet<LineId> {
        let lines = lock(&self.disruptions).clear_line(line);
        if !lines.is_empty() {
            info!(%line, "disruption cleared");
        }
        lines
    }

    pub fn disrupted(&self, now: DailyTime) -> BTreeMap<LineId, BTreeSet<PlatformId>> {
        lock(&self.disruptions).active(now)
    }

    pub fn disrupted_platforms(&self, line: LineId, now: DailyTime) -> Vec<PlatformId> {
        lock(&self.disruptions).platforms_for(&self.network, line, now)
    }

    pub fn is_line_disrupted(&self, line: LineId, now: DailyTime) -> bool {
        self.disrupted(now).get(&line).is_some_and(|s| !s.is_empty())
    }

    // ── Speed and dwell ───────────────────────────────────────────────────

    pub fn reset_speed_limit(
        &self,
        speed_mps: f64,
        start_stn: StationId,
        end_stn:   StationId,
        line:      LineId,
        start:     DailyTime,
        end:       DailyTime,
    ) -> ControlResult<()> {
        let r = SpeedRestriction::compute(&self.network, line, start_stn, end_stn, speed_mps, start, end)?;
        lock(&self.restrictions).add_speed(r);
        Ok(())
    }

    pub fn reset_acceleration(&self, line: LineId, accel_mps2: f64) -> ControlResult<()> {
        self.network.line(line).ok_or(ControlError::UnknownLine(line))?;
        lock(&self.restrictions).set_accel(line, accel_mps2);
        info!(%line, accel_mps2, "acceleration reset");
        Ok(())
    }

    pub fn limits(&self, now: DailyTime) -> BlockLimits {
        lock(&self.restrictions).limits(&self.network, now)
    }

    /// Drop expired speed restrictions and disruptions.  Returns the lines
    /// whose disruption ended.
    pub fn expire(&self, now: DailyTime) -> BTreeSet<LineId> {
        lock(&self.restrictions).expire(now);
        lock(&self.disruptions).expire(now)
    }

    pub fn set_dwell_scaling(&self, line: LineId, scaling: DwellScaling) {
        lock(&self.scaling).insert(line, scaling);
    }

    pub fn clear_dwell_scaling(&self, line: LineId) {
        lock(&self.scaling).remove(&line);
    }

    pub fn dwell_scaling(&self, line: LineId) -> DwellScaling {
        lock(&self.scaling).get(&line).copied().unwrap_or_default()
    }

    pub fn dwell_model(&self, line: LineId) -> Option<&DwellModel> {
        self.dwell_models.get(&line)
    }
}
