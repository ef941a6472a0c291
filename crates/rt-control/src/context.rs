//! `RailContext` — everything one simulation needs, built once and shared.
//!
//! # Per-tick protocol
//!
//! ```text
//! begin_tick(now)        expire overrides, dispatch due trips, register, rechain
//! frame(now, dt)         freeze limits, disruptions and train snapshots
//!   driver.tick(view)    every train, in any order or in parallel
//! apply(frame, tref, ev) sequential, ascending TrainRef
//! end_tick()             removal flush + depot messages (post-barrier)
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use tracing::{debug, error, instrument, warn};

use rt_core::{DailyTime, LineId, PlatformId, TrainKey, TrainRef, TripId, lock};
use rt_driver::{
    DriverPhase, ExchangeOutcome, MovementError, Passenger, TickView, TrainDriver, TrainEvent,
    TrainSnapshot,
};
use rt_network::{BlockLimits, RailNetwork};
use rt_schedule::{TrainTrip, TripIdGen};

use crate::{DepotMessage, MessageBus, ServiceController, StationBook, TrainController, TrainRemoval};

/// One stop of one train, for output.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrivalRecord {
    pub train:      TrainKey,
    /// Line the train was operating on.
    pub line:       LineId,
    pub trip:       TripId,
    pub platform:   PlatformId,
    pub time:       DailyTime,
    pub boarded:    u32,
    pub alighted:   u32,
    pub denied:     u32,
    pub occupancy:  u32,
    pub dwell_secs: f64,
}

/// State frozen at the start of the train phase.
pub struct TickFrame {
    pub now:        DailyTime,
    pub dt_secs:    f64,
    pub limits:     BlockLimits,
    pub disrupted:  BTreeMap<LineId, BTreeSet<PlatformId>>,
    pub terminated: BTreeSet<LineId>,
    pub trains:     FxHashMap<TrainRef, TrainSnapshot>,
    /// Ascending by `TrainRef`.
    pub drivers:    Vec<(TrainRef, Arc<TrainDriver>)>,
}

impl TickFrame {
    pub fn view<'a>(&'a self, network: &'a RailNetwork) -> TickView<'a> {
        TickView {
            network,
            limits:     &self.limits,
            now:        self.now,
            dt_secs:    self.dt_secs,
            trains:     &self.trains,
            disrupted:  &self.disrupted,
            terminated: &self.terminated,
        }
    }
}

pub struct RailContext {
    pub network:    Arc<RailNetwork>,
    pub controller: Arc<TrainController>,
    pub service:    Arc<ServiceController>,
    pub removal:    TrainRemoval,
    pub stations:   Mutex<StationBook>,
    pub bus:        MessageBus,
}

impl RailContext {
    pub fn new(network: Arc<RailNetwork>, trips: Vec<TrainTrip>, trip_ids: TripIdGen) -> Self {
        let controller = Arc::new(TrainController::new(Arc::clone(&network), trips, trip_ids));
        let service = Arc::new(ServiceController::new(Arc::clone(&controller)));
        Self {
            stations: Mutex::new(StationBook::new(&network)),
            network,
            controller,
            service,
            removal: TrainRemoval::default(),
            bus: MessageBus::default(),
        }
    }

    /// Queue a passenger at their origin platform.
    pub fn add_passenger(&self, passenger: Passenger) -> bool {
        let mut stations = lock(&self.stations);
        match stations.get_mut(passenger.origin) {
            Some(book) => {
                book.waiting.push_back(passenger);
                true
            }
            None => false,
        }
    }

    pub fn waiting_at(&self, platform: PlatformId) -> usize {
        lock(&self.stations).get(platform).map_or(0, |b| b.waiting.len())
    }

    // ── Tick phases ───────────────────────────────────────────────────────

    /// Expire timed overrides, dispatch due trips and order every line.
    /// Returns the number of trains dispatched.
    pub fn begin_tick(&self, now: DailyTime) -> usize {
        self.controller.set_now(now);
        self.controller.expire(now);
        let spawned = self.controller.dispatch_due(now);
        for driver in &spawned {
            self.service.register(Arc::clone(driver));
        }
        self.controller.rechain_all();
        spawned.len()
    }

    pub fn frame(&self, now: DailyTime, dt_secs: f64) -> TickFrame {
        let drivers = self.controller.drivers();
        let trains = drivers.iter().map(|(r, d)| (*r, d.snapshot())).collect();
        TickFrame {
            now,
            dt_secs,
            limits: self.controller.limits(now),
            disrupted: self.controller.disrupted(now),
            terminated: self.controller.terminated_lines(),
            trains,
            drivers,
        }
    }

    /// Carry out one train's events.  Returns its arrivals.
    pub fn apply(&self, frame: &TickFrame, tref: TrainRef, events: Vec<TrainEvent>) -> Vec<ArrivalRecord> {
        let Some(driver) = self.controller.driver(tref) else {
            return Vec::new();
        };
        let now = frame.now;
        let mut records = Vec::new();

        for ev in events {
            match ev {
                TrainEvent::Arrived { platform, hold } => {
                    let outcome = {
                        let mut stations = lock(&self.stations);
                        let Some(book) = stations.get_mut(platform) else { continue };
                        book.occupant = Some(tref);
                        if hold {
                            let (alighted, requeue) = driver.evacuate(&self.network, platform, true);
                            let requeued = requeue.len() as u32;
                            book.waiting.extend(requeue);
                            ExchangeOutcome { alighted, requeued, ..ExchangeOutcome::default() }
                        } else {
                            driver.exchange(&self.network, platform, &mut book.waiting, now)
                        }
                    };
                    let line = driver.operating_line();
                    let dwell = match self.controller.dwell_model(line) {
                        Some(model) => driver.settle_dwell(
                            &self.network,
                            platform,
                            model,
                            self.controller.dwell_scaling(line),
                            &outcome,
                        ),
                        None => 0.0,
                    };
                    records.push(ArrivalRecord {
                        train: driver.key(),
                        line,
                        trip: driver.trip(),
                        platform,
                        time: now,
                        boarded: outcome.boarded,
                        alighted: outcome.alighted,
                        denied: outcome.denied,
                        occupancy: outcome.occupancy,
                        dwell_secs: dwell,
                    });
                }

                TrainEvent::Held { platform } => {
                    let (_, requeue) = driver.evacuate(&self.network, platform, true);
                    if let Some(book) = lock(&self.stations).get_mut(platform) {
                        book.waiting.extend(requeue);
                    }
                }

                TrainEvent::Departed { platform } => {
                    self.leave_platform(tref, platform, now);
                }

                TrainEvent::UturnRequested { platform } => {
                    if let Err(e) = self.try_uturn(frame, tref, &driver, platform) {
                        self.contain_fault(tref, &e);
                    }
                }

                TrainEvent::Finished { platform } => {
                    let (_, requeue) = driver.evacuate(&self.network, platform, false);
                    if let Some(book) = lock(&self.stations).get_mut(platform) {
                        book.waiting.extend(requeue);
                    }
                    self.leave_platform(tref, platform, now);
                    driver.finish();
                    self.removal.enqueue(&driver);
                }
            }
        }
        records
    }

    fn leave_platform(&self, tref: TrainRef, platform: PlatformId, now: DailyTime) {
        let mut stations = lock(&self.stations);
        if let Some(book) = stations.get_mut(platform) {
            if book.occupant == Some(tref) {
                book.occupant = None;
            }
            book.last_driver = Some(tref);
            book.last_departure = Some(now);
        }
    }

    /// U-turn `driver` from `platform` onto the opposite line, once the
    /// destination platform is free and its last departure is at least the
    /// safe headway ago.  Otherwise nothing happens and the train asks again
    /// next tick.
    fn try_uturn(
        &self,
        frame:    &TickFrame,
        tref:     TrainRef,
        driver:   &TrainDriver,
        platform: PlatformId,
    ) -> Result<(), MovementError> {
        let from = driver.operating_line();
        let (Some(opposite), Some(mirrored)) = (
            self.network.opposite_line(from),
            self.network.mirrored_platform(platform),
        ) else {
            warn!(train = %driver.key(), %platform, "no mirrored platform, u-turn dropped");
            driver.set_uturn(false);
            return Ok(());
        };

        let approaching = frame.trains.iter().any(|(&r, s)| {
            r != tref
                && s.line == opposite
                && (s.at_platform == Some(mirrored)
                    || (s.next_platform == Some(mirrored)
                        && matches!(s.phase, DriverPhase::Depot | DriverPhase::ApproachingPlatform)))
        });
        let (occupied, headway_ok) = {
            let stations = lock(&self.stations);
            let book = stations.get(mirrored);
            let occupied = book.and_then(|b| b.occupant).is_some_and(|o| o != tref);
            let headway_ok = book.and_then(|b| b.last_departure).is_none_or(|last| {
                frame.now.secs_since(last) as f64 >= driver.safe_headway_secs()
            });
            (occupied, headway_ok)
        };
        if approaching || occupied || !headway_ok {
            debug!(train = %driver.key(), %mirrored, approaching, occupied, headway_ok, "u-turn deferred");
            return Ok(());
        }

        let (_, requeue) = driver.evacuate(&self.network, platform, true);
        if let Some(book) = lock(&self.stations).get_mut(platform) {
            book.waiting.extend(requeue);
        }
        self.leave_platform(tref, platform, frame.now);
        driver.perform_uturn(&self.network, opposite, mirrored)?;
        self.controller.move_active(tref, from, opposite);
        self.controller.rechain(from);
        self.controller.rechain(opposite);
        Ok(())
    }

    /// Take a train whose tick failed out of service.  Other trains are
    /// unaffected.
    pub fn contain_fault(&self, tref: TrainRef, err: &MovementError) {
        let Some(driver) = self.controller.driver(tref) else { return };
        error!(train = %driver.key(), error = %err, "train faulted, removing from service");
        driver.mark_faulted();
        self.removal.enqueue(&driver);
    }

    /// Post-barrier flush.  Returns the number of trains removed.
    ///
    /// For each queued train: trains behind it are re-linked past it, the
    /// station ledger forgets it, it leaves the active lists, the arena and
    /// the command registry, and a depot message returns its id.
    #[instrument(level = "debug", skip_all)]
    pub fn end_tick(&self) -> usize {
        let pending = self.removal.drain();
        let removed: BTreeSet<TrainRef> = pending.iter().copied().collect();
        if !removed.is_empty() {
            self.controller.relink_around(&removed);
        }

        let mut count = 0;
        for &tref in &removed {
            lock(&self.stations).clear_train(tref);
            let Some(driver) = self.controller.deregister(tref) else { continue };
            self.service.deregister(&driver);
            self.bus.post(DepotMessage::TrainReturned {
                key:  driver.key(),
                park: driver.is_faulted(),
            });
            count += 1;
        }
        self.controller.handle_depot_messages(&self.bus);
        count
    }
}
