//! `TrainDriver` — one running train.
//!
//! A driver owns two locks: `overrides` (operator-written) and `state`
//! (tick-written).  When both are needed, `overrides` is taken first.
//! Operator commands from other threads therefore never observe a
//! half-applied tick.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace};

use rt_core::{DailyTime, LineId, PlatformId, TrainKey, TrainRef, TripId, lock};
use rt_network::{LineProperties, PlatformKind, RailNetwork};

use crate::movement::{APPROACH_WINDOW_M, ARRIVAL_EPSILON_M, Constraint, ConstraintKind, plan_step};
use crate::{
    DriverOverrides, DwellModel, DwellScaling, HoldingBounds, MovementError, MovementResult,
    Passenger, PassengerRestriction, StopPoint, TickView, TrainMovement, TrainSnapshot,
};

/// Speeds below this count as standing still.
const STANDSTILL_MPS: f64 = 1e-3;

// ── Phase and events ──────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DriverPhase {
    Depot,
    Moving,
    ApproachingPlatform,
    Dwelling,
    StoppedAtPoint,
    Terminal,
    ReturnToDepot,
}

impl DriverPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Depot               => "depot",
            Self::Moving              => "moving",
            Self::ApproachingPlatform => "approaching",
            Self::Dwelling            => "dwelling",
            Self::StoppedAtPoint      => "stopped",
            Self::Terminal            => "terminal",
            Self::ReturnToDepot       => "return_to_depot",
        }
    }

    /// Between platforms, on the track.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Moving | Self::ApproachingPlatform | Self::StoppedAtPoint)
    }
}

/// What a train's tick asks the apply phase to do.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TrainEvent {
    /// Came to a stand at `platform`.  `hold` = held there by a disruption
    /// ahead: passengers are put off instead of exchanged.
    Arrived { platform: PlatformId, hold: bool },
    /// A disruption ahead was declared while dwelling at `platform`.
    Held { platform: PlatformId },
    Departed { platform: PlatformId },
    UturnRequested { platform: PlatformId },
    Finished { platform: PlatformId },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExchangeOutcome {
    pub boarded:   u32,
    pub alighted:  u32,
    pub denied:    u32,
    /// Put off before their destination and returned to the platform queue.
    pub requeued:  u32,
    pub occupancy: u32,
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default)]
struct DwellClock {
    total:     f64,
    remaining: f64,
}

impl DwellClock {
    fn set(&mut self, secs: f64) {
        self.total = secs;
        self.remaining = secs;
    }

    /// Change the dwell length, keeping the time already spent.
    fn rescale(&mut self, secs: f64) {
        let elapsed = self.total - self.remaining;
        self.total = secs;
        self.remaining = (secs - elapsed).max(0.0);
    }
}

struct DriverState {
    /// Line currently operated on; differs from `key.line` after a U-turn.
    line:              LineId,
    phase:             DriverPhase,
    movement:          TrainMovement,
    passengers:        Vec<Passenger>,
    next_ahead:        Option<TrainRef>,
    safe_distance_m:   f64,
    safe_headway_secs: f64,
    dwell:             DwellClock,
    at_platform:       Option<PlatformId>,
    last_platform:     Option<PlatformId>,
    stop_wait_secs:    f64,
    /// Held at a platform by a disruption ahead.
    disruption_hold:   bool,
    disrupted:         bool,
    force_alighted:    bool,
    terminating:       bool,
    faulted:           bool,
}

impl DriverState {
    fn arrive(&mut self, platform: PlatformId) {
        self.phase = DriverPhase::Dwelling;
        self.at_platform = Some(platform);
        self.last_platform = Some(platform);
        self.movement.speed_mps = 0.0;
        self.movement.accel_mps2 = 0.0;
        self.dwell = DwellClock::default();
    }

    /// `true` when the next platform served is disrupted and `platform`
    /// itself is not.
    fn must_hold_at(&self, view: &TickView<'_>, platform: PlatformId) -> bool {
        let Some(disrupted) = view.disrupted_on(self.line) else {
            return false;
        };
        !disrupted.contains(&platform)
            && self.movement.platforms.ahead().first().is_some_and(|p| disrupted.contains(p))
    }

    /// Distance to the block where the disrupted region starts, when the
    /// next platform is disrupted and the train has not yet entered it.
    fn disruption_boundary(&self, view: &TickView<'_>, target: PlatformId) -> Option<f64> {
        let disrupted = view.disrupted_on(self.line)?;
        if !disrupted.contains(&target) {
            return None;
        }
        if self.last_platform.is_some_and(|p| disrupted.contains(&p)) {
            return None;
        }
        let pos = self.movement.path.position();
        let boundary = view.network.platform_block_start(target)?;
        (boundary >= pos - ARRIVAL_EPSILON_M).then(|| (boundary - pos).max(0.0))
    }
}

// ── TrainDriver ───────────────────────────────────────────────────────────────

pub struct TrainDriver {
    key:              TrainKey,
    tref:             TrainRef,
    trip:             TripId,
    capacity:         u32,
    state:            Mutex<DriverState>,
    overrides:        Mutex<DriverOverrides>,
    removal_enqueued: AtomicBool,
}

impl TrainDriver {
    pub fn new(
        key:      TrainKey,
        tref:     TrainRef,
        trip:     TripId,
        movement: TrainMovement,
        props:    &LineProperties,
    ) -> Self {
        let line = movement.path.line();
        Self {
            key,
            tref,
            trip,
            capacity: props.capacity,
            state: Mutex::new(DriverState {
                line,
                phase:             DriverPhase::Depot,
                movement,
                passengers:        Vec::new(),
                next_ahead:        None,
                safe_distance_m:   props.safe_distance_m,
                safe_headway_secs: props.safe_headway_secs,
                dwell:             DwellClock::default(),
                at_platform:       None,
                last_platform:     None,
                stop_wait_secs:    0.0,
                disruption_hold:   false,
                disrupted:         false,
                force_alighted:    false,
                terminating:       false,
                faulted:           false,
            }),
            overrides: Mutex::new(DriverOverrides::default()),
            removal_enqueued: AtomicBool::new(false),
        }
    }

    // ── Identity ──────────────────────────────────────────────────────────

    #[inline]
    pub fn key(&self) -> TrainKey {
        self.key
    }

    #[inline]
    pub fn train_ref(&self) -> TrainRef {
        self.tref
    }

    #[inline]
    pub fn trip(&self) -> TripId {
        self.trip
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> TrainSnapshot {
        let st = lock(&self.state);
        TrainSnapshot {
            key:           self.key,
            line:          st.line,
            position_m:    st.movement.path.position(),
            speed_mps:     st.movement.speed_mps,
            phase:         st.phase,
            next_platform: st.movement.platforms.next(),
            at_platform:   st.at_platform,
        }
    }

    /// Line the train currently runs on; differs from `key().line` after a U-turn.
    pub fn operating_line(&self) -> LineId {
        lock(&self.state).line
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> DriverPhase {
        lock(&self.state).phase
    }

    /// Line-frame position in metres.
    pub fn position(&self) -> f64 {
        lock(&self.state).movement.path.position()
    }

    /// Speed in m/s.
    pub fn speed(&self) -> f64 {
        lock(&self.state).movement.speed_mps
    }

    /// Passengers on board.
    pub fn occupancy(&self) -> u32 {
        lock(&self.state).passengers.len() as u32
    }

    /// Platform under the cursor: the one being approached or served.
    pub fn next_platform(&self) -> Option<PlatformId> {
        lock(&self.state).movement.platforms.next()
    }

    /// Platform the train stands at, `None` while running or in depot.
    pub fn at_platform(&self) -> Option<PlatformId> {
        lock(&self.state).at_platform
    }

    /// Platforms still to be served, the cursor's one first.
    pub fn remaining_platforms(&self) -> Vec<PlatformId> {
        let st = lock(&self.state);
        let mut out = Vec::new();
        out.extend(st.movement.platforms.next());
        out.extend_from_slice(st.movement.platforms.ahead());
        out
    }

    /// Platform `offset` stops past the cursor.
    pub fn platform_by_offset(&self, offset: usize) -> Option<PlatformId> {
        lock(&self.state).movement.platforms.by_offset(offset)
    }

    /// Metres left to the next platform's stop position.
    pub fn distance_to_next_platform(&self, network: &RailNetwork) -> Option<f64> {
        lock(&self.state).movement.distance_to_next_platform(network)
    }

    /// Total dwell at the current platform, `None` unless dwelling.
    pub fn dwell_time(&self) -> Option<f64> {
        let st = lock(&self.state);
        (st.phase == DriverPhase::Dwelling).then_some(st.dwell.total)
    }

    /// Dwell seconds still to run, `None` unless dwelling.
    pub fn remaining_dwell(&self) -> Option<f64> {
        let st = lock(&self.state);
        (st.phase == DriverPhase::Dwelling).then_some(st.dwell.remaining)
    }

    /// Train directly ahead on the same line.
    pub fn next_ahead(&self) -> Option<TrainRef> {
        lock(&self.state).next_ahead
    }

    /// Relink to the train ahead.  A link to itself is dropped.
    pub fn set_next_ahead(&self, ahead: Option<TrainRef>) {
        let ahead = ahead.filter(|&r| r != self.tref);
        lock(&self.state).next_ahead = ahead;
    }

    /// Standing still between platforms while its line is disrupted.
    pub fn is_stranded(&self, line_disrupted: bool) -> bool {
        let st = lock(&self.state);
        line_disrupted && st.phase.is_running() && st.movement.speed_mps < STANDSTILL_MPS
    }

    /// Held by, or braking for, a disrupted region.
    pub fn disrupted_state(&self) -> bool {
        lock(&self.state).disrupted
    }

    /// Passengers were put off short of their destination at the last stop.
    pub fn force_alight_status(&self) -> bool {
        lock(&self.state).force_alighted
    }

    /// A tick failed; the train is out of service.
    pub fn is_faulted(&self) -> bool {
        lock(&self.state).faulted
    }

    /// Operator asked for a U-turn at the next opportunity.
    pub fn uturn_flag(&self) -> bool {
        lock(&self.overrides).uturn
    }

    /// Time gap kept to the train ahead.
    pub fn safe_headway_secs(&self) -> f64 {
        lock(&self.state).safe_headway_secs
    }

    // ── Operator setters ──────────────────────────────────────────────────

    /// Negative values clamp to zero.
    pub fn set_safe_headway(&self, secs: f64) {
        lock(&self.state).safe_headway_secs = secs.max(0.0);
    }

    /// Negative values clamp to zero.
    pub fn set_safe_distance(&self, metres: f64) {
        lock(&self.state).safe_distance_m = metres.max(0.0);
    }

    /// Follow the train ahead without the fixed safe distance.
    pub fn set_ignore_safe_distance(&self, ignore: bool) {
        lock(&self.overrides).ignore_safe_distance = ignore;
    }

    /// Follow the train ahead without the speed-proportional headway margin.
    pub fn set_ignore_safe_headway(&self, ignore: bool) {
        lock(&self.overrides).ignore_safe_headway = ignore;
    }

    /// Schedule a stop `distance_m` ahead of the current position.
    ///
    /// Returns `false` when the point would lie behind the train or past the
    /// end of the line.
    pub fn insert_stop_point(&self, distance_m: f64, duration_secs: f64, max_decel_mps2: Option<f64>) -> bool {
        if !distance_m.is_finite() || distance_m <= 0.0 || duration_secs < 0.0 {
            return false;
        }
        let mut ov = lock(&self.overrides);
        let st = lock(&self.state);
        let position_m = st.movement.path.position() + distance_m;
        if position_m > st.movement.path.length() {
            return false;
        }
        ov.insert_stop_point(StopPoint {
            position_m,
            duration_secs,
            max_decel_mps2: max_decel_mps2.filter(|d| *d > 0.0),
        });
        true
    }

    /// Drop every scheduled stop point.
    pub fn clear_stop_points(&self) {
        lock(&self.overrides).stop_points.clear();
    }

    /// Block boarding, alighting or both at `platform` for the next stop there.
    pub fn restrict_passengers(&self, platform: PlatformId, restriction: PassengerRestriction) {
        lock(&self.overrides).restrictions.insert(platform, restriction);
    }

    /// Exact dwell at `platform`.  Applies immediately when the train is
    /// already dwelling there.
    pub fn reset_holding(&self, platform: PlatformId, secs: f64) -> bool {
        let mut ov = lock(&self.overrides);
        if !ov.insert_holding(platform, secs) {
            return false;
        }
        let mut st = lock(&self.state);
        if st.phase == DriverPhase::Dwelling && st.at_platform == Some(platform) {
            ov.holding.remove(&platform);
            st.dwell.rescale(secs);
        }
        true
    }

    /// Upper dwell bound at `platform`.  Wins over a larger minimum.
    pub fn reset_max_holding(&self, platform: PlatformId, secs: f64) {
        lock(&self.overrides).max_holding.insert(platform, secs.max(0.0));
    }

    /// Lower dwell bound at `platform`, replacing the platform-type minimum.
    pub fn reset_min_holding(&self, platform: PlatformId, secs: f64) {
        lock(&self.overrides).min_holding.insert(platform, secs.max(0.0));
    }

    /// Request (or withdraw) a U-turn onto the opposite line.
    pub fn set_uturn(&self, flag: bool) {
        lock(&self.overrides).uturn = flag;
    }

    /// End the trip at the next platform.
    pub fn terminate(&self) {
        lock(&self.overrides).terminate = true;
    }

    /// Platforms to run through without stopping.  The final one is always served.
    pub fn set_ignore_platforms(&self, platforms: impl IntoIterator<Item = PlatformId>) {
        lock(&self.overrides).ignore_platforms = platforms.into_iter().collect();
    }

    /// Put every passenger off at the next stop, requeueing those short of their destination.
    pub fn force_release(&self) {
        lock(&self.overrides).force_alight = true;
    }

    /// Claim this train for removal.  `true` only for the first caller.
    pub fn mark_removal_enqueued(&self) -> bool {
        !self.removal_enqueued.swap(true, Ordering::AcqRel)
    }

    /// Stop the train and send it back to depot after a failed tick.
    pub fn mark_faulted(&self) {
        let mut st = lock(&self.state);
        st.faulted = true;
        st.phase = DriverPhase::ReturnToDepot;
        st.movement.speed_mps = 0.0;
    }

    /// Trip over; the train leaves the platform for the depot.
    pub fn finish(&self) {
        let mut st = lock(&self.state);
        st.phase = DriverPhase::ReturnToDepot;
        st.at_platform = None;
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance this train by one tick.
    ///
    /// Reads other trains only through `view`.  Anything that touches shared
    /// state is returned as a [`TrainEvent`].
    pub fn tick(&self, view: &TickView<'_>) -> MovementResult<Vec<TrainEvent>> {
        let mut ov = lock(&self.overrides);
        let mut st = lock(&self.state);
        let st = &mut *st;
        let mut events = Vec::new();

        if !st.terminating && (ov.terminate || view.is_terminated(st.line)) {
            st.terminating = true;
            st.movement.platforms.truncate_after_cursor();
            info!(train = %self.key, "service terminated, ending at next platform");
        }

        match st.phase {
            DriverPhase::Terminal | DriverPhase::ReturnToDepot => return Ok(events),

            DriverPhase::Depot => {
                let platform = st.movement.platforms.next().ok_or(MovementError::NoPlatforms(self.key))?;
                let occupied = view.trains.iter().any(|(&r, s)| {
                    r != self.tref && s.line == st.line && s.at_platform == Some(platform)
                });
                if occupied {
                    trace!(train = %self.key, %platform, "origin platform occupied, waiting");
                    return Ok(events);
                }
                st.arrive(platform);
                let hold = st.must_hold_at(view, platform);
                if hold {
                    st.disruption_hold = true;
                    st.disrupted = true;
                }
                events.push(TrainEvent::Arrived { platform, hold });
                return Ok(events);
            }

            DriverPhase::Dwelling => {
                let platform = st.at_platform.ok_or(MovementError::NoPlatforms(self.key))?;
                st.dwell.remaining = (st.dwell.remaining - view.dt_secs).max(0.0);

                if !st.disruption_hold && st.must_hold_at(view, platform) {
                    st.disruption_hold = true;
                    st.disrupted = true;
                    events.push(TrainEvent::Held { platform });
                }
                if st.disruption_hold {
                    if st.must_hold_at(view, platform) {
                        let auto = view.network.props(st.line).is_some_and(|p| p.auto_uturn_on_disruption);
                        if view.network.opposite_line(st.line).is_some() && (auto || ov.uturn) {
                            events.push(TrainEvent::UturnRequested { platform });
                        }
                        return Ok(events);
                    }
                    debug!(train = %self.key, %platform, "disruption cleared, resuming");
                    st.disruption_hold = false;
                    st.disrupted = false;
                    st.force_alighted = false;
                }

                if ov.uturn && view.network.opposite_line(st.line).is_some() {
                    events.push(TrainEvent::UturnRequested { platform });
                    return Ok(events);
                }
                if st.dwell.remaining > 0.0 {
                    return Ok(events);
                }
                if st.movement.platforms.is_last() {
                    st.phase = DriverPhase::Terminal;
                    events.push(TrainEvent::Finished { platform });
                    return Ok(events);
                }

                events.push(TrainEvent::Departed { platform });
                st.at_platform = None;
                st.movement.platforms.advance(&ov.ignore_platforms);
                st.phase = DriverPhase::Moving;
            }

            DriverPhase::StoppedAtPoint => {
                st.stop_wait_secs -= view.dt_secs;
                if st.stop_wait_secs > 0.0 {
                    return Ok(events);
                }
                ov.discard_stop_points_behind(st.movement.path.position());
                st.phase = DriverPhase::Moving;
            }

            DriverPhase::Moving | DriverPhase::ApproachingPlatform => {}
        }

        self.step_movement(st, &mut ov, view, &mut events)?;
        Ok(events)
    }

    fn step_movement(
        &self,
        st:     &mut DriverState,
        ov:     &mut DriverOverrides,
        view:   &TickView<'_>,
        events: &mut Vec<TrainEvent>,
    ) -> MovementResult<()> {
        let line = st.line;
        let target = st.movement.platforms.next().ok_or(MovementError::NoPlatforms(self.key))?;
        let stop = view
            .network
            .stop_position(line, target)
            .ok_or(MovementError::PlatformOffLine { platform: target, line })?;
        let block = st.movement.path.current_block();
        let rates = view.limits.get(block).ok_or(MovementError::UnknownBlock(block))?;
        let pos = st.movement.path.position();
        let v = st.movement.speed_mps;

        let mut constraints = Vec::with_capacity(4);
        constraints.push(Constraint {
            distance_m: stop - pos,
            decel_mps2: rates.decel_mps2,
            kind:       ConstraintKind::Platform,
        });
        if let Some(gap) = self.gap_to_train_ahead(st, ov, view) {
            constraints.push(Constraint {
                distance_m: gap,
                decel_mps2: rates.decel_mps2,
                kind:       ConstraintKind::TrainAhead,
            });
        }
        if let Some(sp) = ov.next_stop_point(pos) {
            constraints.push(Constraint {
                distance_m: sp.position_m - pos,
                decel_mps2: sp.max_decel_mps2.unwrap_or(rates.decel_mps2),
                kind:       ConstraintKind::StopPoint,
            });
        }
        let boundary = st.disruption_boundary(view, target);
        if let Some(d) = boundary {
            constraints.push(Constraint {
                distance_m: d,
                decel_mps2: rates.decel_mps2,
                kind:       ConstraintKind::DisruptionBoundary,
            });
        }
        st.disrupted = boundary.is_some() || st.disruption_hold;

        let plan = plan_step(v, view.dt_secs, rates, &constraints);
        if plan.distance_m > 0.0 {
            st.movement.path.advance(plan.distance_m)?;
        }
        st.movement.speed_mps = plan.speed_mps;
        st.movement.accel_mps2 = plan.accel_mps2;
        let pos = st.movement.path.position();

        if stop - pos <= ARRIVAL_EPSILON_M {
            st.arrive(target);
            ov.discard_stop_points_behind(pos);
            let hold = st.must_hold_at(view, target);
            if hold {
                st.disruption_hold = true;
                st.disrupted = true;
            }
            events.push(TrainEvent::Arrived { platform: target, hold });
            return Ok(());
        }

        if plan.reached && plan.binding == Some(ConstraintKind::StopPoint) {
            if let Some(sp) = ov.next_stop_point(pos) {
                st.stop_wait_secs = sp.duration_secs;
                st.phase = DriverPhase::StoppedAtPoint;
                debug!(train = %self.key, position_m = pos, secs = sp.duration_secs, "holding at stop point");
                return Ok(());
            }
        }

        let braking = if rates.decel_mps2 > 0.0 {
            st.movement.speed_mps.powi(2) / (2.0 * rates.decel_mps2)
        } else {
            0.0
        };
        st.phase = if stop - pos <= braking + APPROACH_WINDOW_M {
            DriverPhase::ApproachingPlatform
        } else {
            DriverPhase::Moving
        };
        Ok(())
    }

    /// Usable distance to the train ahead on the same line, after the safe
    /// distance and the speed-proportional headway margin.
    fn gap_to_train_ahead(&self, st: &DriverState, ov: &DriverOverrides, view: &TickView<'_>) -> Option<f64> {
        let ahead = view.trains.get(&st.next_ahead?)?;
        let pos = st.movement.path.position();
        if ahead.line != st.line || ahead.position_m < pos {
            return None;
        }
        let mut gap = ahead.position_m - pos;
        if !ov.ignore_safe_distance {
            gap -= st.safe_distance_m;
        }
        if !ov.ignore_safe_headway {
            gap -= st.safe_headway_secs * st.movement.speed_mps;
        }
        Some(gap.max(0.0))
    }

    // ── Apply-phase operations ────────────────────────────────────────────

    /// Alight, then board, at `platform`.
    ///
    /// Alighting takes everyone whose destination is this platform or one
    /// already passed.  Riders whose destination was cut from the trip stay
    /// aboard until the train finishes and requeues them.  Boarding takes
    /// waiting passengers, front first, whose
    /// destination is ahead, until the train is full; eligible passengers
    /// left behind get their denied-boarding count bumped.
    pub fn exchange(
        &self,
        network:  &RailNetwork,
        platform: PlatformId,
        waiting:  &mut VecDeque<Passenger>,
        now:      DailyTime,
    ) -> ExchangeOutcome {
        let mut ov = lock(&self.overrides);
        let mut st = lock(&self.state);
        let st = &mut *st;
        let mut out = ExchangeOutcome::default();
        let restriction = ov.restrictions.get(&platform).copied();
        let ahead: BTreeSet<PlatformId> = st.movement.platforms.ahead().iter().copied().collect();
        let passed: BTreeSet<PlatformId> = st.movement.platforms.passed().iter().copied().collect();

        let forced = std::mem::take(&mut ov.force_alight);
        if forced {
            st.force_alighted = true;
            let requeue = !network.is_line_terminal(platform);
            for p in st.passengers.drain(..) {
                if p.destination != platform && requeue {
                    out.requeued += 1;
                    waiting.push_back(p);
                } else {
                    out.alighted += 1;
                }
            }
            info!(train = %self.key, %platform, requeued = out.requeued, "passengers force-released");
        } else if !restriction.is_some_and(PassengerRestriction::blocks_alighting) {
            let (off, stay): (Vec<_>, Vec<_>) = std::mem::take(&mut st.passengers)
                .into_iter()
                .partition(|p| p.destination == platform || passed.contains(&p.destination));
            st.passengers = stay;
            out.alighted = off.len() as u32;
        }
        if restriction == Some(PassengerRestriction::Alighting) {
            ov.restrictions.remove(&platform);
        }

        if !forced && !restriction.is_some_and(PassengerRestriction::blocks_boarding) {
            let mut room = (self.capacity as usize).saturating_sub(st.passengers.len());
            let mut kept = VecDeque::with_capacity(waiting.len());
            while let Some(mut p) = waiting.pop_front() {
                if !ahead.contains(&p.destination) {
                    kept.push_back(p);
                } else if room > 0 {
                    p.boarded_at = Some(now);
                    st.passengers.push(p);
                    room -= 1;
                    out.boarded += 1;
                } else {
                    p.denied_boarding += 1;
                    out.denied += 1;
                    kept.push_back(p);
                }
            }
            *waiting = kept;
        }
        if matches!(restriction, Some(PassengerRestriction::Boarding | PassengerRestriction::Both)) {
            ov.restrictions.remove(&platform);
        }

        out.occupancy = st.passengers.len() as u32;
        out
    }

    /// Put every passenger off at `platform`.
    ///
    /// Returns `(alighted, requeue)`; `requeue` holds those short of their
    /// destination, to go back on the platform's queue.  Nobody is requeued at
    /// the line's terminal.
    pub fn evacuate(&self, network: &RailNetwork, platform: PlatformId, disruption: bool) -> (u32, Vec<Passenger>) {
        let mut st = lock(&self.state);
        if disruption {
            st.force_alighted = true;
        }
        let requeue_allowed = !network.is_line_terminal(platform);
        let mut alighted = 0;
        let mut requeue = Vec::new();
        for p in st.passengers.drain(..) {
            if p.destination != platform && requeue_allowed {
                requeue.push(p);
            } else {
                alighted += 1;
            }
        }
        (alighted, requeue)
    }

    /// Resolve and start the dwell at `platform` after an exchange.
    ///
    /// Consumes an exact holding override for the platform if one is set.
    pub fn settle_dwell(
        &self,
        network:  &RailNetwork,
        platform: PlatformId,
        model:    &DwellModel,
        scaling:  DwellScaling,
        outcome:  &ExchangeOutcome,
    ) -> f64 {
        let kind = network.platform(platform).map_or(PlatformKind::Normal, |p| p.kind);
        let mut ov = lock(&self.overrides);
        let bounds = HoldingBounds {
            exact: ov.holding.remove(&platform),
            max:   ov.max_holding.get(&platform).copied(),
            min:   ov.min_holding.get(&platform).copied(),
        };
        let raw = model.raw(outcome.boarded, outcome.alighted, outcome.occupancy, scaling);
        let dwell = model.resolve(raw, kind, bounds);
        lock(&self.state).dwell.set(dwell);
        trace!(train = %self.key, %platform, raw, dwell, "dwell settled");
        dwell
    }

    /// Restart this train on `line` at `platform` (the mirrored platform of
    /// the one it stood at), in `Depot`, serving the rest of `line`.
    pub fn perform_uturn(&self, network: &RailNetwork, line: LineId, platform: PlatformId) -> MovementResult<()> {
        let platforms = network
            .platforms_from(line, platform)
            .ok_or(MovementError::PlatformOffLine { platform, line })?;
        let movement = TrainMovement::at_first_platform(network, line, platforms)?;
        let mut ov = lock(&self.overrides);
        let mut st = lock(&self.state);
        ov.uturn = false;
        ov.stop_points.clear();
        if let Some(props) = network.props(line) {
            st.safe_distance_m = props.safe_distance_m;
            st.safe_headway_secs = props.safe_headway_secs;
        }
        st.line = line;
        st.movement = movement;
        st.phase = DriverPhase::Depot;
        st.at_platform = None;
        st.last_platform = None;
        st.next_ahead = None;
        st.dwell = DwellClock::default();
        st.disruption_hold = false;
        st.disrupted = false;
        if st.terminating {
            st.movement.platforms.truncate_after_cursor();
        }
        info!(train = %self.key, %line, %platform, "u-turned");
        Ok(())
    }
}
