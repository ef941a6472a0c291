//! Unit tests for rt-control.

use std::sync::Arc;

use rt_core::{DailyTime, LineId, PassengerId, PlatformId, StationId, TrainId, TripId};
use rt_driver::Passenger;
use rt_network::{BlockSpec, LineProperties, PlatformKind, PlatformSpec, RailNetwork, RailNetworkBuilder};
use rt_schedule::{TrainTrip, TripIdGen};

use crate::{ArrivalRecord, RailContext};

// ── Helpers ───────────────────────────────────────────────────────────────────

const EW: LineId = LineId(0);
const WE: LineId = LineId(1);
const STN_A: StationId = StationId(0);
const STN_B: StationId = StationId(1);
const STN_C: StationId = StationId(2);
const STN_D: StationId = StationId(3);
const EW_A: PlatformId = PlatformId(0);
const EW_B: PlatformId = PlatformId(1);
const EW_C: PlatformId = PlatformId(2);
const EW_D: PlatformId = PlatformId(3);
const WE_D: PlatformId = PlatformId(4);
const WE_C: PlatformId = PlatformId(5);
const WE_B: PlatformId = PlatformId(6);
const WE_A: PlatformId = PlatformId(7);

/// Two opposite lines over stations A..D, 1 km blocks.
///
/// ```text
/// EW: A(600) ── B(1600) ── C(2600) ── D(3600)
/// WE: D(600) ── C(1600) ── B(2600) ── A(3600)
/// ```
fn line4(props: LineProperties) -> Arc<RailNetwork> {
    let mut b = RailNetworkBuilder::new();
    let ew = b.add_line("EW").unwrap();
    let we = b.add_line("WE").unwrap();
    let stations: Vec<StationId> = ["A", "B", "C", "D"].iter().map(|n| b.add_station(n).unwrap()).collect();
    for (line, prefix) in [(ew, "E"), (we, "W")] {
        for i in 1..=4 {
            let blk = b
                .add_block(BlockSpec {
                    name: format!("{prefix}{i}"),
                    length_m: 1_000.0,
                    speed_limit_mps: 20.0,
                    accel_mps2: 1.0,
                    decel_mps2: 1.2,
                })
                .unwrap();
            b.push_route_block(line, blk);
        }
    }
    let reversed: Vec<StationId> = stations.iter().rev().copied().collect();
    for (line, prefix, order) in [(ew, "E", &stations), (we, "W", &reversed)] {
        for (i, &stn) in order.iter().enumerate() {
            b.add_platform(PlatformSpec {
                name: format!("{prefix}P{}", i + 1),
                station: stn,
                line,
                block: b.block_id(&format!("{prefix}{}", i + 1)).unwrap(),
                capacity: 1_000,
                kind: if i == 3 { PlatformKind::Terminal } else { PlatformKind::Normal },
                offset_m: 450.0,
                length_m: 150.0,
            })
            .unwrap();
        }
    }
    b.pair_opposite(ew, we);
    b.set_properties(ew, props.clone());
    b.set_properties(we, props);
    Arc::new(b.build().unwrap())
}

fn hms(h: u32, m: u32, s: u32) -> DailyTime {
    DailyTime::from_hms(h, m, s)
}

fn trip(id: u64, start: DailyTime, platforms: Vec<PlatformId>) -> TrainTrip {
    TrainTrip { id: TripId(id), line: EW, start, platforms, unscheduled: false }
}

fn context(props: LineProperties, trips: Vec<TrainTrip>) -> RailContext {
    RailContext::new(line4(props), trips, TripIdGen::new(1_000))
}

/// One full tick with a 1 s step.
fn step(ctx: &RailContext, now: DailyTime) -> Vec<ArrivalRecord> {
    ctx.begin_tick(now);
    let frame = ctx.frame(now, 1.0);
    let view = frame.view(&ctx.network);
    let results: Vec<_> = frame.drivers.iter().map(|(r, d)| (*r, d.tick(&view))).collect();
    let mut records = Vec::new();
    for (tref, res) in results {
        match res {
            Ok(events) => records.extend(ctx.apply(&frame, tref, events)),
            Err(e) => ctx.contain_fault(tref, &e),
        }
    }
    ctx.end_tick();
    records
}

/// Step from `from` for up to `max` seconds until `done` holds.
fn run_until(ctx: &RailContext, from: DailyTime, max: u32, mut done: impl FnMut(&RailContext) -> bool) -> DailyTime {
    let mut now = from;
    for _ in 0..max {
        step(ctx, now);
        if done(ctx) {
            return now;
        }
        now = now.add_secs(1);
    }
    panic!("condition not reached within {max} s of {from}");
}

// ── TrainIdPool ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod pool_tests {
    use super::*;
    use crate::{IdState, TrainIdPool};
    use rt_core::SimRng;

    fn pool(min: u32, max: u32, parked: u32) -> TrainIdPool {
        TrainIdPool::from_network(&line4(LineProperties {
            min_train_id: min,
            max_train_id: max,
            initially_parked: parked,
            ..LineProperties::default()
        }))
    }

    #[test]
    fn initially_parked_takes_top_of_range() {
        let p = pool(1, 5, 2);
        let snap = p.snapshot(EW).unwrap();
        assert_eq!(snap.available, vec![TrainId(1), TrainId(2), TrainId(3)]);
        assert_eq!(snap.inactive, vec![TrainId(4), TrainId(5)]);
        assert!(snap.in_use.is_empty());
    }

    #[test]
    fn range_ending_below_reserved_id() {
        let p = pool(u32::MAX - 3, u32::MAX - 1, 1);
        let snap = p.snapshot(EW).unwrap();
        assert_eq!(snap.available, vec![TrainId(u32::MAX - 3), TrainId(u32::MAX - 2)]);
        assert_eq!(snap.inactive, vec![TrainId(u32::MAX - 1)]);
    }

    #[test]
    fn exhaustion_is_none_not_error() {
        let p = pool(1, 2, 0);
        assert_eq!(p.acquire(EW), Some(TrainId(1)));
        assert_eq!(p.acquire(EW), Some(TrainId(2)));
        assert_eq!(p.acquire(EW), None);
        assert!(p.release(EW, TrainId(1)));
        assert_eq!(p.acquire(EW), Some(TrainId(1)));
    }

    #[test]
    fn park_and_unpark_fifo() {
        let p = pool(1, 3, 0);
        assert!(p.park(EW, TrainId(3)));
        assert!(p.park(EW, TrainId(1)));
        assert!(!p.park(EW, TrainId(1)));
        assert_eq!(p.state_of(EW, TrainId(1)), Some(IdState::Inactive));
        assert_eq!(p.unpark(EW), Some(TrainId(3)));
        assert_eq!(p.unpark(EW), Some(TrainId(1)));
        assert_eq!(p.unpark(EW), None);
    }

    #[test]
    fn release_of_unused_id_refused() {
        let p = pool(1, 3, 0);
        assert!(!p.release(EW, TrainId(2)));
        assert!(!p.retire(EW, TrainId(2)));
        assert!(!p.release(LineId(9), TrainId(2)));
    }

    #[test]
    fn every_id_in_exactly_one_set() {
        let p = pool(1, 8, 2);
        let mut rng = SimRng::new(42);
        for _ in 0..2_000 {
            let id = TrainId(rng.gen_range(1..=8));
            match rng.gen_range(0..5) {
                0 => {
                    p.acquire(EW);
                }
                1 => {
                    p.release(EW, id);
                }
                2 => {
                    p.park(EW, id);
                }
                3 => {
                    p.unpark(EW);
                }
                _ => {
                    p.retire(EW, id);
                }
            }
            let snap = p.snapshot(EW).unwrap();
            let mut all: Vec<u32> = snap
                .available
                .iter()
                .chain(&snap.in_use)
                .chain(&snap.inactive)
                .map(|t| t.0)
                .collect();
            all.sort_unstable();
            assert_eq!(all, (1..=8).collect::<Vec<_>>());
        }
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod dispatch_tests {
    use super::*;

    #[test]
    fn exhausted_pool_defers_third_trip() {
        let props = LineProperties { min_train_id: 1, max_train_id: 2, ..LineProperties::default() };
        let t0 = hms(6, 0, 0);
        let trips = (1..=3).map(|i| trip(i, t0, vec![EW_A, EW_B])).collect();
        let ctx = context(props, trips);

        assert_eq!(ctx.begin_tick(t0), 2);
        assert_eq!(ctx.controller.queued_trips(EW), 1);
        assert_eq!(ctx.controller.active_count(), 2);
        assert_eq!(ctx.begin_tick(t0.add_secs(1)), 0);

        let (_, first) = ctx.controller.drivers()[0].clone();
        first.finish();
        assert!(ctx.removal.enqueue(&first));
        assert_eq!(ctx.end_tick(), 1);

        assert_eq!(ctx.begin_tick(t0.add_secs(2)), 1);
        assert_eq!(ctx.controller.queued_trips(EW), 0);
        assert_eq!(ctx.service.registered(), 2);
    }

    #[test]
    fn trips_leave_in_start_order() {
        let ctx = context(
            LineProperties::default(),
            vec![trip(2, hms(6, 5, 0), vec![EW_A, EW_B]), trip(1, hms(6, 0, 0), vec![EW_A, EW_B])],
        );
        assert_eq!(ctx.begin_tick(hms(5, 59, 59)), 0);
        assert_eq!(ctx.begin_tick(hms(6, 0, 0)), 1);
        assert_eq!(ctx.controller.drivers()[0].1.trip(), TripId(1));
        assert_eq!(ctx.begin_tick(hms(6, 4, 59)), 0);
        assert_eq!(ctx.begin_tick(hms(6, 5, 0)), 1);
    }

    #[test]
    fn unscheduled_trip_from_named_station() {
        let ctx = context(LineProperties::default(), Vec::new());
        let id = ctx
            .service
            .insert_unscheduled_train(EW, hms(6, 0, 0), Some(STN_B))
            .unwrap();
        assert_eq!(id, TripId(1_000));
        ctx.begin_tick(hms(6, 0, 0));
        let (_, d) = ctx.controller.drivers()[0].clone();
        assert_eq!(d.trip(), id);
        assert_eq!(d.remaining_platforms(), vec![EW_B, EW_C, EW_D]);
        assert!(ctx.service.insert_unscheduled_train(EW, hms(6, 0, 0), Some(STN_D)).is_none());
    }

    #[test]
    fn terminated_line_drops_trips_and_finishes_running_train() {
        let ctx = context(
            LineProperties::default(),
            vec![
                trip(1, hms(6, 0, 0), vec![EW_A, EW_B, EW_C, EW_D]),
                trip(2, hms(6, 30, 0), vec![EW_A, EW_B, EW_C, EW_D]),
            ],
        );
        step(&ctx, hms(6, 0, 0));
        let (_, d) = ctx.controller.drivers()[0].clone();
        let id = d.key().train;
        ctx.service.terminate_train_service(EW);
        assert_eq!(ctx.controller.queued_trips(EW), 0);

        run_until(&ctx, hms(6, 0, 1), 600, |c| c.controller.active_count() == 0);
        assert_eq!(
            ctx.controller.pool().state_of(EW, id),
            Some(crate::IdState::Available)
        );
    }

    #[test]
    fn passengers_ride_to_destination() {
        let ctx = context(LineProperties::default(), vec![trip(1, hms(6, 0, 0), vec![EW_A, EW_B, EW_C])]);
        assert!(ctx.add_passenger(Passenger::new(PassengerId(1), EW_A, EW_C)));
        assert!(ctx.add_passenger(Passenger::new(PassengerId(2), EW_B, EW_C)));

        let mut records = Vec::new();
        let mut now = hms(6, 0, 0);
        for _ in 0..600 {
            records.extend(step(&ctx, now));
            now = now.add_secs(1);
        }
        let at = |p| records.iter().find(|r: &&ArrivalRecord| r.platform == p).unwrap();
        assert_eq!(at(EW_A).boarded, 1);
        assert_eq!(at(EW_B).boarded, 1);
        assert_eq!(at(EW_B).occupancy, 2);
        assert_eq!(at(EW_C).alighted, 2);
        assert_eq!(at(EW_A).dwell_secs, 20.0);
        assert_eq!(ctx.controller.active_count(), 0);
        assert_eq!(ctx.waiting_at(EW_A) + ctx.waiting_at(EW_B), 0);
    }
}

// ── Removal ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod removal_tests {
    use super::*;
    use rt_driver::MovementError;

    fn three_at_origin() -> RailContext {
        let t0 = hms(6, 0, 0);
        let trips = (1..=3).map(|i| trip(i, t0, vec![EW_A, EW_B, EW_C])).collect();
        let ctx = context(LineProperties::default(), trips);
        ctx.begin_tick(t0);
        ctx
    }

    #[test]
    fn chain_by_position_without_cycles() {
        let ctx = three_at_origin();
        let d = ctx.controller.drivers();
        assert_eq!(d[0].1.next_ahead(), None);
        assert_eq!(d[1].1.next_ahead(), Some(d[0].0));
        assert_eq!(d[2].1.next_ahead(), Some(d[1].0));
    }

    #[test]
    fn removal_enqueued_and_flushed_once() {
        let ctx = three_at_origin();
        let (_, d) = ctx.controller.drivers()[1].clone();
        assert!(ctx.removal.enqueue(&d));
        assert!(!ctx.removal.enqueue(&d));
        assert_eq!(ctx.removal.len(), 1);
        assert_eq!(ctx.end_tick(), 1);
        assert_eq!(ctx.end_tick(), 0);
        assert_eq!(ctx.controller.active_count(), 2);
        assert_eq!(ctx.service.registered(), 2);
    }

    #[test]
    fn relink_skips_removed_train() {
        let ctx = three_at_origin();
        let d = ctx.controller.drivers();
        assert!(ctx.removal.enqueue(&d[1].1));
        ctx.end_tick();
        assert_eq!(d[2].1.next_ahead(), Some(d[0].0));

        assert!(ctx.removal.enqueue(&d[0].1));
        ctx.end_tick();
        assert_eq!(d[2].1.next_ahead(), None);
        assert!(ctx.controller.driver(d[0].0).is_none());
    }

    #[test]
    fn removing_whole_chain_leaves_no_self_link() {
        let ctx = three_at_origin();
        let d = ctx.controller.drivers();
        for (_, driver) in &d[..2] {
            ctx.removal.enqueue(driver);
        }
        ctx.end_tick();
        assert_eq!(d[2].1.next_ahead(), None);
    }

    #[test]
    fn faulted_train_contained_and_parked() {
        let ctx = three_at_origin();
        let d = ctx.controller.drivers();
        let id = d[0].1.key().train;
        ctx.contain_fault(d[0].0, &MovementError::InvalidDistance(-1.0));
        assert_eq!(ctx.end_tick(), 1);
        assert_eq!(ctx.controller.pool().state_of(EW, id), Some(crate::IdState::Inactive));
        assert_eq!(ctx.controller.active_count(), 2);
        assert!(!d[1].1.is_faulted());
    }
}

// ── Disruption ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod disruption_tests {
    use super::*;

    #[test]
    fn range_covers_both_directions() {
        let ctx = context(LineProperties::default(), Vec::new());
        assert!(ctx.service.set_disrupted_platforms(EW, STN_D, STN_C));
        assert_eq!(ctx.service.get_disrupted_platforms(EW), vec![EW_C, EW_D]);
        assert_eq!(ctx.service.get_disrupted_platforms(WE), vec![WE_D, WE_C]);
        ctx.service.clear_disruption(WE);
        assert!(ctx.service.get_disrupted_platforms(EW).is_empty());
    }

    #[test]
    fn timed_disruption_expires() {
        let ctx = context(LineProperties::default(), Vec::new());
        assert!(ctx.service.perform_disruption(EW, STN_B, STN_C, hms(7, 0, 0), 600));
        ctx.begin_tick(hms(6, 59, 59));
        assert!(ctx.service.get_disrupted_platforms(EW).is_empty());
        ctx.begin_tick(hms(7, 5, 0));
        assert_eq!(ctx.service.get_disrupted_platforms(EW), vec![EW_B, EW_C]);
        ctx.begin_tick(hms(7, 10, 0));
        assert!(ctx.service.get_disrupted_platforms(EW).is_empty());
    }

    #[test]
    fn later_trips_trimmed_running_train_stranded() {
        let ctx = context(LineProperties::default(), vec![trip(1, hms(6, 0, 0), vec![EW_A, EW_B, EW_C, EW_D])]);
        let t = run_until(&ctx, hms(6, 0, 0), 400, |c| {
            let (_, d) = &c.controller.drivers()[0];
            d.next_platform() == Some(EW_C) && d.phase().is_running()
        });
        let first = ctx.controller.drivers()[0].1.key().train;

        assert!(ctx.service.set_disrupted_platforms(EW, STN_C, STN_D));
        ctx.service.insert_unscheduled_train(EW, hms(6, 10, 0), None).unwrap();

        let t = run_until(&ctx, t.add_secs(1), 900, |c| c.controller.active_count() == 2);
        assert!(t >= hms(6, 10, 0));
        assert_eq!(ctx.service.is_stranded_during_disruption(EW, first), Some(true));
        assert_eq!(ctx.service.get_disrupted_state(EW, first), Some(true));
        let stuck = ctx.controller.drivers()[0].1.position();
        assert!((stuck - 2_000.0).abs() < 0.02);

        let second = ctx
            .controller
            .drivers()
            .into_iter()
            .find(|(_, d)| d.key().train != first)
            .unwrap()
            .1;
        assert_eq!(second.remaining_platforms(), vec![EW_A, EW_B]);
    }

    #[test]
    fn trip_inside_region_cancelled() {
        let ctx = context(LineProperties::default(), vec![trip(1, hms(6, 0, 0), vec![EW_A, EW_B, EW_C, EW_D])]);
        assert!(ctx.service.set_disrupted_platforms(EW, STN_B, STN_D));
        assert_eq!(ctx.begin_tick(hms(6, 0, 0)), 0);
        assert_eq!(ctx.controller.queued_trips(EW), 0);
        let snap = ctx.controller.pool().snapshot(EW).unwrap();
        assert!(snap.in_use.is_empty());
    }

    #[test]
    fn uturn_to_opposite_line() {
        let ctx = context(LineProperties::default(), vec![trip(1, hms(6, 0, 0), vec![EW_A, EW_B, EW_C, EW_D])]);
        let t = run_until(&ctx, hms(6, 0, 0), 400, |c| {
            c.controller.drivers()[0].1.at_platform() == Some(EW_B)
        });
        let (_, d) = ctx.controller.drivers()[0].clone();
        let id = d.key().train;
        assert!(ctx.service.set_uturn_flag(EW, id, true));

        step(&ctx, t.add_secs(1));
        assert_eq!(d.operating_line(), WE);
        assert_eq!(d.key().line, EW);
        assert_eq!(ctx.service.get_active_train_ids(WE), vec![id]);
        assert!(ctx.service.get_active_train_ids(EW).is_empty());
        assert!(ctx.service.resolve(WE, id).is_some());

        step(&ctx, t.add_secs(2));
        assert_eq!(d.at_platform(), Some(WE_B));
        assert_eq!(d.remaining_platforms(), vec![WE_B, WE_A]);
    }

    #[test]
    fn uturn_waits_while_mirrored_platform_is_served() {
        let ctx = context(LineProperties::default(), vec![trip(1, hms(6, 0, 0), vec![EW_A, EW_B, EW_C, EW_D])]);
        let t = run_until(&ctx, hms(6, 0, 0), 400, |c| {
            c.controller.drivers()[0].1.at_platform() == Some(EW_B)
        });
        let (_, ew) = ctx.controller.drivers()[0].clone();
        ctx.service.insert_unscheduled_train(WE, t.add_secs(1), Some(STN_B)).unwrap();
        assert!(ctx.service.set_uturn_flag(EW, ew.key().train, true));

        // Inbound on the first tick, then dwelling at WE_B.
        step(&ctx, t.add_secs(1));
        let (_, we) = ctx
            .controller
            .drivers()
            .into_iter()
            .find(|(_, d)| d.key().line == WE)
            .unwrap();
        assert_eq!(we.at_platform(), Some(WE_B));
        assert_eq!(ew.operating_line(), EW);

        let left = run_until(&ctx, t.add_secs(2), 200, |_| we.at_platform().is_none());
        assert_eq!(ew.operating_line(), EW);
        assert!(ew.uturn_flag());

        let turned = run_until(&ctx, left.add_secs(1), 200, |_| ew.operating_line() == WE);
        assert!(turned.secs_since(left) >= 10);
    }

    #[test]
    fn uturn_waits_for_headway_at_destination() {
        let props = LineProperties { safe_headway_secs: 120.0, ..LineProperties::default() };
        let ctx = context(props, vec![trip(1, hms(6, 0, 0), vec![EW_A, EW_B, EW_C, EW_D])]);
        let t = run_until(&ctx, hms(6, 0, 0), 400, |c| {
            c.controller.drivers()[0].1.at_platform() == Some(EW_B)
        });
        rt_core::lock(&ctx.stations).get_mut(WE_B).unwrap().last_departure = Some(t);
        let (_, d) = ctx.controller.drivers()[0].clone();
        d.set_uturn(true);

        step(&ctx, t.add_secs(1));
        assert_eq!(d.operating_line(), EW);
        assert!(d.uturn_flag());

        run_until(&ctx, t.add_secs(2), 200, |_| d.operating_line() == WE);
    }
}

// ── ServiceController ─────────────────────────────────────────────────────────

#[cfg(test)]
mod service_tests {
    use super::*;
    use rt_driver::DwellScaling;

    fn running() -> (RailContext, TrainId) {
        let ctx = context(LineProperties::default(), vec![trip(1, hms(6, 0, 0), vec![EW_A, EW_B, EW_C, EW_D])]);
        step(&ctx, hms(6, 0, 0));
        let id = ctx.controller.drivers()[0].1.key().train;
        (ctx, id)
    }

    #[test]
    fn unknown_train_is_noop() {
        let (ctx, _) = running();
        let ghost = TrainId(99);
        assert!(!ctx.service.set_uturn_flag(EW, ghost, true));
        assert!(!ctx.service.reset_holding_time_at_station(EW, ghost, EW_B, 30.0));
        assert_eq!(ctx.service.get_next_platform(EW, ghost), None);
        assert_eq!(ctx.service.get_dwell_time(LineId(7), ghost), None);
    }

    #[test]
    fn duplicate_registration_refused() {
        let (ctx, _) = running();
        let (_, d) = ctx.controller.drivers()[0].clone();
        assert!(!ctx.service.register(d));
        assert_eq!(ctx.service.registered(), 1);
    }

    #[test]
    fn queries_reflect_driver_state() {
        let (ctx, id) = running();
        assert_eq!(ctx.service.get_next_platform(EW, id), Some(EW_A));
        assert_eq!(ctx.service.get_platform_by_offset(EW, id, 2), Some(EW_C));
        assert_eq!(ctx.service.get_distance_to_next_platform(EW, id), Some(0.0));
        assert_eq!(ctx.service.get_dwell_time(EW, id), Some(20.0));
        assert_eq!(ctx.service.get_opposite_line_id(EW), Some(WE));
        assert_eq!(ctx.service.get_active_train_ids(EW), vec![id]);
        assert_eq!(ctx.service.get_train_id_of_train_ahead(EW, id), None);
        assert_eq!(ctx.service.get_force_alight_status(EW, id), Some(false));
        assert_eq!(ctx.service.is_stranded_during_disruption(EW, id), Some(false));
    }

    #[test]
    fn holding_reset_applies_to_current_dwell() {
        let (ctx, id) = running();
        assert!(ctx.service.reset_holding_time_at_station(EW, id, EW_A, 50.0));
        assert_eq!(ctx.service.get_dwell_time(EW, id), Some(50.0));
        assert!(ctx.service.reset_maximum_holding_time(EW, id, EW_B, 30.0));
        assert!(!ctx.service.reset_holding_time_at_station(EW, id, EW_B, 40.0));
    }

    #[test]
    fn dwell_scaling_per_line() {
        let (ctx, _) = running();
        let s = DwellScaling { boarding: 2.0, alighting: 1.0, occupancy: 1.0 };
        ctx.service.set_dwell_time_scaling(EW, s);
        assert_eq!(ctx.controller.dwell_scaling(EW), s);
        assert_eq!(ctx.controller.dwell_scaling(WE), DwellScaling::default());
        ctx.service.clear_dwell_time_scaling(EW);
        assert_eq!(ctx.controller.dwell_scaling(EW), DwellScaling::default());
    }

    #[test]
    fn speed_restriction_caps_then_reverts() {
        let (ctx, _) = running();
        assert!(ctx.service.reset_speed_limit(5.0, STN_A, STN_B, EW, hms(6, 0, 0), hms(6, 10, 0)));
        assert!(!ctx.service.reset_speed_limit(5.0, STN_A, StationId(40), EW, hms(6, 0, 0), hms(6, 10, 0)));
        let blk = ctx.network.platform(EW_A).unwrap().block;
        assert_eq!(ctx.controller.limits(hms(6, 5, 0)).get(blk).unwrap().speed_mps, 5.0);
        ctx.begin_tick(hms(6, 10, 0));
        assert_eq!(ctx.controller.limits(hms(6, 10, 0)).get(blk).unwrap().speed_mps, 20.0);
    }

    #[test]
    fn acceleration_reset_covers_line() {
        let (ctx, _) = running();
        assert!(ctx.service.reset_acceleration(0.4, EW));
        let limits = ctx.controller.limits(hms(6, 0, 0));
        for &blk in &ctx.network.line(EW).unwrap().blocks {
            assert_eq!(limits.get(blk).unwrap().accel_mps2, 0.4);
        }
        let we_blk = ctx.network.line(WE).unwrap().blocks[0];
        assert_eq!(limits.get(we_blk).unwrap().accel_mps2, 1.0);
    }

    #[test]
    fn inactive_pool_controls() {
        let (ctx, id) = running();
        assert!(ctx.service.push_train_into_inactive_pool(EW, id));
        assert!(ctx.service.push_train_into_inactive_pool(EW, TrainId(20)));
        assert!(!ctx.service.push_train_into_inactive_pool(EW, TrainId(99)));

        let (_, d) = ctx.controller.drivers()[0].clone();
        d.finish();
        ctx.removal.enqueue(&d);
        ctx.end_tick();
        let snap = ctx.controller.pool().snapshot(EW).unwrap();
        assert_eq!(snap.inactive, vec![TrainId(20), id]);

        assert_eq!(ctx.service.pull_out_train_from_inactive_pool(EW), Some(TrainId(20)));
        assert_eq!(
            ctx.controller.pool().state_of(EW, TrainId(20)),
            Some(crate::IdState::Available)
        );
    }

    #[test]
    fn terminated_train_requeues_riders_short_of_destination() {
        let ctx = context(LineProperties::default(), vec![trip(1, hms(6, 0, 0), vec![EW_A, EW_B, EW_C, EW_D])]);
        assert!(ctx.add_passenger(Passenger::new(PassengerId(1), EW_A, EW_D)));
        let t = run_until(&ctx, hms(6, 0, 0), 120, |c| {
            let (_, d) = &c.controller.drivers()[0];
            d.next_platform() == Some(EW_B) && d.phase().is_running()
        });
        let (_, d) = ctx.controller.drivers()[0].clone();
        assert_eq!(d.occupancy(), 1);
        assert!(ctx.service.terminate_single_train_service(EW, d.key().train));

        let mut records = Vec::new();
        let mut now = t.add_secs(1);
        for _ in 0..600 {
            records.extend(step(&ctx, now));
            if ctx.controller.active_count() == 0 {
                break;
            }
            now = now.add_secs(1);
        }
        assert_eq!(ctx.controller.active_count(), 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].platform, EW_B);
        assert_eq!(records[0].alighted, 0);
        assert_eq!(records[0].occupancy, 1);
        assert_eq!(ctx.waiting_at(EW_B), 1);
    }

    #[test]
    fn single_train_termination() {
        let (ctx, id) = running();
        assert!(ctx.service.terminate_single_train_service(EW, id));
        run_until(&ctx, hms(6, 0, 1), 60, |c| c.controller.active_count() == 0);
    }
}
