//! corridor — a morning peak on a five-station line pair.
//!
//! Trains run both directions from headway windows, passengers appear at
//! platforms with seeded random origins and destinations, and a scripted
//! operator intervenes during the run: an unscheduled short-turn service, a
//! timed disruption at the east end, a speed restriction, a holding order
//! and a train pulled from the inactive pool.
//!
//! Output lands in `output/corridor`.  Set `RUST_LOG=debug` for the dispatch
//! and removal trace.

mod network;

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rt_control::{ArrivalRecord, RailContext};
use rt_core::{DailyTime, LineId, PassengerId, SimConfig, SimRng, Tick, lock};
use rt_driver::{DwellScaling, Passenger};
use rt_network::{RailConfig, RailNetwork};
use rt_output::{CsvWriter, OutputWriter, SimOutputObserver};
use rt_schedule::load_headways_reader;
use rt_sim::{SimBuilder, SimObserver, TickSummary};

use network::build_network;

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:                  u64 = 7;
const PASSENGER_COUNT:       u64 = 4_000;
const TICK_DURATION_SECS:    u32 = 1;
const SIM_HOURS:             u64 = 3;
const OUTPUT_INTERVAL_TICKS: u64 = 60; // one snapshot per simulated minute

// ── Line properties ───────────────────────────────────────────────────────────

const CONFIG_JSON: &str = r#"{
    "EW": {
        "capacity": 900,
        "min_train_id": 101,
        "max_train_id": 112,
        "initially_parked": 2,
        "opposite_line": "WE"
    },
    "WE": {
        "capacity": 900,
        "min_train_id": 201,
        "max_train_id": 212,
        "initially_parked": 2,
        "auto_uturn_on_disruption": true,
        "opposite_line": "EW"
    }
}"#;

// ── Timetable ─────────────────────────────────────────────────────────────────

const HEADWAYS_CSV: &str = "\
line,start_time,end_time,headway_sec
EW,06:00:00,06:59:59,360
EW,07:00:00,08:30:00,240
WE,06:02:00,06:59:59,360
WE,07:02:00,08:30:00,240
";

// ── Demand ────────────────────────────────────────────────────────────────────

/// Passengers already waiting when service starts, each travelling forward
/// along a randomly chosen line.
fn synthetic_demand(network: &RailNetwork, rng: &mut SimRng) -> Vec<Passenger> {
    let lines: Vec<LineId> = network.line_ids().collect();
    (0..PASSENGER_COUNT)
        .filter_map(|i| {
            let line = *rng.choose(&lines)?;
            let platforms = &network.line(line)?.platforms;
            if platforms.len() < 2 {
                return None;
            }
            let from = rng.gen_range(0..platforms.len() - 1);
            let to = rng.gen_range(from + 1..platforms.len());
            Some(Passenger::new(PassengerId(i), platforms[from], platforms[to]))
        })
        .collect()
}

// ── Scripted operator ─────────────────────────────────────────────────────────

/// Issues operator commands at fixed clock times and forwards everything to
/// the output observer.
struct ScriptedOperator<W: OutputWriter> {
    inner:      SimOutputObserver<W>,
    arrivals:   usize,
    boarded:    u64,
    denied:     u64,
    dispatched: usize,
    removed:    usize,
    faulted:    usize,
}

impl<W: OutputWriter> ScriptedOperator<W> {
    fn new(inner: SimOutputObserver<W>) -> Self {
        Self { inner, arrivals: 0, boarded: 0, denied: 0, dispatched: 0, removed: 0, faulted: 0 }
    }

    fn script(&mut self, now: DailyTime, rail: &RailContext) {
        let net = &rail.network;
        let (Some(ew), Some(we)) = (net.line_by_name("EW"), net.line_by_name("WE")) else {
            return;
        };
        let station = |name: &str| net.station_by_name(name);
        let hms = DailyTime::from_hms;

        if now == hms(6, 30, 0) {
            if let Some(charlie) = station("Charlie") {
                let trip = rail.service.insert_unscheduled_train(we, hms(6, 35, 0), Some(charlie));
                info!(?trip, "short-turn service from Charlie inserted");
            }
            if let Some(id) = rail.service.pull_out_train_from_inactive_pool(ew) {
                info!(train = %id, "EW train pulled out of the inactive pool");
            }
        }

        if now == hms(7, 0, 0) {
            rail.service.set_dwell_time_scaling(ew, DwellScaling { boarding: 1.2, alighting: 1.0, occupancy: 1.0 });
            if let (Some(alpha), Some(bravo)) = (station("Alpha"), station("Bravo")) {
                rail.service.reset_speed_limit(8.0, alpha, bravo, ew, hms(7, 0, 0), hms(7, 20, 0));
            }
        }

        if now == hms(7, 15, 0) {
            if let (Some(delta), Some(echo)) = (station("Delta"), station("Echo")) {
                rail.service.perform_disruption(ew, delta, echo, hms(7, 15, 0), 15 * 60);
                info!(platforms = ?rail.service.get_disrupted_platforms(we), "WE platforms disrupted");
            }
        }

        if now == hms(7, 45, 0) {
            // Hold the lead EW train at its next stop for a minute.
            if let Some(&lead) = rail.service.get_active_train_ids(ew).first() {
                if let Some(next) = rail.service.get_next_platform(ew, lead) {
                    rail.service.reset_holding_time_at_station(ew, lead, next, 60.0);
                }
            }
            rail.service.clear_dwell_time_scaling(ew);
        }

        if now == hms(8, 45, 0) {
            rail.service.terminate_train_service(ew);
            rail.service.terminate_train_service(we);
        }
    }
}

impl<W: OutputWriter> SimObserver for ScriptedOperator<W> {
    fn on_tick_start(&mut self, tick: Tick, now: DailyTime, rail: &RailContext) {
        self.script(now, rail);
        self.inner.on_tick_start(tick, now, rail);
    }

    fn on_arrivals(&mut self, tick: Tick, arrivals: &[ArrivalRecord]) {
        self.arrivals += arrivals.len();
        self.boarded += arrivals.iter().map(|a| a.boarded as u64).sum::<u64>();
        self.denied += arrivals.iter().map(|a| a.denied as u64).sum::<u64>();
        self.inner.on_arrivals(tick, arrivals);
    }

    fn on_tick_end(&mut self, summary: &TickSummary) {
        self.dispatched += summary.dispatched;
        self.removed += summary.removed;
        self.faulted += summary.faulted;
        self.inner.on_tick_end(summary);
    }

    fn on_snapshot(&mut self, summary: &TickSummary, rail: &RailContext) {
        if summary.tick.0.is_multiple_of(1_800) {
            info!(time = %summary.time, active = summary.active, waiting = summary.waiting, "progress");
        }
        self.inner.on_snapshot(summary, rail);
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        self.inner.on_sim_end(final_tick);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== corridor — rail_twin dispatch core ===");
    println!("Passengers: {PASSENGER_COUNT}  |  Hours: {SIM_HOURS}  |  Seed: {SEED}");
    println!();

    // 1. Line properties and network.
    let config: RailConfig = serde_json::from_str(CONFIG_JSON).context("parsing line properties")?;
    let network = Arc::new(build_network(&config)?);
    println!(
        "Network: {} lines, {} stations, {} platforms",
        network.line_count(),
        network.stations.len(),
        network.platform_count()
    );

    // 2. Timetable.
    let windows = load_headways_reader(Cursor::new(HEADWAYS_CSV), &network)?;

    // 3. Demand.
    let mut rng = SimRng::new(SEED);
    let passengers = synthetic_demand(&network, &mut rng);

    // 4. Sim config.
    let sim_config = SimConfig {
        start_time:            DailyTime::from_hms(6, 0, 0),
        tick_duration_secs:    TICK_DURATION_SECS,
        total_ticks:           SIM_HOURS * 3_600 / TICK_DURATION_SECS as u64,
        seed:                  SEED,
        num_threads:           None, // all logical cores
        output_interval_ticks: OUTPUT_INTERVAL_TICKS,
    };

    // 5. Build sim.
    let mut sim = SimBuilder::new(sim_config, Arc::clone(&network))
        .headways(windows)
        .passengers(passengers)
        .build()?;

    // 6. Set up output.
    std::fs::create_dir_all("output/corridor")?;
    let writer = CsvWriter::new(Path::new("output/corridor"))?;
    let mut obs = ScriptedOperator::new(SimOutputObserver::new(writer));

    // 7. Run.
    let t0 = Instant::now();
    sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }

    // 8. Summary.
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  trains dispatched      : {}", obs.dispatched);
    println!("  trains removed         : {}", obs.removed);
    println!("  trains faulted         : {}", obs.faulted);
    println!("  platform arrivals      : {}", obs.arrivals);
    println!("  passengers boarded     : {}", obs.boarded);
    println!("  boardings denied       : {}", obs.denied);
    println!("  still waiting          : {}", lock(&sim.rail.stations).waiting_total());
    println!();

    // 9. Pool state per line.
    println!("{:<6} {:>10} {:>8} {:>10}", "Line", "Available", "In use", "Inactive");
    println!("{}", "-".repeat(38));
    for line in network.line_ids() {
        let name = network.line(line).map_or("?", |l| l.name.as_str());
        if let Some(snap) = sim.rail.controller.pool().snapshot(line) {
            println!(
                "{:<6} {:>10} {:>8} {:>10}",
                name,
                snap.available.len(),
                snap.in_use.len(),
                snap.inactive.len()
            );
        }
    }

    Ok(())
}
