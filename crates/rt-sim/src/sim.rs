//! The `Sim` struct and its tick loop.

use tracing::{debug, debug_span, info};

use rt_control::{RailContext, TickFrame};
use rt_core::{SimClock, SimConfig, Tick, TrainRef, lock};
use rt_driver::{MovementResult, TrainEvent};

use crate::{SimObserver, SimResult, TickSummary};

type TrainOutcome = (TrainRef, MovementResult<Vec<TrainEvent>>);

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Each tick runs five phases against the shared [`RailContext`]:
///
/// 1. **Dispatch**: expire timed overrides, start due trips, register them
///    with the `ServiceController`, re-chain every line by position.
/// 2. **Frame**: freeze block limits, disruptions and a snapshot of every
///    train.
/// 3. **Train phase** (optionally parallel with the `parallel` feature):
///    every driver ticks against the frame and returns its events.
/// 4. **Apply phase** (sequential, ascending `TrainRef`): passenger
///    exchange, dwell, platform ledger, U-turns, removal enqueue.  A train
///    whose tick failed is taken out of service here.
/// 5. **Barrier**: removal flush, then depot messages return ids to their
///    pools.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    /// Global configuration (start time, tick length, total ticks, …).
    pub config: SimConfig,

    /// Current tick and its clock time.
    pub clock: SimClock,

    /// Network, controllers, station ledger and removal queue.
    pub rail: RailContext,

    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run the simulation from the current tick to `config.end_tick()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.current_tick < self.config.end_tick() {
            self.step(observer);
        }
        info!(tick = %self.clock.current_tick, time = %self.clock.now(), "simulation finished");
        observer.on_sim_end(self.clock.current_tick);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer);
        }
        Ok(())
    }

    fn step<O: SimObserver>(&mut self, observer: &mut O) {
        let tick = self.clock.current_tick;
        observer.on_tick_start(tick, self.clock.now(), &self.rail);
        let summary = self.process_tick(tick, observer);
        observer.on_tick_end(&summary);
        if self.config.output_interval_ticks > 0 && tick.0.is_multiple_of(self.config.output_interval_ticks) {
            observer.on_snapshot(&summary, &self.rail);
        }
        self.clock.advance();
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick<O: SimObserver>(&self, tick: Tick, observer: &mut O) -> TickSummary {
        let now = self.clock.time_of(tick);
        let _span = debug_span!("tick", %tick, %now).entered();

        // ── Phase 1: dispatch ─────────────────────────────────────────────
        let dispatched = self.rail.begin_tick(now);

        // ── Phase 2: freeze the frame ─────────────────────────────────────
        let frame = self.rail.frame(now, self.clock.tick_secs());

        // ── Phase 3: train phase (produce) ────────────────────────────────
        let outcomes = self.train_phase(&frame);

        // ── Phase 4: apply phase (consume) ────────────────────────────────
        //
        // Outcomes are in ascending TrainRef order whether or not the train
        // phase ran in parallel.
        let mut arrivals = Vec::new();
        let mut faulted = 0;
        for (tref, outcome) in outcomes {
            match outcome {
                Ok(events) => arrivals.extend(self.rail.apply(&frame, tref, events)),
                Err(e) => {
                    faulted += 1;
                    self.rail.contain_fault(tref, &e);
                }
            }
        }
        if !arrivals.is_empty() {
            observer.on_arrivals(tick, &arrivals);
        }

        // ── Phase 5: barrier ──────────────────────────────────────────────
        let removed = self.rail.end_tick();

        let summary = TickSummary {
            tick,
            time: now,
            active: self.rail.controller.active_count(),
            dispatched,
            removed,
            faulted,
            waiting: lock(&self.rail.stations).waiting_total(),
        };
        if dispatched + removed + faulted > 0 {
            debug!(dispatched, removed, faulted, active = summary.active, "tick done");
        }
        summary
    }

    /// Tick every driver against the frame.  With the `parallel` Cargo
    /// feature the drivers run on Rayon's thread pool.
    fn train_phase(&self, frame: &TickFrame) -> Vec<TrainOutcome> {
        let view = frame.view(&self.rail.network);

        #[cfg(not(feature = "parallel"))]
        {
            frame
                .drivers
                .iter()
                .map(|(tref, driver)| (*tref, driver.tick(&view)))
                .collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let run = || -> Vec<TrainOutcome> {
                frame
                    .drivers
                    .par_iter()
                    .map(|(tref, driver)| (*tref, driver.tick(&view)))
                    .collect()
            };
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        }
    }
}
