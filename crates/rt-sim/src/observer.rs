//! Simulation observer trait for progress reporting, data collection and
//! scripted operator input.

use rt_control::{ArrivalRecord, RailContext};
use rt_core::{DailyTime, Tick};

/// What one tick did.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TickSummary {
    pub tick:       Tick,
    pub time:       DailyTime,
    /// Trains in service after the removal flush.
    pub active:     usize,
    pub dispatched: usize,
    pub removed:    usize,
    /// Trains whose tick failed and were taken out of service.
    pub faulted:    usize,
    /// Passengers waiting on all platforms after the tick.
    pub waiting:    usize,
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — scripted operator
///
/// ```rust,ignore
/// struct CloseAtNine { line: LineId }
///
/// impl SimObserver for CloseAtNine {
///     fn on_tick_start(&mut self, _tick: Tick, now: DailyTime, rail: &RailContext) {
///         if now == DailyTime::from_hms(9, 0, 0) {
///             rail.service.terminate_train_service(self.line);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before dispatch.
    ///
    /// Commands issued through `rail.service` here take effect this tick.
    fn on_tick_start(&mut self, _tick: Tick, _now: DailyTime, _rail: &RailContext) {}

    /// Called after the apply phase with this tick's platform arrivals, in
    /// ascending train-ref order.  Not called when nothing arrived.
    fn on_arrivals(&mut self, _tick: Tick, _arrivals: &[ArrivalRecord]) {}

    /// Called at the end of each tick, after the removal flush.
    fn on_tick_end(&mut self, _summary: &TickSummary) {}

    /// Called at snapshot intervals (every `config.output_interval_ticks`
    /// ticks), after `on_tick_end`.
    fn on_snapshot(&mut self, _summary: &TickSummary, _rail: &RailContext) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
