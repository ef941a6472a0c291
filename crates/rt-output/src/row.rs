//! Plain data row types written by output backends.

use rt_core::DailyTime;

/// One train stopping at one platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformArrivalRow {
    /// Line owning the train id.
    pub train_line: u32,
    pub train_id:   u32,
    /// Line the train was operating on.
    pub line:       u32,
    pub trip:       u64,
    pub platform:   u32,
    pub time:       DailyTime,
    pub boarded:    u32,
    pub alighted:   u32,
    pub denied:     u32,
    pub occupancy:  u32,
    pub dwell_secs: f64,
}

/// Summary statistics for one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummaryRow {
    pub tick:       u64,
    pub time:       DailyTime,
    pub active:     u64,
    pub dispatched: u64,
    pub removed:    u64,
    pub faulted:    u64,
    pub waiting:    u64,
}

/// A train's kinematic state at a snapshot tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainSnapshotRow {
    pub tick:          u64,
    pub train_line:    u32,
    pub train_id:      u32,
    pub line:          u32,
    pub phase:         &'static str,
    pub position_m:    f64,
    pub speed_mps:     f64,
    pub occupancy:     u32,
    /// `u32::MAX` when the train has no platform ahead.
    pub next_platform: u32,
}
