//! Simulation time model.
//!
//! # Design
//!
//! The canonical simulation time is a monotonically increasing [`Tick`]
//! counter.  Timetables, holding times and operator commands speak in
//! service-day clock time, held as [`DailyTime`] (whole seconds since
//! midnight).  [`SimClock`] maps one onto the other:
//!
//!   now = start_time + tick * tick_duration_secs
//!
//! `DailyTime` may exceed `24:00:00` so a service day can run past midnight
//! without wrapping.

use std::fmt;
use std::str::FromStr;

use crate::RailError;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── DailyTime ────────────────────────────────────────────────────────────────

/// Service-day clock time in whole seconds since midnight.
///
/// Parsed from and printed as `HH:MM:SS`.  Hours above 23 are accepted.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DailyTime(pub u32);

impl DailyTime {
    pub const MIDNIGHT: DailyTime = DailyTime(0);

    #[inline]
    pub const fn from_hms(h: u32, m: u32, s: u32) -> Self {
        DailyTime(h * 3_600 + m * 60 + s)
    }

    #[inline]
    pub fn secs(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn add_secs(self, secs: u32) -> Self {
        DailyTime(self.0.saturating_add(secs))
    }

    /// Seconds elapsed from `earlier` to `self`, or 0 if `earlier` is later.
    #[inline]
    pub fn secs_since(self, earlier: DailyTime) -> u32 {
        self.0.saturating_sub(earlier.0)
    }

    /// Parse `HH:MM:SS` (or `HH:MM`).
    pub fn parse(s: &str) -> Result<Self, RailError> {
        let bad = || RailError::Parse(format!("invalid time {s:?}: expected HH:MM:SS"));
        let mut parts = s.trim().split(':');
        let h: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        let m: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        let sec: u32 = match parts.next() {
            None    => 0,
            Some(p) => p.parse().map_err(|_| bad())?,
        };
        if parts.next().is_some() || m >= 60 || sec >= 60 {
            return Err(bad());
        }
        Ok(Self::from_hms(h, m, sec))
    }
}

impl FromStr for DailyTime {
    type Err = RailError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.0;
        write!(f, "{:02}:{:02}:{:02}", t / 3_600, (t % 3_600) / 60, t % 60)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts tick counts into service-day clock time.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Clock time of tick 0.
    pub start_time:         DailyTime,
    /// How many seconds one tick represents.
    pub tick_duration_secs: u32,
    /// The current tick, advanced by `SimClock::advance()` each iteration.
    pub current_tick:       Tick,
}

impl SimClock {
    pub fn new(start_time: DailyTime, tick_duration_secs: u32) -> Self {
        Self {
            start_time,
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> u64 {
        self.current_tick.0 * self.tick_duration_secs as u64
    }

    /// Clock time of the current tick.
    #[inline]
    pub fn now(&self) -> DailyTime {
        self.time_of(self.current_tick)
    }

    /// Clock time of an arbitrary tick.
    #[inline]
    pub fn time_of(&self, tick: Tick) -> DailyTime {
        let secs = tick.0.saturating_mul(self.tick_duration_secs as u64);
        self.start_time.add_secs(u32::try_from(secs).unwrap_or(u32::MAX))
    }

    /// Tick length in seconds as `f64`, the unit kinematics integrate over.
    #[inline]
    pub fn tick_secs(&self) -> f64 {
        self.tick_duration_secs as f64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.current_tick, self.now())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Service-day clock time of tick 0.
    pub start_time: DailyTime,

    /// Seconds per tick.  Rail kinematics want short ticks; 1–5 s is typical.
    pub tick_duration_secs: u32,

    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Worker thread count passed to Rayon.  `None` uses all logical cores.
    pub num_threads: Option<usize>,

    /// Write tick summaries every N ticks.  1 = every tick.
    pub output_interval_ticks: u64,
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_time, self.tick_duration_secs)
    }
}
