//! Temporary speed restrictions and per-line acceleration overrides.
//!
//! Both are layered over the network's static block limits when the tick's
//! `BlockLimits` table is built.  Speed restrictions revert on their own
//! once their end time passes.

use std::collections::BTreeMap;

use tracing::info;

use rt_core::{BlockId, DailyTime, LineId, StationId};
use rt_network::{BlockLimits, RailNetwork};

use crate::{ControlError, ControlResult};

#[derive(Clone, Debug, PartialEq)]
pub struct SpeedRestriction {
    pub line:      LineId,
    pub stations:  (StationId, StationId),
    pub speed_mps: f64,
    pub start:     DailyTime,
    pub end:       DailyTime,
    /// Blocks covered, resolved when the restriction is declared.
    pub blocks:    Vec<BlockId>,
}

impl SpeedRestriction {
    pub fn compute(
        network:   &RailNetwork,
        line:      LineId,
        start_stn: StationId,
        end_stn:   StationId,
        speed_mps: f64,
        start:     DailyTime,
        end:       DailyTime,
    ) -> ControlResult<Self> {
        network.line(line).ok_or(ControlError::UnknownLine(line))?;
        let blocks = network
            .blocks_between(line, start_stn, end_stn)
            .ok_or(ControlError::StationOffLine { station: start_stn, line })?;
        Ok(Self {
            line,
            stations: (start_stn, end_stn),
            speed_mps,
            start,
            end,
            blocks,
        })
    }

    pub fn is_active(&self, now: DailyTime) -> bool {
        self.start <= now && now < self.end
    }
}

#[derive(Debug, Default)]
pub struct Restrictions {
    speed: Vec<SpeedRestriction>,
    accel: BTreeMap<LineId, f64>,
}

impl Restrictions {
    pub fn add_speed(&mut self, r: SpeedRestriction) {
        info!(line = %r.line, speed_mps = r.speed_mps, start = %r.start, end = %r.end, "speed restriction");
        self.speed.push(r);
    }

    pub fn set_accel(&mut self, line: LineId, accel_mps2: f64) {
        self.accel.insert(line, accel_mps2);
    }

    /// Drop speed restrictions whose end time has passed.
    pub fn expire(&mut self, now: DailyTime) -> usize {
        let before = self.speed.len();
        self.speed.retain(|r| now < r.end);
        let gone = before - self.speed.len();
        if gone > 0 {
            info!(count = gone, "speed restrictions reverted");
        }
        gone
    }

    /// Effective block limits at `now`.
    pub fn limits(&self, network: &RailNetwork, now: DailyTime) -> BlockLimits {
        let mut limits = BlockLimits::from_network(network);
        for (&line, &accel) in &self.accel {
            limits.set_line_accel(network, line, accel);
        }
        for r in self.speed.iter().filter(|r| r.is_active(now)) {
            for &block in &r.blocks {
                limits.cap_speed(block, r.speed_mps);
            }
        }
        limits
    }

    pub fn speed_count(&self) -> usize {
        self.speed.len()
    }
}
