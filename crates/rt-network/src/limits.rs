//! Effective per-block kinematic limits.
//!
//! The network's blocks never change after build.  Operator speed
//! restrictions and per-line acceleration overrides are layered on top by
//! rebuilding a `BlockLimits` table at the start of every tick; trains read
//! only this table.

use rt_core::{BlockId, LineId};

use crate::RailNetwork;

/// Speed, acceleration and deceleration in force on one block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockRates {
    pub speed_mps:  f64,
    pub accel_mps2: f64,
    pub decel_mps2: f64,
}

/// Block-indexed table of [`BlockRates`].
#[derive(Clone, Debug)]
pub struct BlockLimits {
    rates: Vec<BlockRates>,
}

impl BlockLimits {
    /// Start from the static limits of every block.
    pub fn from_network(network: &RailNetwork) -> Self {
        let rates = network
            .blocks
            .iter()
            .map(|b| BlockRates {
                speed_mps:  b.speed_limit_mps,
                accel_mps2: b.accel_mps2,
                decel_mps2: b.decel_mps2,
            })
            .collect();
        Self { rates }
    }

    #[inline]
    pub fn get(&self, block: BlockId) -> Option<BlockRates> {
        self.rates.get(block.index()).copied()
    }

    /// Lower the speed limit of `block` to at most `speed_mps`.
    ///
    /// Overlapping restrictions compose: the tightest one wins.
    pub fn cap_speed(&mut self, block: BlockId, speed_mps: f64) {
        if let Some(r) = self.rates.get_mut(block.index()) {
            r.speed_mps = r.speed_mps.min(speed_mps.max(0.0));
        }
    }

    /// Override the acceleration rate of every block on `line`.
    pub fn set_line_accel(&mut self, network: &RailNetwork, line: LineId, accel_mps2: f64) {
        let Some(route) = network.line(line) else {
            return;
        };
        for &block in &route.blocks {
            if let Some(r) = self.rates.get_mut(block.index()) {
                r.accel_mps2 = accel_mps2;
            }
        }
    }
}
