//! Position along a line, platform sequencing, and per-tick speed planning.
//!
//! Every position is a line-frame offset in metres from the start of the
//! line's first block.  A train only ever moves forward.

use std::collections::BTreeSet;

use rt_core::{BlockId, LineId, PlatformId};
use rt_network::{BlockRates, RailNetwork};

use crate::{MovementError, MovementResult};

/// Distance below which a train counts as arrived at a target.
pub const ARRIVAL_EPSILON_M: f64 = 0.01;

/// Extra margin beyond braking distance that flags a train as approaching.
pub const APPROACH_WINDOW_M: f64 = 50.0;

// ── TrainPathMover ────────────────────────────────────────────────────────────

/// Cursor over the ordered blocks of one line.
#[derive(Clone, Debug)]
pub struct TrainPathMover {
    line:       LineId,
    blocks:     Vec<BlockId>,
    starts:     Vec<f64>,
    length_m:   f64,
    position_m: f64,
    block_idx:  usize,
}

impl TrainPathMover {
    pub fn new(network: &RailNetwork, line: LineId) -> MovementResult<Self> {
        let route = network.line(line).ok_or(MovementError::EmptyRoute(line))?;
        if route.blocks.is_empty() {
            return Err(MovementError::EmptyRoute(line));
        }
        Ok(Self {
            line,
            blocks:     route.blocks.clone(),
            starts:     route.block_starts.clone(),
            length_m:   route.length_m,
            position_m: 0.0,
            block_idx:  0,
        })
    }

    /// Jump to an absolute position on the line.
    pub fn place(&mut self, position_m: f64) -> MovementResult<()> {
        if !position_m.is_finite() || position_m < 0.0 || position_m > self.length_m {
            return Err(MovementError::OutOfRange {
                line:     self.line,
                position_m,
                length_m: self.length_m,
            });
        }
        self.position_m = position_m;
        self.block_idx = self.starts.partition_point(|&s| s <= position_m).saturating_sub(1);
        Ok(())
    }

    /// Move forward by `distance_m`, crossing block boundaries as needed.
    ///
    /// Returns the distance actually travelled, which is short of the
    /// request only when the end of the line is reached.
    pub fn advance(&mut self, distance_m: f64) -> MovementResult<f64> {
        if !distance_m.is_finite() || distance_m < 0.0 {
            return Err(MovementError::InvalidDistance(distance_m));
        }
        if distance_m > 0.0 && self.is_completed() {
            return Err(MovementError::PathCompleted { position_m: self.position_m });
        }
        let moved = distance_m.min(self.length_m - self.position_m);
        self.position_m += moved;
        while self.block_idx + 1 < self.starts.len() && self.starts[self.block_idx + 1] <= self.position_m {
            self.block_idx += 1;
        }
        Ok(moved)
    }

    #[inline]
    pub fn line(&self) -> LineId {
        self.line
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.position_m
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.length_m
    }

    #[inline]
    pub fn current_block(&self) -> BlockId {
        self.blocks[self.block_idx]
    }

    pub fn is_completed(&self) -> bool {
        self.position_m >= self.length_m
    }
}

// ── TrainPlatformMover ────────────────────────────────────────────────────────

/// Cursor over the platforms a train serves.
///
/// The cursor names the platform the train is heading to, or dwelling at.
#[derive(Clone, Debug)]
pub struct TrainPlatformMover {
    platforms: Vec<PlatformId>,
    cursor:    usize,
}

impl TrainPlatformMover {
    pub fn new(platforms: Vec<PlatformId>) -> Self {
        Self { platforms, cursor: 0 }
    }

    pub fn next(&self) -> Option<PlatformId> {
        self.platforms.get(self.cursor).copied()
    }

    pub fn is_last(&self) -> bool {
        self.cursor + 1 >= self.platforms.len()
    }

    /// Platforms strictly after the cursor.
    pub fn ahead(&self) -> &[PlatformId] {
        self.platforms.get(self.cursor + 1..).unwrap_or(&[])
    }

    pub fn all(&self) -> &[PlatformId] {
        &self.platforms
    }

    /// Platforms strictly before the cursor, served or skipped.
    pub fn passed(&self) -> &[PlatformId] {
        &self.platforms[..self.cursor.min(self.platforms.len())]
    }

    /// Platform `offset` positions past the cursor (0 = the cursor itself).
    pub fn by_offset(&self, offset: usize) -> Option<PlatformId> {
        self.platforms.get(self.cursor.checked_add(offset)?).copied()
    }

    /// Step to the next platform not in `skip`.  The final platform is never
    /// skipped.
    pub fn advance(&mut self, skip: &BTreeSet<PlatformId>) -> Option<PlatformId> {
        let last = self.platforms.len().checked_sub(1)?;
        while self.cursor < last {
            self.cursor += 1;
            if self.cursor == last || !skip.contains(&self.platforms[self.cursor]) {
                break;
            }
        }
        self.next()
    }

    /// Make the cursor's platform the final one.
    pub fn truncate_after_cursor(&mut self) {
        self.platforms.truncate(self.cursor + 1);
    }
}

// ── TrainMovement ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct TrainMovement {
    pub path:       TrainPathMover,
    pub platforms:  TrainPlatformMover,
    pub speed_mps:  f64,
    pub accel_mps2: f64,
}

impl TrainMovement {
    /// A stationary train placed at the stop position of the first platform.
    pub fn at_first_platform(
        network:   &RailNetwork,
        line:      LineId,
        platforms: Vec<PlatformId>,
    ) -> MovementResult<Self> {
        let first = *platforms.first().ok_or(MovementError::EmptyRoute(line))?;
        let stop = network
            .stop_position(line, first)
            .ok_or(MovementError::PlatformOffLine { platform: first, line })?;
        let mut path = TrainPathMover::new(network, line)?;
        path.place(stop)?;
        Ok(Self {
            path,
            platforms:  TrainPlatformMover::new(platforms),
            speed_mps:  0.0,
            accel_mps2: 0.0,
        })
    }

    /// Remaining distance to the next platform's stop position.
    pub fn distance_to_next_platform(&self, network: &RailNetwork) -> Option<f64> {
        let stop = network.stop_position(self.path.line(), self.platforms.next()?)?;
        Some((stop - self.path.position()).max(0.0))
    }
}

// ── Speed planning ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Platform,
    TrainAhead,
    StopPoint,
    DisruptionBoundary,
}

/// A point ahead at which the train must be able to stand still.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Constraint {
    pub distance_m:  f64,
    pub decel_mps2:  f64,
    pub kind:        ConstraintKind,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StepPlan {
    pub target_mps: f64,
    pub accel_mps2: f64,
    pub distance_m: f64,
    pub speed_mps:  f64,
    /// Nearest constraint, if any.
    pub binding:    Option<ConstraintKind>,
    /// The step ends on the binding constraint.
    pub reached:    bool,
}

/// Plan one tick of motion.
///
/// The target speed is the block limit, lowered so that every constraint can
/// still be met at its braking rate (`v = √(2·b·d)`).  The step never moves
/// past the nearest constraint.
pub fn plan_step(speed_mps: f64, dt_secs: f64, rates: BlockRates, constraints: &[Constraint]) -> StepPlan {
    let mut target = rates.speed_mps.max(0.0);
    let mut binding: Option<(f64, ConstraintKind)> = None;
    for c in constraints {
        let d = c.distance_m.max(0.0);
        target = target.min((2.0 * c.decel_mps2.max(0.0) * d).sqrt());
        if binding.is_none_or(|(bd, _)| d < bd) {
            binding = Some((d, c.kind));
        }
    }

    let accel = if dt_secs > 0.0 {
        ((target - speed_mps) / dt_secs).clamp(-rates.decel_mps2, rates.accel_mps2)
    } else {
        0.0
    };
    let mut distance = (speed_mps * dt_secs + 0.5 * accel * dt_secs * dt_secs).max(0.0);
    let mut speed = (speed_mps + accel * dt_secs).max(0.0);
    let mut reached = false;

    if let Some((limit, _)) = binding {
        if distance >= limit - ARRIVAL_EPSILON_M && (distance > 0.0 || limit <= ARRIVAL_EPSILON_M) {
            distance = limit;
            speed = 0.0;
            reached = true;
        }
    }

    StepPlan {
        target_mps: target,
        accel_mps2: accel,
        distance_m: distance,
        speed_mps:  speed,
        binding:    binding.map(|(_, k)| k),
        reached,
    }
}
