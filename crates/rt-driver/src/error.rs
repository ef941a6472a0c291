//! Invariant violations raised by a single train.
//!
//! None of these are expected in a consistent simulation.  The orchestrator
//! contains them to the offending train: it is logged, marked faulted and
//! removed, and every other train keeps running.

use thiserror::Error;

use rt_core::{BlockId, LineId, PlatformId, TrainKey};

#[derive(Debug, Error)]
pub enum MovementError {
    #[error("line {0} has no route to move along")]
    EmptyRoute(LineId),

    #[error("train {0} has no platform left to serve")]
    NoPlatforms(TrainKey),

    #[error("advance on a completed path at {position_m:.1} m")]
    PathCompleted { position_m: f64 },

    #[error("invalid advance distance {0}")]
    InvalidDistance(f64),

    #[error("position {position_m:.1} m lies outside line {line} ({length_m:.1} m long)")]
    OutOfRange { line: LineId, position_m: f64, length_m: f64 },

    #[error("platform {platform} is not on line {line}")]
    PlatformOffLine { platform: PlatformId, line: LineId },

    #[error("block {0} has no limits entry")]
    UnknownBlock(BlockId),
}

pub type MovementResult<T> = Result<T, MovementError>;
