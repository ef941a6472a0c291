use thiserror::Error;

use rt_core::{LineId, RailError, StationId};
use rt_driver::MovementError;
use rt_network::NetworkError;
use rt_schedule::ScheduleError;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("line {0} is not in the network")]
    UnknownLine(LineId),

    #[error("station {station} is not served by line {line}")]
    StationOffLine { station: StationId, line: LineId },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Movement(#[from] MovementError),

    #[error(transparent)]
    Core(#[from] RailError),
}

pub type ControlResult<T> = Result<T, ControlError>;
