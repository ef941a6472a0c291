use thiserror::Error;

use rt_core::{DailyTime, LineId, RailError};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("unknown line {0:?}")]
    UnknownLine(String),

    #[error("line {0} is not in the network")]
    LineNotInNetwork(LineId),

    #[error("headway window {start}-{end} on {line} is empty or inverted")]
    InvertedWindow { line: LineId, start: DailyTime, end: DailyTime },

    #[error("headway on {0} must be positive")]
    ZeroHeadway(LineId),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] RailError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
