use rt_control::ControlError;
use rt_core::PlatformId;
use rt_schedule::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("passenger origin {0} is not a platform of the network")]
    UnknownOrigin(PlatformId),

    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("control error: {0}")]
    Control(#[from] ControlError),
}

pub type SimResult<T> = Result<T, SimError>;
