//! Network error type.  Every variant is a load-time configuration error.

use thiserror::Error;

use rt_core::{BlockId, LineId, PlatformId, RailError};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("line {0} has no blocks on its route")]
    EmptyRoute(String),

    #[error("line {0} has no platforms")]
    NoPlatforms(String),

    #[error("route of line {line} references unknown block {block}")]
    UnknownBlock { line: String, block: BlockId },

    #[error("platform {platform} sits on block {block}, which is not on line {line}")]
    PlatformOffRoute { platform: String, block: BlockId, line: String },

    #[error("platform {platform} on line {line} does not stop after the previous platform")]
    PlatformOrder { platform: String, line: String },

    #[error("opposite-line pairing of {0} is not symmetric")]
    AsymmetricOpposite(String),

    #[error("no line properties configured for line {0}")]
    MissingProperties(String),

    #[error("invalid line properties for {line}: {reason}")]
    InvalidProperties { line: String, reason: String },

    #[error("unknown {kind} {name:?}")]
    UnknownName { kind: &'static str, name: String },

    #[error("duplicate {kind} {name:?}")]
    Duplicate { kind: &'static str, name: String },

    #[error("invalid block {block}: {reason}")]
    InvalidBlock { block: String, reason: String },

    #[error("line {0} is out of range")]
    UnknownLine(LineId),

    #[error("platform {0} is out of range")]
    UnknownPlatform(PlatformId),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] RailError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
