//! `rt-control` — dispatch and operator control.
//!
//! | Module           | Contents                                                |
//! |------------------|---------------------------------------------------------|
//! | [`pool`]         | `TrainIdPool`: available / in use / inactive ids        |
//! | [`arena`]        | `TrainArena`: generational storage of running trains    |
//! | [`controller`]   | `TrainController`: dispatch, chains, line state         |
//! | [`service`]      | `ServiceController`: operator command surface           |
//! | [`removal`]      | `TrainRemoval`: deferred, exactly-once removal          |
//! | [`disruption`]   | `DisruptionEntity`, `DisruptionBook`                    |
//! | [`restrictions`] | speed restrictions and acceleration overrides           |
//! | [`station`]      | `StationBook`: waiting queues and platform ledger       |
//! | [`bus`]          | depot message bus                                       |
//! | [`context`]      | `RailContext`: the shared simulation context            |

pub mod arena;
pub mod bus;
pub mod context;
pub mod controller;
pub mod disruption;
pub mod error;
pub mod pool;
pub mod removal;
pub mod restrictions;
pub mod service;
pub mod station;

#[cfg(test)]
mod tests;

pub use arena::TrainArena;
pub use bus::{DepotMessage, MessageBus};
pub use context::{ArrivalRecord, RailContext, TickFrame};
pub use controller::TrainController;
pub use disruption::{DisruptionBook, DisruptionEntity};
pub use error::{ControlError, ControlResult};
pub use pool::{IdState, PoolSnapshot, TrainIdPool};
pub use removal::TrainRemoval;
pub use restrictions::{Restrictions, SpeedRestriction};
pub use service::ServiceController;
pub use station::{PlatformBook, StationBook};
