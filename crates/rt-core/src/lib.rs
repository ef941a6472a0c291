//! `rt-core` — foundational types for the `rail_twin` dispatch core.
//!
//! Every other `rt-*` crate depends on this one.  It has no `rt-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module     | Contents                                                      |
//! |------------|---------------------------------------------------------------|
//! | [`ids`]    | `LineId`, `TrainId`, `TripId`, `BlockId`, `PlatformId`, …     |
//! | [`time`]   | `Tick`, `DailyTime`, `SimClock`, `SimConfig`                  |
//! | [`rng`]    | `SimRng` (seeded, deterministic)                              |
//! | [`sync`]   | poison-tolerant `lock` / `read` / `write` helpers             |
//! | [`error`]  | `RailError`, `RailResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids and time types.      |

pub mod error;
pub mod ids;
pub mod rng;
pub mod sync;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{RailError, RailResult};
pub use ids::{BlockId, LineId, PassengerId, PlatformId, StationId, TrainId, TrainKey, TrainRef, TripId};
pub use rng::SimRng;
pub use sync::{lock, read, write};
pub use time::{DailyTime, SimClock, SimConfig, Tick};
