//! `rt-network` — static rail network data.
//!
//! The network is built once at startup and is read-only afterwards; every
//! train and every operator command shares it through an `Arc`.
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`network`] | `Block`, `Platform`, `Station`, `LineRoute`, `RailNetwork` |
//! | [`builder`] | `RailNetworkBuilder` with load-time validation             |
//! | [`props`]   | `LineProperties`, `RailConfig`                             |
//! | [`limits`]  | `BlockLimits`: per-tick effective speed / accel / decel    |
//! | [`loader`]  | CSV loader for blocks, routes and platforms                |
//!
//! Positions along a line are measured in metres from the start of the
//! line's first block (the "line frame").

pub mod builder;
pub mod error;
pub mod limits;
pub mod loader;
pub mod network;
pub mod props;

#[cfg(test)]
mod tests;

pub use builder::{BlockSpec, PlatformSpec, RailNetworkBuilder};
pub use error::{NetworkError, NetworkResult};
pub use limits::{BlockLimits, BlockRates};
pub use loader::{load_network_dir, load_network_readers};
pub use network::{Block, LineRoute, Platform, PlatformKind, RailNetwork, Station};
pub use props::{LineProperties, RailConfig};
