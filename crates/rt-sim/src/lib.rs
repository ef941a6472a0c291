//! `rt-sim` — tick loop orchestrator for the rail_twin core.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Dispatch  — expire overrides, start due trips, register, re-chain.
//!   ② Frame     — freeze limits, disruptions and train snapshots.
//!   ③ Trains    — TrainDriver::tick for every train
//!                 (parallel with the `parallel` feature).
//!   ④ Apply     — for each train in ascending TrainRef order:
//!                   Arrived         → exchange passengers, settle dwell
//!                   Departed        → update the platform ledger
//!                   UturnRequested  → move to the opposite line when clear
//!                   Finished        → enqueue for removal
//!   ⑤ Barrier   — removal flush, depot messages return ids to pools.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the train phase on Rayon's thread pool.           |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rt_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(config, Arc::new(network))
//!     .headways(windows)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver, TickSummary};
pub use sim::Sim;
