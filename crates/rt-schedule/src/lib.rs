//! `rt-schedule` — timetable side of the dispatch core.
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`trip`]   | `HeadwayWindow`, `TrainTrip`, `TripIdGen`, `compose_trips`  |
//! | [`queue`]  | `TrainScheduleQueue` (scheduled + unscheduled, per line)    |
//! | [`loader`] | headway CSV loader                                          |
//!
//! # Dispatch order
//!
//! Within a line, trips leave in start-time order.  A trip inserted at run
//! time by an operator goes ahead of a timetabled trip with the same start
//! time.

pub mod error;
pub mod loader;
pub mod queue;
pub mod trip;


pub use error::{ScheduleError, ScheduleResult};
pub use loader::{load_headways_csv, load_headways_reader};
pub use queue::TrainScheduleQueue;
pub use trip::{HeadwayWindow, TrainTrip, TripIdGen, compose_trips};
