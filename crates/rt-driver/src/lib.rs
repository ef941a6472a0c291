//! `rt-driver` — the per-train agent.
//!
//! # Tick contract
//!
//! ```text
//! train phase (parallel-safe):
//!   TrainDriver::tick(&TickView) -> Vec<TrainEvent>
//!     reads only its own state and the frozen snapshot of other trains
//!
//! apply phase (sequential, ascending TrainRef):
//!   Arrived   → exchange() + settle_dwell()
//!   Departed  → platform bookkeeping
//!   UturnRequested / Held / Finished → handled by the controller
//! ```
//!
//! # Logical states
//!
//! `Depot → Moving → ApproachingPlatform → Dwelling → Moving … → Terminal →
//! ReturnToDepot`, with `StoppedAtPoint` for operator stop points.
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`driver`]    | `TrainDriver`, `DriverPhase`, `TrainEvent`             |
//! | [`movement`]  | `TrainMovement`, `TrainPathMover`, `TrainPlatformMover`, speed planning |
//! | [`dwell`]     | `DwellModel`, `DwellScaling`, `HoldingBounds`          |
//! | [`overrides`] | `DriverOverrides`, `StopPoint`                         |
//! | [`passenger`] | `Passenger`, `PassengerRestriction`                    |
//! | [`view`]      | `TickView`, `TrainSnapshot`                            |

pub mod driver;
pub mod dwell;
pub mod error;
pub mod movement;
pub mod overrides;
pub mod passenger;
pub mod view;


pub use driver::{DriverPhase, ExchangeOutcome, TrainDriver, TrainEvent};
pub use dwell::{DwellModel, DwellScaling, HoldingBounds};
pub use error::{MovementError, MovementResult};
pub use movement::{
    ARRIVAL_EPSILON_M, Constraint, ConstraintKind, StepPlan, TrainMovement, TrainPathMover,
    TrainPlatformMover, plan_step,
};
pub use overrides::{DriverOverrides, StopPoint};
pub use passenger::{Passenger, PassengerRestriction};
pub use view::{TickView, TrainSnapshot};
