//! Depot message bus.
//!
//! The removal flush posts here; the controller drains it in the same
//! post-barrier step.

use std::collections::VecDeque;
use std::sync::Mutex;

use rt_core::{TrainKey, lock};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DepotMessage {
    /// The train is back in depot.  `park` = send its id to the inactive
    /// pool rather than back into service.
    ///
    /// The id always goes back to the pool of `key.line`, the line that
    /// dispatched the train.  A train that U-turned onto the opposite line
    /// keeps its key, so its id never migrates between line pools.
    TrainReturned { key: TrainKey, park: bool },
}

#[derive(Debug, Default)]
pub struct MessageBus {
    queue: Mutex<VecDeque<DepotMessage>>,
}

impl MessageBus {
    pub fn post(&self, msg: DepotMessage) {
        lock(&self.queue).push_back(msg);
    }

    pub fn drain(&self) -> Vec<DepotMessage> {
        lock(&self.queue).drain(..).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.queue).is_empty()
    }
}
