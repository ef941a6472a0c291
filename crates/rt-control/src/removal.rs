//! Deferred removal of finished trains.
//!
//! A finishing train is only queued here during a tick.  Other trains may
//! still name it as the train ahead in their snapshot, so its slot is freed
//! in the flush that runs strictly between ticks
//! (see `RailContext::end_tick`).

use std::sync::Mutex;

use tracing::debug;

use rt_core::{TrainRef, lock};
use rt_driver::TrainDriver;

#[derive(Debug, Default)]
pub struct TrainRemoval {
    pending: Mutex<Vec<TrainRef>>,
}

impl TrainRemoval {
    /// Queue `driver` for removal.  Only the first call for a driver queues
    /// it; later calls return `false`.
    pub fn enqueue(&self, driver: &TrainDriver) -> bool {
        if !driver.mark_removal_enqueued() {
            return false;
        }
        debug!(train = %driver.key(), "queued for removal");
        lock(&self.pending).push(driver.train_ref());
        true
    }

    pub fn drain(&self) -> Vec<TrainRef> {
        std::mem::take(&mut *lock(&self.pending))
    }

    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.pending).is_empty()
    }
}
