//! Generational storage for running trains.
//!
//! A `TrainRef` stays valid until its slot is freed; after that every copy
//! of it resolves to `None`, never to a different train.

use std::sync::Arc;

use slotmap::SlotMap;

use rt_core::TrainRef;
use rt_driver::TrainDriver;

#[derive(Default)]
pub struct TrainArena {
    slots: SlotMap<TrainRef, Arc<TrainDriver>>,
}

impl TrainArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a driver built from its own key.
    pub fn insert_with(&mut self, build: impl FnOnce(TrainRef) -> TrainDriver) -> TrainRef {
        self.slots.insert_with_key(|tref| Arc::new(build(tref)))
    }

    pub fn get(&self, tref: TrainRef) -> Option<&Arc<TrainDriver>> {
        self.slots.get(tref)
    }

    pub fn remove(&mut self, tref: TrainRef) -> Option<Arc<TrainDriver>> {
        self.slots.remove(tref)
    }

    pub fn contains(&self, tref: TrainRef) -> bool {
        self.slots.contains_key(tref)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All live trains in ascending key order.
    pub fn sorted(&self) -> Vec<(TrainRef, Arc<TrainDriver>)> {
        let mut out: Vec<_> = self.slots.iter().map(|(k, d)| (k, Arc::clone(d))).collect();
        out.sort_unstable_by_key(|(k, _)| *k);
        out
    }
}
