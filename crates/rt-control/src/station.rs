//! Per-platform ledger: waiting passengers and who used the platform last.

use std::collections::VecDeque;

use rt_core::{DailyTime, PlatformId, TrainRef};
use rt_driver::Passenger;
use rt_network::RailNetwork;

#[derive(Debug, Default)]
pub struct PlatformBook {
    /// FIFO; boarding takes from the front.
    pub waiting:        VecDeque<Passenger>,
    /// Train standing at the platform.
    pub occupant:       Option<TrainRef>,
    pub last_driver:    Option<TrainRef>,
    pub last_departure: Option<DailyTime>,
}

/// `PlatformBook`s indexed by `PlatformId`.
#[derive(Debug, Default)]
pub struct StationBook {
    platforms: Vec<PlatformBook>,
}

impl StationBook {
    pub fn new(network: &RailNetwork) -> Self {
        Self {
            platforms: (0..network.platform_count()).map(|_| PlatformBook::default()).collect(),
        }
    }

    pub fn get(&self, platform: PlatformId) -> Option<&PlatformBook> {
        self.platforms.get(platform.index())
    }

    pub fn get_mut(&mut self, platform: PlatformId) -> Option<&mut PlatformBook> {
        self.platforms.get_mut(platform.index())
    }

    /// Forget every reference to `tref`.
    pub fn clear_train(&mut self, tref: TrainRef) {
        for p in &mut self.platforms {
            if p.occupant == Some(tref) {
                p.occupant = None;
            }
            if p.last_driver == Some(tref) {
                p.last_driver = None;
            }
        }
    }

    pub fn waiting_total(&self) -> usize {
        self.platforms.iter().map(|p| p.waiting.len()).sum()
    }
}
