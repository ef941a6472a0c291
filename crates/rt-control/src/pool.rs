//! `TrainIdPool` — recyclable train ids, per line.
//!
//! Every id of a line's configured range sits in exactly one of three sets:
//!
//! ```text
//!             acquire                 retire
//!  available ─────────▶ in use ──────────────▶ inactive
//!      ▲  ◀─────────────  │                        │
//!      │     release      │                        │
//!      │                  ▼ park (available only)  │
//!      └──────────────── unpark (FIFO) ◀───────────┘
//! ```
//!
//! Running out of ids is not an error: `acquire` returns `None` and the
//! dispatcher retries next tick.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

use tracing::trace;

use rt_core::{LineId, TrainId, lock};
use rt_network::RailNetwork;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IdState {
    Available,
    InUse,
    Inactive,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub available: Vec<TrainId>,
    pub in_use:    Vec<TrainId>,
    pub inactive:  Vec<TrainId>,
}

#[derive(Debug, Default)]
struct LinePool {
    available: VecDeque<TrainId>,
    in_use:    BTreeSet<TrainId>,
    inactive:  VecDeque<TrainId>,
}

#[derive(Debug, Default)]
pub struct TrainIdPool {
    lines: Mutex<BTreeMap<LineId, LinePool>>,
}

impl TrainIdPool {
    /// One pool per line over `min_train_id..=max_train_id`.  The top
    /// `initially_parked` ids start inactive.
    pub fn from_network(network: &RailNetwork) -> Self {
        let mut lines = BTreeMap::new();
        for line in network.line_ids() {
            let Some(props) = network.props(line) else { continue };
            let size = props.pool_size();
            let active = size - props.initially_parked.min(size);
            let mut pool = LinePool::default();
            for (n, id) in (props.min_train_id..=props.max_train_id).enumerate() {
                if n >= active as usize {
                    pool.inactive.push_back(TrainId(id));
                } else {
                    pool.available.push_back(TrainId(id));
                }
            }
            lines.insert(line, pool);
        }
        Self { lines: Mutex::new(lines) }
    }

    /// Take the lowest-queued available id, `None` when exhausted.
    pub fn acquire(&self, line: LineId) -> Option<TrainId> {
        let mut lines = lock(&self.lines);
        let pool = lines.get_mut(&line)?;
        let id = pool.available.pop_front()?;
        pool.in_use.insert(id);
        trace!(%line, train = %id, "id acquired");
        Some(id)
    }

    /// In use → available.
    pub fn release(&self, line: LineId, id: TrainId) -> bool {
        let mut lines = lock(&self.lines);
        let Some(pool) = lines.get_mut(&line) else { return false };
        if !pool.in_use.remove(&id) {
            return false;
        }
        pool.available.push_back(id);
        true
    }

    /// Available → inactive.
    pub fn park(&self, line: LineId, id: TrainId) -> bool {
        let mut lines = lock(&self.lines);
        let Some(pool) = lines.get_mut(&line) else { return false };
        let Some(at) = pool.available.iter().position(|&a| a == id) else {
            return false;
        };
        pool.available.remove(at);
        pool.inactive.push_back(id);
        true
    }

    /// Oldest inactive → available.
    pub fn unpark(&self, line: LineId) -> Option<TrainId> {
        let mut lines = lock(&self.lines);
        let pool = lines.get_mut(&line)?;
        let id = pool.inactive.pop_front()?;
        pool.available.push_back(id);
        Some(id)
    }

    /// In use → inactive, for a train parked on its return to depot.
    pub fn retire(&self, line: LineId, id: TrainId) -> bool {
        let mut lines = lock(&self.lines);
        let Some(pool) = lines.get_mut(&line) else { return false };
        if !pool.in_use.remove(&id) {
            return false;
        }
        pool.inactive.push_back(id);
        true
    }

    pub fn state_of(&self, line: LineId, id: TrainId) -> Option<IdState> {
        let lines = lock(&self.lines);
        let pool = lines.get(&line)?;
        if pool.in_use.contains(&id) {
            Some(IdState::InUse)
        } else if pool.available.contains(&id) {
            Some(IdState::Available)
        } else if pool.inactive.contains(&id) {
            Some(IdState::Inactive)
        } else {
            None
        }
    }

    pub fn snapshot(&self, line: LineId) -> Option<PoolSnapshot> {
        let lines = lock(&self.lines);
        let pool = lines.get(&line)?;
        Some(PoolSnapshot {
            available: pool.available.iter().copied().collect(),
            in_use:    pool.in_use.iter().copied().collect(),
            inactive:  pool.inactive.iter().copied().collect(),
        })
    }
}
