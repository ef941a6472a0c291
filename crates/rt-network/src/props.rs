//! Per-line operating properties.
//!
//! Loaded by the application (typically from JSON) and attached to the
//! network at build time.  Every line must have an entry.

use std::collections::BTreeMap;

use serde::Deserialize;

use rt_core::TrainId;

/// Operating properties of one line.
///
/// All fields have defaults so a config file only needs to name what
/// differs.  Times are seconds, distances metres.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LineProperties {
    /// Passengers a train can carry.
    pub capacity: u32,

    /// Dwell model coefficients `[base, boarding, alighting, crowding]`.
    pub dwell_coefficients: [f64; 4],

    pub min_dwell_normal_secs:      f64,
    pub min_dwell_interchange_secs: f64,
    pub min_dwell_terminal_secs:    f64,
    pub max_dwell_secs:             f64,

    /// Default gap a train keeps to the train ahead.
    pub safe_distance_m: f64,

    /// Default time gap; adds `safe_headway_secs × speed` to the following
    /// distance and gates U-turn entry at a platform.
    pub safe_headway_secs: f64,

    /// Inclusive train-id range of this line's pool.
    pub min_train_id: u32,
    pub max_train_id: u32,

    /// How many ids (from the top of the range) start in the inactive set.
    pub initially_parked: u32,

    /// Trains held at a disruption boundary U-turn without an operator flag.
    pub auto_uturn_on_disruption: bool,

    /// Name of the line running the other way over the same stations.
    pub opposite_line: Option<String>,
}

impl Default for LineProperties {
    fn default() -> Self {
        Self {
            capacity:                   900,
            dwell_coefficients:         [12.22, 2.27, 1.82, 0.00062],
            min_dwell_normal_secs:      20.0,
            min_dwell_interchange_secs: 30.0,
            min_dwell_terminal_secs:    60.0,
            max_dwell_secs:             120.0,
            safe_distance_m:            30.0,
            safe_headway_secs:          10.0,
            min_train_id:               1,
            max_train_id:               20,
            initially_parked:           0,
            auto_uturn_on_disruption:   false,
            opposite_line:              None,
        }
    }
}

impl LineProperties {
    /// Number of ids in the pool range, saturating at `u32::MAX`.
    pub fn pool_size(&self) -> u32 {
        if self.min_train_id > self.max_train_id {
            return 0;
        }
        (self.max_train_id - self.min_train_id).saturating_add(1)
    }

    /// Check internal consistency; returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_train_id > self.max_train_id {
            return Err(format!(
                "min_train_id {} exceeds max_train_id {}",
                self.min_train_id, self.max_train_id
            ));
        }
        if self.max_train_id == TrainId::INVALID.0 {
            return Err(format!("max_train_id {} is reserved as the invalid train id", self.max_train_id));
        }
        if self.initially_parked > self.pool_size() {
            return Err(format!(
                "initially_parked {} exceeds pool size {}",
                self.initially_parked,
                self.pool_size()
            ));
        }
        if self.capacity == 0 {
            return Err("capacity must be positive".into());
        }
        let mins = [
            self.min_dwell_normal_secs,
            self.min_dwell_interchange_secs,
            self.min_dwell_terminal_secs,
        ];
        if mins.iter().any(|&m| m < 0.0 || m > self.max_dwell_secs) {
            return Err("minimum dwell times must lie in [0, max_dwell_secs]".into());
        }
        if self.safe_distance_m < 0.0 || self.safe_headway_secs < 0.0 {
            return Err("safe distance and headway must be non-negative".into());
        }
        Ok(())
    }
}

/// Line name → properties.  Ordered so iteration is deterministic.
pub type RailConfig = BTreeMap<String, LineProperties>;
