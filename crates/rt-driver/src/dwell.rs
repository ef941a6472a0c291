//! Dwell-time model.
//!
//! ```text
//! b = boarding / 24 · s_b      a = alighting / 24 · s_a      o = occupancy / 24 · s_o
//! raw = c0 + c1·b + c2·a + c3·o³·b
//! ```
//!
//! `c0..c3` are per-line coefficients; `s_b, s_a, s_o` is the operator's
//! scaling triple (all 1 by default).  The raw value is then resolved
//! against holding overrides and the line's dwell bounds:
//!
//! | Overrides present  | Result                                               |
//! |--------------------|------------------------------------------------------|
//! | exact              | exact, nothing else applies                          |
//! | max (± min)        | clamp to max; lift to min only if min ≤ max, else max |
//! | min only           | lift to min; cap at config max only if max ≥ min     |
//! | none               | clamp to [platform-kind min, config max]             |

use rt_network::{LineProperties, PlatformKind};

/// Operator multipliers on the boarding / alighting / occupancy terms.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DwellScaling {
    pub boarding:  f64,
    pub alighting: f64,
    pub occupancy: f64,
}

impl Default for DwellScaling {
    fn default() -> Self {
        Self { boarding: 1.0, alighting: 1.0, occupancy: 1.0 }
    }
}

/// Holding overrides in force for one platform.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HoldingBounds {
    pub exact: Option<f64>,
    pub max:   Option<f64>,
    pub min:   Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DwellModel {
    pub coefficients:    [f64; 4],
    pub min_normal:      f64,
    pub min_interchange: f64,
    pub min_terminal:    f64,
    pub max:             f64,
}

impl DwellModel {
    pub fn from_properties(props: &LineProperties) -> Self {
        Self {
            coefficients:    props.dwell_coefficients,
            min_normal:      props.min_dwell_normal_secs,
            min_interchange: props.min_dwell_interchange_secs,
            min_terminal:    props.min_dwell_terminal_secs,
            max:             props.max_dwell_secs,
        }
    }

    /// Unclamped dwell in seconds.
    pub fn raw(&self, boarding: u32, alighting: u32, occupancy: u32, scaling: DwellScaling) -> f64 {
        let [c0, c1, c2, c3] = self.coefficients;
        let b = boarding as f64 / 24.0 * scaling.boarding;
        let a = alighting as f64 / 24.0 * scaling.alighting;
        let o = occupancy as f64 / 24.0 * scaling.occupancy;
        c0 + c1 * b + c2 * a + c3 * o.powi(3) * b
    }

    pub fn min_for(&self, kind: PlatformKind) -> f64 {
        match kind {
            PlatformKind::Normal      => self.min_normal,
            PlatformKind::Interchange => self.min_interchange,
            PlatformKind::Terminal    => self.min_terminal,
        }
    }

    /// Apply holding overrides and bounds to a raw dwell.
    pub fn resolve(&self, raw: f64, kind: PlatformKind, bounds: HoldingBounds) -> f64 {
        if let Some(exact) = bounds.exact {
            return exact;
        }
        let min = bounds.min.unwrap_or_else(|| self.min_for(kind));
        match (bounds.max, bounds.min) {
            (Some(max), _) => {
                if raw > max {
                    max
                } else if raw < min {
                    if min <= max { min } else { max }
                } else {
                    raw
                }
            }
            (None, Some(min)) => {
                if raw < min {
                    min
                } else if raw > self.max {
                    if self.max >= min { self.max } else { min }
                } else {
                    raw
                }
            }
            (None, None) => raw.clamp(min.min(self.max), self.max),
        }
    }
}
