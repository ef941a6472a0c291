//! Fluent builder for [`RailNetwork`].

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::debug;

use rt_core::{BlockId, LineId, PlatformId, StationId};

use crate::network::{Block, LineRoute, Platform, PlatformKind, RailNetwork, Station};
use crate::{LineProperties, NetworkError, NetworkResult, RailConfig};

/// Input for [`RailNetworkBuilder::add_block`].
#[derive(Clone, Debug)]
pub struct BlockSpec {
    pub name:            String,
    pub length_m:        f64,
    pub speed_limit_mps: f64,
    pub accel_mps2:      f64,
    pub decel_mps2:      f64,
}

/// Input for [`RailNetworkBuilder::add_platform`].
#[derive(Clone, Debug)]
pub struct PlatformSpec {
    pub name:     String,
    pub station:  StationId,
    pub line:     LineId,
    pub block:    BlockId,
    pub capacity: u32,
    pub kind:     PlatformKind,
    pub offset_m: f64,
    pub length_m: f64,
}

struct RawLine {
    name:     String,
    blocks:   Vec<BlockId>,
    opposite: Option<LineId>,
    props:    Option<LineProperties>,
}

/// Construct a [`RailNetwork`] incrementally, then call [`build`](Self::build).
///
/// Platforms must be added to a line in traversal order.  `build()` checks
/// that, along with every other structural invariant, and fails with a
/// [`NetworkError`] on the first violation.
///
/// # Example
///
/// ```
/// use rt_network::{BlockSpec, LineProperties, PlatformKind, PlatformSpec, RailNetworkBuilder};
///
/// let mut b = RailNetworkBuilder::new();
/// let line = b.add_line("EW").unwrap();
/// let stn = b.add_station("Alpha").unwrap();
/// let blk = b.add_block(BlockSpec {
///     name: "B1".into(), length_m: 500.0, speed_limit_mps: 20.0,
///     accel_mps2: 1.0, decel_mps2: 1.0,
/// }).unwrap();
/// b.push_route_block(line, blk);
/// b.add_platform(PlatformSpec {
///     name: "EW1".into(), station: stn, line, block: blk, capacity: 500,
///     kind: PlatformKind::Terminal, offset_m: 100.0, length_m: 150.0,
/// }).unwrap();
/// b.set_properties(line, LineProperties::default());
/// let net = b.build().unwrap();
/// assert_eq!(net.stop_position(line, net.lines[0].platforms[0]), Some(250.0));
/// ```
#[derive(Default)]
pub struct RailNetworkBuilder {
    blocks:    Vec<Block>,
    platforms: Vec<Platform>,
    stations:  Vec<Station>,
    lines:     Vec<RawLine>,

    line_names:     FxHashMap<String, LineId>,
    station_names:  FxHashMap<String, StationId>,
    platform_names: FxHashMap<String, PlatformId>,
    block_names:    FxHashMap<String, BlockId>,
}

impl RailNetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Entities ──────────────────────────────────────────────────────────

    pub fn add_line(&mut self, name: &str) -> NetworkResult<LineId> {
        if self.line_names.contains_key(name) {
            return Err(NetworkError::Duplicate { kind: "line", name: name.into() });
        }
        let id = LineId(self.lines.len() as u32);
        self.lines.push(RawLine {
            name:     name.into(),
            blocks:   Vec::new(),
            opposite: None,
            props:    None,
        });
        self.line_names.insert(name.into(), id);
        Ok(id)
    }

    pub fn add_station(&mut self, name: &str) -> NetworkResult<StationId> {
        if self.station_names.contains_key(name) {
            return Err(NetworkError::Duplicate { kind: "station", name: name.into() });
        }
        let id = StationId(self.stations.len() as u32);
        self.stations.push(Station { id, name: name.into(), platforms: BTreeMap::new() });
        self.station_names.insert(name.into(), id);
        Ok(id)
    }

    /// Return the station named `name`, adding it if it does not exist yet.
    pub fn station_or_insert(&mut self, name: &str) -> StationId {
        match self.station_names.get(name) {
            Some(&id) => id,
            None => {
                let id = StationId(self.stations.len() as u32);
                self.stations.push(Station { id, name: name.into(), platforms: BTreeMap::new() });
                self.station_names.insert(name.into(), id);
                id
            }
        }
    }

    pub fn add_block(&mut self, spec: BlockSpec) -> NetworkResult<BlockId> {
        if self.block_names.contains_key(&spec.name) {
            return Err(NetworkError::Duplicate { kind: "block", name: spec.name });
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let reason = if !positive(spec.length_m) {
            Some("length must be positive")
        } else if !positive(spec.speed_limit_mps) {
            Some("speed limit must be positive")
        } else if !positive(spec.accel_mps2) || !positive(spec.decel_mps2) {
            Some("acceleration and deceleration rates must be positive")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(NetworkError::InvalidBlock { block: spec.name, reason: reason.into() });
        }

        let id = BlockId(self.blocks.len() as u32);
        self.block_names.insert(spec.name.clone(), id);
        self.blocks.push(Block {
            id,
            name:            spec.name,
            length_m:        spec.length_m,
            speed_limit_mps: spec.speed_limit_mps,
            accel_mps2:      spec.accel_mps2,
            decel_mps2:      spec.decel_mps2,
            platform:        None,
        });
        Ok(id)
    }

    /// Append `block` to `line`'s route.  Unknown blocks are reported by `build`.
    pub fn push_route_block(&mut self, line: LineId, block: BlockId) {
        if let Some(raw) = self.lines.get_mut(line.index()) {
            raw.blocks.push(block);
        }
    }

    /// Add a platform; it is appended to its line's platform sequence.
    pub fn add_platform(&mut self, spec: PlatformSpec) -> NetworkResult<PlatformId> {
        if self.platform_names.contains_key(&spec.name) {
            return Err(NetworkError::Duplicate { kind: "platform", name: spec.name });
        }
        let station = self
            .stations
            .get_mut(spec.station.index())
            .ok_or_else(|| NetworkError::UnknownName {
                kind: "station",
                name: spec.station.to_string(),
            })?;
        if station.platforms.contains_key(&spec.line) {
            return Err(NetworkError::Duplicate {
                kind: "platform for line at station",
                name: format!("{} @ {}", spec.name, station.name),
            });
        }
        if spec.line.index() >= self.lines.len() {
            return Err(NetworkError::UnknownLine(spec.line));
        }

        let id = PlatformId(self.platforms.len() as u32);
        station.platforms.insert(spec.line, id);
        self.platform_names.insert(spec.name.clone(), id);
        self.platforms.push(Platform {
            id,
            name:     spec.name,
            station:  spec.station,
            line:     spec.line,
            capacity: spec.capacity,
            kind:     spec.kind,
            block:    spec.block,
            offset_m: spec.offset_m.max(0.0),
            length_m: spec.length_m.max(0.0),
        });
        Ok(id)
    }

    /// Declare `a` and `b` as running opposite ways over the same stations.
    pub fn pair_opposite(&mut self, a: LineId, b: LineId) {
        if let Some(raw) = self.lines.get_mut(a.index()) {
            raw.opposite = Some(b);
        }
        if let Some(raw) = self.lines.get_mut(b.index()) {
            raw.opposite = Some(a);
        }
    }

    pub fn set_properties(&mut self, line: LineId, props: LineProperties) {
        if let Some(raw) = self.lines.get_mut(line.index()) {
            raw.props = Some(props);
        }
    }

    /// Attach properties from `config` to every line and pair opposite lines.
    ///
    /// Config entries for lines that do not exist are ignored with a debug log.
    pub fn apply_config(&mut self, config: &RailConfig) -> NetworkResult<()> {
        for (name, props) in config {
            let Some(line) = self.line_id(name) else {
                debug!(line = %name, "config entry for unknown line ignored");
                continue;
            };
            if let Some(opposite) = &props.opposite_line {
                let other = self.line_id(opposite).ok_or_else(|| NetworkError::UnknownName {
                    kind: "opposite line",
                    name: opposite.clone(),
                })?;
                self.pair_opposite(line, other);
            }
            self.set_properties(line, props.clone());
        }
        Ok(())
    }

    pub fn line_id(&self, name: &str) -> Option<LineId> {
        self.line_names.get(name).copied()
    }

    /// Blocks pushed onto `line`'s route so far.
    pub fn route_blocks(&self, line: LineId) -> Option<&[BlockId]> {
        self.lines.get(line.index()).map(|raw| raw.blocks.as_slice())
    }

    pub fn block_id(&self, name: &str) -> Option<BlockId> {
        self.block_names.get(name).copied()
    }

    pub fn station_id(&self, name: &str) -> Option<StationId> {
        self.station_names.get(name).copied()
    }

    // ── Build ─────────────────────────────────────────────────────────────

    /// Validate and produce the immutable network.
    pub fn build(self) -> NetworkResult<RailNetwork> {
        let Self {
            mut blocks,
            platforms,
            stations,
            lines: raw_lines,
            line_names,
            station_names,
            platform_names,
            block_names,
        } = self;

        // ── Routes ────────────────────────────────────────────────────────
        let mut lines = Vec::with_capacity(raw_lines.len());
        let mut props = Vec::with_capacity(raw_lines.len());
        for (i, raw) in raw_lines.into_iter().enumerate() {
            if raw.blocks.is_empty() {
                return Err(NetworkError::EmptyRoute(raw.name));
            }
            let mut block_starts = Vec::with_capacity(raw.blocks.len());
            let mut length_m = 0.0;
            for &block in &raw.blocks {
                let b = blocks.get(block.index()).ok_or_else(|| NetworkError::UnknownBlock {
                    line: raw.name.clone(),
                    block,
                })?;
                block_starts.push(length_m);
                length_m += b.length_m;
            }
            let line_props = raw
                .props
                .ok_or_else(|| NetworkError::MissingProperties(raw.name.clone()))?;
            line_props.validate().map_err(|reason| NetworkError::InvalidProperties {
                line: raw.name.clone(),
                reason,
            })?;
            props.push(line_props);
            lines.push(LineRoute {
                id: LineId(i as u32),
                name: raw.name,
                blocks: raw.blocks,
                block_starts,
                length_m,
                platforms: Vec::new(),
                opposite: raw.opposite,
            });
        }

        // ── Opposite pairing ──────────────────────────────────────────────
        for line in &lines {
            if let Some(opposite) = line.opposite {
                let back = lines.get(opposite.index()).and_then(|o| o.opposite);
                if back != Some(line.id) || opposite == line.id {
                    return Err(NetworkError::AsymmetricOpposite(line.name.clone()));
                }
            }
        }

        // ── Platforms: stop positions and ordering ────────────────────────
        let mut stop_positions = Vec::with_capacity(platforms.len());
        for platform in &platforms {
            let line = &mut lines[platform.line.index()];
            let start = line.block_start(platform.block).ok_or_else(|| {
                NetworkError::PlatformOffRoute {
                    platform: platform.name.clone(),
                    block:    platform.block,
                    line:     line.name.clone(),
                }
            })?;
            let block = &mut blocks[platform.block.index()];
            let stop = start + (platform.offset_m + platform.length_m).min(block.length_m);

            if let Some(&prev) = line.platforms.last() {
                let prev_stop: f64 = stop_positions[prev.index()];
                if stop <= prev_stop {
                    return Err(NetworkError::PlatformOrder {
                        platform: platform.name.clone(),
                        line:     line.name.clone(),
                    });
                }
            }
            block.platform = Some(platform.id);
            line.platforms.push(platform.id);
            stop_positions.push(stop);
        }

        if let Some(line) = lines.iter().find(|l| l.platforms.is_empty()) {
            return Err(NetworkError::NoPlatforms(line.name.clone()));
        }

        debug!(
            lines = lines.len(),
            blocks = blocks.len(),
            platforms = platforms.len(),
            stations = stations.len(),
            "rail network built"
        );

        Ok(RailNetwork {
            blocks,
            platforms,
            stations,
            lines,
            props,
            stop_positions,
            line_names,
            station_names,
            platform_names,
            block_names,
        })
    }
}
