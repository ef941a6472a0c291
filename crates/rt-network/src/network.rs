//! Rail network representation.
//!
//! # Data layout
//!
//! Blocks, platforms, stations and lines live in dense `Vec`s indexed by
//! their typed ids.  Each [`LineRoute`] carries its ordered block sequence
//! with the cumulative start offset of every block, so converting a
//! (block, offset) pair into a line-frame position is one addition.
//!
//! Every platform belongs to exactly one line; its stop position in that
//! line's frame is precomputed at build time:
//!
//! ```text
//! stop = block_start + min(offset + length, block_length)
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use rt_core::{BlockId, LineId, PlatformId, RailError, StationId};

use crate::LineProperties;

// ── PlatformKind ──────────────────────────────────────────────────────────────

/// Platform type; selects the minimum dwell time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum PlatformKind {
    #[default]
    Normal,
    Interchange,
    Terminal,
}

impl FromStr for PlatformKind {
    type Err = RailError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "normal"  => Ok(PlatformKind::Normal),
            "interchange"  => Ok(PlatformKind::Interchange),
            "terminal"     => Ok(PlatformKind::Terminal),
            other => Err(RailError::Parse(format!(
                "invalid platform kind {other:?}: expected normal, interchange or terminal"
            ))),
        }
    }
}

// ── Static entities ───────────────────────────────────────────────────────────

/// An immutable track segment.
#[derive(Clone, Debug)]
pub struct Block {
    pub id:              BlockId,
    pub name:            String,
    pub length_m:        f64,
    pub speed_limit_mps: f64,
    pub accel_mps2:      f64,
    pub decel_mps2:      f64,
    /// Platform attached to this block, if any.
    pub platform:        Option<PlatformId>,
}

#[derive(Clone, Debug)]
pub struct Platform {
    pub id:       PlatformId,
    pub name:     String,
    pub station:  StationId,
    pub line:     LineId,
    pub capacity: u32,
    pub kind:     PlatformKind,
    pub block:    BlockId,
    pub offset_m: f64,
    pub length_m: f64,
}

#[derive(Clone, Debug)]
pub struct Station {
    pub id:        StationId,
    pub name:      String,
    /// The station's platform on each line that serves it.
    pub platforms: BTreeMap<LineId, PlatformId>,
}

/// One direction of service: ordered blocks and ordered platforms.
#[derive(Clone, Debug)]
pub struct LineRoute {
    pub id:           LineId,
    pub name:         String,
    pub blocks:       Vec<BlockId>,
    /// Line-frame position where each entry of `blocks` begins.
    pub block_starts: Vec<f64>,
    pub length_m:     f64,
    /// Platforms in traversal order; stop positions strictly increase.
    pub platforms:    Vec<PlatformId>,
    pub opposite:     Option<LineId>,
}

impl LineRoute {
    /// Line-frame start of `block`, `None` if the block is not on this line.
    pub fn block_start(&self, block: BlockId) -> Option<f64> {
        self.blocks
            .iter()
            .position(|&b| b == block)
            .map(|i| self.block_starts[i])
    }

    /// Position of `platform` in this line's platform sequence.
    pub fn platform_index(&self, platform: PlatformId) -> Option<usize> {
        self.platforms.iter().position(|&p| p == platform)
    }

    /// The line's last platform.
    pub fn terminal(&self) -> Option<PlatformId> {
        self.platforms.last().copied()
    }
}

// ── RailNetwork ───────────────────────────────────────────────────────────────

/// The complete, validated, read-only rail network.
///
/// Do not construct directly; use [`RailNetworkBuilder`][crate::RailNetworkBuilder].
pub struct RailNetwork {
    pub blocks:    Vec<Block>,
    pub platforms: Vec<Platform>,
    pub stations:  Vec<Station>,
    pub lines:     Vec<LineRoute>,
    /// Indexed by `LineId`.
    pub props:     Vec<LineProperties>,

    pub(crate) stop_positions: Vec<f64>,
    pub(crate) line_names:     FxHashMap<String, LineId>,
    pub(crate) station_names:  FxHashMap<String, StationId>,
    pub(crate) platform_names: FxHashMap<String, PlatformId>,
    pub(crate) block_names:    FxHashMap<String, BlockId>,
}

impl RailNetwork {
    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn platform_count(&self) -> usize {
        self.platforms.len()
    }

    pub fn line_ids(&self) -> impl Iterator<Item = LineId> + '_ {
        self.lines.iter().map(|l| l.id)
    }

    // ── Checked accessors ─────────────────────────────────────────────────

    #[inline]
    pub fn line(&self, id: LineId) -> Option<&LineRoute> {
        self.lines.get(id.index())
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    #[inline]
    pub fn platform(&self, id: PlatformId) -> Option<&Platform> {
        self.platforms.get(id.index())
    }

    #[inline]
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    #[inline]
    pub fn props(&self, line: LineId) -> Option<&LineProperties> {
        self.props.get(line.index())
    }

    // ── Name lookups ──────────────────────────────────────────────────────

    pub fn line_by_name(&self, name: &str) -> Option<LineId> {
        self.line_names.get(name).copied()
    }

    pub fn station_by_name(&self, name: &str) -> Option<StationId> {
        self.station_names.get(name).copied()
    }

    pub fn platform_by_name(&self, name: &str) -> Option<PlatformId> {
        self.platform_names.get(name).copied()
    }

    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.block_names.get(name).copied()
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    /// Stop position of `platform` in `line`'s frame.
    ///
    /// `None` if the platform does not belong to `line`.
    #[inline]
    pub fn stop_position(&self, line: LineId, platform: PlatformId) -> Option<f64> {
        let p = self.platform(platform)?;
        (p.line == line).then(|| self.stop_positions[platform.index()])
    }

    /// Line-frame start of the block `platform` is attached to.
    pub fn platform_block_start(&self, platform: PlatformId) -> Option<f64> {
        let p = self.platform(platform)?;
        self.line(p.line)?.block_start(p.block)
    }

    // ── Topology ──────────────────────────────────────────────────────────

    pub fn opposite_line(&self, line: LineId) -> Option<LineId> {
        self.line(line)?.opposite
    }

    /// The same station's platform on the opposite line.
    pub fn mirrored_platform(&self, platform: PlatformId) -> Option<PlatformId> {
        let p = self.platform(platform)?;
        let opposite = self.opposite_line(p.line)?;
        self.station(p.station)?.platforms.get(&opposite).copied()
    }

    /// `line`'s platform at `station`.
    pub fn platform_at(&self, line: LineId, station: StationId) -> Option<PlatformId> {
        self.station(station)?.platforms.get(&line).copied()
    }

    /// Platforms of `line` from `start` to `end` station inclusive, in route
    /// order regardless of argument order.
    pub fn platforms_between(
        &self,
        line:  LineId,
        start: StationId,
        end:   StationId,
    ) -> Option<Vec<PlatformId>> {
        let route = self.line(line)?;
        let i = route.platform_index(self.platform_at(line, start)?)?;
        let j = route.platform_index(self.platform_at(line, end)?)?;
        let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
        Some(route.platforms[lo..=hi].to_vec())
    }

    /// Blocks of `line` spanning from `start`'s platform block to `end`'s
    /// platform block inclusive.
    pub fn blocks_between(
        &self,
        line:  LineId,
        start: StationId,
        end:   StationId,
    ) -> Option<Vec<BlockId>> {
        let route = self.line(line)?;
        let index_of = |station| {
            let platform = self.platform(self.platform_at(line, station)?)?;
            route.blocks.iter().position(|&b| b == platform.block)
        };
        let (i, j) = (index_of(start)?, index_of(end)?);
        let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
        Some(route.blocks[lo..=hi].to_vec())
    }

    /// `line`'s platforms from `start` onward.
    pub fn platforms_from(&self, line: LineId, start: PlatformId) -> Option<Vec<PlatformId>> {
        let route = self.line(line)?;
        let i = route.platform_index(start)?;
        Some(route.platforms[i..].to_vec())
    }

    /// `true` when `platform` is the last platform of its line.
    pub fn is_line_terminal(&self, platform: PlatformId) -> bool {
        self.platform(platform)
            .and_then(|p| self.line(p.line))
            .and_then(LineRoute::terminal)
            == Some(platform)
    }
}
