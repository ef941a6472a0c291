//! CSV network loader.
//!
//! # CSV formats
//!
//! `blocks.csv` — one row per track block:
//!
//! ```csv
//! block,length_m,speed_limit_mps,accel_mps2,decel_mps2
//! B1,800,22.2,1.0,1.1
//! ```
//!
//! `routes.csv` — the ordered block sequence of every line:
//!
//! ```csv
//! line,sequence,block
//! EW,0,B1
//! EW,1,B2
//! ```
//!
//! `platforms.csv` — one row per platform:
//!
//! ```csv
//! platform,station,line,block,capacity,kind,offset_m,length_m
//! EW1,Alpha,EW,B1,1200,terminal,300,140
//! ```
//!
//! `kind` is `normal`, `interchange` or `terminal` (empty = `normal`).
//! Platform rows may appear in any order; each line's platforms are sorted by
//! their position along the route.  Lines get ids in name order.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::builder::{BlockSpec, PlatformSpec, RailNetworkBuilder};
use crate::network::PlatformKind;
use crate::{NetworkError, NetworkResult, RailConfig, RailNetwork};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct BlockRecord {
    block:           String,
    length_m:        f64,
    speed_limit_mps: f64,
    accel_mps2:      f64,
    decel_mps2:      f64,
}

#[derive(Deserialize)]
struct RouteRecord {
    line:     String,
    sequence: u32,
    block:    String,
}

#[derive(Deserialize)]
struct PlatformRecord {
    platform: String,
    station:  String,
    line:     String,
    block:    String,
    capacity: u32,
    #[serde(default)]
    kind:     String,
    offset_m: f64,
    length_m: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load `blocks.csv`, `routes.csv` and `platforms.csv` from `dir`.
pub fn load_network_dir(dir: &Path, config: &RailConfig) -> NetworkResult<RailNetwork> {
    let blocks = std::fs::File::open(dir.join("blocks.csv"))?;
    let routes = std::fs::File::open(dir.join("routes.csv"))?;
    let platforms = std::fs::File::open(dir.join("platforms.csv"))?;
    load_network_readers(blocks, routes, platforms, config)
}

/// Like [`load_network_dir`] but accepts any `Read` sources.
///
/// Useful for testing (pass a `std::io::Cursor`) or embedded fixtures.
pub fn load_network_readers<B: Read, R: Read, P: Read>(
    blocks:    B,
    routes:    R,
    platforms: P,
    config:    &RailConfig,
) -> NetworkResult<RailNetwork> {
    let mut builder = RailNetworkBuilder::new();

    // ── Blocks ────────────────────────────────────────────────────────────
    for row in csv::Reader::from_reader(blocks).deserialize::<BlockRecord>() {
        let row = row?;
        builder.add_block(BlockSpec {
            name:            row.block,
            length_m:        row.length_m,
            speed_limit_mps: row.speed_limit_mps,
            accel_mps2:      row.accel_mps2,
            decel_mps2:      row.decel_mps2,
        })?;
    }

    // ── Routes, grouped per line ──────────────────────────────────────────
    let mut by_line: BTreeMap<String, Vec<(u32, String)>> = BTreeMap::new();
    for row in csv::Reader::from_reader(routes).deserialize::<RouteRecord>() {
        let row = row?;
        by_line.entry(row.line).or_default().push((row.sequence, row.block));
    }
    for (name, mut rows) in by_line {
        rows.sort_by_key(|(seq, _)| *seq);
        let line = builder.add_line(&name)?;
        for (_, block_name) in rows {
            let block = builder.block_id(&block_name).ok_or_else(|| NetworkError::UnknownName {
                kind: "block",
                name: block_name.clone(),
            })?;
            builder.push_route_block(line, block);
        }
    }

    // ── Platforms, sorted along each route ────────────────────────────────
    let mut specs: Vec<(usize, f64, PlatformRecord)> = Vec::new();
    {
        let mut reader = csv::Reader::from_reader(platforms);
        for row in reader.deserialize::<PlatformRecord>() {
            let row = row?;
            let line = builder.line_id(&row.line).ok_or_else(|| NetworkError::UnknownName {
                kind: "line",
                name: row.line.clone(),
            })?;
            let block = builder.block_id(&row.block).ok_or_else(|| NetworkError::UnknownName {
                kind: "block",
                name: row.block.clone(),
            })?;
            // Off-route platforms sort last; build() reports them.
            let route_index = route_position(&builder, line, block).unwrap_or(usize::MAX);
            specs.push((route_index, row.offset_m + row.length_m, row));
        }
    }
    specs.sort_by(|a, b| {
        (a.2.line.as_str(), a.0)
            .cmp(&(b.2.line.as_str(), b.0))
            .then(a.1.total_cmp(&b.1))
    });

    for (_, _, row) in specs {
        let station = builder.station_or_insert(&row.station);
        let (Some(line), Some(block)) = (builder.line_id(&row.line), builder.block_id(&row.block))
        else {
            continue;
        };
        builder.add_platform(PlatformSpec {
            name:     row.platform,
            station,
            line,
            block,
            capacity: row.capacity,
            kind:     row.kind.parse::<PlatformKind>()?,
            offset_m: row.offset_m,
            length_m: row.length_m,
        })?;
    }

    builder.apply_config(config)?;
    builder.build()
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn route_position(
    builder: &RailNetworkBuilder,
    line:    rt_core::LineId,
    block:   rt_core::BlockId,
) -> Option<usize> {
    builder.route_blocks(line)?.iter().position(|&b| b == block)
}
