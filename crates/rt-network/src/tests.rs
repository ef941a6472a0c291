//! Unit tests for rt-network.

use rt_core::{LineId, StationId};

use crate::{BlockSpec, LineProperties, PlatformKind, PlatformSpec, RailNetwork, RailNetworkBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn block(name: &str, length_m: f64) -> BlockSpec {
    BlockSpec {
        name: name.into(),
        length_m,
        speed_limit_mps: 20.0,
        accel_mps2: 1.0,
        decel_mps2: 1.2,
    }
}

/// Two opposite lines over three stations, one 1 km block per station.
///
/// ```text
/// EW: [E1]──[E2]──[E3]     stops at 600, 1600, 2600
/// WE: [W1]──[W2]──[W3]     stations reversed: C, B, A
/// ```
fn corridor() -> (RailNetwork, LineId, LineId, [StationId; 3]) {
    let mut b = RailNetworkBuilder::new();
    let ew = b.add_line("EW").unwrap();
    let we = b.add_line("WE").unwrap();
    let stations = [
        b.add_station("A").unwrap(),
        b.add_station("B").unwrap(),
        b.add_station("C").unwrap(),
    ];
    for i in 0..3 {
        let e = b.add_block(block(&format!("E{}", i + 1), 1_000.0)).unwrap();
        b.push_route_block(ew, e);
    }
    for i in 0..3 {
        let w = b.add_block(block(&format!("W{}", i + 1), 1_000.0)).unwrap();
        b.push_route_block(we, w);
    }
    for (i, &stn) in stations.iter().enumerate() {
        let kind = if i == 2 { PlatformKind::Terminal } else { PlatformKind::Normal };
        b.add_platform(PlatformSpec {
            name: format!("EW{}", i + 1),
            station: stn,
            line: ew,
            block: b.block_id(&format!("E{}", i + 1)).unwrap(),
            capacity: 1_000,
            kind,
            offset_m: 450.0,
            length_m: 150.0,
        })
        .unwrap();
    }
    for (i, &stn) in stations.iter().rev().enumerate() {
        b.add_platform(PlatformSpec {
            name: format!("WE{}", i + 1),
            station: stn,
            line: we,
            block: b.block_id(&format!("W{}", i + 1)).unwrap(),
            capacity: 1_000,
            kind: PlatformKind::Normal,
            offset_m: 450.0,
            length_m: 150.0,
        })
        .unwrap();
    }
    b.pair_opposite(ew, we);
    b.set_properties(ew, LineProperties::default());
    b.set_properties(we, LineProperties::default());
    (b.build().unwrap(), ew, we, stations)
}

// ── Builder and geometry ──────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::NetworkError;

    #[test]
    fn stop_positions_in_line_frame() {
        let (net, ew, _, _) = corridor();
        let stops: Vec<f64> = net.lines[ew.index()]
            .platforms
            .iter()
            .map(|&p| net.stop_position(ew, p).unwrap())
            .collect();
        assert_eq!(stops, vec![600.0, 1_600.0, 2_600.0]);
        assert_eq!(net.lines[ew.index()].length_m, 3_000.0);
    }

    #[test]
    fn stop_position_is_clamped_to_block() {
        let mut b = RailNetworkBuilder::new();
        let l = b.add_line("L").unwrap();
        let s = b.add_station("S").unwrap();
        let blk = b.add_block(block("B", 100.0)).unwrap();
        b.push_route_block(l, blk);
        let p = b
            .add_platform(PlatformSpec {
                name: "P".into(), station: s, line: l, block: blk, capacity: 1,
                kind: PlatformKind::Normal, offset_m: 80.0, length_m: 60.0,
            })
            .unwrap();
        b.set_properties(l, LineProperties::default());
        let net = b.build().unwrap();
        assert_eq!(net.stop_position(l, p), Some(100.0));
    }

    #[test]
    fn stop_position_on_foreign_line_is_none() {
        let (net, ew, we, _) = corridor();
        let we_first = net.lines[we.index()].platforms[0];
        assert!(net.stop_position(ew, we_first).is_none());
    }

    #[test]
    fn empty_route_rejected() {
        let mut b = RailNetworkBuilder::new();
        let l = b.add_line("L").unwrap();
        b.set_properties(l, LineProperties::default());
        assert!(matches!(b.build(), Err(NetworkError::EmptyRoute(_))));
    }

    #[test]
    fn missing_properties_rejected() {
        let mut b = RailNetworkBuilder::new();
        let l = b.add_line("L").unwrap();
        let s = b.add_station("S").unwrap();
        let blk = b.add_block(block("B", 100.0)).unwrap();
        b.push_route_block(l, blk);
        b.add_platform(PlatformSpec {
            name: "P".into(), station: s, line: l, block: blk, capacity: 1,
            kind: PlatformKind::Normal, offset_m: 0.0, length_m: 50.0,
        })
        .unwrap();
        assert!(matches!(b.build(), Err(NetworkError::MissingProperties(_))));
    }

    #[test]
    fn out_of_order_platforms_rejected() {
        let mut b = RailNetworkBuilder::new();
        let l = b.add_line("L").unwrap();
        let blk = b.add_block(block("B", 1_000.0)).unwrap();
        b.push_route_block(l, blk);
        for (name, offset) in [("P1", 500.0), ("P2", 100.0)] {
            let s = b.add_station(name).unwrap();
            b.add_platform(PlatformSpec {
                name: name.into(), station: s, line: l, block: blk, capacity: 1,
                kind: PlatformKind::Normal, offset_m: offset, length_m: 50.0,
            })
            .unwrap();
        }
        b.set_properties(l, LineProperties::default());
        assert!(matches!(b.build(), Err(NetworkError::PlatformOrder { .. })));
    }

    #[test]
    fn platform_off_route_rejected() {
        let mut b = RailNetworkBuilder::new();
        let l = b.add_line("L").unwrap();
        let s = b.add_station("S").unwrap();
        let on = b.add_block(block("ON", 100.0)).unwrap();
        let off = b.add_block(block("OFF", 100.0)).unwrap();
        b.push_route_block(l, on);
        b.add_platform(PlatformSpec {
            name: "P".into(), station: s, line: l, block: off, capacity: 1,
            kind: PlatformKind::Normal, offset_m: 0.0, length_m: 50.0,
        })
        .unwrap();
        b.set_properties(l, LineProperties::default());
        assert!(matches!(b.build(), Err(NetworkError::PlatformOffRoute { .. })));
    }

    #[test]
    fn invalid_block_rejected() {
        let mut b = RailNetworkBuilder::new();
        assert!(b.add_block(block("Z", 0.0)).is_err());
    }

    #[test]
    fn invalid_id_range_rejected() {
        let mut b = RailNetworkBuilder::new();
        let l = b.add_line("L").unwrap();
        let s = b.add_station("S").unwrap();
        let blk = b.add_block(block("B", 100.0)).unwrap();
        b.push_route_block(l, blk);
        b.add_platform(PlatformSpec {
            name: "P".into(), station: s, line: l, block: blk, capacity: 1,
            kind: PlatformKind::Normal, offset_m: 0.0, length_m: 50.0,
        })
        .unwrap();
        b.set_properties(l, LineProperties { min_train_id: 5, max_train_id: 2, ..Default::default() });
        assert!(matches!(b.build(), Err(NetworkError::InvalidProperties { .. })));
    }

    #[test]
    fn pool_size_at_top_of_id_space() {
        let props = |min, max| LineProperties { min_train_id: min, max_train_id: max, ..Default::default() };
        assert_eq!(props(1, 20).pool_size(), 20);
        assert_eq!(props(5, 2).pool_size(), 0);
        assert_eq!(props(u32::MAX - 2, u32::MAX).pool_size(), 3);
        assert_eq!(props(0, u32::MAX).pool_size(), u32::MAX);
        assert!(props(u32::MAX - 2, u32::MAX).validate().is_err());
        assert!(props(u32::MAX - 2, u32::MAX - 1).validate().is_ok());
    }
}

#[cfg(test)]
mod topology_tests {
    use super::*;

    #[test]
    fn opposite_and_mirror() {
        let (net, ew, we, stations) = corridor();
        assert_eq!(net.opposite_line(ew), Some(we));
        assert_eq!(net.opposite_line(we), Some(ew));

        let ew_b = net.platform_at(ew, stations[1]).unwrap();
        let we_b = net.platform_at(we, stations[1]).unwrap();
        assert_eq!(net.mirrored_platform(ew_b), Some(we_b));
        assert_eq!(net.mirrored_platform(we_b), Some(ew_b));
    }

    #[test]
    fn platforms_between_is_order_independent() {
        let (net, ew, we, [a, _, c]) = corridor();
        let forward = net.platforms_between(ew, a, c).unwrap();
        let backward = net.platforms_between(ew, c, a).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward, net.lines[ew.index()].platforms);

        // On the opposite line the same stations come in reverse route order.
        let opposite = net.platforms_between(we, a, c).unwrap();
        assert_eq!(opposite, net.lines[we.index()].platforms);
    }

    #[test]
    fn blocks_between_spans_platform_blocks() {
        let (net, ew, _, [a, b, _]) = corridor();
        let blocks = net.blocks_between(ew, b, a).unwrap();
        assert_eq!(blocks, vec![net.block_by_name("E1").unwrap(), net.block_by_name("E2").unwrap()]);
    }

    #[test]
    fn terminal_detection() {
        let (net, ew, _, _) = corridor();
        let last = *net.lines[ew.index()].platforms.last().unwrap();
        let first = net.lines[ew.index()].platforms[0];
        assert!(net.is_line_terminal(last));
        assert!(!net.is_line_terminal(first));
    }

    #[test]
    fn name_lookups() {
        let (net, ew, _, [a, _, _]) = corridor();
        assert_eq!(net.line_by_name("EW"), Some(ew));
        assert_eq!(net.station_by_name("A"), Some(a));
        assert!(net.platform_by_name("EW2").is_some());
        assert!(net.line_by_name("NS").is_none());
    }
}

#[cfg(test)]
mod limits_tests {
    use super::*;
    use crate::BlockLimits;

    #[test]
    fn tightest_speed_cap_wins() {
        let (net, _, _, _) = corridor();
        let e1 = net.block_by_name("E1").unwrap();
        let mut limits = BlockLimits::from_network(&net);
        limits.cap_speed(e1, 12.0);
        limits.cap_speed(e1, 15.0);
        assert_eq!(limits.get(e1).unwrap().speed_mps, 12.0);
    }

    #[test]
    fn line_accel_override_touches_only_that_line() {
        let (net, ew, _, _) = corridor();
        let mut limits = BlockLimits::from_network(&net);
        limits.set_line_accel(&net, ew, 0.4);
        let e2 = net.block_by_name("E2").unwrap();
        let w2 = net.block_by_name("W2").unwrap();
        assert_eq!(limits.get(e2).unwrap().accel_mps2, 0.4);
        assert_eq!(limits.get(w2).unwrap().accel_mps2, 1.0);
        assert_eq!(limits.get(e2).unwrap().decel_mps2, 1.2);
    }
}

#[cfg(test)]
mod loader_tests {
    use std::io::Cursor;

    use crate::{PlatformKind, RailConfig, load_network_readers};

    const BLOCKS: &str = "\
block,length_m,speed_limit_mps,accel_mps2,decel_mps2
B1,800,20,1.0,1.1
B2,900,20,1.0,1.1
R1,900,20,1.0,1.1
R2,800,20,1.0,1.1
";

    const ROUTES: &str = "\
line,sequence,block
NS,1,B2
NS,0,B1
SN,0,R1
SN,1,R2
";

    // Rows deliberately out of route order.
    const PLATFORMS: &str = "\
platform,station,line,block,capacity,kind,offset_m,length_m
NS2,North,NS,B2,800,terminal,500,140
NS1,South,NS,B1,800,,300,140
SN1,North,SN,R1,800,normal,300,140
SN2,South,SN,R2,800,terminal,500,140
";

    const CONFIG: &str = r#"{
        "NS": { "capacity": 600, "opposite_line": "SN", "max_train_id": 4 },
        "SN": { "opposite_line": "NS" }
    }"#;

    #[test]
    fn loads_and_sorts_platforms() {
        let config: RailConfig = serde_json::from_str(CONFIG).unwrap();
        let net = load_network_readers(
            Cursor::new(BLOCKS),
            Cursor::new(ROUTES),
            Cursor::new(PLATFORMS),
            &config,
        )
        .unwrap();

        let ns = net.line_by_name("NS").unwrap();
        let sn = net.line_by_name("SN").unwrap();
        let names: Vec<&str> = net.lines[ns.index()]
            .platforms
            .iter()
            .map(|&p| net.platforms[p.index()].name.as_str())
            .collect();
        assert_eq!(names, ["NS1", "NS2"]);
        assert_eq!(net.opposite_line(ns), Some(sn));
        assert_eq!(net.props(ns).unwrap().capacity, 600);
        assert_eq!(net.props(ns).unwrap().max_train_id, 4);
        assert_eq!(net.props(sn).unwrap().capacity, 900);

        let ns2 = net.platform_by_name("NS2").unwrap();
        assert_eq!(net.platforms[ns2.index()].kind, PlatformKind::Terminal);
        // NS2 on B2 (starts at 800): 800 + 500 + 140.
        assert_eq!(net.stop_position(ns, ns2), Some(1_440.0));
    }

    #[test]
    fn missing_line_config_is_an_error() {
        let config: RailConfig = serde_json::from_str(r#"{ "NS": {} }"#).unwrap();
        let result = load_network_readers(
            Cursor::new(BLOCKS),
            Cursor::new(ROUTES),
            Cursor::new(PLATFORMS),
            &config,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_block_in_route_is_an_error() {
        let routes = "line,sequence,block\nNS,0,NOPE\n";
        let result = load_network_readers(
            Cursor::new(BLOCKS),
            Cursor::new(routes),
            Cursor::new("platform,station,line,block,capacity,kind,offset_m,length_m\n"),
            &RailConfig::new(),
        );
        assert!(result.is_err());
    }
}
