//! The demo corridor: five stations served by a pair of opposite lines.
//!
//! ```text
//! EW: Alpha ── Bravo ── Charlie ── Delta ── Echo
//! WE: Echo  ── Delta ── Charlie ── Bravo ── Alpha
//! ```
//!
//! Charlie is an interchange; each line ends at a terminal platform.

use std::io::Cursor;

use rt_network::{RailConfig, RailNetwork, load_network_readers};

const BLOCKS_CSV: &str = "\
block,length_m,speed_limit_mps,accel_mps2,decel_mps2
E1,1200,22.0,1.0,1.1
E2,1500,22.0,1.0,1.1
E3,1100,18.0,0.9,1.1
E4,1400,22.0,1.0,1.1
E5,1200,22.0,1.0,1.1
W1,1200,22.0,1.0,1.1
W2,1400,22.0,1.0,1.1
W3,1100,18.0,0.9,1.1
W4,1500,22.0,1.0,1.1
W5,1200,22.0,1.0,1.1
";

const ROUTES_CSV: &str = "\
line,sequence,block
EW,0,E1
EW,1,E2
EW,2,E3
EW,3,E4
EW,4,E5
WE,0,W1
WE,1,W2
WE,2,W3
WE,3,W4
WE,4,W5
";

const PLATFORMS_CSV: &str = "\
platform,station,line,block,capacity,kind,offset_m,length_m
EW-ALP,Alpha,EW,E1,1200,,500,140
EW-BRA,Bravo,EW,E2,1200,,700,140
EW-CHA,Charlie,EW,E3,1500,interchange,500,140
EW-DEL,Delta,EW,E4,1200,,600,140
EW-ECH,Echo,EW,E5,1200,terminal,500,140
WE-ECH,Echo,WE,W1,1200,,500,140
WE-DEL,Delta,WE,W2,1200,,600,140
WE-CHA,Charlie,WE,W3,1500,interchange,500,140
WE-BRA,Bravo,WE,W4,1200,,700,140
WE-ALP,Alpha,WE,W5,1200,terminal,500,140
";

/// Build the corridor with per-line properties from `config`.
pub fn build_network(config: &RailConfig) -> anyhow::Result<RailNetwork> {
    let network = load_network_readers(
        Cursor::new(BLOCKS_CSV),
        Cursor::new(ROUTES_CSV),
        Cursor::new(PLATFORMS_CSV),
        config,
    )?;
    Ok(network)
}
