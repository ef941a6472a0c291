//! CSV headway loader.
//!
//! # CSV format
//!
//! One row per headway window:
//!
//! ```csv
//! line,start_time,end_time,headway_sec
//! EW,06:00:00,09:00:00,180
//! EW,09:00:00,17:00:00,420
//! ```
//!
//! Line names resolve against the network; an unknown name is an error.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use rt_core::DailyTime;
use rt_network::RailNetwork;

use crate::{HeadwayWindow, ScheduleError, ScheduleResult};

#[derive(Deserialize)]
struct HeadwayRecord {
    line:        String,
    start_time:  String,
    end_time:    String,
    headway_sec: u32,
}

/// Load headway windows from a CSV file.
pub fn load_headways_csv(path: &Path, network: &RailNetwork) -> ScheduleResult<Vec<HeadwayWindow>> {
    let file = std::fs::File::open(path)?;
    load_headways_reader(file, network)
}

/// Like [`load_headways_csv`] but accepts any `Read` source.
pub fn load_headways_reader<R: Read>(
    reader:  R,
    network: &RailNetwork,
) -> ScheduleResult<Vec<HeadwayWindow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut windows = Vec::new();
    for result in csv_reader.deserialize::<HeadwayRecord>() {
        let row = result.map_err(|e| ScheduleError::Parse(e.to_string()))?;
        let line = network
            .line_by_name(row.line.trim())
            .ok_or_else(|| ScheduleError::UnknownLine(row.line.clone()))?;
        windows.push(HeadwayWindow {
            line,
            start:        DailyTime::parse(&row.start_time)?,
            end:          DailyTime::parse(&row.end_time)?,
            headway_secs: row.headway_sec,
        });
    }
    Ok(windows)
}
