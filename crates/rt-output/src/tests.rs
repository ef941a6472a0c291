//! Integration tests for rt-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use rt_core::DailyTime;

    use crate::csv::{ARRIVAL_HEADERS, CsvWriter, SNAPSHOT_HEADERS, SUMMARY_HEADERS};
    use crate::row::{PlatformArrivalRow, TickSummaryRow, TrainSnapshotRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn arrival(train_id: u32, platform: u32) -> PlatformArrivalRow {
        PlatformArrivalRow {
            train_line: 0,
            train_id,
            line:       0,
            trip:       7,
            platform,
            time:       DailyTime::from_hms(6, 1, 5),
            boarded:    12,
            alighted:   3,
            denied:     1,
            occupancy:  40,
            dwell_secs: 16.890_8,
        }
    }

    fn headers(dir: &TempDir, file: &str) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("platform_arrivals.csv").exists());
        assert!(dir.path().join("tick_summaries.csv").exists());
        assert!(dir.path().join("train_snapshots.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        assert_eq!(headers(&dir, "platform_arrivals.csv"), ARRIVAL_HEADERS);
        assert_eq!(headers(&dir, "tick_summaries.csv"), SUMMARY_HEADERS);
        assert_eq!(headers(&dir, "train_snapshots.csv"), SNAPSHOT_HEADERS);
    }

    #[test]
    fn csv_arrival_fields() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_arrivals(&[arrival(3, 1), arrival(4, 2)]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("platform_arrivals.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "3");        // train_id
        assert_eq!(&rows[0][4], "1");        // platform
        assert_eq!(&rows[0][5], "06:01:05"); // time
        assert_eq!(&rows[0][10], "16.89");   // dwell_secs
        assert_eq!(&rows[1][1], "4");
    }

    #[test]
    fn csv_tick_summary_fields() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let row = TickSummaryRow {
            tick:       3_600,
            time:       DailyTime::from_hms(7, 0, 0),
            active:     5,
            dispatched: 1,
            removed:    0,
            faulted:    0,
            waiting:    88,
        };
        w.write_tick_summary(&row).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("tick_summaries.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "3600");
        assert_eq!(&rows[0][1], "07:00:00");
        assert_eq!(&rows[0][2], "5");
        assert_eq!(&rows[0][6], "88");
    }

    #[test]
    fn csv_snapshot_without_next_platform() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let row = TrainSnapshotRow {
            tick:          60,
            train_line:    1,
            train_id:      9,
            line:          0,
            phase:         "dwelling",
            position_m:    1_600.0,
            speed_mps:     0.0,
            occupancy:     2,
            next_platform: u32::MAX,
        };
        w.write_snapshots(&[row]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("train_snapshots.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][4], "dwelling");
        assert_eq!(&rows[0][5], "1600.00");
        assert_eq!(&rows[0][8], u32::MAX.to_string());
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_empty_batches_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_arrivals(&[]).unwrap();
        w.write_snapshots(&[]).unwrap();
    }

    #[test]
    fn missing_dir_is_io_error() {
        let dir = tmp();
        let result = CsvWriter::new(&dir.path().join("no/such/dir"));
        assert!(result.is_err());
    }

    #[test]
    fn integration_csv() {
        use std::sync::Arc;

        use rt_core::{LineId, PlatformId, SimConfig, TripId};
        use rt_network::{BlockSpec, LineProperties, PlatformKind, PlatformSpec, RailNetworkBuilder};
        use rt_schedule::TrainTrip;
        use rt_sim::SimBuilder;

        use crate::observer::SimOutputObserver;

        let mut b = RailNetworkBuilder::new();
        let line = b.add_line("NS").unwrap();
        for i in 0..2 {
            let station = b.add_station(&format!("S{i}")).unwrap();
            let block = b
                .add_block(BlockSpec {
                    name:            format!("B{i}"),
                    length_m:        1_000.0,
                    speed_limit_mps: 20.0,
                    accel_mps2:      1.0,
                    decel_mps2:      1.2,
                })
                .unwrap();
            b.push_route_block(line, block);
            b.add_platform(PlatformSpec {
                name: format!("P{i}"),
                station,
                line,
                block,
                capacity: 1_000,
                kind: PlatformKind::Normal,
                offset_m: 450.0,
                length_m: 150.0,
            })
            .unwrap();
        }
        b.set_properties(line, LineProperties::default());
        let network = Arc::new(b.build().unwrap());

        let config = SimConfig {
            start_time:            DailyTime::from_hms(6, 0, 0),
            tick_duration_secs:    1,
            total_ticks:           300,
            seed:                  1,
            num_threads:           Some(1),
            output_interval_ticks: 60,
        };
        let trip = TrainTrip {
            id:          TripId(1),
            line:        LineId(0),
            start:       DailyTime::from_hms(6, 0, 0),
            platforms:   vec![PlatformId(0), PlatformId(1)],
            unscheduled: false,
        };
        let mut sim = SimBuilder::new(config, network).trips(vec![trip]).build().unwrap();

        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = SimOutputObserver::new(writer);
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        let count = |file: &str| {
            let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
            rdr.records().count()
        };
        assert_eq!(count("platform_arrivals.csv"), 2);
        assert_eq!(count("tick_summaries.csv"), 300);
        // The train runs from tick 0 to roughly tick 110: snapshots at 0 and 60.
        assert_eq!(count("train_snapshots.csv"), 2);
    }
}
