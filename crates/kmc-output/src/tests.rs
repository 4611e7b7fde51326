//! Integration tests for kmc-output.

#[cfg(test)]
mod csv_tests {
    use kmc_core::{OutputCadence, RunBudget, RunConfig, RunMode, SiteId, Vec3};
    use kmc_engine::EngineBuilder;
    use kmc_graph::{SiteGraph, SiteGraphBuilder};
    use tempfile::TempDir;

    use crate::csv::{write_decay_probabilities_csv, CsvWriter};
    use crate::observer::OutputObserver;
    use crate::row::{DecayRow, JumpLengthRow, OccupationRow, TimeDependenceRow, TrajectoryRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn records(dir: &TempDir, file: &str) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    fn headers(dir: &TempDir, file: &str) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    /// Periodic chain, optionally with a decay event on every site.
    fn chain(n: u32, decay: Option<f64>) -> SiteGraph {
        let mut b = SiteGraphBuilder::new();
        for i in 0..n {
            b.add_site(Vec3::new(i as f64, 0.0, 0.0), 0.0);
        }
        for i in 0..n {
            let j = (i + 1) % n;
            b.add_hop(SiteId(i), SiteId(j), 1.0, Vec3::new(1.0, 0.0, 0.0));
            b.add_hop(SiteId(j), SiteId(i), 1.0, Vec3::new(-1.0, 0.0, 0.0));
            if let Some(rate) = decay {
                b.add_decay(SiteId(i), rate).unwrap();
            }
        }
        b.build().unwrap()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        for file in [
            "trajectory.csv",
            "time_dependence.csv",
            "decays.csv",
            "carrier_energy.csv",
            "occupation.csv",
            "jump_lengths.csv",
        ] {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        assert_eq!(headers(&dir, "trajectory.csv"), ["time", "step", "carrier", "x", "y", "z"]);
        assert_eq!(
            headers(&dir, "decays.csv"),
            ["time", "insertion", "carrier", "lifetime", "steps", "site", "dx", "dy", "dz"],
        );
        assert_eq!(
            headers(&dir, "time_dependence.csv"),
            ["time", "step", "energy_per_carrier", "mobility", "distance_along_field", "distance_absolute"],
        );
        assert_eq!(headers(&dir, "occupation.csv"), ["site", "kind", "energy", "occupation_time", "probability"]);
    }

    #[test]
    fn csv_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_trajectory(&[
            TrajectoryRow { time: 0.5, step: 3, carrier: 0, x: 1.0, y: 2.0, z: 3.0 },
            TrajectoryRow { time: 0.5, step: 3, carrier: 1, x: -1.0, y: 0.0, z: 0.0 },
        ])
        .unwrap();
        w.write_time_dependence(&TimeDependenceRow {
            time:                 0.5,
            step:                 3,
            energy_per_carrier:   -0.25,
            mobility:             0.0,
            distance_along_field: 0.0,
            distance_absolute:    1.5,
        })
        .unwrap();
        w.write_decay(&DecayRow {
            time: 2.0, insertion: 1, carrier: 4, lifetime: 1.5, steps: 7, site: 9, dx: 1.0, dy: 0.0, dz: -2.0,
        })
        .unwrap();
        w.write_occupation(&[OccupationRow {
            site:            0,
            kind:            "donor".into(),
            energy:          -5.1,
            occupation_time: 0.25,
            probability:     0.5,
        }])
        .unwrap();
        w.write_jump_lengths(&[JumpLengthRow { lower: 0.0, upper: 0.5, count: 12 }]).unwrap();
        w.finish().unwrap();

        let traj = records(&dir, "trajectory.csv");
        assert_eq!(traj.len(), 2);
        assert_eq!(&traj[0][1], "3");
        assert_eq!(&traj[1][2], "1");
        assert_eq!(&traj[1][3], "-1");

        let decays = records(&dir, "decays.csv");
        assert_eq!(&decays[0][2], "4");
        assert_eq!(&decays[0][5], "9");
        assert_eq!(&decays[0][8], "-2");

        let occ = records(&dir, "occupation.csv");
        assert_eq!(&occ[0][1], "donor");

        let jumps = records(&dir, "jump_lengths.csv");
        assert_eq!(&jumps[0][2], "12");
        assert_eq!(records(&dir, "time_dependence.csv").len(), 1);
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_empty_trajectory_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_trajectory(&[]).unwrap();
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tmp();
        let result = CsvWriter::new(&dir.path().join("does/not/exist"));
        assert!(result.is_err());
    }

    #[test]
    fn decay_probabilities_file() {
        let dir = tmp();
        let g = chain(3, Some(1.0));
        let path = dir.path().join("decay_probabilities.csv");
        write_decay_probabilities_csv(&path, &g.decay_probabilities()).unwrap();

        let rows = records(&dir, "decay_probabilities.csv");
        assert_eq!(rows.len(), 3);
        // Two hops out and two in at rate 1 against λ = 1.
        let p: f64 = rows[0][1].parse().unwrap();
        assert!((p - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn integration_fixed_population() {
        let mut config = RunConfig::new(2, 7, RunMode::FixedPopulation { budget: RunBudget::Steps(20) });
        config.output = OutputCadence::Steps(5);
        config.jump_length_bins = Some(4);

        let mut engine = EngineBuilder::new(config.clone(), chain(6, None)).build().unwrap();
        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = OutputObserver::new(writer, &config);
        engine.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        // Initial positions plus snapshots at steps 5, 10, 15, 20.
        assert_eq!(records(&dir, "trajectory.csv").len(), 5 * 2);
        assert_eq!(records(&dir, "time_dependence.csv").len(), 4);
        assert_eq!(records(&dir, "occupation.csv").len(), 6);
        assert!(records(&dir, "decays.csv").is_empty());

        let jumps = records(&dir, "jump_lengths.csv");
        assert_eq!(jumps.len(), 4);
        let total: u64 = jumps.iter().map(|r| r[2].parse::<u64>().unwrap()).sum();
        assert_eq!(total, 20, "every step on a decay-free chain is a committed hop");

        let occupied: f64 = records(&dir, "occupation.csv").iter().map(|r| r[4].parse::<f64>().unwrap()).sum();
        assert!((occupied - 2.0).abs() < 1e-9, "probabilities sum to the carrier count, got {occupied}");
    }

    #[test]
    fn integration_lifetime_writes_one_row_per_decay() {
        let config = RunConfig::new(1, 11, RunMode::Lifetime { insertions: 25 });
        let mut engine = EngineBuilder::new(config.clone(), chain(5, Some(0.5))).build().unwrap();

        let dir = tmp();
        let mut obs = OutputObserver::new(CsvWriter::new(dir.path()).unwrap(), &config);
        let summary = engine.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let decays = records(&dir, "decays.csv");
        assert_eq!(decays.len() as u64, summary.insertions);
        assert_eq!(&decays[0][1], "0", "insertion counter starts at zero");
        // Output disabled: no initial positions either.
        assert!(records(&dir, "trajectory.csv").is_empty());
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use tempfile::TempDir;

    use crate::row::{DecayRow, OccupationRow, TrajectoryRow};
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn count(dir: &TempDir, table: &str) -> i64 {
        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn sqlite_trajectory_count() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        let rows: Vec<_> = (0..3)
            .map(|i| TrajectoryRow { time: 1.0, step: 4, carrier: i, x: i as f64, y: 0.0, z: 0.0 })
            .collect();
        w.write_trajectory(&rows).unwrap();
        w.finish().unwrap();
        assert_eq!(count(&dir, "trajectory"), 3);
    }

    #[test]
    fn sqlite_decay_fields() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_decay(&DecayRow {
            time: 3.0, insertion: 2, carrier: 8, lifetime: 0.75, steps: 40, site: 5, dx: 0.0, dy: 1.0, dz: 0.0,
        })
        .unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let (carrier, site): (i64, i64) = conn
            .query_row("SELECT carrier, site FROM decays", [], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap();
        assert_eq!((carrier, site), (8, 5));
    }

    #[test]
    fn sqlite_occupation_keyed_by_site() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        let row = OccupationRow { site: 1, kind: "a".into(), energy: 0.0, occupation_time: 1.0, probability: 0.1 };
        w.write_occupation(&[row.clone()]).unwrap();
        w.write_occupation(&[OccupationRow { probability: 0.2, ..row }]).unwrap();
        w.finish().unwrap();
        assert_eq!(count(&dir, "occupation"), 1);
    }

    #[test]
    fn sqlite_finish_idempotent() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}
