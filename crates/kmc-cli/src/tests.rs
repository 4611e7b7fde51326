//! Tests for settings parsing and the run command.

#[cfg(test)]
mod settings {
    use kmc_core::{CarrierKind, OutputCadence, RunBudget, RunMode};

    use crate::settings::{Backend, Settings};

    const MINIMAL: &str = r#"
        [input]
        sites  = "sites.csv"
        events = "events.csv"

        [run]
        carriers = 4
        seed     = 42

        [run.mode.fixed_population.budget]
        steps = 1000
    "#;

    #[test]
    fn minimal_settings_take_defaults() {
        let s = Settings::parse(MINIMAL).unwrap();
        assert_eq!(s.output_dir.to_str(), Some("output"));
        assert_eq!(s.backend, Backend::Csv);
        assert!(s.input.lifetimes.is_none());

        let run = &s.run;
        assert_eq!(run.carriers, 4);
        assert_eq!(run.seed, 42);
        assert_eq!(run.mode, RunMode::FixedPopulation { budget: RunBudget::Steps(1000) });
        assert_eq!(run.output, OutputCadence::Never);
        assert_eq!(run.carrier_kind, CarrierKind::Electron);
        assert_eq!(run.injection_pattern, "*");
        assert_eq!(run.temperature, 300.0);
        assert_eq!(run.diffusion_resolution, 1000);
        assert!(run.energy_tracking.is_none());
    }

    #[test]
    fn lifetime_settings() {
        let s = Settings::parse(
            r#"
            output_dir = "runs/a"
            backend    = "sqlite"

            [input]
            sites     = "s.csv"
            events    = "e.csv"
            lifetimes = "l.csv"

            [run]
            carriers          = 1
            seed              = 3
            carrier_kind      = "singlet"
            field             = [0.0, 0.0, 1.0e7]
            injection_pattern = "donor*"
            jump_length_bins  = 20

            [run.mode.lifetime]
            insertions = 500

            [run.output]
            seconds = 1.0e-9

            [run.energy_tracking]
            alpha = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(s.backend, Backend::Sqlite);
        assert_eq!(s.input.lifetimes.as_deref().and_then(|p| p.to_str()), Some("l.csv"));
        assert_eq!(s.run.mode, RunMode::Lifetime { insertions: 500 });
        assert_eq!(s.run.carrier_kind, CarrierKind::Singlet);
        assert_eq!(s.run.field, [0.0, 0.0, 1.0e7]);
        assert_eq!(s.run.output, OutputCadence::Seconds(1.0e-9));
        assert_eq!(s.run.jump_length_bins, Some(20));

        let tracking = s.run.energy_tracking.unwrap();
        assert_eq!(tracking.alpha, 0.5);
        assert_eq!(tracking.every_steps, 100);
        assert!(s.run.validate().is_ok());
    }

    #[test]
    fn missing_mode_is_rejected() {
        let err = Settings::parse(
            r#"
            [input]
            sites  = "s.csv"
            events = "e.csv"

            [run]
            carriers = 1
            seed     = 1
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn relative_inputs_resolve_against_the_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let s = Settings::load(&path).unwrap();
        assert_eq!(s.input.sites, dir.path().join("sites.csv"));
        assert_eq!(s.input.events, dir.path().join("events.csv"));
    }
}

#[cfg(test)]
mod run_command {
    use std::path::Path;

    use kmc_core::{RunBudget, RunMode};
    use tempfile::TempDir;

    use crate::settings::Settings;

    /// Four-site periodic chain along x, spacing 1 nm.
    fn write_inputs(dir: &Path, with_decay: bool) {
        let mut sites = String::from("id,x,y,z,energy,kind,occupied\n");
        for i in 0..4 {
            sites.push_str(&format!("{i},{i}.0,0.0,0.0,-5.0,A,0\n"));
        }
        std::fs::write(dir.join("sites.csv"), sites).unwrap();

        let mut events = String::from("from,to,rate,dx,dy,dz\n");
        for i in 0..4 {
            let j = (i + 1) % 4;
            events.push_str(&format!("{i},{j},1.0e12,1.0,0.0,0.0\n"));
            events.push_str(&format!("{j},{i},1.0e12,-1.0,0.0,0.0\n"));
            if with_decay {
                events.push_str(&format!("{i},decay,1.0e11,,,\n"));
            }
        }
        std::fs::write(dir.join("events.csv"), events).unwrap();
    }

    fn settings(dir: &TempDir, run: &str) -> Settings {
        let toml = format!(
            "[input]\nsites = \"sites.csv\"\nevents = \"events.csv\"\n\n{run}"
        );
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, toml).unwrap();
        let mut s = Settings::load(&path).unwrap();
        s.output_dir = dir.path().join("out");
        s
    }

    fn summary_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn fixed_population_run_writes_summary_and_streams() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), false);
        let s = settings(
            &dir,
            "[run]\ncarriers = 2\nseed = 5\noutput = { steps = 10 }\n\n\
             [run.mode.fixed_population.budget]\nsteps = 50\n",
        );
        let out = s.output_dir.clone();
        crate::run(s, None).unwrap();

        let summary = summary_json(&out.join("summary.json"));
        assert_eq!(summary["steps"], 50);
        assert_eq!(summary["mode"], "fixed_population");
        assert_eq!(summary["carriers"].as_array().unwrap().len(), 2);
        assert!(out.join("trajectory.csv").exists());
        assert!(out.join("occupation.csv").exists());
    }

    #[test]
    fn lifetime_ensemble_writes_one_summary_per_replica() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), true);
        let s = settings(&dir, "[run]\ncarriers = 1\nseed = 9\n\n[run.mode.lifetime]\ninsertions = 10\n");
        let out = s.output_dir.clone();
        crate::run(s, Some(3)).unwrap();

        let summaries = summary_json(&out.join("summaries.json"));
        let list = summaries.as_array().unwrap();
        assert_eq!(list.len(), 3);
        for s in list {
            assert_eq!(s["insertions"], 10);
            assert_eq!(s["decay"]["decays"], 10);
        }
    }

    #[test]
    fn runtime_override_only_touches_fixed_population() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), true);

        let mut fixed = settings(
            &dir,
            "[run]\ncarriers = 1\nseed = 2\n\n[run.mode.fixed_population.budget]\nsteps = 50\n",
        );
        crate::apply_runtime(&mut fixed.run, 2000.0).unwrap();
        assert_eq!(fixed.run.mode, RunMode::FixedPopulation { budget: RunBudget::Steps(2000) });

        let mut lifetime = settings(&dir, "[run]\ncarriers = 1\nseed = 2\n\n[run.mode.lifetime]\ninsertions = 10\n");
        let err = crate::apply_runtime(&mut lifetime.run, 2000.0).unwrap_err();
        assert!(err.to_string().contains("--runtime"));
        assert_eq!(lifetime.run.mode, RunMode::Lifetime { insertions: 10 });
    }

    #[test]
    fn missing_graph_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(&dir, "[run]\ncarriers = 1\nseed = 1\n\n[run.mode.lifetime]\ninsertions = 1\n");
        let err = crate::run(s, None).unwrap_err();
        assert!(format!("{err:#}").contains("site graph"));
    }
}
