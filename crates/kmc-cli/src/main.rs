//! `kmc`: run kinetic Monte Carlo charge-transport simulations.
//!
//! ```text
//! kmc run settings.toml
//! kmc run settings.toml --replicas 8
//! kmc decay-prob --sites sites.csv --events events.csv --lifetimes lifetimes.csv
//! ```

mod settings;
mod telemetry;

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kmc_core::{RunBudget, RunConfig, RunMode};
use kmc_engine::{run_ensemble, EngineBuilder};
use kmc_graph::{load_graph_csv, SiteGraph};
use kmc_output::{write_decay_probabilities_csv, CsvWriter, OutputObserver, OutputWriter};
use kmc_stats::RunSummary;

use crate::settings::{Backend, Settings};

#[derive(Parser)]
#[command(name = "kmc", version)]
#[command(about = "Kinetic Monte Carlo charge transport on site graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(value_enum, short, long, global = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation (or an ensemble of replicas) from a settings file.
    Run {
        /// TOML settings file.
        settings: PathBuf,
        /// Override the output directory from the settings file.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Old-style runtime value: above 100 it is a step count, otherwise seconds.
        #[arg(long)]
        runtime: Option<f64>,
        /// Run this many independent replicas and write only their summaries.
        #[arg(long)]
        replicas: Option<u64>,
    },

    /// Write the per-site decay probability table for a graph.
    DecayProb {
        #[arg(long)]
        sites: PathBuf,
        #[arg(long)]
        events: PathBuf,
        #[arg(long)]
        lifetimes: PathBuf,
        #[arg(short, long, default_value = "decay_probabilities.csv")]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub(crate) fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn  => "warn",
            LogLevel::Info  => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_subscriber(telemetry::get_subscriber(cli.log_level))?;

    match cli.command {
        Commands::Run { settings, output, seed, runtime, replicas } => {
            let mut settings = Settings::load(&settings)?;
            if let Some(dir) = output {
                settings.output_dir = dir;
            }
            if let Some(seed) = seed {
                settings.run.seed = seed;
            }
            if let Some(runtime) = runtime {
                apply_runtime(&mut settings.run, runtime)?;
            }
            run(settings, replicas)
        }

        Commands::DecayProb { sites, events, lifetimes, output } => {
            let graph = load_graph_csv(&sites, &events, Some(&lifetimes))
                .context("failed to load the site graph")?;
            write_decay_probabilities_csv(&output, &graph.decay_probabilities())
                .with_context(|| format!("failed to write {}", output.display()))?;
            tracing::info!(sites = graph.site_count(), path = %output.display(), "wrote decay probabilities");
            Ok(())
        }
    }
}

/// Replace the budget of a fixed-population run with an old-style runtime value.
fn apply_runtime(run: &mut RunConfig, runtime: f64) -> Result<()> {
    match &mut run.mode {
        RunMode::FixedPopulation { budget } => {
            *budget = RunBudget::from_legacy_runtime(runtime);
            Ok(())
        }
        RunMode::Lifetime { .. } => anyhow::bail!(
            "--runtime applies to fixed-population runs only; lifetime runs end after their insertion budget"
        ),
    }
}

fn run(settings: Settings, replicas: Option<u64>) -> Result<()> {
    let input = &settings.input;
    let graph = load_graph_csv(&input.sites, &input.events, input.lifetimes.as_deref())
        .context("failed to load the site graph")?;

    std::fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("failed to create {}", settings.output_dir.display()))?;

    if let Some(replicas) = replicas {
        let summaries = run_ensemble(&settings.run, &graph, replicas)?;
        return write_json(&settings.output_dir.join("summaries.json"), &summaries);
    }

    let summary = match settings.backend {
        Backend::Csv => run_with(CsvWriter::new(&settings.output_dir)?, &settings, graph)?,
        Backend::Sqlite => run_sqlite(&settings, graph)?,
    };
    print_summary(&summary);
    write_json(&settings.output_dir.join("summary.json"), &summary)
}

fn run_with<W: OutputWriter>(writer: W, settings: &Settings, graph: SiteGraph) -> Result<RunSummary> {
    let mut engine = EngineBuilder::new(settings.run.clone(), graph).build()?;
    let mut observer = OutputObserver::new(writer, &settings.run);
    let summary = engine.run(&mut observer)?;
    if let Some(e) = observer.take_error() {
        return Err(e).context("writing run output failed");
    }
    Ok(summary)
}

#[cfg(feature = "sqlite")]
fn run_sqlite(settings: &Settings, graph: SiteGraph) -> Result<RunSummary> {
    run_with(kmc_output::SqliteWriter::new(&settings.output_dir)?, settings, graph)
}

#[cfg(not(feature = "sqlite"))]
fn run_sqlite(_settings: &Settings, _graph: SiteGraph) -> Result<RunSummary> {
    anyhow::bail!("the sqlite backend needs kmc-cli built with the `sqlite` feature")
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)?;
    tracing::info!(path = %path.display(), "summary written");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\n=== Run Complete ({}) ===", summary.mode);
    println!("Steps: {}", summary.steps);
    println!("Simulated time: {:e} s", summary.time);
    if summary.time_limited {
        println!("Stopped early by the real-time limit");
    }
    if summary.insertions > 0 {
        println!("Insertions: {}", summary.insertions);
    }
    let v = summary.average_velocity;
    println!("Average velocity: ({:e}, {:e}, {:e}) nm/s", v[0], v[1], v[2]);
    if let Some(mu) = summary.average_mobility {
        println!("Average mobility: {mu:e} nm^2/Vs");
    }
    if let Some(d) = &summary.diffusion {
        println!("Diffusion eigenvalues: {:?} nm^2/s", d.eigenvalues);
    }
    if let Some(mu) = summary.einstein_mobility {
        println!("Einstein mobility: {mu:e} nm^2/Vs");
    }
    if let Some(decay) = &summary.decay {
        println!(
            "Decays: {} (mean lifetime {:e} s, mean free path {:.3} nm, diffusion length {:.3} nm)",
            decay.decays, decay.mean_lifetime, decay.mean_free_path, decay.diffusion_length,
        );
    }
}
