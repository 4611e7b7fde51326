//! Layered settings: a TOML file, then `KMC_*` environment overrides.
//!
//! Nested keys use a double underscore, e.g. `KMC_RUN__SEED=7` or
//! `KMC_OUTPUT_DIR=/tmp/out`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use config::builder::DefaultState;
use kmc_core::RunConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct Settings {
    pub(crate) input: InputFiles,

    #[serde(default = "default_output_dir")]
    pub(crate) output_dir: PathBuf,

    #[serde(default)]
    pub(crate) backend: Backend,

    pub(crate) run: RunConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InputFiles {
    pub(crate) sites:     PathBuf,
    pub(crate) events:    PathBuf,
    #[serde(default)]
    pub(crate) lifetimes: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Backend {
    #[default]
    Csv,
    Sqlite,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Settings {
    /// Read `path`, apply environment overrides and deserialise.
    ///
    /// Relative input paths are resolved against the settings file's
    /// directory.
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let builder = Config::builder().add_source(File::from(path).format(FileFormat::Toml));
        let mut settings = Self::finish(builder)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;

        if let Some(base) = path.parent() {
            settings.input.resolve(base);
        }
        Ok(settings)
    }

    /// Deserialise settings from an in-memory TOML document.
    pub(crate) fn parse(toml: &str) -> anyhow::Result<Self> {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let s = builder
            .add_source(
                Environment::with_prefix("KMC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        s.try_deserialize().context("failed to deserialise the settings")
    }
}

impl InputFiles {
    fn resolve(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.sites);
        join(&mut self.events);
        if let Some(p) = self.lifetimes.as_mut() {
            join(p);
        }
    }
}
