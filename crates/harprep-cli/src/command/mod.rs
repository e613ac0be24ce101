use std::path::PathBuf;

use clap::{Parser, Subcommand};
use harprep_pipeline::{config::PipelineConfig, features::UndefinedStatisticPolicy};

use self::{generate_samples::GenerateSamplesArg, inspect::InspectArg, prepare::PrepareArg};

mod generate_samples;
mod inspect;
mod prepare;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run the full pipeline and write the training/validation dataset
    Prepare(#[clap(flatten)] PrepareArg),
    /// Report timing, filtering and axis selection of a recording
    Inspect(#[clap(flatten)] InspectArg),
    /// Generate a synthetic sensor recording
    GenerateSamples(#[clap(flatten)] GenerateSamplesArg),
}

/// Pipeline configuration file and command-line overrides
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArg {
    /// Pipeline configuration JSON file (missing keys use defaults)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Window duration in seconds
    #[arg(long)]
    window_duration: Option<f64>,
    /// Share of each class used for training
    #[arg(long)]
    training_fraction: Option<f64>,
    /// How to handle undefined statistics ("nan" or "fail")
    #[arg(long)]
    undefined_statistic: Option<UndefinedStatisticPolicy>,
    /// Keep integer class labels instead of one-hot targets
    #[arg(long)]
    no_one_hot: bool,
    /// Do not standardize features
    #[arg(long)]
    no_standardize: bool,
}

impl ConfigArg {
    /// Load the configuration file, if any, and apply overrides.
    pub(crate) fn load(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => crate::util::read_json_file("pipeline config", path)?,
            None => PipelineConfig::default(),
        };
        if let Some(duration) = self.window_duration {
            config.window_duration_secs = duration;
        }
        if let Some(fraction) = self.training_fraction {
            config.training_fraction = fraction;
        }
        if let Some(policy) = self.undefined_statistic {
            config.undefined_statistic = policy;
        }
        if self.no_one_hot {
            config.one_hot = false;
        }
        if self.no_standardize {
            config.standardize = false;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Prepare(arg) => prepare::run(&arg)?,
        Mode::Inspect(arg) => inspect::run(&arg)?,
        Mode::GenerateSamples(arg) => generate_samples::run(&arg)?,
    }
    Ok(())
}
