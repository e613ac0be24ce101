use std::path::PathBuf;

use harprep_pipeline::pipeline::Pipeline;

use crate::{
    command::ConfigArg,
    schema::DatasetFile,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PrepareArg {
    /// Sensor recording CSV file
    input: PathBuf,
    #[clap(flatten)]
    config: ConfigArg,
    /// Output file path for the dataset JSON (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also write the balanced feature table as CSV
    #[arg(long)]
    features: Option<PathBuf>,
    /// Also write the pipeline report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

pub(crate) fn run(arg: &PrepareArg) -> anyhow::Result<()> {
    let PrepareArg {
        input,
        config,
        output,
        features,
        report,
    } = arg;

    let config = config.load()?;
    let encoder = config.label_encoder();
    let recording = util::read_recording_file(input)?;

    let mut pipeline = Pipeline::new(config)?;
    let prepared = pipeline.run(&recording)?;

    if let Some(path) = features {
        util::save_feature_csv(&prepared.features, &encoder, path.clone())?;
    }
    if let Some(path) = report {
        Output::save_json(&prepared.report, Some(path.clone()))?;
        tracing::info!(path = %path.display(), "saved pipeline report");
    }

    let dataset = DatasetFile::new(
        input.display().to_string(),
        prepared.report.generated_at,
        prepared.split,
    );
    Output::save_json(&dataset, output.clone())?;

    tracing::info!(
        train_rows = dataset.x_train.len(),
        valid_rows = dataset.x_valid.len(),
        features = dataset.feature_names.len(),
        "dataset prepared"
    );

    Ok(())
}
