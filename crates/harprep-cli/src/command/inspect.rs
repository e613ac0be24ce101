use std::{collections::BTreeSet, path::PathBuf};

use chrono::{DateTime, Utc};
use harprep_pipeline::{
    axis::SensorAxis,
    balance::ClassDistribution,
    pipeline::{Pipeline, StageTiming, StreamAnalysis},
    selection::CorrelationMatrix,
    timing::{self, StreamSummary},
    window::WindowGeometry,
};
use harprep_stats::{descriptive::DescriptiveStats, percentiles::Percentiles};
use serde::Serialize;

use crate::{
    command::ConfigArg,
    util::{self, Output},
};

const INTERVAL_PERCENTILES: [f64; 5] = [1.0, 10.0, 50.0, 90.0, 99.0];

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct InspectArg {
    /// Sensor recording CSV file
    input: PathBuf,
    #[clap(flatten)]
    config: ConfigArg,
    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Distribution of the sampling intervals of a stream
#[derive(Debug, Clone, Serialize)]
struct IntervalSummary {
    count: usize,
    min: f64,
    max: f64,
    mean: f64,
    std_dev: f64,
    /// `(percentile, interval)` pairs
    percentiles: Vec<(f64, f64)>,
}

impl IntervalSummary {
    fn from_times(times: &[f64]) -> Option<Self> {
        let mut intervals = timing::measurement_intervals(times)
            .into_iter()
            .map(|record| record.measurement_time)
            .collect::<Vec<_>>();
        intervals.sort_by(f64::total_cmp);
        let stats = DescriptiveStats::from_sorted(&intervals)?;
        let percentiles = Percentiles::from_sorted(&intervals, &INTERVAL_PERCENTILES);
        Some(Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            std_dev: stats.std_dev,
            percentiles: percentiles.as_slice().to_vec(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct InspectReport {
    source: String,
    generated_at: DateTime<Utc>,
    raw_stream: StreamSummary,
    raw_intervals: Option<IntervalSummary>,
    regular_stream: StreamSummary,
    regular_intervals: Option<IntervalSummary>,
    irregular_samples: usize,
    excluded_samples: usize,
    sample_distribution: ClassDistribution,
    correlation: CorrelationMatrix,
    discarded_axes: BTreeSet<SensorAxis>,
    surviving_axes: Vec<SensorAxis>,
    window_geometry: WindowGeometry,
    window_distribution: ClassDistribution,
    stage_timings: Vec<StageTiming>,
}

pub(crate) fn run(arg: &InspectArg) -> anyhow::Result<()> {
    let InspectArg {
        input,
        config,
        output,
    } = arg;

    let mut pipeline = Pipeline::new(config.load()?)?;
    let recording = util::read_recording_file(input)?;
    let StreamAnalysis {
        raw_stream,
        regularized,
        regular_stream,
        excluded_samples,
        sample_distribution,
        selection,
        windows,
        stage_timings,
        ..
    } = pipeline.analyze(&recording)?;

    let report = InspectReport {
        source: input.display().to_string(),
        generated_at: Utc::now(),
        raw_stream,
        raw_intervals: IntervalSummary::from_times(&recording.times()),
        regular_stream,
        regular_intervals: IntervalSummary::from_times(&regularized.recording.times()),
        irregular_samples: regularized.dropped_samples,
        excluded_samples,
        sample_distribution,
        correlation: selection.correlation.clone(),
        discarded_axes: selection.discarded.clone(),
        surviving_axes: selection.surviving.clone(),
        window_geometry: windows.geometry,
        window_distribution: ClassDistribution::from_rows(&windows.windows),
        stage_timings,
    };
    Output::save_json(&report, output.clone())?;

    Ok(())
}
