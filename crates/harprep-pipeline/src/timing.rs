//! Sampling-period analysis and irregular-sample removal
//!
//! Wearable sensors do not sample at a perfectly constant rate: the radio
//! link drops readings and the OS delays others. This module measures the
//! intervals between consecutive samples and removes samples that arrive
//! after an unusually long gap.
//!
//! # Irregularity Rule
//!
//! Sample `i` is retained when `time[i] - time[i-1] <= factor * average_period`,
//! where `average_period` is the mean interval of the *unfiltered* stream and
//! `factor` defaults to [`DEFAULT_IRREGULARITY_FACTOR`]. The first sample is
//! always retained. This is a single pass: the average is not recomputed
//! after dropping samples.

use serde::{Deserialize, Serialize};

use crate::{
    error::{DegenerateReason, PipelineError},
    recording::Recording,
};

/// Intervals longer than this multiple of the average period are irregular.
pub const DEFAULT_IRREGULARITY_FACTOR: f64 = 1.5;

/// Measurement interval between two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub start_time: f64,
    pub end_time: f64,
    /// `end_time - start_time`; negative only for an out-of-order stream
    pub measurement_time: f64,
}

/// Summary of the timing characteristics of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub sample_count: usize,
    /// Time between the first and the last sample, in seconds
    pub measurement_time: f64,
    /// Mean interval between consecutive samples, in seconds
    pub average_period: f64,
    /// Reciprocal of the average period, in Hz
    pub average_frequency: f64,
}

/// Result of removing irregular samples from a recording.
#[derive(Debug, Clone)]
pub struct RegularizedRecording {
    /// The retained samples, in original order
    pub recording: Recording,
    /// Number of samples removed
    pub dropped_samples: usize,
    /// Longest interval that was still accepted, in seconds
    pub max_interval: f64,
}

/// One record per consecutive pair of timestamps.
///
/// The first sample contributes no record, so the result has `len - 1`
/// entries (none for streams shorter than two samples).
#[must_use]
pub fn measurement_intervals(times: &[f64]) -> Vec<IntervalRecord> {
    times
        .windows(2)
        .map(|pair| IntervalRecord {
            start_time: pair[0],
            end_time: pair[1],
            measurement_time: pair[1] - pair[0],
        })
        .collect()
}

/// Mean of consecutive time differences.
///
/// The differences telescope, so this is `(last - first) / (len - 1)`; it is
/// computed that way to avoid accumulating rounding error over long streams.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateStream`] for fewer than two samples.
#[expect(clippy::cast_precision_loss)]
pub fn average_period(times: &[f64]) -> Result<f64, PipelineError> {
    if times.len() < 2 {
        return Err(PipelineError::degenerate(DegenerateReason::TooFewSamples {
            count: times.len(),
        }));
    }
    let span = times[times.len() - 1] - times[0];
    Ok(span / (times.len() - 1) as f64)
}

/// Reciprocal of [`average_period`].
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateStream`] for fewer than two samples or
/// when all samples share the same timestamp (zero average period).
pub fn average_frequency(times: &[f64]) -> Result<f64, PipelineError> {
    let period = average_period(times)?;
    if period == 0.0 {
        return Err(PipelineError::degenerate(
            DegenerateReason::ZeroAveragePeriod,
        ));
    }
    Ok(1.0 / period)
}

impl StreamSummary {
    /// Summarize the timing of a recording.
    pub fn from_recording(recording: &Recording) -> Result<Self, PipelineError> {
        let times = recording.times();
        let average_period = average_period(&times)?;
        let average_frequency = average_frequency(&times)?;
        let measurement_time = times.last().copied().unwrap_or_default()
            - times.first().copied().unwrap_or_default();
        Ok(Self {
            sample_count: times.len(),
            measurement_time,
            average_period,
            average_frequency,
        })
    }
}

/// Drop samples that follow an interval longer than `factor` average periods.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] for a non-positive or
/// non-finite `factor`, and [`PipelineError::DegenerateStream`] for fewer than
/// two samples.
pub fn drop_irregular_samples(
    recording: &Recording,
    factor: f64,
) -> Result<RegularizedRecording, PipelineError> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(PipelineError::invalid_parameter(
            "irregularity_factor",
            format!("must be a positive number, got {factor}"),
        ));
    }

    let samples = recording.samples();
    let times = recording.times();
    let max_interval = average_period(&times)? * factor;

    let retained = samples
        .iter()
        .enumerate()
        .filter(|(i, _)| *i == 0 || times[*i] - times[*i - 1] <= max_interval)
        .map(|(_, sample)| sample.clone())
        .collect::<Recording>();
    let dropped_samples = samples.len() - retained.len();

    tracing::info!(
        kept = retained.len(),
        dropped = dropped_samples,
        max_interval,
        "removed irregular samples"
    );

    Ok(RegularizedRecording {
        recording: retained,
        dropped_samples,
        max_interval,
    })
}
