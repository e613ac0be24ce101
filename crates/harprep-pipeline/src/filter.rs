//! Median filtering of sensor channels
//!
//! Each selected axis is smoothed with a centered rolling median, which
//! suppresses isolated spikes while keeping step changes between activities
//! sharp. Windows near the ends of the stream shrink instead of being padded,
//! so every sample gets a filtered value.
//!
//! The result is a [`FilteredStream`]: the original samples plus one
//! `<axis>_filtered` channel per filtered axis. Later stages read only the
//! filtered channels.

use harprep_stats::rolling;

use crate::{
    axis::{self, SensorAxis},
    balance::Labeled,
    error::PipelineError,
    recording::{Recording, Sample},
};

/// Default number of samples in the median filter window.
pub const DEFAULT_FILTER_WINDOW: usize = 10;

/// A sample together with its filtered channel values.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSample {
    pub sample: Sample,
    /// Filtered values, aligned with [`FilteredStream::axes`]
    pub filtered: Vec<f64>,
}

impl Labeled for FilteredSample {
    fn label(&self) -> &str {
        &self.sample.activity
    }
}

/// A recording with median-filtered channels.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredStream {
    axes: Vec<SensorAxis>,
    rows: Vec<FilteredSample>,
}

impl FilteredStream {
    /// Filtered axes, in canonical order.
    #[must_use]
    pub fn axes(&self) -> &[SensorAxis] {
        &self.axes
    }

    #[must_use]
    pub fn rows(&self) -> &[FilteredSample] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.sample.time).collect()
    }

    /// Filtered values of one axis, or `None` if the axis was not filtered.
    #[must_use]
    pub fn filtered_values(&self, axis: SensorAxis) -> Option<Vec<f64>> {
        let index = self.axes.iter().position(|a| *a == axis)?;
        Some(self.rows.iter().map(|row| row.filtered[index]).collect())
    }

    /// Raw (unfiltered) values of one axis.
    #[must_use]
    pub fn raw_values(&self, axis: SensorAxis) -> Vec<f64> {
        self.rows.iter().map(|row| row.sample.axis(axis)).collect()
    }

    /// New stream keeping only rows for which `keep` returns `true`.
    #[must_use]
    pub fn retain_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&FilteredSample) -> bool,
    {
        Self {
            axes: self.axes.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// New stream from rows sharing this stream's axis layout.
    #[must_use]
    pub fn with_rows(&self, rows: Vec<FilteredSample>) -> Self {
        Self {
            axes: self.axes.clone(),
            rows,
        }
    }

    /// New stream restricted to the given filtered axes.
    ///
    /// Axes that were never filtered are ignored.
    #[must_use]
    pub fn select_axes(&self, axes: &[SensorAxis]) -> Self {
        let indices = self
            .axes
            .iter()
            .enumerate()
            .filter(|(_, axis)| axes.contains(axis))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        let rows = self
            .rows
            .iter()
            .map(|row| FilteredSample {
                sample: row.sample.clone(),
                filtered: indices.iter().map(|&i| row.filtered[i]).collect(),
            })
            .collect();
        Self {
            axes: indices.iter().map(|&i| self.axes[i]).collect(),
            rows,
        }
    }
}

/// Apply a centered rolling median to each of `axes`.
///
/// Axes are deduplicated and put in canonical order. Filtering is
/// deterministic: the same recording and parameters always yield bit-identical
/// channels.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `window_size` is zero.
pub fn median_filter(
    recording: &Recording,
    axes: &[SensorAxis],
    window_size: usize,
) -> Result<FilteredStream, PipelineError> {
    let axes = axis::canonical(axes);
    let channels = axes
        .iter()
        .map(|&axis| {
            rolling::centered_rolling_median(&recording.axis_values(axis), window_size)
                .ok_or_else(|| {
                    PipelineError::invalid_parameter("filter_window", "must be at least 1 sample")
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rows = recording
        .samples()
        .iter()
        .enumerate()
        .map(|(i, sample)| FilteredSample {
            sample: sample.clone(),
            filtered: channels.iter().map(|channel| channel[i]).collect(),
        })
        .collect();

    tracing::info!(
        samples = recording.len(),
        window_size,
        axes = ?axes,
        "applied median filter"
    );

    Ok(FilteredStream { axes, rows })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::recording::tests::sample;

    pub(crate) fn stream_from(values: &[(f64, f64, &str)]) -> FilteredStream {
        let recording = values
            .iter()
            .map(|&(time, value, label)| sample(time, value, label))
            .collect::<Recording>();
        median_filter(&recording, &SensorAxis::ALL, 1).unwrap()
    }

    #[test]
    fn test_spike_and_boundaries() {
        let recording = [0.0, 1.0, 2.0, 3.0, 4.0]
            .into_iter()
            .zip([1.0, 2.0, 100.0, 3.0, 4.0])
            .map(|(t, v)| sample(t, v, "Walk"))
            .collect::<Recording>();
        let stream = median_filter(&recording, &[SensorAxis::AccX], 3).unwrap();
        assert_eq!(
            stream.filtered_values(SensorAxis::AccX).unwrap(),
            vec![1.5, 2.0, 3.0, 4.0, 3.5]
        );
        assert_eq!(stream.filtered_values(SensorAxis::AccY), None);
        // raw values are preserved alongside
        assert_eq!(stream.raw_values(SensorAxis::AccX)[2], 100.0);
    }

    #[test]
    fn test_zero_window_rejected() {
        let recording = Recording::new(vec![sample(0.0, 1.0, "Walk")]);
        assert!(matches!(
            median_filter(&recording, &[SensorAxis::AccX], 0),
            Err(PipelineError::InvalidParameter {
                name: "filter_window",
                ..
            })
        ));
    }

    #[test]
    fn test_axes_are_canonical() {
        let recording = Recording::new(vec![sample(0.0, 1.0, "Walk")]);
        let stream = median_filter(
            &recording,
            &[SensorAxis::GyrZ, SensorAxis::AccX, SensorAxis::GyrZ],
            10,
        )
        .unwrap();
        assert_eq!(stream.axes(), &[SensorAxis::AccX, SensorAxis::GyrZ]);
        assert_eq!(stream.rows()[0].filtered.len(), 2);
    }

    #[test]
    fn test_select_and_retain() {
        let stream = stream_from(&[(0.0, 1.0, "Walk"), (1.0, 2.0, "Squat"), (2.0, 3.0, "Walk")]);
        let selected = stream.select_axes(&[SensorAxis::AccY, SensorAxis::GyrZ]);
        assert_eq!(selected.axes(), &[SensorAxis::AccY, SensorAxis::GyrZ]);
        assert_eq!(selected.rows()[1].filtered, vec![2.0, 2.0]);

        let walks = stream.retain_rows(|row| row.sample.activity == "Walk");
        assert_eq!(walks.times(), vec![0.0, 2.0]);
        // the source stream is untouched
        assert_eq!(stream.len(), 3);
    }
}
