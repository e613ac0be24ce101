//! Sliding-window segmentation of the filtered stream
//!
//! A window is a contiguous slice of the stream covering roughly
//! `window_duration_secs` of signal. Windows overlap by half: the step between
//! window starts is `window_size / 2`.
//!
//! # Geometry
//!
//! ```text
//! sampling_frequency = 1 / average_period(filtered stream)
//! window_size        = ceil(sampling_frequency * window_duration_secs)
//! step_size          = window_size / 2
//! ```
//!
//! Windows start at `0, step, 2 * step, ...` for every start below the stream
//! length, so the last windows may be shorter than `window_size`. Those
//! trailing partial windows are kept unless `drop_partial` is set.
//!
//! Each window is labeled with its most frequent activity; ties go to the
//! label encountered first within the window.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    axis::SensorAxis,
    balance::Labeled,
    error::{DegenerateReason, PipelineError},
    filter::FilteredStream,
    timing,
};

/// Default window duration, in seconds.
pub const DEFAULT_WINDOW_DURATION_SECS: f64 = 2.0;

/// Window size and stride derived from the sampling frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowGeometry {
    /// Average sampling frequency of the segmented stream, in Hz
    pub sampling_frequency: f64,
    pub window_duration_secs: f64,
    /// Samples per full window
    pub window_size: usize,
    /// Samples between consecutive window starts
    pub step_size: usize,
}

impl WindowGeometry {
    /// Compute the geometry for a given frequency and window duration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] if the duration is not
    /// positive or the resulting window is too short to step through
    /// (`window_size < 2`).
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(sampling_frequency: f64, window_duration_secs: f64) -> Result<Self, PipelineError> {
        if !(window_duration_secs.is_finite() && window_duration_secs > 0.0) {
            return Err(PipelineError::invalid_parameter(
                "window_duration_secs",
                format!("must be a positive number of seconds, got {window_duration_secs}"),
            ));
        }
        let samples = (sampling_frequency * window_duration_secs).ceil();
        if !(samples.is_finite() && samples >= 2.0) {
            return Err(PipelineError::invalid_parameter(
                "window_duration_secs",
                format!(
                    "{window_duration_secs} s at {sampling_frequency} Hz spans {samples} sample(s), \
                     at least 2 are required for a non-zero step"
                ),
            ));
        }
        let window_size = samples as usize;
        Ok(Self {
            sampling_frequency,
            window_duration_secs,
            window_size,
            step_size: window_size / 2,
        })
    }

    /// Geometry for a filtered stream, measuring its sampling frequency.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DegenerateStream`] if the stream has no
    /// defined frequency, or [`PipelineError::InvalidParameter`] as in
    /// [`Self::new`].
    pub fn from_stream(
        stream: &FilteredStream,
        window_duration_secs: f64,
    ) -> Result<Self, PipelineError> {
        let sampling_frequency = timing::average_frequency(&stream.times())?;
        Self::new(sampling_frequency, window_duration_secs)
    }

    /// Start offsets of the windows over a stream of `len` samples.
    #[must_use]
    pub fn window_starts(&self, len: usize, drop_partial: bool) -> Vec<usize> {
        (0..len)
            .step_by(self.step_size)
            .filter(|start| !drop_partial || start + self.window_size <= len)
            .collect()
    }
}

/// One labeled slice of the filtered stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Index of the first sample of the window in the segmented stream
    pub start_index: usize,
    /// Filtered values per axis, aligned with [`WindowTable::axes`]
    pub channels: Vec<Vec<f64>>,
    /// Majority activity label
    pub activity: String,
}

impl Window {
    /// Number of samples in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Labeled for Window {
    fn label(&self) -> &str {
        &self.activity
    }
}

/// Windows over a stream, with the axes and geometry used to cut them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowTable {
    pub axes: Vec<SensorAxis>,
    pub geometry: WindowGeometry,
    pub windows: Vec<Window>,
}

/// Most frequent label, ties broken by first occurrence.
///
/// Returns `None` for an empty sequence.
pub fn majority_label<'a, I>(labels: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index = HashMap::new();
    let mut counts: Vec<(&str, usize)> = vec![];
    for label in labels {
        let slot = *index.entry(label).or_insert_with(|| {
            counts.push((label, 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

/// Cut the filtered stream into half-overlapping labeled windows.
///
/// Windows carry every filtered axis of `stream`; restrict the stream with
/// [`FilteredStream::select_axes`] first to window only surviving axes.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateStream`] if the stream frequency is
/// undefined or no window can be formed, and
/// [`PipelineError::InvalidParameter`] for an unusable window duration.
pub fn segment(
    stream: &FilteredStream,
    window_duration_secs: f64,
    drop_partial: bool,
) -> Result<WindowTable, PipelineError> {
    let geometry = WindowGeometry::from_stream(stream, window_duration_secs)?;
    let rows = stream.rows();

    let mut windows = vec![];
    for start_index in geometry.window_starts(rows.len(), drop_partial) {
        let end = usize::min(start_index + geometry.window_size, rows.len());
        let slice = &rows[start_index..end];
        let Some(activity) = majority_label(slice.iter().map(|row| row.sample.activity.as_str()))
        else {
            continue;
        };
        let channels = (0..stream.axes().len())
            .map(|axis| slice.iter().map(|row| row.filtered[axis]).collect())
            .collect();
        windows.push(Window {
            start_index,
            channels,
            activity: activity.to_owned(),
        });
    }

    if windows.is_empty() {
        return Err(PipelineError::degenerate(DegenerateReason::EmptyTable {
            stage: "window segmentation",
        }));
    }

    tracing::info!(
        samples = rows.len(),
        windows = windows.len(),
        window_size = geometry.window_size,
        step_size = geometry.step_size,
        sampling_frequency = geometry.sampling_frequency,
        "segmented stream into windows"
    );

    Ok(WindowTable {
        axes: stream.axes().to_vec(),
        geometry,
        windows,
    })
}
