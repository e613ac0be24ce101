//! Per-window statistical features
//!
//! Every window is summarized by a fixed list of twelve statistics computed
//! on each of its axes. The resulting feature vector has one column per
//! `(statistic, axis)` pair.
//!
//! # Column Layout
//!
//! Columns are named `<axis>_<statistic>` and ordered statistic-major: all
//! axes for the first statistic, then all axes for the second, and so on.
//! With the reference axes `accX, accY, accZ, gyrZ` the first columns are
//!
//! ```text
//! accX_mean, accY_mean, accZ_mean, gyrZ_mean, accX_std, accY_std, ...
//! ```
//!
//! for 48 columns in total. Consumers may rely on positional access, so this
//! order is stable.
//!
//! # Undefined Statistics
//!
//! Standard deviation, skewness and kurtosis need at least two samples, and
//! skewness and kurtosis additionally need non-zero variance. How such cells
//! are handled is chosen with [`UndefinedStatisticPolicy`].

use harprep_stats::{descriptive, moments, percentiles};
use serde::{Deserialize, Serialize};

use crate::{
    balance::Labeled,
    error::{DegenerateReason, PipelineError},
    window::WindowTable,
};

/// A summary statistic applied to one window channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    /// Population standard deviation
    Std,
    /// Mean absolute deviation from the mean
    Mad,
    Min,
    Max,
    /// `max - min`
    Range,
    Median,
    /// Interquartile range, `P75 - P25`
    Iqr,
    /// Number of values below zero
    NegCount,
    /// Number of values above zero
    PosCount,
    /// Biased sample skewness
    Skew,
    /// Biased excess kurtosis
    Kurtosis,
}

impl Statistic {
    /// All statistics in feature column order.
    pub const ALL: [Statistic; 12] = [
        Statistic::Mean,
        Statistic::Std,
        Statistic::Mad,
        Statistic::Min,
        Statistic::Max,
        Statistic::Range,
        Statistic::Median,
        Statistic::Iqr,
        Statistic::NegCount,
        Statistic::PosCount,
        Statistic::Skew,
        Statistic::Kurtosis,
    ];

    /// Column suffix of this statistic.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Mad => "mad",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Range => "range",
            Statistic::Median => "median",
            Statistic::Iqr => "iqr",
            Statistic::NegCount => "neg_count",
            Statistic::PosCount => "pos_count",
            Statistic::Skew => "skew",
            Statistic::Kurtosis => "kurtosis",
        }
    }

    /// Evaluate the statistic, or `None` where it is undefined.
    ///
    /// ```
    /// # use harprep_pipeline::features::Statistic;
    /// let values = [4.0, -1.0, 2.0, 3.0];
    /// assert_eq!(Statistic::Range.compute(&values), Some(5.0));
    /// assert_eq!(Statistic::NegCount.compute(&values), Some(1.0));
    /// assert_eq!(Statistic::Std.compute(&[1.0]), None);
    /// ```
    #[must_use]
    pub fn compute(self, values: &[f64]) -> Option<f64> {
        ChannelSummary::new(values).get(self)
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do with a statistic that is undefined for a window.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedStatisticPolicy {
    /// Write NaN into the cell and continue
    #[default]
    Nan,
    /// Abort with [`PipelineError::UndefinedStatistic`]
    Fail,
}

/// Channel values with a sorted copy, shared by all statistics.
struct ChannelSummary<'a> {
    values: &'a [f64],
    sorted: Vec<f64>,
}

impl<'a> ChannelSummary<'a> {
    fn new(values: &'a [f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self { values, sorted }
    }

    #[expect(clippy::cast_precision_loss)]
    fn get(&self, statistic: Statistic) -> Option<f64> {
        let values = self.values;
        let sorted = &self.sorted;
        match statistic {
            Statistic::Mean => descriptive::mean(values),
            Statistic::Std if values.len() < 2 => None,
            Statistic::Std => descriptive::std_dev(values),
            Statistic::Mad => descriptive::mean_absolute_deviation(values),
            Statistic::Min => sorted.first().copied(),
            Statistic::Max => sorted.last().copied(),
            Statistic::Range => Some(sorted.last()? - sorted.first()?),
            Statistic::Median if sorted.is_empty() => None,
            Statistic::Median => Some(percentiles::median_sorted(sorted)),
            Statistic::Iqr if sorted.is_empty() => None,
            Statistic::Iqr => Some(percentiles::interquartile_range_sorted(sorted)),
            Statistic::NegCount => Some(descriptive::count_negative(values) as f64),
            Statistic::PosCount => Some(descriptive::count_positive(values) as f64),
            Statistic::Skew => moments::skewness(values),
            Statistic::Kurtosis => moments::excess_kurtosis(values),
        }
    }
}

/// Features of one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Values aligned with [`FeatureTable::columns`]
    pub values: Vec<f64>,
    /// Window label, carried over unchanged
    pub activity: String,
}

impl Labeled for FeatureRow {
    fn label(&self) -> &str {
        &self.activity
    }
}

/// One feature row per window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// New table with the same columns and different rows.
    #[must_use]
    pub fn with_rows(&self, rows: Vec<FeatureRow>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Summarize every window with all [`Statistic`]s on every axis.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateStream`] for a table without windows,
/// and [`PipelineError::UndefinedStatistic`] for the first undefined cell
/// when `policy` is [`UndefinedStatisticPolicy::Fail`].
pub fn extract_features(
    table: &WindowTable,
    policy: UndefinedStatisticPolicy,
) -> Result<FeatureTable, PipelineError> {
    if table.windows.is_empty() {
        return Err(PipelineError::degenerate(DegenerateReason::EmptyTable {
            stage: "feature extraction",
        }));
    }

    let columns = Statistic::ALL
        .iter()
        .flat_map(|statistic| {
            table
                .axes
                .iter()
                .map(move |axis| format!("{axis}_{statistic}"))
        })
        .collect::<Vec<_>>();

    let mut undefined_cells = 0;
    let mut rows = Vec::with_capacity(table.windows.len());
    for (window_index, window) in table.windows.iter().enumerate() {
        let summaries = window
            .channels
            .iter()
            .map(|channel| ChannelSummary::new(channel))
            .collect::<Vec<_>>();
        let mut values = Vec::with_capacity(columns.len());
        for statistic in Statistic::ALL {
            for (summary, &axis) in summaries.iter().zip(&table.axes) {
                let value = match (summary.get(statistic), policy) {
                    (Some(value), _) => value,
                    (None, UndefinedStatisticPolicy::Nan) => {
                        undefined_cells += 1;
                        f64::NAN
                    }
                    (None, UndefinedStatisticPolicy::Fail) => {
                        return Err(PipelineError::UndefinedStatistic {
                            window: window_index,
                            axis,
                            statistic,
                        });
                    }
                };
                values.push(value);
            }
        }
        rows.push(FeatureRow {
            values,
            activity: window.activity.clone(),
        });
    }

    if undefined_cells > 0 {
        tracing::warn!(undefined_cells, "undefined statistics written as NaN");
    }
    tracing::info!(
        windows = rows.len(),
        columns = columns.len(),
        "extracted window features"
    );

    Ok(FeatureTable { columns, rows })
}
