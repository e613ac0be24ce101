//! Correlation-based pruning of redundant sensor axes
//!
//! Strongly correlated channels carry mostly the same information, and
//! keeping all of them multiplies the feature count without helping the
//! classifier. This stage computes the Pearson correlation matrix of the
//! filtered channels and discards axes that are redundant with another axis.
//!
//! # Discard Rule
//!
//! The matrix is traversed in canonical axis order, column by column, and
//! every ordered pair `(a, b)` with `a != b` and `|corr(a, b)| > threshold` is
//! examined:
//!
//! - `a` is not important: discard `a`
//! - `a` and `b` are both important: keep both
//! - `a` is important and `b` is not: discard `b`
//!
//! Since both orientations of each pair are visited, a non-important axis
//! correlated with anything is always discarded, and important axes are
//! never discarded. Undefined correlations (NaN) never exceed the threshold.

use std::collections::BTreeSet;

use harprep_stats::correlation;
use serde::{Deserialize, Serialize};

use crate::{
    axis::{self, SensorAxis},
    error::{DegenerateReason, PipelineError},
    filter::FilteredStream,
};

/// Absolute correlation above which two axes are considered redundant.
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.5;

/// Pearson correlation matrix over a set of filtered axes.
///
/// Symmetric, with a diagonal of exactly `1.0`. Entries involving a constant
/// channel are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    axes: Vec<SensorAxis>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlate every pair of filtered channels in `stream`.
    #[must_use]
    pub fn from_stream(stream: &FilteredStream) -> Self {
        let axes = stream.axes().to_vec();
        let channels = axes
            .iter()
            .filter_map(|&axis| stream.filtered_values(axis))
            .collect::<Vec<_>>();
        let columns = channels.iter().map(Vec::as_slice).collect::<Vec<_>>();
        Self {
            values: correlation::correlation_matrix(&columns),
            axes,
        }
    }

    #[must_use]
    pub fn axes(&self) -> &[SensorAxis] {
        &self.axes
    }

    /// Matrix rows, aligned with [`Self::axes`] in both dimensions.
    #[must_use]
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Correlation between two axes, or `None` if either is absent.
    #[must_use]
    pub fn get(&self, a: SensorAxis, b: SensorAxis) -> Option<f64> {
        let i = self.axes.iter().position(|axis| *axis == a)?;
        let j = self.axes.iter().position(|axis| *axis == b)?;
        Some(self.values[i][j])
    }
}

/// Outcome of feature selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSelection {
    pub correlation: CorrelationMatrix,
    /// Axes removed as redundant
    pub discarded: BTreeSet<SensorAxis>,
    /// Axes kept for windowing, in canonical order
    pub surviving: Vec<SensorAxis>,
}

/// Axes to discard according to the rule in the module documentation.
#[must_use]
pub fn discard_set(
    matrix: &CorrelationMatrix,
    important_axes: &[SensorAxis],
    threshold: f64,
) -> BTreeSet<SensorAxis> {
    let is_important = |axis: &SensorAxis| important_axes.contains(axis);
    let mut discarded = BTreeSet::new();

    for (j, a) in matrix.axes.iter().enumerate() {
        for (i, b) in matrix.axes.iter().enumerate() {
            if i == j || matrix.values[i][j].abs() <= threshold || matrix.values[i][j].is_nan() {
                continue;
            }
            match (is_important(a), is_important(b)) {
                (false, _) => {
                    discarded.insert(*a);
                }
                (true, true) => {}
                (true, false) => {
                    discarded.insert(*b);
                }
            }
        }
    }

    discarded
}

/// Correlate the filtered channels and drop redundant axes.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `threshold` is outside
/// `[0, 1]`, and [`PipelineError::DegenerateStream`] if no axis survives.
pub fn select_features(
    stream: &FilteredStream,
    important_axes: &[SensorAxis],
    threshold: f64,
) -> Result<FeatureSelection, PipelineError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(PipelineError::invalid_parameter(
            "correlation_threshold",
            format!("must be within [0, 1], got {threshold}"),
        ));
    }

    let important_axes = axis::canonical(important_axes);
    let correlation = CorrelationMatrix::from_stream(stream);
    let discarded = discard_set(&correlation, &important_axes, threshold);
    let surviving = correlation
        .axes()
        .iter()
        .copied()
        .filter(|axis| !discarded.contains(axis))
        .collect::<Vec<_>>();

    if surviving.is_empty() {
        return Err(PipelineError::degenerate(DegenerateReason::NoSurvivingAxes));
    }

    tracing::info!(
        discarded = ?discarded,
        surviving = ?surviving,
        threshold,
        "selected sensor axes"
    );

    Ok(FeatureSelection {
        correlation,
        discarded,
        surviving,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{filter, recording::Recording, recording::Sample};

    /// Recording with accX/accY/gyrX rising together, accZ and gyrY
    /// uncorrelated with them, and gyrZ constant.
    fn recording() -> Recording {
        let zigzag = [0.0, 3.0, 1.0, 2.0, 0.0, 3.0, 1.0, 2.0];
        let other = [1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0];
        (0..8_u8)
            .map(|i| {
                let t = f64::from(i);
                Sample {
                    time: t * 0.1,
                    acc_x: t,
                    acc_y: 2.0 * t + 1.0,
                    acc_z: zigzag[usize::from(i)],
                    gyr_x: -t,
                    gyr_y: other[usize::from(i)],
                    gyr_z: 5.0,
                    activity: "Walk".to_owned(),
                }
            })
            .collect()
    }

    fn stream() -> FilteredStream {
        filter::median_filter(&recording(), &SensorAxis::ALL, 1).unwrap()
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let matrix = CorrelationMatrix::from_stream(&stream());
        let n = matrix.axes().len();
        for i in 0..n {
            assert_eq!(matrix.values()[i][i], 1.0);
            for j in 0..n {
                let (a, b) = (matrix.values()[i][j], matrix.values()[j][i]);
                assert!(a == b || (a.is_nan() && b.is_nan()));
            }
        }
        let r = matrix.get(SensorAxis::AccX, SensorAxis::AccY).unwrap();
        assert_abs_diff_eq!(r, 1.0, epsilon = 1e-12);
        let r = matrix.get(SensorAxis::AccX, SensorAxis::GyrX).unwrap();
        assert_abs_diff_eq!(r, -1.0, epsilon = 1e-12);
        assert!(
            matrix
                .get(SensorAxis::AccX, SensorAxis::GyrZ)
                .unwrap()
                .is_nan()
        );
    }

    #[test]
    fn test_important_axes_are_never_discarded() {
        let selection = select_features(&stream(), &SensorAxis::ACCELEROMETER, 0.5).unwrap();
        for axis in SensorAxis::ACCELEROMETER {
            assert!(!selection.discarded.contains(&axis));
        }
        // gyrX mirrors accX
        assert!(selection.discarded.contains(&SensorAxis::GyrX));
        // a constant channel has no defined correlation
        assert!(!selection.discarded.contains(&SensorAxis::GyrZ));
        assert_eq!(
            selection.surviving,
            SensorAxis::ALL
                .into_iter()
                .filter(|axis| !selection.discarded.contains(axis))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_non_important_pair_is_discarded_entirely() {
        // with nothing important, every correlated axis goes
        let matrix = CorrelationMatrix::from_stream(&stream());
        let discarded = discard_set(&matrix, &[], 0.5);
        assert!(discarded.contains(&SensorAxis::AccX));
        assert!(discarded.contains(&SensorAxis::AccY));
        assert!(discarded.contains(&SensorAxis::GyrX));
        assert!(!discarded.contains(&SensorAxis::GyrZ));
    }

    #[test]
    fn test_discard_set_is_reproducible() {
        let matrix = CorrelationMatrix::from_stream(&stream());
        let first = discard_set(&matrix, &SensorAxis::ACCELEROMETER, 0.5);
        let second = discard_set(&matrix, &SensorAxis::ACCELEROMETER, 0.5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_surviving_axes() {
        let stream = stream().select_axes(&[SensorAxis::AccX, SensorAxis::AccY]);
        let err = select_features(&stream, &[], 0.5).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DegenerateStream {
                reason: DegenerateReason::NoSurvivingAxes
            }
        ));
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(matches!(
            select_features(&stream(), &[], 1.5),
            Err(PipelineError::InvalidParameter {
                name: "correlation_threshold",
                ..
            })
        ));
    }
}
