//! Standardized higher-order moments.
//!
//! Both estimators are the biased (population) forms: central moments are
//! divided by `n`, not `n - 1`. They are undefined when the slice has fewer
//! than two values or zero variance; the functions then return `None` and the
//! caller decides whether that is an error.

use crate::descriptive;

/// Central moments `m2`, `m3`, `m4` of a slice.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CentralMoments {
    m2: f64,
    m3: f64,
    m4: f64,
}

impl CentralMoments {
    #[expect(clippy::cast_precision_loss)]
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.len() < 2 || values.iter().all(|v| v.total_cmp(&values[0]).is_eq()) {
            return None;
        }
        let mean = descriptive::mean(values)?;
        let n = values.len() as f64;
        let (mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0);
        for v in values {
            let d = v - mean;
            let d2 = d * d;
            s2 += d2;
            s3 += d2 * d;
            s4 += d2 * d2;
        }
        let moments = Self {
            m2: s2 / n,
            m3: s3 / n,
            m4: s4 / n,
        };
        // Constant input is rejected above, so any spread here is real, however
        // small next to the values' magnitude.
        if moments.m2 == 0.0 {
            return None;
        }
        Some(moments)
    }
}

/// Biased sample skewness `m3 / m2^1.5`.
///
/// # Returns
///
/// * `Some(skewness)` - for at least two values with non-zero variance
/// * `None` - otherwise
///
/// # Examples
///
/// ```
/// # use harprep_stats::moments::skewness;
/// assert_eq!(skewness(&[1.0, 2.0, 3.0]), Some(0.0));
/// assert!(skewness(&[1.0, 1.0, 10.0]).unwrap() > 0.0);
/// assert_eq!(skewness(&[5.0]), None);
/// ```
#[must_use]
pub fn skewness(values: &[f64]) -> Option<f64> {
    let m = CentralMoments::from_values(values)?;
    Some(m.m3 / m.m2.powf(1.5))
}

/// Biased excess kurtosis `m4 / m2² - 3` (Fisher definition, normal = 0).
///
/// # Examples
///
/// ```
/// # use harprep_stats::moments::excess_kurtosis;
/// // Two-point distribution: m4 / m2² = 1
/// assert_eq!(excess_kurtosis(&[-1.0, 1.0]), Some(-2.0));
/// assert_eq!(excess_kurtosis(&[3.0, 3.0, 3.0]), None);
/// ```
#[must_use]
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let m = CentralMoments::from_values(values)?;
    Some(m.m4 / (m.m2 * m.m2) - 3.0)
}
