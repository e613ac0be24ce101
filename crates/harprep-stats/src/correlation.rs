use crate::descriptive;

/// Pearson correlation coefficient between two equally long columns.
///
/// # Returns
///
/// * `Some(r)` - with `r` clamped to `[-1, 1]`
/// * `None` - if the columns differ in length, hold fewer than two values,
///   or either column is constant
///
/// # Examples
///
/// ```
/// # use harprep_stats::correlation::pearson;
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let y = [2.0, 4.0, 6.0, 8.0];
/// assert_eq!(pearson(&x, &y), Some(1.0));
/// assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), None);
/// ```
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mean_x = descriptive::mean(x)?;
    let mean_y = descriptive::mean(y)?;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Square correlation matrix over a set of columns.
///
/// Entry `[i][j]` is the Pearson correlation of `columns[i]` and `columns[j]`.
/// Undefined correlations (constant columns) are `NaN`. The diagonal is always
/// exactly `1.0` and the matrix is exactly symmetric: each off-diagonal pair is
/// computed once and mirrored.
///
/// ```
/// # use harprep_stats::correlation::correlation_matrix;
/// let a = [1.0, 2.0, 3.0];
/// let b = [3.0, 2.0, 1.0];
/// let matrix = correlation_matrix(&[&a, &b]);
/// assert_eq!(matrix, vec![vec![1.0, -1.0], vec![-1.0, 1.0]]);
/// ```
#[must_use]
pub fn correlation_matrix(columns: &[&[f64]]) -> Vec<Vec<f64>> {
    let n = columns.len();
    let mut matrix = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(columns[i], columns[j]).unwrap_or(f64::NAN);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_uncorrelated_columns() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, -1.0, -1.0, 1.0];
        assert_abs_diff_eq!(pearson(&x, &y).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(pearson(&[1.0, 2.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn test_matrix_symmetry_and_diagonal() {
        let a = [0.3, 1.7, -2.0, 4.1, 0.0, 2.2];
        let b = [1.0, 0.5, 0.1, 3.3, -1.0, 2.0];
        let c = [5.0, -4.0, 3.0, -2.0, 1.0, 0.0];
        let matrix = correlation_matrix(&[&a, &b, &c]);
        for i in 0..3 {
            assert_eq!(matrix[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(matrix[i][j].to_bits(), matrix[j][i].to_bits());
                assert!((-1.0..=1.0).contains(&matrix[i][j]));
            }
        }
    }

    #[test]
    fn test_constant_column_is_nan_off_diagonal() {
        let a = [1.0, 2.0, 3.0];
        let constant = [2.0, 2.0, 2.0];
        let matrix = correlation_matrix(&[&a, &constant]);
        assert_eq!(matrix[1][1], 1.0);
        assert!(matrix[0][1].is_nan());
        assert!(matrix[1][0].is_nan());
    }
}
