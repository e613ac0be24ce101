use std::ops::Range;

use crate::percentiles;

/// Index range of a centered window of `window` samples around `index`.
///
/// For an even window the extra sample falls before the center, so a window
/// of 10 covers `index - 5 ..= index + 4`. The range is clipped to `0..len`,
/// which shrinks windows near both ends of the sequence.
///
/// ```
/// # use harprep_stats::rolling::centered_window;
/// assert_eq!(centered_window(0, 3, 5), 0..2);
/// assert_eq!(centered_window(2, 3, 5), 1..4);
/// assert_eq!(centered_window(6, 10, 20), 1..11);
/// ```
#[must_use]
pub fn centered_window(index: usize, window: usize, len: usize) -> Range<usize> {
    let before = window / 2;
    let after = (window - 1) / 2;
    let start = index.saturating_sub(before);
    let end = (index + after + 1).min(len);
    start..end
}

/// Centered rolling median with shrinking edge windows.
///
/// Each output value is the median of the centered window around the
/// corresponding input value (see [`centered_window`]). Windows at the
/// boundaries are truncated instead of padded, so the output never contains
/// placeholder values and has the same length as the input.
///
/// # Returns
///
/// * `Some(filtered)` - for a non-zero window
/// * `None` - if `window` is zero
///
/// # Examples
///
/// ```
/// # use harprep_stats::rolling::centered_rolling_median;
/// let filtered = centered_rolling_median(&[1.0, 2.0, 100.0, 3.0, 4.0], 3).unwrap();
/// // The spike is removed, the edges use two-sample windows.
/// assert_eq!(filtered, vec![1.5, 2.0, 3.0, 4.0, 3.5]);
/// ```
#[must_use]
pub fn centered_rolling_median(values: &[f64], window: usize) -> Option<Vec<f64>> {
    if window == 0 {
        return None;
    }
    let mut scratch = Vec::with_capacity(window);
    let filtered = (0..values.len())
        .map(|index| {
            scratch.clear();
            scratch.extend_from_slice(&values[centered_window(index, window, values.len())]);
            scratch.sort_by(f64::total_cmp);
            percentiles::median_sorted(&scratch)
        })
        .collect();
    Some(filtered)
}
