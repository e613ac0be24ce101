//! Class balancing by deterministic undersampling
//!
//! Activity recordings are rarely balanced: a session may contain minutes of
//! walking and only seconds of squats. Training on such data biases the
//! classifier toward the majority class, so every class is cut down to the
//! size of the smallest one.
//!
//! # Algorithm
//!
//! 1. Collect distinct labels in order of first appearance
//! 2. Let `m` be the smallest per-class row count
//! 3. For each class in that order, keep its first `m` rows (original order)
//! 4. Concatenate the kept rows class by class
//!
//! The operation is not random: the same table always yields the same rows,
//! and balancing an already balanced table returns it unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DegenerateReason, PipelineError};

/// A table row carrying an activity label.
pub trait Labeled {
    fn label(&self) -> &str;
}

/// Number of rows and share of the table for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassShare {
    pub label: String,
    pub count: usize,
    /// Share of all rows, in percent
    pub percentage: f64,
}

/// Per-class row counts in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDistribution {
    pub classes: Vec<ClassShare>,
}

impl ClassDistribution {
    /// Count rows per class.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_rows<T>(rows: &[T]) -> Self
    where
        T: Labeled,
    {
        let total = rows.len();
        let classes = class_counts(rows)
            .into_iter()
            .map(|(label, count)| ClassShare {
                label: label.to_owned(),
                count,
                percentage: count as f64 * 100.0 / total as f64,
            })
            .collect();
        Self { classes }
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<usize> {
        self.classes
            .iter()
            .find(|share| share.label == label)
            .map(|share| share.count)
    }
}

/// Distinct labels in order of first appearance.
#[must_use]
pub fn class_order<T>(rows: &[T]) -> Vec<&str>
where
    T: Labeled,
{
    class_counts(rows)
        .into_iter()
        .map(|(label, _)| label)
        .collect()
}

/// `(label, count)` pairs in order of first appearance.
fn class_counts<T>(rows: &[T]) -> Vec<(&str, usize)>
where
    T: Labeled,
{
    let mut index = HashMap::new();
    let mut counts: Vec<(&str, usize)> = vec![];
    for row in rows {
        let label = row.label();
        let slot = *index.entry(label).or_insert_with(|| {
            counts.push((label, 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }
    counts
}

/// Undersample every class to the minority class count.
///
/// The result has exactly `m * classes` rows, where `m` is the smallest
/// per-class count. `stage` names the caller in the error.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateStream`] for an empty table.
pub fn undersample<T>(rows: &[T], stage: &'static str) -> Result<Vec<T>, PipelineError>
where
    T: Labeled + Clone,
{
    let counts = class_counts(rows);
    let Some(min_count) = counts.iter().map(|(_, count)| *count).min() else {
        return Err(PipelineError::degenerate(DegenerateReason::EmptyTable {
            stage,
        }));
    };

    let mut balanced = Vec::with_capacity(min_count * counts.len());
    for (label, _) in &counts {
        balanced.extend(
            rows.iter()
                .filter(|row| row.label() == *label)
                .take(min_count)
                .cloned(),
        );
    }

    tracing::debug!(
        rows_in = rows.len(),
        rows_out = balanced.len(),
        classes = counts.len(),
        per_class = min_count,
        stage,
        "undersampled classes"
    );

    Ok(balanced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str, usize);

    impl Labeled for Row {
        fn label(&self) -> &str {
            self.0
        }
    }

    fn rows(labels: &[&'static str]) -> Vec<Row> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| Row(label, i))
            .collect()
    }

    #[test]
    fn test_keeps_first_rows_per_class() {
        let table = rows(&["B", "A", "B", "A", "B", "C", "C", "A"]);
        let balanced = undersample(&table, "test").unwrap();
        // classes ordered by first appearance: B, A, C; min count = 2
        assert_eq!(
            balanced,
            vec![
                Row("B", 0),
                Row("B", 2),
                Row("A", 1),
                Row("A", 3),
                Row("C", 5),
                Row("C", 6),
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let mut table = vec![];
        for i in 0..50 {
            table.push(Row("Walk", i));
        }
        for i in 50..80 {
            table.push(Row("Squat", i));
        }
        for i in 80..160 {
            table.push(Row(if i % 3 == 0 { "Walk" } else { "Jogging" }, i));
        }
        let once = undersample(&table, "test").unwrap();
        let twice = undersample(&once, "test").unwrap();
        assert_eq!(once, twice);

        let distribution = ClassDistribution::from_rows(&once);
        for share in &distribution.classes {
            assert_eq!(share.count, 30);
        }
        assert_eq!(once.len(), 30 * 3);
    }

    #[test]
    fn test_empty_table() {
        let err = undersample::<Row>(&[], "class balancing").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DegenerateStream {
                reason: DegenerateReason::EmptyTable {
                    stage: "class balancing"
                }
            }
        ));
    }

    #[test]
    fn test_distribution() {
        let table = rows(&["A", "B", "A", "A"]);
        let distribution = ClassDistribution::from_rows(&table);
        assert_eq!(class_order(&table), vec!["A", "B"]);
        assert_eq!(distribution.get("A"), Some(3));
        assert_eq!(distribution.get("B"), Some(1));
        assert_eq!(distribution.get("C"), None);
        assert_eq!(distribution.classes[0].percentage, 75.0);
    }
}
