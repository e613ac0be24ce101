//! Label encoding, train/validation split and feature scaling
//!
//! The last stage turns the balanced feature table into arrays a classifier
//! can consume:
//!
//! 1. Encode each activity with a closed vocabulary ([`LabelEncoder`]);
//!    an unknown label aborts the run
//! 2. Split every class at `floor(training_fraction * class_rows)`: earlier
//!    rows train, later rows validate
//! 3. Optionally one-hot encode the targets
//! 4. Optionally standardize features with statistics fit on the training
//!    partition only, then apply the same transform to validation
//!
//! Splitting per class in stream order keeps temporally adjacent windows
//! together, and fitting the scaler on training rows only keeps validation
//! statistics out of the model.

use harprep_stats::descriptive;
use serde::{Deserialize, Serialize};

use crate::{
    balance,
    error::{DegenerateReason, PipelineError},
    features::{FeatureRow, FeatureTable},
};

/// Default share of each class assigned to training.
pub const DEFAULT_TRAINING_FRACTION: f64 = 0.8;

/// Activity names of the reference recordings, indexed by encoded label.
pub const DEFAULT_LABEL_VOCABULARY: [&str; 5] =
    ["Squat", "Leg land", "Walk", "Lateral squat slide", "Jogging"];

/// Closed mapping between activity names and class indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    vocabulary: Vec<String>,
}

impl Default for LabelEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_VOCABULARY.map(str::to_owned).to_vec())
    }
}

impl LabelEncoder {
    #[must_use]
    pub fn new(vocabulary: Vec<String>) -> Self {
        Self { vocabulary }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Class index of an activity.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownLabel`] for a label outside the
    /// vocabulary.
    pub fn encode(&self, label: &str) -> Result<usize, PipelineError> {
        self.vocabulary
            .iter()
            .position(|known| known == label)
            .ok_or_else(|| PipelineError::UnknownLabel {
                label: label.to_owned(),
            })
    }
}

/// Encoded classification targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Targets {
    /// One class index per row
    Labels(Vec<usize>),
    /// One indicator vector per row, as wide as the vocabulary
    OneHot(Vec<Vec<f64>>),
}

impl Targets {
    fn encode(labels: Vec<usize>, one_hot_width: Option<usize>) -> Self {
        match one_hot_width {
            None => Self::Labels(labels),
            Some(width) => Self::OneHot(
                labels
                    .into_iter()
                    .map(|label| {
                        let mut row = vec![0.0; width];
                        row[label] = 1.0;
                        row
                    })
                    .collect(),
            ),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Labels(labels) => labels.len(),
            Self::OneHot(rows) => rows.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-feature standardization `(x - mean) / scale`.
///
/// NaN cells are ignored when fitting and stay NaN when transforming.
/// Features with zero spread get a scale of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit mean and population standard deviation of each of `width` columns.
    #[must_use]
    pub fn fit(rows: &[Vec<f64>], width: usize) -> Self {
        let (mean, scale) = (0..width)
            .map(|column| {
                let values = rows
                    .iter()
                    .map(|row| row[column])
                    .filter(|v| !v.is_nan())
                    .collect::<Vec<_>>();
                let mean = descriptive::mean(&values).unwrap_or(0.0);
                let scale = descriptive::std_dev(&values)
                    .filter(|std| *std > 0.0)
                    .unwrap_or(1.0);
                (mean, scale)
            })
            .unzip();
        Self { mean, scale }
    }

    #[must_use]
    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(x, (mean, scale))| (x - mean) / scale)
                    .collect()
            })
            .collect()
    }
}

/// Options of the final dataset stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitOptions {
    pub training_fraction: f64,
    pub one_hot: bool,
    pub standardize: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            training_fraction: DEFAULT_TRAINING_FRACTION,
            one_hot: true,
            standardize: true,
        }
    }
}

/// Training and validation arrays ready for a classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub feature_names: Vec<String>,
    /// Activity names, indexed by class
    pub classes: Vec<String>,
    pub x_train: Vec<Vec<f64>>,
    pub y_train: Targets,
    pub x_valid: Vec<Vec<f64>>,
    pub y_valid: Targets,
    /// Scaler fit on `x_train`, if standardization was requested
    pub scaler: Option<StandardScaler>,
}

/// Split rows per class, in order of first class appearance.
///
/// For each class the first `floor(training_fraction * n)` rows go to
/// training and the rest to validation.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `training_fraction` is
/// outside `[0, 1]`.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn split_rows<T>(rows: &[T], training_fraction: f64) -> Result<(Vec<T>, Vec<T>), PipelineError>
where
    T: balance::Labeled + Clone,
{
    if !(0.0..=1.0).contains(&training_fraction) {
        return Err(PipelineError::invalid_parameter(
            "training_fraction",
            format!("must be within [0, 1], got {training_fraction}"),
        ));
    }

    let mut train = vec![];
    let mut valid = vec![];
    for class in balance::class_order(rows) {
        let class_rows = rows
            .iter()
            .filter(|row| row.label() == class)
            .collect::<Vec<_>>();
        let cut = (training_fraction * class_rows.len() as f64).floor() as usize;
        let (head, tail) = class_rows.split_at(cut.min(class_rows.len()));
        train.extend(head.iter().map(|row| (*row).clone()));
        valid.extend(tail.iter().map(|row| (*row).clone()));
    }
    Ok((train, valid))
}

/// Encode, split and optionally scale a balanced feature table.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateStream`] for an empty table,
/// [`PipelineError::UnknownLabel`] for a label outside `encoder`'s
/// vocabulary, and [`PipelineError::InvalidParameter`] for a bad fraction.
pub fn prepare_dataset(
    table: &FeatureTable,
    encoder: &LabelEncoder,
    options: SplitOptions,
) -> Result<DatasetSplit, PipelineError> {
    if table.is_empty() {
        return Err(PipelineError::degenerate(DegenerateReason::EmptyTable {
            stage: "dataset split",
        }));
    }
    // every label is checked before anything is split
    for row in &table.rows {
        encoder.encode(&row.activity)?;
    }

    let (train, valid) = split_rows(&table.rows, options.training_fraction)?;
    let encode_rows = |rows: &[FeatureRow]| -> Result<(Vec<Vec<f64>>, Vec<usize>), PipelineError> {
        let features = rows.iter().map(|row| row.values.clone()).collect();
        let labels = rows
            .iter()
            .map(|row| encoder.encode(&row.activity))
            .collect::<Result<_, _>>()?;
        Ok((features, labels))
    };
    let (mut x_train, train_labels) = encode_rows(&train)?;
    let (mut x_valid, valid_labels) = encode_rows(&valid)?;

    let one_hot_width = options.one_hot.then_some(encoder.len());
    let scaler = options.standardize.then(|| {
        let scaler = StandardScaler::fit(&x_train, table.columns.len());
        x_train = scaler.transform(&x_train);
        x_valid = scaler.transform(&x_valid);
        scaler
    });

    tracing::info!(
        train_rows = x_train.len(),
        valid_rows = x_valid.len(),
        training_fraction = options.training_fraction,
        one_hot = options.one_hot,
        standardize = options.standardize,
        "split dataset"
    );

    Ok(DatasetSplit {
        feature_names: table.columns.clone(),
        classes: encoder.vocabulary().to_vec(),
        x_train,
        y_train: Targets::encode(train_labels, one_hot_width),
        x_valid,
        y_valid: Targets::encode(valid_labels, one_hot_width),
        scaler,
    })
}
