use chrono::{DateTime, Utc};
use harprep_pipeline::dataset::{DatasetSplit, StandardScaler, Targets};
use serde::{Deserialize, Serialize};

/// Prepared training data as written by `harprep prepare`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetFile {
    /// Recording the dataset was prepared from
    pub source: String,
    pub prepared_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    /// Activity names, indexed by class
    pub classes: Vec<String>,
    pub x_train: Vec<Vec<f64>>,
    pub y_train: Targets,
    pub x_valid: Vec<Vec<f64>>,
    pub y_valid: Targets,
    pub scaler: Option<StandardScaler>,
}

impl DatasetFile {
    pub fn new(source: String, prepared_at: DateTime<Utc>, split: DatasetSplit) -> Self {
        let DatasetSplit {
            feature_names,
            classes,
            x_train,
            y_train,
            x_valid,
            y_valid,
            scaler,
        } = split;
        Self {
            source,
            prepared_at,
            feature_names,
            classes,
            x_train,
            y_train,
            x_valid,
            y_valid,
            scaler,
        }
    }
}
