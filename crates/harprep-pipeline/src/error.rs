//! Error types shared by all pipeline stages
//!
//! Every failure is local to one stage boundary and deterministic: the same
//! input and configuration fail the same way every time. Stages never catch
//! and ignore these errors; the first failing stage aborts the whole run.

use std::io;

use crate::{axis::SensorAxis, features::Statistic};

/// Failure of a pipeline stage.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PipelineError {
    /// The input recording could not be read into a sample table.
    #[display("malformed input: {_0}")]
    MalformedInput(MalformedInputError),
    /// The stream is too small or too regular to define the requested quantity.
    #[display("degenerate stream: {reason}")]
    DegenerateStream { reason: DegenerateReason },
    /// An activity label is absent from the closed label vocabulary.
    #[display("unknown activity label '{label}'")]
    UnknownLabel { label: String },
    /// A statistic is undefined for a window and the policy is to fail.
    #[display("statistic '{statistic}' is undefined for axis '{axis}' in window #{window}")]
    UndefinedStatistic {
        window: usize,
        axis: SensorAxis,
        statistic: Statistic,
    },
    /// A configuration value makes a stage meaningless.
    #[display("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl PipelineError {
    pub(crate) fn degenerate(reason: DegenerateReason) -> Self {
        Self::DegenerateStream { reason }
    }

    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<MalformedInputError> for PipelineError {
    fn from(err: MalformedInputError) -> Self {
        Self::MalformedInput(err)
    }
}

/// Reason a recording could not be parsed.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum MalformedInputError {
    #[display("failed to read {path}")]
    Io { path: String, source: io::Error },
    #[display("invalid CSV data")]
    Csv { source: csv::Error },
    #[display("missing required column '{column}'")]
    MissingColumn { column: String },
    #[display("line {line}: column '{column}' has non-numeric value '{value}'")]
    NonNumericValue {
        line: u64,
        column: String,
        value: String,
    },
    #[display("line {line}: empty activity label")]
    EmptyLabel { line: u64 },
}

impl From<csv::Error> for MalformedInputError {
    fn from(source: csv::Error) -> Self {
        Self::Csv { source }
    }
}

/// Why a stream cannot be processed further.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DegenerateReason {
    #[display("{count} sample(s), at least 2 are required to define a sampling period")]
    TooFewSamples { count: usize },
    #[display("average sampling period is zero, frequency is undefined")]
    ZeroAveragePeriod,
    #[display("empty table reached {stage}")]
    EmptyTable { stage: &'static str },
    #[display("no sensor axis survived feature selection")]
    NoSurvivingAxes,
}
