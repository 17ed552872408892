//! Assessment error types.
//!
//! The numeric core never fails: degenerate statistics are logged and replaced
//! with neutral values. These errors cover the inputs a caller is expected to
//! validate before invoking the engine (mismatched record shapes, impossible
//! skill axes, unknown configuration names).

use thiserror::Error;

use crate::norm::Norm;

/// Errors that can occur when configuring or invoking a skill assessment.
#[derive(Debug, Error, PartialEq)]
pub enum AssessmentError {
    /// Two inputs that must describe the same metrics or records disagree in length.
    #[error("{what} has length {actual}, expected {expected}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// The skill axis must be partitioned into at least two classes.
    #[error("at least 2 skill classes are required, got {0}")]
    NotEnoughSkillClasses(usize),

    /// The skill axis is empty or inverted.
    #[error("invalid skill range [{min}, {max}]")]
    InvalidSkillRange { min: f64, max: f64 },

    /// The defuzzification grid needs at least one step.
    #[error("number_of_steps must be at least 1")]
    InvalidResolution,

    /// Metric names key the rule inputs and must be unique.
    #[error("duplicate metric name: {0}")]
    DuplicateMetric(String),

    /// A metric value, weight or skill label is NaN or infinite.
    #[error("{0} is not a finite number")]
    NonFinite(String),

    /// There is nothing to learn membership functions from.
    #[error("no training records provided")]
    NoTrainingRecords,

    /// Rule antecedents must be combined with a t-norm or an s-norm.
    #[error("{0} cannot combine rule antecedents")]
    InvalidAntecedent(Norm),

    /// A configuration string did not name any known variant.
    #[error("unknown {kind}: {name}")]
    UnknownName { kind: &'static str, name: String },
}

impl AssessmentError {
    pub(crate) fn length_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        AssessmentError::LengthMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    pub(crate) fn non_finite(what: impl Into<String>) -> Self {
        AssessmentError::NonFinite(what.into())
    }

    pub(crate) fn unknown(kind: &'static str, name: &str) -> Self {
        AssessmentError::UnknownName {
            kind,
            name: name.to_string(),
        }
    }

    /// Returns `true` if the error is caused by the shape of the data rather
    /// than by configuration.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            AssessmentError::LengthMismatch { .. }
                | AssessmentError::DuplicateMetric(_)
                | AssessmentError::NonFinite(_)
                | AssessmentError::NoTrainingRecords
        )
    }
}
