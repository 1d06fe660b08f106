//! Domain error types.

use crate::domain::builder::Step;

/// Top-level error type for stratbuilder.
///
/// Every validation failure is recoverable: it blocks the mutation or
/// transition that produced it and leaves the builder usable.
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error("unsupported indicator: {0}")]
    InvalidParameterKind(String),

    #[error("invalid parameter {key} for {indicator}: {reason}")]
    InvalidParameterValue {
        indicator: String,
        key: String,
        reason: String,
    },

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("invalid symbol {0:?}")]
    InvalidSymbol(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("{symbol} must keep at least one {collection}")]
    MinimumCardinalityViolated { symbol: String, collection: String },

    #[error("{collection} index {index} out of range for {symbol} (len {len})")]
    IndexOutOfRange {
        symbol: String,
        collection: String,
        index: usize,
        len: usize,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("cannot leave step {step}: {reason}")]
    GateFailed { step: Step, reason: String },

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("no submission is pending")]
    NoSubmissionPending,

    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BuilderError {
    /// Shorthand for the common "parameter out of range" case.
    pub(crate) fn param(indicator: impl ToString, key: &str, reason: impl Into<String>) -> Self {
        BuilderError::InvalidParameterValue {
            indicator: indicator.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn field(field: &str, reason: impl Into<String>) -> Self {
        BuilderError::InvalidFieldValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&BuilderError> for std::process::ExitCode {
    fn from(err: &BuilderError) -> Self {
        let code: u8 = match err {
            BuilderError::Io(_) => 1,
            BuilderError::ConfigParse { .. } | BuilderError::ConfigInvalid { .. } => 2,
            BuilderError::Json(_)
            | BuilderError::InvalidParameterKind(_)
            | BuilderError::InvalidParameterValue { .. }
            | BuilderError::DuplicateSymbol(_)
            | BuilderError::InvalidSymbol(_)
            | BuilderError::UnknownSymbol(_)
            | BuilderError::MinimumCardinalityViolated { .. }
            | BuilderError::IndexOutOfRange { .. }
            | BuilderError::InvalidFieldValue { .. } => 3,
            BuilderError::GateFailed { .. } => 4,
            BuilderError::SubmissionInProgress
            | BuilderError::NoSubmissionPending
            | BuilderError::SubmissionRejected(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
