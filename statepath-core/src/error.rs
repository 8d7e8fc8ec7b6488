//! Core error types.

use thiserror::Error;

/// Shape violations of a single branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BranchViolation {
    #[error("no transition directive")]
    MissingDirective,

    #[error("multiple transition directives")]
    MultipleDirectives,

    #[error("multiple side effects")]
    MultipleSideEffects,

    #[error("multiple guards")]
    MultipleGuards,

    #[error("emitted events declared without a side effect")]
    EmitsWithoutSideEffect,
}

/// Errors raised while building or loading a state graph.
///
/// Every variant is a configuration error: it is reported when the graph is
/// constructed and never while events are being processed.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("initial state not specified")]
    MissingInitialState,

    #[error("duplicate definition for state '{state}'")]
    DuplicateState { state: String },

    #[error("unknown event '{event}' referenced in state '{state}'")]
    UnknownEvent { state: String, event: String },

    #[error("duplicate transition for event '{event}' in state '{state}'")]
    DuplicateEvent { state: String, event: String },

    #[error("event '{event}' in state '{state}' has no branches")]
    NoBranches { state: String, event: String },

    #[error("invalid branch #{index} for event '{event}' in state '{state}': {violation}")]
    InvalidBranch {
        state: String,
        event: String,
        index: usize,
        violation: BranchViolation,
    },

    #[error("invalid flat graph: {reason}")]
    InvalidFlatGraph { reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GraphError {
    /// Returns a short machine-readable code for the error.
    pub fn error_code(&self) -> &'static str {
        match self {
            GraphError::MissingInitialState => "MISSING_INITIAL",
            GraphError::DuplicateState { .. } => "DUPLICATE_STATE",
            GraphError::UnknownEvent { .. } => "UNKNOWN_EVENT",
            GraphError::DuplicateEvent { .. } => "DUPLICATE_EVENT",
            GraphError::NoBranches { .. } => "NO_BRANCHES",
            GraphError::InvalidBranch { .. } => "INVALID_BRANCH",
            GraphError::InvalidFlatGraph { .. } => "INVALID_FLAT_GRAPH",
            GraphError::Json(_) | GraphError::Yaml(_) => "PARSE_ERROR",
        }
    }
}
