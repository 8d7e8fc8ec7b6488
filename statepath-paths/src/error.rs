//! Enumerator error types.

use thiserror::Error;

/// Errors from path enumeration setup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnumeratorError {
    #[error("max_visits_per_state must be at least 1, got {value}")]
    InvalidMaxVisits { value: usize },

    #[error("max_path_depth must be at least 1, got {value}")]
    InvalidMaxDepth { value: usize },

    #[error("unknown hash algorithm '{name}' (expected crc16 or crc32)")]
    UnknownHashAlgorithm { name: String },
}
