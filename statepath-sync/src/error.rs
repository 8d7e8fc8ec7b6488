//! Manifest error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading or writing a manifest file.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
