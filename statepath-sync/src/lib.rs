//! Test sync engine.
//!
//! Classifies previously generated tests against a fresh enumeration and
//! plans the non-destructive edits a test writer should make.

pub mod engine;
pub mod error;
pub mod manifest;
pub mod report;

pub use engine::{PreviousTests, SyncAction, SyncEngine, SyncPlan};
pub use error::ManifestError;
pub use manifest::{Manifest, ManifestEntry, ObsoleteMark};
pub use report::{SyncReport, SyncStatus};
