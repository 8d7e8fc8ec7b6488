//! # statepath-paths
//!
//! Path enumeration for statepath.
//!
//! This crate provides:
//! - Enumerator configuration (visit and depth limits, hash algorithm)
//! - CRC-16 and CRC-32 path checksums
//! - Bounded depth-first traversal producing stable, hashed test paths
//! - Test case naming that matches the runtime transition log format

pub mod case;
pub mod checksum;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod path;

pub use case::TestCase;
pub use config::{EnumeratorConfig, HashAlgorithm};
pub use enumerator::PathEnumerator;
pub use error::EnumeratorError;
pub use path::{PathStep, TestPath};
