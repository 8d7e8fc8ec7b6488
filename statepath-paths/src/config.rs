//! Enumerator configuration.

use crate::checksum::{crc16, crc32};
use crate::error::EnumeratorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Checksum used for path hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// 4 uppercase hex digits, zero-padded.
    #[default]
    Crc16,
    /// Uppercase hex, not padded.
    Crc32,
}

impl HashAlgorithm {
    /// Hashes `data` and renders it as uppercase hex.
    pub fn hash(&self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Crc16 => format!("{:04X}", crc16(data)),
            HashAlgorithm::Crc32 => format!("{:X}", crc32(data)),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = EnumeratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crc16" | "crc-16" => Ok(HashAlgorithm::Crc16),
            "crc32" | "crc-32" => Ok(HashAlgorithm::Crc32),
            _ => Err(EnumeratorError::UnknownHashAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Crc16 => f.write_str("crc16"),
            HashAlgorithm::Crc32 => f.write_str("crc32"),
        }
    }
}

/// Limits and hashing options for path enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumeratorConfig {
    /// How many times a single path may enter the same state.
    pub max_visits_per_state: usize,
    /// Optional hard ceiling on the number of transitions in a path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_path_depth: Option<usize>,
    /// Checksum used for path hashes.
    pub hash_algorithm: HashAlgorithm,
}

impl Default for EnumeratorConfig {
    fn default() -> Self {
        Self {
            max_visits_per_state: 1,
            max_path_depth: None,
            hash_algorithm: HashAlgorithm::Crc16,
        }
    }
}

impl EnumeratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_visits(mut self, max_visits_per_state: usize) -> Self {
        self.max_visits_per_state = max_visits_per_state;
        self
    }

    pub fn with_max_depth(mut self, max_path_depth: usize) -> Self {
        self.max_path_depth = Some(max_path_depth);
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Rejects limits below 1.
    pub fn validate(&self) -> Result<(), EnumeratorError> {
        if self.max_visits_per_state < 1 {
            return Err(EnumeratorError::InvalidMaxVisits {
                value: self.max_visits_per_state,
            });
        }
        if let Some(depth) = self.max_path_depth {
            if depth < 1 {
                return Err(EnumeratorError::InvalidMaxDepth { value: depth });
            }
        }
        Ok(())
    }
}
