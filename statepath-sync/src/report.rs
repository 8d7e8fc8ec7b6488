//! Sync classification results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one test hash relative to the current enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// Only in the current enumeration.
    New,
    /// In both, expected transitions equal.
    Unchanged,
    /// In both, expected transitions differ.
    Modified,
    /// Only in the previous tests.
    Obsolete,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::New => "NEW",
            SyncStatus::Unchanged => "UNCHANGED",
            SyncStatus::Modified => "MODIFIED",
            SyncStatus::Obsolete => "OBSOLETE",
        };
        f.write_str(s)
    }
}

/// Hashes grouped by status. Each list is sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub new: Vec<String>,
    pub unchanged: Vec<String>,
    pub modified: Vec<String>,
    pub obsolete: Vec<String>,
    /// Number of distinct hashes classified.
    pub total: usize,
    pub timestamp: DateTime<Utc>,
}

impl SyncReport {
    pub(crate) fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            new: Vec::new(),
            unchanged: Vec::new(),
            modified: Vec::new(),
            obsolete: Vec::new(),
            total: 0,
            timestamp,
        }
    }

    pub(crate) fn push(&mut self, hash: String, status: SyncStatus) {
        match status {
            SyncStatus::New => self.new.push(hash),
            SyncStatus::Unchanged => self.unchanged.push(hash),
            SyncStatus::Modified => self.modified.push(hash),
            SyncStatus::Obsolete => self.obsolete.push(hash),
        }
        self.total += 1;
    }

    pub(crate) fn finish(mut self) -> Self {
        self.new.sort();
        self.unchanged.sort();
        self.modified.sort();
        self.obsolete.sort();
        self
    }

    /// Looks up the status of a hash.
    pub fn status_of(&self, hash: &str) -> Option<SyncStatus> {
        let contains = |list: &[String]| list.binary_search_by(|h| h.as_str().cmp(hash)).is_ok();
        if contains(&self.new) {
            Some(SyncStatus::New)
        } else if contains(&self.unchanged) {
            Some(SyncStatus::Unchanged)
        } else if contains(&self.modified) {
            Some(SyncStatus::Modified)
        } else if contains(&self.obsolete) {
            Some(SyncStatus::Obsolete)
        } else {
            None
        }
    }

    /// True when every hash is UNCHANGED.
    pub fn is_clean(&self) -> bool {
        self.new.is_empty() && self.modified.is_empty() && self.obsolete.is_empty()
    }

    pub fn count(&self, status: SyncStatus) -> usize {
        match status {
            SyncStatus::New => self.new.len(),
            SyncStatus::Unchanged => self.unchanged.len(),
            SyncStatus::Modified => self.modified.len(),
            SyncStatus::Obsolete => self.obsolete.len(),
        }
    }
}
