//! JSON manifest of previously generated tests.

use crate::engine::{PreviousTests, SyncAction};
use crate::error::ManifestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statepath_paths::TestCase;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Obsolete annotation carried by a test whose path is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsoleteMark {
    pub reason: String,
    pub marked_at: DateTime<Utc>,
}

/// One previously generated test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub expected_transitions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obsolete: Option<ObsoleteMark>,
}

impl ManifestEntry {
    pub fn new(name: impl Into<String>, expected_transitions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            expected_transitions,
            obsolete: None,
        }
    }

    /// Sets the obsolete mark unless one is already present.
    pub fn mark_obsolete(&mut self, reason: impl Into<String>, marked_at: DateTime<Utc>) -> bool {
        if self.obsolete.is_some() {
            return false;
        }
        self.obsolete = Some(ObsoleteMark {
            reason: reason.into(),
            marked_at,
        });
        true
    }

    pub fn is_obsolete(&self) -> bool {
        self.obsolete.is_some()
    }
}

/// Previously generated tests keyed by hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Builds a manifest recording every test case.
    ///
    /// The first case wins when hashes collide.
    pub fn from_test_cases(cases: &[TestCase]) -> Self {
        let mut entries = BTreeMap::new();
        for case in cases {
            entries
                .entry(case.hash.clone())
                .or_insert_with(|| ManifestEntry::new(&case.name, case.expected_transitions.clone()));
        }
        Self { entries }
    }

    /// Loads a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads a manifest, or returns an empty one if the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Writes the manifest as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|source| {
            ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Recorded transitions of every entry, obsolete ones included.
    pub fn previous_tests(&self) -> PreviousTests {
        self.entries
            .iter()
            .map(|(hash, entry)| (hash.clone(), entry.expected_transitions.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies sync actions. Entries are never removed and names never
    /// change; only the expected transitions and obsolete marks are
    /// rewritten.
    ///
    /// Returns the number of entries that changed.
    pub fn apply(&mut self, actions: &[SyncAction]) -> usize {
        let mut changed = 0;
        for action in actions {
            let applied = match action {
                SyncAction::Append(case) => {
                    if self.entries.contains_key(&case.hash) {
                        false
                    } else {
                        self.entries.insert(
                            case.hash.clone(),
                            ManifestEntry::new(&case.name, case.expected_transitions.clone()),
                        );
                        true
                    }
                }
                SyncAction::ReplaceExpected { hash, current, .. } => {
                    match self.entries.get_mut(hash) {
                        Some(entry) if entry.expected_transitions != *current => {
                            entry.expected_transitions = current.clone();
                            true
                        }
                        _ => false,
                    }
                }
                SyncAction::MarkObsolete {
                    hash,
                    reason,
                    marked_at,
                    ..
                } => self
                    .entries
                    .get_mut(hash)
                    .is_some_and(|entry| entry.mark_obsolete(reason.as_str(), *marked_at)),
                SyncAction::Restore { hash } => self
                    .entries
                    .get_mut(hash)
                    .is_some_and(|entry| entry.obsolete.take().is_some()),
            };
            if applied {
                tracing::debug!("Applied {} to {}", action.kind(), action.hash());
                changed += 1;
            }
        }
        changed
    }
}
