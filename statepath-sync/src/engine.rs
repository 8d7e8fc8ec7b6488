//! Classification and planning.
//!
//! The engine is pure: it reads the current test cases and the previous
//! tests and returns a report and a list of actions. Writing is left to
//! the caller, so a dry run performs the same classification.

use crate::manifest::Manifest;
use crate::report::{SyncReport, SyncStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statepath_paths::TestCase;
use std::collections::{BTreeMap, HashMap};

/// Previously generated tests: hash -> recorded expected transitions.
pub type PreviousTests = BTreeMap<String, Vec<String>>;

/// An edit the test writer should make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    /// Add a test for a new path.
    Append(TestCase),
    /// Replace only the expected-transitions block of an existing test.
    ReplaceExpected {
        hash: String,
        previous: Vec<String>,
        current: Vec<String>,
    },
    /// Annotate a test whose path no longer exists.
    MarkObsolete {
        hash: String,
        previous: Vec<String>,
        reason: String,
        marked_at: DateTime<Utc>,
    },
    /// Lift an obsolete mark from a test whose path exists again.
    Restore { hash: String },
}

impl SyncAction {
    pub fn hash(&self) -> &str {
        match self {
            SyncAction::Append(case) => &case.hash,
            SyncAction::ReplaceExpected { hash, .. }
            | SyncAction::MarkObsolete { hash, .. }
            | SyncAction::Restore { hash } => hash,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SyncAction::Append(_) => "append",
            SyncAction::ReplaceExpected { .. } => "replace_expected",
            SyncAction::MarkObsolete { .. } => "mark_obsolete",
            SyncAction::Restore { .. } => "restore",
        }
    }
}

/// Classification plus the actions derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub report: SyncReport,
    pub actions: Vec<SyncAction>,
}

impl SyncPlan {
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Classifies test hashes as NEW, UNCHANGED, MODIFIED or OBSOLETE.
#[derive(Debug, Clone, Default)]
pub struct SyncEngine;

impl SyncEngine {
    pub fn new() -> Self {
        Self
    }

    /// Classifies every hash present in either input.
    pub fn classify(&self, current: &[TestCase], previous: &PreviousTests) -> SyncReport {
        self.classify_at(current, previous, Utc::now())
    }

    pub fn classify_at(
        &self,
        current: &[TestCase],
        previous: &PreviousTests,
        now: DateTime<Utc>,
    ) -> SyncReport {
        let owners = owners(current);
        let mut report = SyncReport::empty(now);

        for (hash, case) in &owners {
            let status = match previous.get(*hash) {
                None => SyncStatus::New,
                Some(recorded) if *recorded == case.expected_transitions => SyncStatus::Unchanged,
                Some(_) => SyncStatus::Modified,
            };
            tracing::debug!("{} {}", status, case.name);
            report.push(hash.to_string(), status);
        }

        for hash in previous.keys() {
            if !owners.contains_key(hash.as_str()) {
                tracing::debug!("{} {}", SyncStatus::Obsolete, hash);
                report.push(hash.clone(), SyncStatus::Obsolete);
            }
        }

        let report = report.finish();
        tracing::info!(
            "Sync: {} new, {} unchanged, {} modified, {} obsolete",
            report.new.len(),
            report.unchanged.len(),
            report.modified.len(),
            report.obsolete.len()
        );
        report
    }

    /// Classifies against a manifest and derives the actions to apply.
    pub fn plan(&self, current: &[TestCase], manifest: &Manifest) -> SyncPlan {
        self.plan_at(current, manifest, Utc::now())
    }

    pub fn plan_at(&self, current: &[TestCase], manifest: &Manifest, now: DateTime<Utc>) -> SyncPlan {
        let previous = manifest.previous_tests();
        let report = self.classify_at(current, &previous, now);
        let owners = owners(current);
        let mut actions = Vec::new();

        for (hash, case) in &owners {
            let Some(entry) = manifest.entries.get(*hash) else {
                actions.push(SyncAction::Append((*case).clone()));
                continue;
            };
            if entry.obsolete.is_some() {
                actions.push(SyncAction::Restore {
                    hash: hash.to_string(),
                });
            }
            if entry.expected_transitions != case.expected_transitions {
                actions.push(SyncAction::ReplaceExpected {
                    hash: hash.to_string(),
                    previous: entry.expected_transitions.clone(),
                    current: case.expected_transitions.clone(),
                });
            }
        }

        for hash in &report.obsolete {
            let Some(entry) = manifest.entries.get(hash) else {
                continue;
            };
            if entry.obsolete.is_some() {
                continue;
            }
            actions.push(SyncAction::MarkObsolete {
                hash: hash.clone(),
                previous: entry.expected_transitions.clone(),
                reason: obsolete_reason(&entry.expected_transitions),
                marked_at: now,
            });
        }

        SyncPlan { report, actions }
    }
}

/// Maps each hash to the first test case that carries it.
fn owners(current: &[TestCase]) -> BTreeMap<&str, &TestCase> {
    let mut owners: BTreeMap<&str, &TestCase> = BTreeMap::new();
    let mut collisions: HashMap<&str, usize> = HashMap::new();

    for case in current {
        if owners.contains_key(case.hash.as_str()) {
            *collisions.entry(case.hash.as_str()).or_insert(0) += 1;
            continue;
        }
        owners.insert(&case.hash, case);
    }

    for (hash, count) in collisions {
        tracing::warn!(
            "Hash {} is shared by {} later paths; keeping {}",
            hash,
            count,
            owners.get(hash).map(|c| c.name.as_str()).unwrap_or("")
        );
    }
    owners
}

fn obsolete_reason(previous: &[String]) -> String {
    if previous.is_empty() {
        "Path no longer exists in the state graph".to_string()
    } else {
        format!(
            "Path no longer exists in the state graph: {}",
            previous.join(" -> ")
        )
    }
}
