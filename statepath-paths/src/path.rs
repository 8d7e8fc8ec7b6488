//! Enumerated paths.

use crate::config::HashAlgorithm;
use serde::{Deserialize, Serialize};
use statepath_core::{transition_entry, EmittedEvent};

/// One step of a path.
///
/// Every step but the last carries the event taken and the state it led to.
/// The last step names the state the path ends in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub state: String,
    pub event: Option<String>,
    pub next_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emitted: Vec<EmittedEvent>,
}

impl PathStep {
    /// Canonical hash contribution: `event|guard|descriptors`.
    ///
    /// Emitted-event descriptors are sorted and comma-joined. Terminal steps
    /// contribute nothing.
    pub fn canonical(&self) -> Option<String> {
        let event = self.event.as_deref()?;
        let mut descriptors: Vec<String> =
            self.emitted.iter().map(EmittedEvent::descriptor).collect();
        descriptors.sort();
        Some(format!(
            "{}|{}|{}",
            event,
            self.guard.as_deref().unwrap_or(""),
            descriptors.join(",")
        ))
    }
}

/// A path from the initial state to a point where traversal stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPath {
    pub steps: Vec<PathStep>,
    /// Number of transitions in the path.
    pub depth: usize,
    pub hash: String,
}

impl TestPath {
    /// Builds a path and computes its hash.
    pub fn new(steps: Vec<PathStep>, algorithm: HashAlgorithm) -> Self {
        let depth = steps.iter().filter(|s| s.event.is_some()).count();
        let hash = algorithm.hash(canonical_string(&steps).as_bytes());
        Self { steps, depth, hash }
    }

    pub fn start_state(&self) -> &str {
        self.steps.first().map(|s| s.state.as_str()).unwrap_or("")
    }

    pub fn end_state(&self) -> &str {
        self.steps.last().map(|s| s.state.as_str()).unwrap_or("")
    }

    /// Event names in the order they are taken.
    pub fn events(&self) -> Vec<String> {
        self.steps.iter().filter_map(|s| s.event.clone()).collect()
    }

    /// Transitions in runtime log format: `{from}_{event}_{to}`.
    pub fn transitions(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|s| match (&s.event, &s.next_state) {
                (Some(event), Some(next)) => Some(transition_entry(&s.state, event, next)),
                _ => None,
            })
            .collect()
    }

    /// Number of times the path enters `state`, counting the start.
    pub fn visits(&self, state: &str) -> usize {
        let start = usize::from(self.start_state() == state);
        start
            + self
                .steps
                .iter()
                .filter(|s| s.next_state.as_deref() == Some(state))
                .count()
    }
}

/// Concatenates the canonical contribution of every step.
pub fn canonical_string(steps: &[PathStep]) -> String {
    steps.iter().filter_map(PathStep::canonical).collect()
}
