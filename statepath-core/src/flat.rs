//! Flattened map form of a state graph.
//!
//! The path enumerator never touches closures; it only needs names. A flat
//! graph maps each state name to its outgoing edges, each edge carrying the
//! event name, target state, guard label and emitted-event metadata. It can
//! be produced from a [`StateGraph`](crate::StateGraph) or loaded from JSON
//! or YAML:
//!
//! ```json
//! {
//!   "initial": "Idle",
//!   "states": {
//!     "Idle": [{"event": "Start", "target": "Running"}],
//!     "Running": [
//!       {"event": "Stop", "target": "Idle", "guard": "graceful"},
//!       {"event": "Stop", "target": "Failed", "guard": "forced"}
//!     ]
//!   }
//! }
//! ```

use crate::branch::EmittedEvent;
use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One outgoing edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatEdge {
    /// Event that triggers the edge.
    pub event: String,

    /// Target state. Equal to the source state for `DoNotTransition`.
    pub target: String,

    /// Optional guard label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,

    /// Events the branch's side effect may emit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emitted: Vec<EmittedEvent>,
}

impl FlatEdge {
    pub fn new(event: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            target: target.into(),
            guard: None,
            emitted: Vec::new(),
        }
    }

    pub fn with_guard(mut self, label: impl Into<String>) -> Self {
        self.guard = Some(label.into());
        self
    }

    pub fn with_emitted(mut self, label: impl Into<String>, event: impl Into<String>) -> Self {
        self.emitted.push(EmittedEvent::new(label, event));
        self
    }
}

/// State name -> outgoing edges, plus the initial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatGraph {
    /// Initial state name.
    pub initial: String,

    /// Outgoing edges per state. States without an entry have no edges.
    #[serde(default)]
    pub states: BTreeMap<String, Vec<FlatEdge>>,
}

impl FlatGraph {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            initial: initial.into(),
            states: BTreeMap::new(),
        }
    }

    /// Adds an edge leaving `from`.
    pub fn with_edge(mut self, from: impl Into<String>, edge: FlatEdge) -> Self {
        self.states.entry(from.into()).or_default().push(edge);
        self
    }

    /// Outgoing edges of a state, in insertion order.
    pub fn edges_from(&self, state: &str) -> &[FlatEdge] {
        self.states.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.states.values().map(Vec::len).sum()
    }

    /// Parses and validates a flat graph from JSON.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let graph: FlatGraph = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Parses and validates a flat graph from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, GraphError> {
        let graph: FlatGraph = serde_yaml::from_str(yaml)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Serializes the graph as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that no name is empty.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.initial.trim().is_empty() {
            return Err(GraphError::InvalidFlatGraph {
                reason: "initial state is empty".to_string(),
            });
        }

        for (state, edges) in &self.states {
            if state.trim().is_empty() {
                return Err(GraphError::InvalidFlatGraph {
                    reason: "state name is empty".to_string(),
                });
            }
            for edge in edges {
                if edge.event.trim().is_empty() {
                    return Err(GraphError::InvalidFlatGraph {
                        reason: format!("edge from '{}' has an empty event name", state),
                    });
                }
                if edge.target.trim().is_empty() {
                    return Err(GraphError::InvalidFlatGraph {
                        reason: format!(
                            "edge '{}' from '{}' has an empty target",
                            edge.event, state
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}
