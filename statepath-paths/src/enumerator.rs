//! Depth-first path enumeration.
//!
//! Walks a [`FlatGraph`] from its initial state. Outgoing edges are taken in
//! a fixed order (event, guard label, target) so the same graph always yields
//! the same paths, hashes and test names.

use crate::case::TestCase;
use crate::config::EnumeratorConfig;
use crate::error::EnumeratorError;
use crate::path::{PathStep, TestPath};
use statepath_core::{EventName, FlatEdge, FlatGraph, StateGraph, StateName};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Enumerates test paths through a state graph.
#[derive(Debug, Clone)]
pub struct PathEnumerator {
    config: EnumeratorConfig,
}

impl PathEnumerator {
    /// Creates an enumerator, rejecting invalid limits.
    pub fn new(config: EnumeratorConfig) -> Result<Self, EnumeratorError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EnumeratorConfig {
        &self.config
    }

    /// Enumerates paths starting at the graph's initial state.
    pub fn enumerate(&self, graph: &FlatGraph) -> Vec<TestPath> {
        self.enumerate_from(graph, &graph.initial)
    }

    /// Enumerates paths starting at `initial`.
    pub fn enumerate_from(&self, graph: &FlatGraph, initial: &str) -> Vec<TestPath> {
        let edges = sorted_edges(graph);
        let mut walk = Walk::new(&edges, &self.config);
        walk.run(initial);

        tracing::info!(
            "Enumerated {} paths from {} ({} edges, max_visits={})",
            walk.paths.len(),
            initial,
            graph.edge_count(),
            self.config.max_visits_per_state
        );
        walk.paths
    }

    /// Flattens a typed graph and enumerates it.
    pub fn enumerate_graph<S, E>(&self, graph: &StateGraph<S, E>) -> Vec<TestPath>
    where
        S: StateName + Clone + 'static,
        E: EventName + 'static,
    {
        self.enumerate(&graph.to_flat())
    }

    /// Enumerates paths and converts them to named test cases.
    pub fn test_cases(&self, graph: &FlatGraph) -> Vec<TestCase> {
        self.enumerate(graph).iter().map(TestCase::from_path).collect()
    }
}

// ============================================================================
// Traversal
// ============================================================================

type EdgeMap<'g> = BTreeMap<&'g str, Vec<&'g FlatEdge>>;

/// Outgoing edges per state in traversal order.
fn sorted_edges(graph: &FlatGraph) -> EdgeMap<'_> {
    graph
        .states
        .iter()
        .map(|(state, edges)| {
            let mut sorted: Vec<&FlatEdge> = edges.iter().collect();
            sorted.sort_by(|a, b| {
                (&a.event, &a.guard, &a.target, &a.emitted)
                    .cmp(&(&b.event, &b.guard, &b.target, &b.emitted))
            });
            (state.as_str(), sorted)
        })
        .collect()
}

/// A state on the current path and the next edge to try from it.
struct Frame<'g> {
    state: &'g str,
    edges: &'g [&'g FlatEdge],
    next: usize,
    followed: bool,
}

struct Walk<'g> {
    edges: &'g EdgeMap<'g>,
    config: &'g EnumeratorConfig,
    steps: Vec<PathStep>,
    visits: HashMap<&'g str, usize>,
    seen: HashSet<(String, Vec<String>)>,
    paths: Vec<TestPath>,
}

impl<'g> Walk<'g> {
    fn new(edges: &'g EdgeMap<'g>, config: &'g EnumeratorConfig) -> Self {
        Self {
            edges,
            config,
            steps: Vec::new(),
            visits: HashMap::new(),
            seen: HashSet::new(),
            paths: Vec::new(),
        }
    }

    fn frame(&self, state: &'g str) -> Frame<'g> {
        let edges = self.edges.get(state).map(Vec::as_slice).unwrap_or(&[]);
        Frame {
            state,
            edges,
            next: 0,
            followed: false,
        }
    }

    fn can_follow(&self, edge: &FlatEdge) -> bool {
        if let Some(max_depth) = self.config.max_path_depth {
            if self.steps.len() >= max_depth {
                return false;
            }
        }
        let visits = self.visits.get(edge.target.as_str()).copied().unwrap_or(0);
        visits < self.config.max_visits_per_state
    }

    /// Depth-first walk with an explicit stack.
    ///
    /// `steps` always holds one entry per frame above the root, and `visits`
    /// counts the states on the current path.
    fn run(&mut self, initial: &'g str) {
        self.visits.insert(initial, 1);
        let mut stack = vec![self.frame(initial)];

        while let Some(frame) = stack.last_mut() {
            let Some(&edge) = frame.edges.get(frame.next) else {
                let (state, followed) = (frame.state, frame.followed);
                stack.pop();
                if !followed {
                    self.record(state);
                }
                if !stack.is_empty() {
                    self.steps.pop();
                    if let Some(count) = self.visits.get_mut(state) {
                        *count -= 1;
                    }
                }
                continue;
            };
            frame.next += 1;

            if !self.can_follow(edge) {
                continue;
            }
            frame.followed = true;

            let target = edge.target.as_str();
            self.steps.push(PathStep {
                state: frame.state.to_string(),
                event: Some(edge.event.clone()),
                next_state: Some(edge.target.clone()),
                guard: edge.guard.clone(),
                emitted: edge.emitted.clone(),
            });
            *self.visits.entry(target).or_insert(0) += 1;
            stack.push(self.frame(target));
        }
    }

    fn record(&mut self, end_state: &str) {
        if self.steps.is_empty() {
            return;
        }

        let mut steps = self.steps.clone();
        steps.push(PathStep {
            state: end_state.to_string(),
            event: None,
            next_state: None,
            guard: None,
            emitted: Vec::new(),
        });
        let path = TestPath::new(steps, self.config.hash_algorithm);

        let key = (path.hash.clone(), path.transitions());
        if !self.seen.insert(key) {
            tracing::debug!("Skipping duplicate path {}", path.hash);
            return;
        }

        tracing::debug!(
            "Recorded path {} (depth {}): {} -> {}",
            path.hash,
            path.depth,
            path.start_state(),
            path.end_state()
        );
        self.paths.push(path);
    }
}
