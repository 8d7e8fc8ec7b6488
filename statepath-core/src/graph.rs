//! State graph definitions.
//!
//! A graph maps every defined state to the events it handles. For each
//! (state, event) pair an ordered list of branches is evaluated top to
//! bottom; the first branch whose guard passes (or that has no guard) wins.
//!
//! ```rust
//! use statepath_core::{EventName, StateGraph, StateName};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Order { Created, Paid }
//!
//! impl StateName for Order {
//!     fn name(&self) -> &str {
//!         match self {
//!             Self::Created => "Created",
//!             Self::Paid => "Paid",
//!         }
//!     }
//! }
//!
//! enum OrderEvent { Pay }
//!
//! impl EventName for OrderEvent {
//!     fn name(&self) -> &str { "Pay" }
//!     fn variants() -> &'static [&'static str] { &["Pay"] }
//! }
//!
//! let graph = StateGraph::<Order, OrderEvent>::builder()
//!     .initial(Order::Created)
//!     .state(Order::Created, |s| s.transition("Pay", Order::Paid))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(graph.initial(), &Order::Created);
//! ```

use crate::branch::{Branch, BranchBuilder};
use crate::error::GraphError;
use crate::flat::{FlatEdge, FlatGraph};
use crate::name::{EventName, StateName};
use std::collections::BTreeMap;

/// Ordered branches for one (state, event) pair.
pub struct EventTransition<S, E> {
    event: String,
    branches: Vec<Branch<S, E>>,
}

impl<S, E> EventTransition<S, E> {
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn branches(&self) -> &[Branch<S, E>] {
        &self.branches
    }

    /// Selects the first branch whose guard is absent or passes.
    pub fn select(&self, state: &S, event: &E) -> Option<&Branch<S, E>> {
        self.branches.iter().find(|b| b.matches(state, event))
    }
}

/// Event transitions registered for one state.
pub struct StateDefinition<S, E> {
    state: S,
    transitions: BTreeMap<String, EventTransition<S, E>>,
}

impl<S, E> StateDefinition<S, E> {
    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn transition(&self, event: &str) -> Option<&EventTransition<S, E>> {
        self.transitions.get(event)
    }

    /// Event transitions in event-name order.
    pub fn transitions(&self) -> impl Iterator<Item = &EventTransition<S, E>> {
        self.transitions.values()
    }
}

/// Immutable, validated state graph.
pub struct StateGraph<S, E> {
    initial: S,
    states: BTreeMap<String, StateDefinition<S, E>>,
}

impl<S, E> StateGraph<S, E>
where
    S: StateName + Clone + 'static,
    E: EventName + 'static,
{
    /// Starts building a graph.
    pub fn builder() -> StateGraphBuilder<S, E> {
        StateGraphBuilder::new()
    }

    pub fn initial(&self) -> &S {
        &self.initial
    }

    /// Looks up the definition registered for a state.
    pub fn definition(&self, state: &S) -> Option<&StateDefinition<S, E>> {
        self.states.get(state.name())
    }

    /// Looks up the branches for the given state and event.
    pub fn event_transition(&self, state: &S, event: &E) -> Option<&EventTransition<S, E>> {
        self.states
            .get(state.name())
            .and_then(|def| def.transitions.get(event.name()))
    }

    /// Names of all states that have a definition, sorted.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(|s| s.as_str())
    }

    /// Returns all state definitions in state-name order.
    pub fn definitions(&self) -> impl Iterator<Item = &StateDefinition<S, E>> {
        self.states.values()
    }

    /// Flattens the graph into the map form used by the path enumerator.
    ///
    /// Every branch becomes one edge. `DoNotTransition` branches become
    /// self-edges.
    pub fn to_flat(&self) -> FlatGraph {
        let mut flat = FlatGraph::new(self.initial.name());
        for (name, def) in &self.states {
            let edges = def
                .transitions
                .values()
                .flat_map(|t| {
                    t.branches.iter().map(|b| FlatEdge {
                        event: t.event.clone(),
                        target: b.directive().resolve(&def.state).name().to_string(),
                        guard: b.guard().map(|g| g.label().to_string()),
                        emitted: b.emitted().to_vec(),
                    })
                })
                .collect();
            flat.states.insert(name.clone(), edges);
        }
        flat
    }
}

/// Builder for the branches of one (state, event) pair.
pub struct EventTransitionBuilder<S, E> {
    event: String,
    branches: Vec<BranchBuilder<S, E>>,
}

impl<S: 'static, E: 'static> EventTransitionBuilder<S, E> {
    fn new(event: String) -> Self {
        Self {
            event,
            branches: Vec::new(),
        }
    }

    /// Appends a branch. Branches are evaluated in the order they are added.
    pub fn branch<F>(mut self, f: F) -> Self
    where
        F: FnOnce(BranchBuilder<S, E>) -> BranchBuilder<S, E>,
    {
        self.branches.push(f(BranchBuilder::new()));
        self
    }
}

/// Builder for the events handled by one state.
pub struct StateDefinitionBuilder<S, E> {
    state: S,
    events: Vec<EventTransitionBuilder<S, E>>,
}

impl<S: 'static, E: 'static> StateDefinitionBuilder<S, E> {
    fn new(state: S) -> Self {
        Self {
            state,
            events: Vec::new(),
        }
    }

    /// Registers the branches handling `event` in this state.
    pub fn on<F>(mut self, event: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(EventTransitionBuilder<S, E>) -> EventTransitionBuilder<S, E>,
    {
        self.events.push(f(EventTransitionBuilder::new(event.into())));
        self
    }

    /// Shorthand for a single unguarded branch moving to `target`.
    pub fn transition(self, event: impl Into<String>, target: S) -> Self {
        self.on(event, |t| t.branch(|b| b.transition_to(target)))
    }

    /// Shorthand for a single unguarded branch that keeps the current state.
    pub fn stay(self, event: impl Into<String>) -> Self {
        self.on(event, |t| t.branch(|b| b.do_not_transition()))
    }
}

/// Builder for [`StateGraph`].
pub struct StateGraphBuilder<S, E> {
    initial: Option<S>,
    states: Vec<StateDefinitionBuilder<S, E>>,
}

impl<S, E> StateGraphBuilder<S, E>
where
    S: StateName + Clone + 'static,
    E: EventName + 'static,
{
    pub fn new() -> Self {
        Self {
            initial: None,
            states: Vec::new(),
        }
    }

    /// Sets the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Registers the events handled by `state`.
    pub fn state<F>(mut self, state: S, f: F) -> Self
    where
        F: FnOnce(StateDefinitionBuilder<S, E>) -> StateDefinitionBuilder<S, E>,
    {
        self.states.push(f(StateDefinitionBuilder::new(state)));
        self
    }

    /// Validates every definition and builds the graph.
    ///
    /// The first violation in declaration order is returned.
    pub fn build(self) -> Result<StateGraph<S, E>, GraphError> {
        let initial = self.initial.ok_or(GraphError::MissingInitialState)?;
        let known_events = E::variants();

        let mut states = BTreeMap::new();
        for def in self.states {
            let state_name = def.state.name().to_string();
            if states.contains_key(&state_name) {
                return Err(GraphError::DuplicateState { state: state_name });
            }

            let mut transitions = BTreeMap::new();
            for et in def.events {
                if !known_events.contains(&et.event.as_str()) {
                    return Err(GraphError::UnknownEvent {
                        state: state_name,
                        event: et.event,
                    });
                }
                if transitions.contains_key(&et.event) {
                    return Err(GraphError::DuplicateEvent {
                        state: state_name,
                        event: et.event,
                    });
                }
                if et.branches.is_empty() {
                    return Err(GraphError::NoBranches {
                        state: state_name,
                        event: et.event,
                    });
                }

                let mut branches = Vec::with_capacity(et.branches.len());
                for (index, builder) in et.branches.into_iter().enumerate() {
                    if let Some(unknown) = builder
                        .emitted_events()
                        .find(|name| !known_events.contains(name))
                    {
                        return Err(GraphError::UnknownEvent {
                            state: state_name,
                            event: unknown.to_string(),
                        });
                    }
                    let branch = builder
                        .build()
                        .map_err(|violation| GraphError::InvalidBranch {
                            state: state_name.clone(),
                            event: et.event.clone(),
                            index,
                            violation,
                        })?;
                    branches.push(branch);
                }

                transitions.insert(
                    et.event.clone(),
                    EventTransition {
                        event: et.event,
                        branches,
                    },
                );
            }

            states.insert(
                state_name,
                StateDefinition {
                    state: def.state,
                    transitions,
                },
            );
        }

        tracing::debug!(
            "Built state graph: initial={}, {} defined states",
            initial.name(),
            states.len()
        );

        Ok(StateGraph { initial, states })
    }
}

impl<S, E> Default for StateGraphBuilder<S, E>
where
    S: StateName + Clone + 'static,
    E: EventName + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
