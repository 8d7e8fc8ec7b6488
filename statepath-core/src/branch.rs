//! Branches: one guarded alternative for handling an event in a state.
//!
//! A branch carries an optional labelled guard, exactly one transition
//! directive and at most one side effect. Emitted-event metadata documents
//! which follow-up events the side effect may produce; it never drives
//! control flow but does feed path hashing.

use crate::error::BranchViolation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Guard predicate over (state, event).
pub type GuardFn<S, E> = Arc<dyn Fn(&S, &E) -> bool + Send + Sync>;

/// Side effect run after a transition is applied.
///
/// The state argument is the post-transition state. A returned event is
/// processed before anything else waiting in the queue.
pub type SideEffectFn<S, E> = Arc<dyn Fn(&S, &E) -> Option<E> + Send + Sync>;

/// A labelled guard predicate.
pub struct Guard<S, E> {
    label: String,
    predicate: GuardFn<S, E>,
}

impl<S, E> Guard<S, E> {
    /// Creates a guard from a label and a predicate.
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&S, &E) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// The label used in path hashes and diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Evaluates the predicate.
    pub fn check(&self, state: &S, event: &E) -> bool {
        (self.predicate)(state, event)
    }
}

impl<S, E> Clone for Guard<S, E> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<S, E> fmt::Debug for Guard<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("label", &self.label).finish()
    }
}

/// What happens to the current state when a branch is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<S> {
    /// Move to the given state.
    TransitionTo(S),
    /// Stay in the current state. A log entry is still recorded.
    DoNotTransition,
}

impl<S> Directive<S> {
    /// Returns the state the machine is in after applying this directive.
    pub fn resolve<'a>(&'a self, current: &'a S) -> &'a S {
        match self {
            Directive::TransitionTo(target) => target,
            Directive::DoNotTransition => current,
        }
    }
}

/// Documentation of an event a side effect may emit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmittedEvent {
    /// Free-form label describing when the event is emitted.
    pub label: String,
    /// Name of the emitted event variant.
    pub event: String,
}

impl EmittedEvent {
    pub fn new(label: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            event: event.into(),
        }
    }

    /// Canonical descriptor used when hashing paths.
    pub fn descriptor(&self) -> String {
        format!("{}:{}", self.label, self.event)
    }
}

/// A validated branch.
pub struct Branch<S, E> {
    guard: Option<Guard<S, E>>,
    directive: Directive<S>,
    side_effect: Option<SideEffectFn<S, E>>,
    emitted: Vec<EmittedEvent>,
}

impl<S, E> Branch<S, E> {
    pub fn guard(&self) -> Option<&Guard<S, E>> {
        self.guard.as_ref()
    }

    pub fn directive(&self) -> &Directive<S> {
        &self.directive
    }

    pub fn emitted(&self) -> &[EmittedEvent] {
        &self.emitted
    }

    pub fn has_side_effect(&self) -> bool {
        self.side_effect.is_some()
    }

    /// Returns true if the branch has no guard or its guard passes.
    pub fn matches(&self, state: &S, event: &E) -> bool {
        self.guard.as_ref().map_or(true, |g| g.check(state, event))
    }

    /// Runs the side effect, if any, against the post-transition state.
    pub fn run_side_effect(&self, state: &S, event: &E) -> Option<E> {
        self.side_effect.as_ref().and_then(|f| f(state, event))
    }
}

impl<S: Clone, E> Clone for Branch<S, E> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            directive: self.directive.clone(),
            side_effect: self.side_effect.clone(),
            emitted: self.emitted.clone(),
        }
    }
}

impl<S: fmt::Debug, E> fmt::Debug for Branch<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field("guard", &self.guard)
            .field("directive", &self.directive)
            .field("side_effect", &self.side_effect.is_some())
            .field("emitted", &self.emitted)
            .finish()
    }
}

/// Fluent builder for a branch.
///
/// Builder calls never fail; shape violations are reported by
/// [`BranchBuilder::build`], which the graph builder calls for every branch.
pub struct BranchBuilder<S, E> {
    guards: Vec<Guard<S, E>>,
    directives: Vec<Directive<S>>,
    side_effects: Vec<SideEffectFn<S, E>>,
    emitted: Vec<EmittedEvent>,
}

impl<S: 'static, E: 'static> BranchBuilder<S, E> {
    pub fn new() -> Self {
        Self {
            guards: Vec::new(),
            directives: Vec::new(),
            side_effects: Vec::new(),
            emitted: Vec::new(),
        }
    }

    /// Adds a labelled guard.
    pub fn guard<F>(mut self, label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&S, &E) -> bool + Send + Sync + 'static,
    {
        self.guards.push(Guard::new(label, predicate));
        self
    }

    /// Moves to `state` when the branch is selected.
    pub fn transition_to(mut self, state: S) -> Self {
        self.directives.push(Directive::TransitionTo(state));
        self
    }

    /// Keeps the current state when the branch is selected.
    pub fn do_not_transition(mut self) -> Self {
        self.directives.push(Directive::DoNotTransition);
        self
    }

    /// Sets the side effect run after the transition.
    pub fn side_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&S, &E) -> Option<E> + Send + Sync + 'static,
    {
        self.side_effects.push(Arc::new(effect));
        self
    }

    /// Declares an event the side effect may emit.
    pub fn emits(mut self, label: impl Into<String>, event: impl Into<String>) -> Self {
        self.emitted.push(EmittedEvent::new(label, event));
        self
    }

    /// Names of the declared emitted events.
    pub(crate) fn emitted_events(&self) -> impl Iterator<Item = &str> {
        self.emitted.iter().map(|e| e.event.as_str())
    }

    /// Validates the branch shape.
    pub fn build(mut self) -> Result<Branch<S, E>, BranchViolation> {
        if self.directives.len() > 1 {
            return Err(BranchViolation::MultipleDirectives);
        }
        if self.side_effects.len() > 1 {
            return Err(BranchViolation::MultipleSideEffects);
        }
        if self.guards.len() > 1 {
            return Err(BranchViolation::MultipleGuards);
        }
        if !self.emitted.is_empty() && self.side_effects.is_empty() {
            return Err(BranchViolation::EmitsWithoutSideEffect);
        }
        let directive = self
            .directives
            .pop()
            .ok_or(BranchViolation::MissingDirective)?;

        Ok(Branch {
            guard: self.guards.pop(),
            directive,
            side_effect: self.side_effects.pop(),
            emitted: self.emitted,
        })
    }
}

impl<S: 'static, E: 'static> Default for BranchBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
