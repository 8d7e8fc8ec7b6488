//! # statepath-core
//!
//! State graph model and runtime for statepath.
//!
//! This crate provides:
//! - Naming traits for closed state and event enums
//! - Branch and graph definitions with eager shape validation
//! - The flattened map form consumed by the path enumerator
//! - A single-writer runtime that drains events in priority order

pub mod branch;
pub mod error;
pub mod flat;
pub mod graph;
pub mod name;
pub mod runtime;

pub use branch::{Branch, BranchBuilder, Directive, EmittedEvent, Guard};
pub use error::{BranchViolation, GraphError};
pub use flat::{FlatEdge, FlatGraph};
pub use graph::{EventTransition, StateDefinition, StateGraph, StateGraphBuilder};
pub use name::{EventName, StateName};
pub use runtime::{transition_entry, RuntimePhase, RuntimeStats, StateMachine, TransitionRecord};
