//! `flowcraft-model` — the blueprint data model.
//!
//! Pure data: nodes, edges, configs, and the invariants that make a
//! blueprint well-formed. No execution behaviour lives here — see
//! `flowcraft-engine` for that.

pub mod blueprint;
pub mod error;
pub mod index;
pub mod result;

pub use blueprint::{Blueprint, Edge, JoinStrategy, NodeConfig, NodeDefinition, NodeInputs};
pub use error::ModelError;
pub use index::BlueprintIndex;
pub use result::{NodeResult, StructuredError};
