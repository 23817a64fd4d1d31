//! The blueprint data model — pure, serializable, no execution behaviour.
//!
//! A [`Blueprint`] is the source of truth for what a workflow looks like: an
//! identifier, an ordered list of [`NodeDefinition`]s, an ordered list of
//! [`Edge`]s, and optional metadata. It carries no runtime state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How many predecessors must complete before a fan-in node becomes ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// Every predecessor reached via a taken edge must be in `completed`.
    #[default]
    All,
    /// The first predecessor to arrive fires the node; later arrivals don't.
    Any,
}

/// Per-node execution tuning: retries, timeout, fallback, join semantics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    /// Maximum attempts of the core implementation (>= 1). `None` means 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Delay between attempts, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
    /// Absolute per-attempt timeout, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// `uses` key of an implementation to run once if retries are exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// Fan-in semantics for this node.
    #[serde(default)]
    pub join_strategy: JoinStrategy,
}

impl NodeConfig {
    /// Effective retry budget — always at least 1.
    pub fn effective_max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(1).max(1)
    }
}

/// How a node's input is resolved from the run context before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeInputs {
    /// Read a single context key and pass it through directly.
    Key(String),
    /// Map local input names to context keys.
    Mapping(HashMap<String, String>),
}

/// A single step in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Unique identifier within this blueprint (referenced by edges).
    pub id: String,
    /// Implementation key resolved against the registry at dispatch time.
    pub uses: String,
    /// Static parameters handed to the implementation alongside the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// How this node's input is pulled from the context / incoming edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<NodeInputs>,
    /// Retry / timeout / fallback / join tuning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<NodeConfig>,
}

impl NodeDefinition {
    pub fn config(&self) -> NodeConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// A directed edge between two nodes in the same blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Selects this edge when the source's result carries a matching action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Must evaluate truthy (via the expression evaluator) for this edge to
    /// be taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Rewrites the data flowing along this edge before it reaches `to`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

/// A complete, independently serializable workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Blueprint {
    pub fn new(id: impl Into<String>, nodes: Vec<NodeDefinition>, edges: Vec<Edge>) -> Self {
        Self {
            id: id.into(),
            name: None,
            nodes,
            edges,
            metadata: None,
        }
    }
}
