//! Builds the implementation registry every subcommand that executes a
//! blueprint shares — currently just the built-in `subflow` node (spec
//! §4.7.3). Application-specific implementations would be registered here
//! too, alongside it.

use std::sync::Arc;

use flowcraft_engine::subflow::{BlueprintRegistry, SubflowNode};
use flowcraft_nodes::{Implementation, ImplementationRegistry};

/// `subflow` recurses into `flowcraft_engine::orchestrator::run` against the
/// registry it is handed; that registry is necessarily built *before*
/// `subflow` itself can be added to it, so a blueprint invoked through
/// `subflow` cannot itself contain another `subflow` node. Application
/// implementations registered here are available at every nesting depth.
pub fn build(blueprints: Arc<BlueprintRegistry>) -> ImplementationRegistry {
    let inner = Arc::new(ImplementationRegistry::new());
    ImplementationRegistry::new().register("subflow", Implementation::function(SubflowNode::new(blueprints, inner)))
}
