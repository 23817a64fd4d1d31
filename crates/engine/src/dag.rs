//! Topological validation — the hard gate `strict` mode uses.
//!
//! Structural invariants (unique node IDs, resolvable edge endpoints) are
//! already enforced by [`flowcraft_model::BlueprintIndex::build`]; this
//! module adds the one check that's optional per spec §3 invariant 4: a
//! cycle is tolerated unless the run was started in `strict` mode, in
//! which case [`CycleDetected`](EngineError::InvalidBlueprint) is raised
//! before a single node runs.

use flowcraft_model::BlueprintIndex;

use crate::graph::{analyze, GraphFacts};

/// Run graph analysis and, if `strict` is set, turn any detected cycle into
/// a hard error.
pub fn validate_strict(index: &BlueprintIndex<'_>, strict: bool) -> Result<GraphFacts, String> {
    let facts = analyze(index);
    if strict && !facts.is_dag {
        return Err(format!(
            "strict mode: blueprint graph contains {} cycle(s), e.g. {:?}",
            facts.cycles.len(),
            facts.cycles.first()
        ));
    }
    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcraft_model::{Blueprint, Edge, NodeDefinition};

    fn node(id: &str) -> NodeDefinition {
        NodeDefinition { id: id.into(), uses: "noop".into(), params: None, inputs: None, config: None }
    }
    fn edge(from: &str, to: &str) -> Edge {
        Edge { from: from.into(), to: to.into(), action: None, condition: None, transform: None }
    }

    #[test]
    fn cyclic_blueprint_passes_when_not_strict() {
        let bp = Blueprint::new("bp", vec![node("a"), node("b")], vec![edge("a", "b"), edge("b", "a")]);
        let idx = BlueprintIndex::build(&bp, None).unwrap();
        assert!(validate_strict(&idx, false).is_ok());
    }

    #[test]
    fn cyclic_blueprint_rejected_when_strict() {
        let bp = Blueprint::new("bp", vec![node("a"), node("b")], vec![edge("a", "b"), edge("b", "a")]);
        let idx = BlueprintIndex::build(&bp, None).unwrap();
        assert!(validate_strict(&idx, true).is_err());
    }
}
