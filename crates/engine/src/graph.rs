//! Graph analysis (spec §4.4) — cycle detection, start/terminal nodes,
//! topology facts. Linear in `|V| + |E|` via DFS with a recursion stack.
//!
//! This is distinct from [`crate::dag::validate_and_sort`]'s Kahn's-algorithm
//! validator: analysis always succeeds and reports what it found (cycles
//! are *allowed but suspect*, not rejected) while validation is the hard
//! gate `strict` mode uses to reject a cyclic blueprint outright.

use std::collections::HashSet;

use flowcraft_model::BlueprintIndex;

/// A cycle as the sequence of node ids visited, ending back at its start.
pub type Cycle = Vec<String>;

/// What [`analyze`] reports about a blueprint's graph shape.
#[derive(Debug, Clone, Default)]
pub struct GraphFacts {
    pub cycles: Vec<Cycle>,
    pub start_nodes: Vec<String>,
    pub terminal_nodes: Vec<String>,
    pub is_dag: bool,
}

/// Depth-first search with a recursion set, detecting every back-edge and
/// reporting it as a cycle.
pub fn analyze(index: &BlueprintIndex<'_>) -> GraphFacts {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: Vec<&str> = Vec::new();
    let mut on_stack_set: HashSet<&str> = HashSet::new();
    let mut cycles: Vec<Cycle> = Vec::new();

    for start in index.node_ids() {
        if !visited.contains(start) {
            dfs(index, start, &mut visited, &mut on_stack, &mut on_stack_set, &mut cycles);
        }
    }

    GraphFacts {
        is_dag: cycles.is_empty(),
        cycles,
        start_nodes: index.start_nodes().into_iter().map(str::to_string).collect(),
        terminal_nodes: index.terminal_nodes().into_iter().map(str::to_string).collect(),
    }
}

fn dfs<'a>(
    index: &BlueprintIndex<'a>,
    node: &'a str,
    visited: &mut HashSet<&'a str>,
    on_stack: &mut Vec<&'a str>,
    on_stack_set: &mut HashSet<&'a str>,
    cycles: &mut Vec<Cycle>,
) {
    visited.insert(node);
    on_stack.push(node);
    on_stack_set.insert(node);

    for edge in index.outgoing(node) {
        let next = edge.to.as_str();
        if on_stack_set.contains(next) {
            // Back-edge: emit the cycle from `next`'s position on the stack
            // through the current node, then back to `next`.
            let start_pos = on_stack.iter().position(|&n| n == next).unwrap();
            let mut cycle: Cycle = on_stack[start_pos..].iter().map(|s| s.to_string()).collect();
            cycle.push(next.to_string());
            cycles.push(cycle);
        } else if !visited.contains(next) {
            dfs(index, next, visited, on_stack, on_stack_set, cycles);
        }
    }

    on_stack.pop();
    on_stack_set.remove(node);
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
    fn acyclic_diamond_reports_is_dag() {
        let bp = Blueprint::new(
            "bp",
            vec![node("a"), node("b"), node("c"), node("d")],
            vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")],
        );
        let idx = BlueprintIndex::build(&bp, None).unwrap();
        let facts = analyze(&idx);
        assert!(facts.is_dag);
        assert!(facts.cycles.is_empty());
        assert_eq!(facts.start_nodes, vec!["a"]);
        assert_eq!(facts.terminal_nodes, vec!["d"]);
    }

    #[test]
    fn cycle_is_reported_not_rejected() {
        let bp = Blueprint::new(
            "bp",
            vec![node("a"), node("b"), node("c")],
            vec![edge("a", "b"), edge("b", "c"), edge("c", "a")],
        );
        let idx = BlueprintIndex::build(&bp, None).unwrap();
        let facts = analyze(&idx);
        assert!(!facts.is_dag);
        assert_eq!(facts.cycles.len(), 1);
        assert_eq!(facts.cycles[0].first(), facts.cycles[0].last());
    }
}
