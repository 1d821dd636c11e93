//! Built-in structural checks.
//!
//! Two passes over the graph:
//! 1. exec-flow reachability: nodes that take part in control flow but can
//!    never be reached from an event node are flagged as warnings;
//! 2. required inputs: a catalog pin marked `required` that is left
//!    unconnected is an error.

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;

use crate::graph::{
    BlueprintGraph, NodeCatalog, NodeId, PinDirection, PinKind, PinRef,
};

use super::{CompileReport, Diagnostic, GraphCompiler};

/// Structural compiler over a node catalog.
pub struct StructuralCompiler {
    catalog: NodeCatalog,
}

impl StructuralCompiler {
    pub fn new(catalog: NodeCatalog) -> Self {
        Self { catalog }
    }

    fn is_event(&self, node_type: &str) -> bool {
        self.catalog
            .get(node_type)
            .map(|spec| spec.is_event)
            .unwrap_or(false)
    }

    fn check_reachability(&self, graph: &BlueprintGraph, diagnostics: &mut Vec<Diagnostic>) {
        // Exec-flow subgraph: every node with an exec pin participates.
        let mut flow: DiGraphMap<NodeId, ()> = DiGraphMap::new();
        for node in graph.nodes() {
            if node.pins.values().any(|p| p.kind == PinKind::Exec) {
                flow.add_node(node.id);
            }
        }
        for conn in graph.connections() {
            let is_exec = graph
                .resolve_pin(&conn.source)
                .map(|p| p.kind == PinKind::Exec)
                .unwrap_or(false);
            if is_exec {
                flow.add_edge(conn.source.node, conn.dest.node, ());
            }
        }

        let mut reached = std::collections::BTreeSet::new();
        for node in graph.nodes() {
            if self.is_event(&node.node_type) && flow.contains_node(node.id) {
                let mut dfs = Dfs::new(&flow, node.id);
                while let Some(id) = dfs.next(&flow) {
                    reached.insert(id);
                }
            }
        }

        for node in graph.nodes() {
            if flow.contains_node(node.id)
                && !reached.contains(&node.id)
                && !self.is_event(&node.node_type)
            {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "node {} ({}) is never executed",
                        node.id, node.node_type
                    ))
                    .at_node(node.id),
                );
            }
        }
    }

    fn check_required_inputs(&self, graph: &BlueprintGraph, diagnostics: &mut Vec<Diagnostic>) {
        for node in graph.nodes() {
            let Some(spec) = self.catalog.get(&node.node_type) else {
                continue;
            };
            for pin_spec in &spec.pins {
                if !pin_spec.required || pin_spec.direction != PinDirection::Input {
                    continue;
                }
                let pin_ref = PinRef::new(node.id, pin_spec.name.as_str());
                if graph.incoming_count(&pin_ref) == 0 {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "required input '{}' on node {} ({}) is not connected",
                            pin_spec.name, node.id, node.node_type
                        ))
                        .at_pin(node.id, pin_spec.name.as_str()),
                    );
                }
            }
        }
    }
}

impl GraphCompiler for StructuralCompiler {
    fn compile(&self, graph: &BlueprintGraph) -> CompileReport {
        let mut diagnostics = Vec::new();
        self.check_reachability(graph, &mut diagnostics);
        self.check_required_inputs(graph, &mut diagnostics);
        CompileReport::from_diagnostics(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeSpec, PinSpec, ValueType};

    #[test]
    fn test_unreachable_node_is_warned() {
        let catalog = NodeCatalog::builtin();
        let mut graph = BlueprintGraph::new("EventGraph");
        let event = graph
            .add_node(&catalog, "begin_play", Default::default())
            .unwrap();
        let wired = graph
            .add_node(&catalog, "print_string", Default::default())
            .unwrap();
        let orphan = graph
            .add_node(&catalog, "delay", Default::default())
            .unwrap();
        graph
            .connect(
                PinRef::new(event, "exec_out"),
                PinRef::new(wired, "exec_in"),
            )
            .unwrap();

        let report = StructuralCompiler::new(catalog).compile(&graph);
        assert!(report.ok, "warnings alone do not fail a compile");
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].node, Some(orphan));
    }

    #[test]
    fn test_literals_are_not_flow_participants() {
        let catalog = NodeCatalog::builtin();
        let mut graph = BlueprintGraph::new("EventGraph");
        graph
            .add_node(&catalog, "string_literal", Default::default())
            .unwrap();

        let report = StructuralCompiler::new(catalog).compile(&graph);
        assert!(report.ok);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_required_input_unconnected_is_error() {
        let mut catalog = NodeCatalog::builtin();
        catalog.register(NodeSpec::new(
            "apply_damage",
            vec![
                PinSpec::exec_in("exec_in"),
                PinSpec::exec_out("exec_out"),
                PinSpec::value_in("amount", ValueType::Float).required(),
            ],
        ));

        let mut graph = BlueprintGraph::new("EventGraph");
        let event = graph
            .add_node(&catalog, "begin_play", Default::default())
            .unwrap();
        let damage = graph
            .add_node(&catalog, "apply_damage", Default::default())
            .unwrap();
        graph
            .connect(
                PinRef::new(event, "exec_out"),
                PinRef::new(damage, "exec_in"),
            )
            .unwrap();

        let report = StructuralCompiler::new(catalog).compile(&graph);
        assert!(!report.ok);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].pin.as_deref(), Some("amount"));
    }
}
