use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::{
    diagnostic::{Anchor, DiagnosticKind, DiagnosticReporter, Severity},
    graph::{BindingGraph, Edge, EdgeIndex, EdgeKind, NodeIndex},
};

use super::{ValidationContext, ValidationPlugin};

/// Reports dependency cycles that cannot be constructed
///
/// A cycle is only permitted when every request in it defers construction,
/// so each edge that does not is checked for a way back to its source.
pub struct DependencyCycleValidation;

impl ValidationPlugin for DependencyCycleValidation {
    fn name(&self) -> &'static str {
        "wrapp/DependencyCycle"
    }

    fn visit_graph(&self, context: &ValidationContext, reporter: &mut DiagnosticReporter) {
        let graph = context.graph;
        let distances = entry_point_distances(graph);
        let mut reported: BTreeSet<Vec<NodeIndex>> = BTreeSet::new();

        for (index, edge) in graph.edges() {
            let Some(request) = edge.request() else {
                continue;
            };
            if edge.is_entry_point() || request.kind.breaks_cycle() {
                continue;
            }

            let Some(back) = graph.shortest_path(edge.target, edge.source, is_binding_dependency) else {
                continue;
            };
            let mut cycle = vec![index];
            cycle.extend(back);

            let cycle = rotate_to_entry(graph, cycle, &distances);
            let mut nodes = cycle
                .iter()
                .map(|edge| graph.edge(*edge).source)
                .collect::<Vec<_>>();
            let keys = nodes
                .iter()
                .chain(nodes.first())
                .filter_map(|node| graph.node(*node).as_binding())
                .map(|binding| binding.key.to_string())
                .collect::<Vec<_>>();
            nodes.sort();
            if !reported.insert(nodes) {
                continue;
            }

            let start = graph.edge(cycle[0]).source;
            let mut path = graph.entry_point_path(start);
            path.extend(&cycle);

            let trace = reporter.render_trace(&path);
            reporter.report(
                DiagnosticKind::DependencyCycle,
                Severity::Error,
                Anchor::Dependency(cycle[0]),
                format!("Found a dependency cycle: {}", keys.join(" -> ")),
                trace,
            );
        }
    }
}

fn is_binding_dependency(edge: &Edge) -> bool {
    matches!(
        edge.kind,
        EdgeKind::Dependency {
            entry_point: false,
            ..
        }
    )
}

/// Fewest edges from any component node to each node
fn entry_point_distances(graph: &BindingGraph) -> HashMap<NodeIndex, usize> {
    let mut distances = HashMap::new();
    let mut queue = VecDeque::new();
    for (index, _) in graph.component_nodes() {
        distances.insert(index, 0);
        queue.push_back(index);
    }

    while let Some(node) = queue.pop_front() {
        let distance = distances[&node];
        for edge in graph.out_edges(node) {
            let target = graph.edge(*edge).target;
            if !distances.contains_key(&target) {
                distances.insert(target, distance + 1);
                queue.push_back(target);
            }
        }
    }
    distances
}

/// Rotates the cycle to start at the node closest to an entry point, the earliest node on ties
fn rotate_to_entry(
    graph: &BindingGraph,
    mut cycle: Vec<EdgeIndex>,
    distances: &HashMap<NodeIndex, usize>,
) -> Vec<EdgeIndex> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, edge)| {
            let source = graph.edge(**edge).source;
            (distances.get(&source).copied().unwrap_or(usize::MAX), source)
        })
        .map(|(position, _)| position)
        .unwrap_or(0);
    cycle.rotate_left(start);
    cycle
}
