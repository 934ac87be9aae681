use std::sync::Arc;

use crate::{
    component::{ComponentId, ComponentPath},
    graph::{BindingGraph, EdgeKind, NodeIndex},
    request::DependencyRequest,
    resolver::{Binding, ResolvedBindings, Resolver},
    store::DeclarationStore,
};

/// Builds the binding graph of one root component
///
/// Traversal is depth first in request declaration order, starting from the entry points.
/// A binding node is identified by its key and owning path:
/// reaching it again, through a diamond or a cycle, only adds an edge.
pub struct GraphBuilder<'a> {
    store: &'a DeclarationStore,
    resolver: Resolver<'a>,
    graph: BindingGraph,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(store: &'a DeclarationStore) -> Self {
        Self {
            store,
            resolver: Resolver::new(store),
            graph: BindingGraph::new(),
        }
    }

    pub fn build(mut self, root: ComponentId) -> BindingGraph {
        tracing::debug!(
            "Building binding graph of '{}'",
            self.store.tree().name(root)
        );

        self.visit_component(ComponentPath::root(root));

        tracing::debug!(
            "Binding graph of '{}' has {} nodes",
            self.store.tree().name(root),
            self.graph.node_count()
        );
        self.graph
    }

    fn visit_component(&mut self, path: ComponentPath) -> NodeIndex {
        if let Some(node) = self.graph.component_node(&path) {
            return node;
        }

        let store = self.store;
        let node = self.graph.add_component_node(path.clone());
        let component = store.tree().get(path.current());

        for entry_point in &component.entry_points {
            let target = self.visit_request(entry_point, &path);
            self.graph.add_edge(
                node,
                target,
                EdgeKind::Dependency {
                    request: entry_point.clone(),
                    entry_point: true,
                },
            );
        }

        // Children with a creator type are reached through their creator binding
        for child in &component.children {
            if store.tree().get(*child).creator.is_some() {
                continue;
            }
            let child_node = self.visit_component(path.child(*child));
            self.graph
                .add_edge(node, child_node, EdgeKind::ChildFactoryMethod);
        }

        node
    }

    fn visit_request(&mut self, request: &DependencyRequest, path: &ComponentPath) -> NodeIndex {
        let resolved = self.resolver.resolve(&request.key, path);
        self.visit_binding(resolved)
    }

    fn visit_binding(&mut self, resolved: Arc<ResolvedBindings>) -> NodeIndex {
        if let Some(node) = self.graph.binding_node(&resolved.key, &resolved.owner) {
            return node;
        }

        // Added before its dependencies, so a cycle leads back to this node
        let node = self.graph.add_binding_node(&resolved);

        for dependency in resolved.binding.dependencies(self.store) {
            let target = self.visit_request(&dependency, &resolved.owner);
            self.graph.add_edge(
                node,
                target,
                EdgeKind::Dependency {
                    request: dependency,
                    entry_point: false,
                },
            );
        }

        if let Binding::SubcomponentCreator { subcomponent, .. } = &resolved.binding {
            let child = self.visit_component(resolved.owner.child(*subcomponent));
            self.graph
                .add_edge(node, child, EdgeKind::SubcomponentCreation);
        }

        node
    }
}
