use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use crate::{
    component::ComponentPath,
    declaration::DeclarationId,
    key::Key,
    request::DependencyRequest,
    resolver::{Binding, ResolvedBindings},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIndex(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Component(ComponentNode),
    Binding(BindingNode),
}

impl Node {
    /// The component path the node lives in
    pub fn path(&self) -> &ComponentPath {
        match self {
            Node::Component(component) => &component.path,
            Node::Binding(binding) => &binding.owner,
        }
    }

    pub fn as_binding(&self) -> Option<&BindingNode> {
        match self {
            Node::Binding(binding) => Some(binding),
            Node::Component(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentNode {
    pub path: ComponentPath,
}

/// A binding together with the component owning it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingNode {
    pub key: Key,
    pub owner: ComponentPath,
    pub binding: Binding,
    pub shadowed: Vec<DeclarationId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    /// A request of a binding, or of an entry point when the source is a component
    Dependency {
        request: DependencyRequest,
        entry_point: bool,
    },
    /// A child component created by a factory method of its parent
    ChildFactoryMethod,
    /// A child component created through the creator binding at the source
    SubcomponentCreation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn request(&self) -> Option<&DependencyRequest> {
        match &self.kind {
            EdgeKind::Dependency { request, .. } => Some(request),
            EdgeKind::ChildFactoryMethod | EdgeKind::SubcomponentCreation => None,
        }
    }

    pub fn is_entry_point(&self) -> bool {
        matches!(
            self.kind,
            EdgeKind::Dependency {
                entry_point: true,
                ..
            }
        )
    }
}

/// Resolved bindings of one root component and all child components reachable from it
///
/// Node and edge indices follow discovery order, so iterating them is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeIndex>>,
    incoming: Vec<Vec<EdgeIndex>>,
    component_nodes: HashMap<ComponentPath, NodeIndex>,
    binding_nodes: HashMap<(Key, ComponentPath), NodeIndex>,
}

impl BindingGraph {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            component_nodes: HashMap::new(),
            binding_nodes: HashMap::new(),
        }
    }

    fn push_node(&mut self, node: Node) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        index
    }

    pub(crate) fn add_component_node(&mut self, path: ComponentPath) -> NodeIndex {
        let index = self.push_node(Node::Component(ComponentNode { path: path.clone() }));
        self.component_nodes.insert(path, index);
        index
    }

    pub(crate) fn add_binding_node(&mut self, resolved: &Arc<ResolvedBindings>) -> NodeIndex {
        let index = self.push_node(Node::Binding(BindingNode {
            key: resolved.key.clone(),
            owner: resolved.owner.clone(),
            binding: resolved.binding.clone(),
            shadowed: resolved.shadowed.clone(),
        }));
        self.binding_nodes
            .insert((resolved.key.clone(), resolved.owner.clone()), index);
        index
    }

    pub(crate) fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, kind: EdgeKind) -> EdgeIndex {
        let index = EdgeIndex(self.edges.len());
        self.edges.push(Edge {
            source,
            target,
            kind,
        });
        self.outgoing[source.0].push(index);
        self.incoming[target.0].push(index);
        index
    }

    /// The root component, always the first node
    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }

    pub fn edge(&self, index: EdgeIndex) -> &Edge {
        &self.edges[index.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeIndex(idx), node))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(idx, edge)| (EdgeIndex(idx), edge))
    }

    pub fn binding_nodes(&self) -> impl Iterator<Item = (NodeIndex, &BindingNode)> {
        self.nodes()
            .filter_map(|(index, node)| node.as_binding().map(|binding| (index, binding)))
    }

    pub fn component_nodes(&self) -> impl Iterator<Item = (NodeIndex, &ComponentNode)> {
        self.nodes().filter_map(|(index, node)| match node {
            Node::Component(component) => Some((index, component)),
            Node::Binding(_) => None,
        })
    }

    pub fn binding_node(&self, key: &Key, owner: &ComponentPath) -> Option<NodeIndex> {
        self.binding_nodes
            .get(&(key.clone(), owner.clone()))
            .copied()
    }

    pub fn component_node(&self, path: &ComponentPath) -> Option<NodeIndex> {
        self.component_nodes.get(path).copied()
    }

    /// Binding nodes providing `key`, one per owning component
    pub fn bindings_for(&self, key: &Key) -> Vec<NodeIndex> {
        self.binding_nodes()
            .filter(|(_, binding)| binding.key == *key)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn out_edges(&self, node: NodeIndex) -> &[EdgeIndex] {
        &self.outgoing[node.0]
    }

    pub fn in_edges(&self, node: NodeIndex) -> &[EdgeIndex] {
        &self.incoming[node.0]
    }

    pub fn entry_point_edges(&self) -> impl Iterator<Item = (EdgeIndex, &Edge)> {
        self.edges().filter(|(_, edge)| edge.is_entry_point())
    }

    /// Shortest path of edges accepted by `follow` from `from` to `to`
    ///
    /// Ties are broken by edge order. An empty path means `from == to`.
    pub fn shortest_path(
        &self,
        from: NodeIndex,
        to: NodeIndex,
        follow: impl Fn(&Edge) -> bool,
    ) -> Option<Vec<EdgeIndex>> {
        if from == to {
            return Some(Vec::new());
        }

        let mut reached_by: HashMap<NodeIndex, EdgeIndex> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            for edge_index in self.out_edges(node) {
                let edge = self.edge(*edge_index);
                if !follow(edge) || edge.target == from || reached_by.contains_key(&edge.target) {
                    continue;
                }
                reached_by.insert(edge.target, *edge_index);
                if edge.target == to {
                    return Some(self.unwind(&reached_by, to));
                }
                queue.push_back(edge.target);
            }
        }
        None
    }

    /// Shortest chain of dependency edges from an entry point down to `node`, entry point first
    ///
    /// Component nodes, and nodes only reached through creator bindings, have no chain.
    pub fn entry_point_path(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        let mut reached_by: HashMap<NodeIndex, EdgeIndex> = HashMap::new();
        let mut queue = VecDeque::from([node]);
        while let Some(current) = queue.pop_front() {
            for edge_index in self.in_edges(current) {
                let edge = self.edge(*edge_index);
                if edge.request().is_none() {
                    continue;
                }
                if edge.is_entry_point() {
                    let mut path = vec![*edge_index];
                    let mut walk = current;
                    while walk != node {
                        let next = reached_by[&walk];
                        path.push(next);
                        walk = self.edge(next).target;
                    }
                    return path;
                }
                if edge.source == node || reached_by.contains_key(&edge.source) {
                    continue;
                }
                reached_by.insert(edge.source, *edge_index);
                queue.push_back(edge.source);
            }
        }
        Vec::new()
    }

    /// Entry points whose dependencies transitively include `node`, in edge order
    pub fn dependent_entry_points(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        let mut seen = vec![false; self.nodes.len()];
        let mut entry_points = Vec::new();
        let mut queue = VecDeque::from([node]);
        seen[node.0] = true;
        while let Some(current) = queue.pop_front() {
            for edge_index in self.in_edges(current) {
                let edge = self.edge(*edge_index);
                if edge.request().is_none() {
                    continue;
                }
                if edge.is_entry_point() {
                    entry_points.push(*edge_index);
                } else if !seen[edge.source.0] {
                    seen[edge.source.0] = true;
                    queue.push_back(edge.source);
                }
            }
        }
        entry_points.sort();
        entry_points
    }

    /// Edges of the path ending at `to`, in order
    fn unwind(&self, reached_by: &HashMap<NodeIndex, EdgeIndex>, to: NodeIndex) -> Vec<EdgeIndex> {
        let mut path = Vec::new();
        let mut current = to;
        while let Some(edge) = reached_by.get(&current) {
            path.push(*edge);
            current = self.edge(*edge).source;
        }
        path.reverse();
        path
    }
}
