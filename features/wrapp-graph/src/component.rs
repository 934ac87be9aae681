use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    request::DependencyRequest,
    types::{Scope, TypeName},
};

/// Index of a component in its [ComponentTree]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub usize);

/// A component with its references resolved
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub id: ComponentId,
    pub name: TypeName,
    pub parent: Option<ComponentId>,
    pub children: Vec<ComponentId>,
    /// Installed modules, transitively included ones too, minus those installed by an ancestor
    pub modules: Vec<TypeName>,
    pub entry_points: Vec<DependencyRequest>,
    pub scopes: Vec<Scope>,
    pub creator: Option<TypeName>,
    pub production: bool,
    pub incomplete: bool,
}

/// All components of one compilation, parents before children
#[derive(Debug, Clone, Default)]
pub struct ComponentTree {
    components: Vec<ComponentDescriptor>,
    by_name: HashMap<TypeName, ComponentId>,
}

impl ComponentTree {
    pub(crate) fn new(components: Vec<ComponentDescriptor>) -> Self {
        let by_name = components
            .iter()
            .map(|component| (component.name.clone(), component.id))
            .collect();
        Self {
            components,
            by_name,
        }
    }

    pub fn get(&self, id: ComponentId) -> &ComponentDescriptor {
        &self.components[id.0]
    }

    pub fn find(&self, name: &TypeName) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.iter()
    }

    /// Components without a parent, in declaration order
    pub fn roots(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components
            .iter()
            .filter(|component| component.parent.is_none())
    }

    /// Path from the root component down to `id`
    pub fn path_of(&self, id: ComponentId) -> ComponentPath {
        let mut lineage = vec![id];
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            lineage.push(parent);
            current = parent;
        }
        lineage.reverse();
        ComponentPath(lineage.into())
    }

    pub fn name(&self, id: ComponentId) -> &TypeName {
        &self.get(id).name
    }
}

/// Components from a root down to the current (sub)component
///
/// A component sees the bindings of all components on its path, never those of its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentPath(Arc<[ComponentId]>);

impl ComponentPath {
    pub fn root(id: ComponentId) -> Self {
        Self(Arc::from([id]))
    }

    pub fn components(&self) -> &[ComponentId] {
        &self.0
    }

    pub fn current(&self) -> ComponentId {
        *self.0.last().expect("component paths are never empty")
    }

    pub fn root_component(&self) -> ComponentId {
        self.0[0]
    }

    /// Number of ancestors, zero at the root
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    pub fn at_root(&self) -> bool {
        self.0.len() == 1
    }

    pub fn child(&self, id: ComponentId) -> Self {
        let mut components = self.0.to_vec();
        components.push(id);
        Self(components.into())
    }

    /// The ancestor path at `depth`
    pub fn prefix(&self, depth: usize) -> Self {
        Self(self.0[..=depth].into())
    }

    pub fn parent(&self) -> Option<Self> {
        (!self.at_root()).then(|| self.prefix(self.depth() - 1))
    }

    /// Depth of `component` on this path
    pub fn depth_of(&self, component: ComponentId) -> Option<usize> {
        self.0.iter().position(|id| *id == component)
    }

    pub fn contains(&self, component: ComponentId) -> bool {
        self.depth_of(component).is_some()
    }

    pub fn display<'a>(&'a self, tree: &'a ComponentTree) -> ComponentPathDisplay<'a> {
        ComponentPathDisplay { path: self, tree }
    }
}

pub struct ComponentPathDisplay<'a> {
    path: &'a ComponentPath,
    tree: &'a ComponentTree,
}

impl fmt::Display for ComponentPathDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .path
            .components()
            .iter()
            .map(|id| self.tree.name(*id).as_str())
            .collect::<Vec<_>>();
        f.write_str(&names.join(" → "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn descriptor(id: usize, name: &str, parent: Option<usize>) -> ComponentDescriptor {
        ComponentDescriptor {
            id: ComponentId(id),
            name: TypeName::new(name),
            parent: parent.map(ComponentId),
            children: Vec::new(),
            modules: Vec::new(),
            entry_points: Vec::new(),
            scopes: Vec::new(),
            creator: None,
            production: false,
            incomplete: false,
        }
    }

    #[test]
    fn paths_run_from_the_root() {
        let tree = ComponentTree::new(vec![
            descriptor(0, "App", None),
            descriptor(1, "Activity", Some(0)),
            descriptor(2, "Fragment", Some(1)),
        ]);

        let path = tree.path_of(ComponentId(2));
        assert_eq!(
            path.components(),
            &[ComponentId(0), ComponentId(1), ComponentId(2)]
        );
        assert_eq!(path.depth(), 2);
        assert_eq!(path.current(), ComponentId(2));
        assert_eq!(path.prefix(0), ComponentPath::root(ComponentId(0)));
        assert_eq!(path.parent(), Some(tree.path_of(ComponentId(1))));
        assert_eq!(path.display(&tree).to_string(), "App → Activity → Fragment");
        assert_eq!(tree.roots().count(), 1);
    }
}
