use std::{
    collections::{HashMap, HashSet},
    hash::{Hash, Hasher},
};

use crate::{
    component::{ComponentId, ComponentPath, ComponentTree},
    declaration::{Declaration, DeclarationId, DeclarationKind},
    key::Key,
    types::TypeName,
};

/// A declaration as seen from one component path
#[derive(Debug, Clone, Copy)]
pub struct VisibleDeclaration<'a> {
    pub id: DeclarationId,
    pub declaration: &'a Declaration,
    /// Component on the path installing the declaration, `None` for implicit injection bindings
    pub component: Option<ComponentId>,
}

impl PartialEq for VisibleDeclaration<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.component == other.component
    }
}

impl Eq for VisibleDeclaration<'_> {}

impl Hash for VisibleDeclaration<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.component.hash(state);
    }
}

/// Every declaration of one compilation, indexed by component and key
///
/// The store only enumerates, judging what is visible is left to the resolver.
#[derive(Debug)]
pub struct DeclarationStore {
    declarations: Vec<Declaration>,
    tree: ComponentTree,
    /// Per component: key -> declarations installed there, in declaration order
    by_component: Vec<HashMap<Key, Vec<DeclarationId>>>,
    injections: HashMap<Key, Vec<DeclarationId>>,
}

impl DeclarationStore {
    pub(crate) fn new(
        mut declarations: Vec<Declaration>,
        synthesized: Vec<(ComponentId, Declaration)>,
        tree: ComponentTree,
    ) -> Self {
        let mut by_module: HashMap<TypeName, Vec<DeclarationId>> = HashMap::new();
        let mut injections: HashMap<Key, Vec<DeclarationId>> = HashMap::new();
        for (idx, declaration) in declarations.iter().enumerate() {
            let id = DeclarationId(idx);
            if declaration.kind == DeclarationKind::Injection {
                injections
                    .entry(declaration.key.clone())
                    .or_default()
                    .push(id);
            } else if let Some(module) = &declaration.module {
                by_module.entry(module.clone()).or_default().push(id);
            } else {
                tracing::warn!("Declaration '{declaration}' has no module and is never visible");
            }
        }

        let mut installed: Vec<Vec<DeclarationId>> = tree
            .iter()
            .map(|component| {
                let mut ids = component
                    .modules
                    .iter()
                    .flat_map(|module| by_module.get(module).into_iter().flatten().copied())
                    .collect::<Vec<_>>();
                ids.sort();
                ids
            })
            .collect();

        for (component, declaration) in synthesized {
            installed[component.0].push(DeclarationId(declarations.len()));
            declarations.push(declaration);
        }

        let by_component = installed
            .into_iter()
            .map(|ids| {
                let mut index: HashMap<Key, Vec<DeclarationId>> = HashMap::new();
                for id in ids {
                    let declaration = &declarations[id.0];
                    index.entry(declaration.key.clone()).or_default().push(id);
                    if let Some(element) = declaration.contribution_key() {
                        index.entry(element).or_default().push(id);
                    }
                }
                index
            })
            .collect();

        tracing::debug!(
            "Indexed {} declarations across {} components",
            declarations.len(),
            tree.iter().count()
        );

        Self {
            declarations,
            tree,
            by_component,
            injections,
        }
    }

    pub fn declaration(&self, id: DeclarationId) -> &Declaration {
        &self.declarations[id.0]
    }

    pub fn declarations(&self) -> impl Iterator<Item = (DeclarationId, &Declaration)> {
        self.declarations
            .iter()
            .enumerate()
            .map(|(idx, declaration)| (DeclarationId(idx), declaration))
    }

    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    /// Every declaration usable for `key` from `path`, ancestors first
    ///
    /// Implicit injection declarations come last.
    pub fn declarations_for(&self, key: &Key, path: &ComponentPath) -> Vec<VisibleDeclaration<'_>> {
        let mut visible = Vec::new();
        for component in path.components() {
            let Some(ids) = self.by_component[component.0].get(key) else {
                continue;
            };
            visible.extend(ids.iter().map(|id| VisibleDeclaration {
                id: *id,
                declaration: self.declaration(*id),
                component: Some(*component),
            }));
        }

        if key.contribution().is_none() {
            if let Some(ids) = self.injections.get(key) {
                visible.extend(ids.iter().map(|id| VisibleDeclaration {
                    id: *id,
                    declaration: self.declaration(*id),
                    component: None,
                }));
            }
        }

        visible
    }

    /// Contributions to the aggregate `key` visible from `path`, in no particular order
    ///
    /// Callers order them by [DeclarationId] to keep aggregates deterministic.
    pub fn multibinding_contributions_for(
        &self,
        key: &Key,
        path: &ComponentPath,
    ) -> HashSet<VisibleDeclaration<'_>> {
        self.declarations_for(key, path)
            .into_iter()
            .filter(|visible| visible.declaration.is_multibinding_contribution())
            .collect()
    }
}
