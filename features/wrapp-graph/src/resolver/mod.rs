//! Decides which declarations satisfy a key and which component owns the result.
//!
//! Resolution is memoized per `(key, requesting path)` and never recurses into the
//! dependencies of the binding beyond what is needed to place it:
//! an unscoped binding is owned by the deepest component owning one of its dependencies,
//! so it is created next to whatever it needs.
//!
//! Bindings on a cycle share one owner. A binding placed while an earlier binding of its
//! cycle was still being resolved is not memoized, it is placed again once that binding is.

mod binding;

use std::{collections::HashMap, sync::Arc};

pub use binding::{Binding, ResolvedBindings};

use crate::{
    component::ComponentPath,
    declaration::{ContributionType, DeclarationId, DeclarationKind},
    key::Key,
    store::{DeclarationStore, VisibleDeclaration},
    types::Scope,
};

/// Memoizing resolver for a single graph
pub struct Resolver<'a> {
    store: &'a DeclarationStore,
    resolved: HashMap<(Key, ComponentPath), Arc<ResolvedBindings>>,
    /// Resolutions still running, outermost first
    in_progress: Vec<Frame>,
}

struct Frame {
    memo: (Key, ComponentPath),
    /// Outermost frame this resolution depended on while it was still running
    reaches: usize,
}

/// Where a dependency ended up while placing the binding requesting it
enum DependencyOwner {
    /// Resolution of the dependency is still running, it cannot pull the binding down
    InProgress,
    Missing,
    Depth(usize),
}

/// The binding chosen for a key before it is placed
struct Candidate {
    binding: Binding,
    /// Depth of the component the binding is installed in
    anchor: usize,
    /// Whether the owner is fixed at the anchor regardless of dependencies
    pinned: bool,
    shadowed: Vec<DeclarationId>,
}

impl Candidate {
    fn pinned(binding: Binding, anchor: usize) -> Self {
        Self {
            binding,
            anchor,
            pinned: true,
            shadowed: Vec::new(),
        }
    }

    fn floating(binding: Binding, anchor: usize) -> Self {
        Self {
            binding,
            anchor,
            pinned: false,
            shadowed: Vec::new(),
        }
    }
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a DeclarationStore) -> Self {
        Self {
            store,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    pub fn store(&self) -> &'a DeclarationStore {
        self.store
    }

    /// Resolves `key` as requested from `path`
    pub fn resolve(&mut self, key: &Key, path: &ComponentPath) -> Arc<ResolvedBindings> {
        let memo = (key.clone(), path.clone());
        if let Some(resolved) = self.resolved.get(&memo) {
            return resolved.clone();
        }

        let frame = self.in_progress.len();
        self.in_progress.push(Frame {
            memo: memo.clone(),
            reaches: frame,
        });
        let candidate = self.choose(key, path);
        let owner_depth = if candidate.pinned {
            candidate.anchor
        } else {
            self.float(&candidate, path)
        };
        let done = self
            .in_progress
            .pop()
            .expect("resolution frames are pushed and popped in pairs");

        let resolved = Arc::new(ResolvedBindings {
            key: key.clone(),
            owner: path.prefix(owner_depth),
            binding: candidate.binding,
            shadowed: candidate.shadowed,
        });

        if done.reaches < frame {
            if let Some(caller) = self.in_progress.last_mut() {
                caller.reaches = caller.reaches.min(done.reaches);
            }
            tracing::trace!("Placed {key} provisionally, its cycle is still being resolved");
            return resolved;
        }

        tracing::trace!(
            "Resolved {key} as {} owned by {}",
            resolved.binding.describe(),
            resolved.owner.display(self.store.tree())
        );

        self.resolved.insert(memo, resolved.clone());
        resolved
    }

    /// Deepest owner among the binding's anchor and its dependencies
    fn float(&mut self, candidate: &Candidate, path: &ComponentPath) -> usize {
        let mut depth = candidate.anchor;
        for request in candidate.binding.dependencies(self.store) {
            if let DependencyOwner::Depth(owner) = self.dependency_owner(&request.key, path) {
                depth = depth.max(owner);
            }
        }
        depth
    }

    fn dependency_owner(&mut self, key: &Key, path: &ComponentPath) -> DependencyOwner {
        let running = self
            .in_progress
            .iter()
            .position(|frame| frame.memo.0 == *key && frame.memo.1 == *path);
        if let Some(running) = running {
            if let Some(current) = self.in_progress.last_mut() {
                current.reaches = current.reaches.min(running);
            }
            return DependencyOwner::InProgress;
        }
        let resolved = self.resolve(key, path);
        if resolved.binding.is_missing() {
            DependencyOwner::Missing
        } else {
            DependencyOwner::Depth(resolved.owner.depth())
        }
    }

    fn choose(&mut self, key: &Key, path: &ComponentPath) -> Candidate {
        let store = self.store;
        let visible = store.declarations_for(key, path);
        let depth_of = |visible: &VisibleDeclaration| {
            visible
                .component
                .and_then(|component| path.depth_of(component))
                .unwrap_or(0)
        };

        if key.contribution().is_some() {
            return match visible.as_slice() {
                [] => Candidate::pinned(Binding::Missing, path.depth()),
                [single] => self.explicit(Binding::Contribution(single.id), single, depth_of(single)),
                several => duplicate(several, false, depth_of),
            };
        }

        let mut contributions = store
            .multibinding_contributions_for(key, path)
            .into_iter()
            .collect::<Vec<_>>();
        contributions.sort_by_key(|visible| visible.id);

        let mut unique = Vec::new();
        let mut multibinds = Vec::new();
        let mut optionals = Vec::new();
        let mut injections = Vec::new();
        for candidate in &visible {
            let declaration = candidate.declaration;
            match (&declaration.kind, &declaration.contribution) {
                (DeclarationKind::Injection, _) => injections.push(*candidate),
                (DeclarationKind::Multibinds(_), _) => multibinds.push(*candidate),
                (DeclarationKind::OptionalOf, _) => optionals.push(*candidate),
                (_, ContributionType::Unique) => unique.push(*candidate),
                // Collected above
                (_, _) => {}
            }
        }

        let multibound = !contributions.is_empty() || !multibinds.is_empty();
        if (!unique.is_empty() && (multibound || !optionals.is_empty()))
            || (multibound && !optionals.is_empty())
        {
            let mut conflicting = unique;
            conflicting.extend(contributions);
            conflicting.extend(multibinds);
            conflicting.extend(optionals);
            conflicting.sort_by_key(|visible| visible.id);
            return duplicate(&conflicting, true, depth_of);
        }

        if !unique.is_empty() {
            let deepest = unique.iter().map(depth_of).max().unwrap_or(0);
            let (winners, shadowed): (Vec<_>, Vec<_>) = unique
                .into_iter()
                .partition(|visible| depth_of(visible) == deepest);

            let mut candidate = match winners.as_slice() {
                [single] => self.unique(single, path, deepest),
                several => duplicate(several, false, depth_of),
            };
            candidate.shadowed = shadowed.iter().map(|visible| visible.id).collect();
            return candidate;
        }

        if multibound {
            return self.multibound(key, &contributions, &multibinds, depth_of);
        }

        if !optionals.is_empty() {
            let anchor = optionals.iter().map(depth_of).max().unwrap_or(0);
            let declarations = optionals.iter().map(|visible| visible.id).collect::<Vec<_>>();
            let underlying = store.declaration(declarations[0]).dependencies[0].key.clone();
            let present = match self.dependency_owner(&underlying, path) {
                DependencyOwner::Missing => false,
                DependencyOwner::InProgress | DependencyOwner::Depth(_) => true,
            };
            return Candidate::floating(
                Binding::Optional {
                    declarations,
                    present,
                },
                anchor,
            );
        }

        match injections.as_slice() {
            [] => Candidate::pinned(Binding::Missing, path.depth()),
            [single] => self.injection(single, path),
            several => duplicate(several, false, depth_of),
        }
    }

    /// A single unique declaration installed at `depth`
    fn unique(&mut self, visible: &VisibleDeclaration, path: &ComponentPath, depth: usize) -> Candidate {
        let store = self.store;
        let declaration = visible.declaration;
        let binding = match &declaration.kind {
            DeclarationKind::Provision => Binding::Provision(visible.id),
            DeclarationKind::Production => Binding::Production(visible.id),
            DeclarationKind::Delegate => {
                let target = &declaration.dependencies[0].key;
                let production = match self.dependency_owner(target, path) {
                    DependencyOwner::Depth(_) => {
                        self.resolve(target, path).binding.is_production(store)
                    }
                    DependencyOwner::InProgress | DependencyOwner::Missing => false,
                };
                Binding::Delegate {
                    declaration: visible.id,
                    production,
                }
            }
            DeclarationKind::ComponentInstance => Binding::ComponentInstance(visible.id),
            DeclarationKind::ComponentDependency => Binding::ComponentDependency(visible.id),
            DeclarationKind::BoundInstance => Binding::BoundInstance(visible.id),
            DeclarationKind::SubcomponentCreator { subcomponent } => Binding::SubcomponentCreator {
                declaration: visible.id,
                subcomponent: store
                    .tree()
                    .find(subcomponent)
                    .expect("subcomponent references are checked when building the store"),
            },
            DeclarationKind::Injection
            | DeclarationKind::Multibinds(_)
            | DeclarationKind::OptionalOf => {
                unreachable!("partitioned out before choosing a unique declaration")
            }
        };
        self.explicit(binding, visible, depth)
    }

    /// Places a binding installed in a component: scoped ones stay where they are installed
    fn explicit(&self, binding: Binding, visible: &VisibleDeclaration, depth: usize) -> Candidate {
        if pins_owner(visible.declaration.scope.as_ref()) {
            Candidate::pinned(binding, depth)
        } else {
            Candidate::floating(binding, depth)
        }
    }

    /// Places an implicit injection binding: scoped ones go to the nearest component with that scope
    fn injection(&self, visible: &VisibleDeclaration, path: &ComponentPath) -> Candidate {
        let binding = Binding::Provision(visible.id);
        match &visible.declaration.scope {
            Some(scope) if pins_owner(Some(scope)) => {
                let tree = self.store.tree();
                let depth = path
                    .components()
                    .iter()
                    .rposition(|component| tree.get(*component).scopes.contains(scope))
                    .unwrap_or(path.depth());
                Candidate::pinned(binding, depth)
            }
            _ => Candidate::floating(binding, 0),
        }
    }

    fn multibound(
        &mut self,
        key: &Key,
        contributions: &[VisibleDeclaration],
        multibinds: &[VisibleDeclaration],
        depth_of: impl Fn(&VisibleDeclaration) -> usize,
    ) -> Candidate {
        let store = self.store;
        let aggregate = multibinds
            .iter()
            .find_map(|visible| match visible.declaration.kind {
                DeclarationKind::Multibinds(aggregate) => Some(aggregate),
                _ => None,
            })
            .or_else(|| {
                contributions
                    .iter()
                    .find_map(|visible| visible.declaration.contribution.aggregate())
            })
            .expect("multibound keys have a contribution or a multibinds declaration");

        let contribution_ids = contributions.iter().map(|visible| visible.id).collect::<Vec<_>>();
        let production = contribution_ids
            .iter()
            .any(|id| store.declaration(*id).is_production());
        let anchor = contributions
            .iter()
            .chain(multibinds)
            .map(depth_of)
            .max()
            .unwrap_or(0);

        tracing::trace!("{key} aggregates {} contributions", contribution_ids.len());
        Candidate::floating(
            Binding::Multibound {
                aggregate,
                contributions: contribution_ids,
                declarations: multibinds.iter().map(|visible| visible.id).collect(),
                production,
            },
            anchor,
        )
    }
}

/// A scope fixes the owner unless it is the reusable scope
fn pins_owner(scope: Option<&Scope>) -> bool {
    scope.is_some_and(|scope| !scope.is_reusable())
}

/// Marker for conflicting declarations, owned by the deepest one
fn duplicate(
    conflicting: &[VisibleDeclaration],
    incompatible: bool,
    depth_of: impl Fn(&VisibleDeclaration) -> usize,
) -> Candidate {
    let anchor = conflicting.iter().map(&depth_of).max().unwrap_or(0);
    let mut declarations = conflicting.iter().map(|visible| visible.id).collect::<Vec<_>>();
    declarations.sort();
    Candidate::pinned(
        Binding::Duplicate {
            declarations,
            incompatible,
        },
        anchor,
    )
}
