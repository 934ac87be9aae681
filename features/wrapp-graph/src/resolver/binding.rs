use crate::{
    component::{ComponentId, ComponentPath},
    declaration::{AggregateKind, DeclarationId},
    key::Key,
    request::DependencyRequest,
    store::DeclarationStore,
    types::Scope,
};

/// How a resolved key is satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Explicit provision method or constructor injection
    Provision(DeclarationId),
    /// Asynchronous factory method, only usable from a production context
    Production(DeclarationId),
    /// Alias of its single dependency, a production binding iff the target is one
    Delegate {
        declaration: DeclarationId,
        production: bool,
    },
    /// One element of a multibinding aggregate, requested by its contribution key
    Contribution(DeclarationId),
    /// A Set or Map aggregate of all visible contributions, in declaration order
    Multibound {
        aggregate: AggregateKind,
        contributions: Vec<DeclarationId>,
        /// Multibinds declarations allowing the aggregate to be empty
        declarations: Vec<DeclarationId>,
        production: bool,
    },
    /// Optional wrapper, present iff the underlying key resolves
    Optional {
        declarations: Vec<DeclarationId>,
        present: bool,
    },
    ComponentInstance(DeclarationId),
    ComponentDependency(DeclarationId),
    BoundInstance(DeclarationId),
    SubcomponentCreator {
        declaration: DeclarationId,
        subcomponent: ComponentId,
    },
    /// Nothing satisfies the key
    Missing,
    /// More than one declaration claims the key
    Duplicate {
        declarations: Vec<DeclarationId>,
        /// Unique and multibinding declarations were mixed
        incompatible: bool,
    },
}

impl Binding {
    /// The single declaration behind the binding, if there is one
    pub fn declaration(&self) -> Option<DeclarationId> {
        match self {
            Binding::Provision(id)
            | Binding::Production(id)
            | Binding::Contribution(id)
            | Binding::ComponentInstance(id)
            | Binding::ComponentDependency(id)
            | Binding::BoundInstance(id)
            | Binding::Delegate {
                declaration: id, ..
            }
            | Binding::SubcomponentCreator {
                declaration: id, ..
            } => Some(*id),
            Binding::Multibound { .. }
            | Binding::Optional { .. }
            | Binding::Missing
            | Binding::Duplicate { .. } => None,
        }
    }

    /// Every declaration involved, in declaration order
    pub fn declarations(&self) -> Vec<DeclarationId> {
        match self {
            Binding::Multibound {
                contributions,
                declarations,
                ..
            } => {
                let mut all = contributions.clone();
                all.extend(declarations);
                all.sort();
                all
            }
            Binding::Optional { declarations, .. } | Binding::Duplicate { declarations, .. } => {
                declarations.clone()
            }
            binding => binding.declaration().into_iter().collect(),
        }
    }

    pub fn is_production(&self, store: &DeclarationStore) -> bool {
        match self {
            Binding::Production(_) => true,
            Binding::Delegate { production, .. } | Binding::Multibound { production, .. } => {
                *production
            }
            Binding::Contribution(id) => store.declaration(*id).is_production(),
            _ => false,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Binding::Missing)
    }

    pub fn scope<'a>(&self, store: &'a DeclarationStore) -> Option<&'a Scope> {
        self.declaration()
            .and_then(|id| store.declaration(id).scope.as_ref())
    }

    pub fn nullable(&self, store: &DeclarationStore) -> bool {
        self.declaration()
            .is_some_and(|id| store.declaration(id).nullable)
    }

    /// Requests the binding makes, in declaration order
    pub fn dependencies(&self, store: &DeclarationStore) -> Vec<DependencyRequest> {
        match self {
            Binding::Provision(id)
            | Binding::Production(id)
            | Binding::Contribution(id)
            | Binding::ComponentDependency(id)
            | Binding::Delegate { declaration: id, .. } => {
                store.declaration(*id).dependencies.clone()
            }
            Binding::Multibound { contributions, .. } => contributions
                .iter()
                .filter_map(|id| {
                    let declaration = store.declaration(*id);
                    declaration
                        .contribution_key()
                        .map(|key| DependencyRequest::instance(key).at(declaration.to_string()))
                })
                .collect(),
            Binding::Optional {
                declarations,
                present: true,
            } => declarations
                .first()
                .map(|id| store.declaration(*id).dependencies.clone())
                .unwrap_or_default(),
            Binding::Optional { present: false, .. }
            | Binding::ComponentInstance(_)
            | Binding::BoundInstance(_)
            | Binding::SubcomponentCreator { .. }
            | Binding::Missing
            | Binding::Duplicate { .. } => Vec::new(),
        }
    }

    /// Short label of the binding variant for messages
    pub fn describe(&self) -> &'static str {
        match self {
            Binding::Provision(_) => "provision",
            Binding::Production(_) => "production",
            Binding::Delegate { .. } => "delegate",
            Binding::Contribution(_) => "multibinding contribution",
            Binding::Multibound { .. } => "multibound",
            Binding::Optional { .. } => "optional",
            Binding::ComponentInstance(_) => "component instance",
            Binding::ComponentDependency(_) => "component dependency",
            Binding::BoundInstance(_) => "bound instance",
            Binding::SubcomponentCreator { .. } => "subcomponent creator",
            Binding::Missing => "missing",
            Binding::Duplicate { .. } => "duplicate",
        }
    }
}

/// Outcome of resolving one key from one component path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBindings {
    pub key: Key,
    /// Component path owning the binding, a prefix of the requesting path
    pub owner: ComponentPath,
    pub binding: Binding,
    /// Unique declarations of ancestors hidden by a deeper one
    pub shadowed: Vec<DeclarationId>,
}
