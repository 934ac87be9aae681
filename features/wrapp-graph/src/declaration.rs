use std::{fmt, sync::Arc};

use crate::{
    key::{ContributionId, Key},
    request::{DependencyRequest, RequestKind},
    types::{MapKey, Scope, TypeName},
};

/// Index of a declaration in its store, also its declaration-site order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationId(pub usize);

/// What kind of declaration provides a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    /// Explicit factory method of a module
    Provision,
    /// Constructor injection, not installed in any module
    Injection,
    /// Asynchronous factory method of a module
    Production,
    /// Aliases the key to its single dependency
    Delegate,
    /// Declares an aggregate that may be empty
    Multibinds(AggregateKind),
    /// Declares an optional wrapper around its single dependency
    OptionalOf,
    /// The component itself
    ComponentInstance,
    /// A value supplied by a component dependency
    ComponentDependency,
    /// A value supplied by the caller when the component is created
    BoundInstance,
    /// Creator of a child component
    SubcomponentCreator { subcomponent: TypeName },
}

/// Shape of a multibinding aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Set,
    Map,
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateKind::Set => f.write_str("Set"),
            AggregateKind::Map => f.write_str("Map"),
        }
    }
}

/// How a declaration contributes to its key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributionType {
    /// The only binding for the key
    Unique,
    /// One element of a Set aggregate
    IntoSet,
    /// Several elements of a Set aggregate
    ElementsIntoSet,
    /// One entry of a Map aggregate, the map keys as annotated
    IntoMap { map_keys: Vec<MapKey> },
}

impl ContributionType {
    pub fn aggregate(&self) -> Option<AggregateKind> {
        match self {
            ContributionType::Unique => None,
            ContributionType::IntoSet | ContributionType::ElementsIntoSet => {
                Some(AggregateKind::Set)
            }
            ContributionType::IntoMap { .. } => Some(AggregateKind::Map),
        }
    }
}

/// One way to satisfy a [Key]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Provided key, the aggregate key for multibinding contributions
    pub key: Key,
    pub kind: DeclarationKind,
    pub contribution: ContributionType,
    /// Module installing the declaration, `None` for implicit and component bindings
    pub module: Option<TypeName>,
    /// The declaring element, e.g. `DripCoffeeModule.provideHeater()`
    pub element: Arc<str>,
    pub dependencies: Vec<DependencyRequest>,
    pub scope: Option<Scope>,
    pub nullable: bool,
}

impl Declaration {
    fn new(kind: DeclarationKind, key: Key, element: impl AsRef<str>) -> Self {
        Self {
            key,
            kind,
            contribution: ContributionType::Unique,
            module: None,
            element: element.as_ref().into(),
            dependencies: Vec::new(),
            scope: None,
            nullable: false,
        }
    }

    pub fn provision(module: impl Into<TypeName>, element: impl AsRef<str>, key: Key) -> Self {
        Self::new(DeclarationKind::Provision, key, element).in_module(module)
    }

    pub fn production(module: impl Into<TypeName>, element: impl AsRef<str>, key: Key) -> Self {
        Self::new(DeclarationKind::Production, key, element).in_module(module)
    }

    /// Constructor injection, visible from every component
    pub fn injection(key: Key) -> Self {
        let element = key.ty().to_string();
        Self::new(DeclarationKind::Injection, key, element)
    }

    /// Binds `key` to whatever satisfies `target`
    pub fn delegate(
        module: impl Into<TypeName>,
        element: impl AsRef<str>,
        key: Key,
        target: DependencyRequest,
    ) -> Self {
        Self::new(DeclarationKind::Delegate, key, element)
            .in_module(module)
            .depends_on(target)
    }

    pub fn multibinds(
        module: impl Into<TypeName>,
        element: impl AsRef<str>,
        key: Key,
        aggregate: AggregateKind,
    ) -> Self {
        Self::new(DeclarationKind::Multibinds(aggregate), key, element).in_module(module)
    }

    /// Declares `key` as an optional wrapper of `underlying`
    pub fn optional_of(
        module: impl Into<TypeName>,
        element: impl AsRef<str>,
        key: Key,
        underlying: Key,
    ) -> Self {
        Self::new(DeclarationKind::OptionalOf, key, element)
            .in_module(module)
            .depends_on(DependencyRequest::new(underlying, RequestKind::Instance))
    }

    pub(crate) fn component_instance(component: &TypeName) -> Self {
        Self::new(
            DeclarationKind::ComponentInstance,
            Key::of(component.clone()),
            component.as_str(),
        )
    }

    pub(crate) fn component_dependency(key: Key, element: impl AsRef<str>) -> Self {
        Self::new(DeclarationKind::ComponentDependency, key, element)
    }

    pub(crate) fn bound_instance(key: Key, element: impl AsRef<str>) -> Self {
        Self::new(DeclarationKind::BoundInstance, key, element)
    }

    pub(crate) fn subcomponent_creator(
        module: Option<TypeName>,
        creator: &TypeName,
        subcomponent: &TypeName,
    ) -> Self {
        let element = match &module {
            Some(module) => format!("{module}.subcomponents({subcomponent})"),
            None => subcomponent.to_string(),
        };
        let mut declaration = Self::new(
            DeclarationKind::SubcomponentCreator {
                subcomponent: subcomponent.clone(),
            },
            Key::of(creator.clone()),
            element,
        );
        declaration.module = module;
        declaration
    }

    fn in_module(mut self, module: impl Into<TypeName>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn depends_on(mut self, request: DependencyRequest) -> Self {
        self.dependencies.push(request);
        self
    }

    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn into_set(mut self) -> Self {
        self.contribution = ContributionType::IntoSet;
        self
    }

    pub fn elements_into_set(mut self) -> Self {
        self.contribution = ContributionType::ElementsIntoSet;
        self
    }

    pub fn into_map(mut self, map_keys: Vec<MapKey>) -> Self {
        self.contribution = ContributionType::IntoMap { map_keys };
        self
    }

    pub fn is_multibinding_contribution(&self) -> bool {
        self.contribution != ContributionType::Unique
    }

    pub fn is_production(&self) -> bool {
        self.kind == DeclarationKind::Production
    }

    /// Key of the single element this declaration contributes
    pub fn contribution_key(&self) -> Option<Key> {
        self.is_multibinding_contribution().then(|| {
            self.key.with_contribution(ContributionId {
                module: self.module.clone(),
                element: self.element.clone(),
            })
        })
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.module) {
            (DeclarationKind::Injection, _) => match &self.scope {
                Some(scope) => write!(f, "{scope} class {}", self.key.ty()),
                None => write!(f, "class {}", self.key.ty()),
            },
            (DeclarationKind::ComponentInstance, _) => write!(f, "component {}", self.element),
            (_, Some(module)) if !self.element.starts_with(module.as_str()) => {
                write!(f, "{module}.{}", self.element)
            }
            _ => f.write_str(&self.element),
        }
    }
}

/// Value supplied to a component by one of its component dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDependencyDecl {
    pub ty: TypeName,
    /// Keys provided by the dependency's provision methods
    pub provisions: Vec<Key>,
}

impl ComponentDependencyDecl {
    pub fn new(ty: impl Into<TypeName>) -> Self {
        Self {
            ty: ty.into(),
            provisions: Vec::new(),
        }
    }

    pub fn provides(mut self, key: Key) -> Self {
        self.provisions.push(key);
        self
    }
}

/// A module as collected by the front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
    pub name: TypeName,
    pub includes: Vec<TypeName>,
    /// Child components whose creators this module binds
    pub subcomponents: Vec<TypeName>,
}

impl ModuleDecl {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            includes: Vec::new(),
            subcomponents: Vec::new(),
        }
    }

    pub fn includes(mut self, module: impl Into<TypeName>) -> Self {
        self.includes.push(module.into());
        self
    }

    pub fn subcomponent(mut self, component: impl Into<TypeName>) -> Self {
        self.subcomponents.push(component.into());
        self
    }
}

/// A component as collected by the front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDecl {
    pub name: TypeName,
    pub parent: Option<TypeName>,
    pub modules: Vec<TypeName>,
    pub entry_points: Vec<DependencyRequest>,
    pub scopes: Vec<Scope>,
    pub dependencies: Vec<ComponentDependencyDecl>,
    pub bound_instances: Vec<Key>,
    /// Creator type of a child component, `None` if created by a factory method on its parent
    pub creator: Option<TypeName>,
    pub production: bool,
    /// Library or intermediate component whose missing bindings may be supplied later
    pub incomplete: bool,
}

impl ComponentDecl {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            modules: Vec::new(),
            entry_points: Vec::new(),
            scopes: Vec::new(),
            dependencies: Vec::new(),
            bound_instances: Vec::new(),
            creator: None,
            production: false,
            incomplete: false,
        }
    }

    pub fn child_of(mut self, parent: impl Into<TypeName>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn install(mut self, module: impl Into<TypeName>) -> Self {
        self.modules.push(module.into());
        self
    }

    pub fn entry_point(mut self, request: DependencyRequest) -> Self {
        self.entry_points.push(request);
        self
    }

    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn depends_on(mut self, dependency: ComponentDependencyDecl) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn bind_instance(mut self, key: Key) -> Self {
        self.bound_instances.push(key);
        self
    }

    pub fn created_by(mut self, creator: impl Into<TypeName>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn production(mut self) -> Self {
        self.production = true;
        self
    }

    pub fn incomplete(mut self) -> Self {
        self.incomplete = true;
        self
    }
}
