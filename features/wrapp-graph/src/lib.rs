//! Binding graph resolution for compile-time dependency injection.
//!
//! The front end collects plain [Declaration]s, modules and components into a
//! [DeclarationsBuilder]. The resulting [DeclarationStore] is immutable and resolved once
//! per root component: the graph of every binding reachable from the entry points,
//! plus the findings of every validation plugin.
//!
//! ```rust
//! use wrapp_graph::{
//!     resolve_component, ComponentDecl, CompilerOptions, Declaration, DeclarationsBuilder,
//!     DependencyRequest, Key,
//! };
//!
//! let store = DeclarationsBuilder::new()
//!     .add_component(
//!         ComponentDecl::new("CoffeeShop")
//!             .entry_point(DependencyRequest::instance(Key::of("CoffeeMaker")).at("CoffeeShop.maker()")),
//!     )
//!     .add_declaration(Declaration::injection(Key::of("CoffeeMaker")))
//!     .build()
//!     .unwrap();
//!
//! let resolution = resolve_component(&store, "CoffeeShop", &CompilerOptions::default()).unwrap();
//! assert!(!resolution.has_errors());
//! ```

pub mod builder;
pub mod component;
pub mod declaration;
pub mod diagnostic;
pub mod errors;
pub mod graph;
pub mod graph_builder;
pub mod key;
pub mod options;
pub mod request;
pub mod resolver;
pub mod store;
pub mod types;
pub mod validation;

pub use builder::DeclarationsBuilder;
pub use component::{ComponentId, ComponentPath};
pub use declaration::{
    AggregateKind, ComponentDecl, ComponentDependencyDecl, ContributionType, Declaration,
    DeclarationId, DeclarationKind, ModuleDecl,
};
pub use diagnostic::{Anchor, DiagnosticItem, DiagnosticKind, Severity};
pub use errors::{GraphErrors, InputError};
pub use graph::{BindingGraph, BindingNode, Edge, EdgeKind, Node, NodeIndex};
pub use key::{ContributionId, Key};
pub use options::{CompilerOptions, OptionsError, ValidationType};
pub use request::{DependencyRequest, RequestKind};
pub use resolver::Binding;
pub use store::DeclarationStore;
pub use types::{MapKey, Qualifier, Scope, TypeName};

use graph_builder::GraphBuilder;
use validation::ValidationContext;

/// The graph of one root component and everything reported about it
#[derive(Debug, Clone)]
pub struct GraphResolution {
    pub component: TypeName,
    pub graph: BindingGraph,
    pub diagnostics: Vec<DiagnosticItem>,
}

impl GraphResolution {
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.diagnostics
            .iter()
            .filter(|item| item.severity == Severity::Error)
    }

    /// The graph, unless an error was reported
    ///
    /// Code must not be generated from a graph with errors.
    pub fn into_result(self) -> Result<BindingGraph, GraphErrors> {
        if !self.has_errors() {
            return Ok(self.graph);
        }

        Err(GraphErrors {
            component: self.component,
            errors: self
                .diagnostics
                .into_iter()
                .filter(|item| item.severity == Severity::Error)
                .collect(),
        })
    }
}

/// Resolves and validates the root component named `component`
pub fn resolve_component(
    store: &DeclarationStore,
    component: impl Into<TypeName>,
    options: &CompilerOptions,
) -> Result<GraphResolution, InputError> {
    let component = component.into();
    let tree = store.tree();
    let id = tree
        .find(&component)
        .ok_or_else(|| InputError::UnknownComponent(component.clone()))?;
    if tree.get(id).parent.is_some() {
        return Err(InputError::NotARoot(component));
    }

    Ok(resolve_root(store, id, options))
}

/// Resolves and validates every root component, in declaration order
///
/// Roots do not share any state, each gets its own graph.
pub fn resolve_all(store: &DeclarationStore, options: &CompilerOptions) -> Vec<GraphResolution> {
    store
        .tree()
        .roots()
        .map(|root| resolve_root(store, root.id, options))
        .collect()
}

fn resolve_root(
    store: &DeclarationStore,
    root: ComponentId,
    options: &CompilerOptions,
) -> GraphResolution {
    let graph = GraphBuilder::new(store).build(root);
    let context = ValidationContext {
        graph: &graph,
        store,
        options,
    };
    let diagnostics = validation::validate(&context, &validation::default_plugins());

    tracing::debug!(
        "Resolved '{}' with {} diagnostics",
        store.tree().name(root),
        diagnostics.len()
    );

    GraphResolution {
        component: store.tree().name(root).clone(),
        graph,
        diagnostics,
    }
}
