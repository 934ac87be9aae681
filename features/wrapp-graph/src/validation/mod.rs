//! Checks run over a completed binding graph.
//!
//! Each plugin inspects the whole graph independently and reports through its own
//! [DiagnosticReporter]; nothing stops at the first finding.

mod cycles;
mod duplicates;
mod map_keys;
mod missing;
mod nullable;
mod production;
mod request_kinds;
mod scopes;

pub use cycles::DependencyCycleValidation;
pub use duplicates::DuplicateBindingsValidation;
pub use map_keys::MapKeysValidation;
pub use missing::MissingBindingValidation;
pub use nullable::NullableValidation;
pub use production::ProvisionDependencyOnProductionValidation;
pub use request_kinds::RequestKindValidation;
pub use scopes::{ConflictingScopesValidation, IncompatibleScopeValidation};

use crate::{
    diagnostic::{DiagnosticItem, DiagnosticReporter},
    graph::{BindingGraph, Node, NodeIndex},
    options::CompilerOptions,
    store::DeclarationStore,
};

/// Everything a plugin may look at
pub struct ValidationContext<'a> {
    pub graph: &'a BindingGraph,
    pub store: &'a DeclarationStore,
    pub options: &'a CompilerOptions,
}

impl ValidationContext<'_> {
    /// Whether the node at `index` is a production context: a production binding,
    /// or a production component for its entry points
    pub fn is_production_context(&self, index: NodeIndex) -> bool {
        match self.graph.node(index) {
            Node::Binding(node) => node.binding.is_production(self.store),
            Node::Component(node) => self.store.tree().get(node.path.current()).production,
        }
    }
}

pub trait ValidationPlugin {
    fn name(&self) -> &'static str;

    fn visit_graph(&self, context: &ValidationContext, reporter: &mut DiagnosticReporter);
}

/// All plugins, in reporting order
pub fn default_plugins() -> Vec<Box<dyn ValidationPlugin>> {
    vec![
        Box::new(MissingBindingValidation),
        Box::new(DuplicateBindingsValidation),
        Box::new(DependencyCycleValidation),
        Box::new(IncompatibleScopeValidation),
        Box::new(ConflictingScopesValidation),
        Box::new(ProvisionDependencyOnProductionValidation),
        Box::new(MapKeysValidation),
        Box::new(RequestKindValidation),
        Box::new(NullableValidation),
    ]
}

/// Runs every plugin and returns their findings, plugin by plugin
pub fn validate(
    context: &ValidationContext,
    plugins: &[Box<dyn ValidationPlugin>],
) -> Vec<DiagnosticItem> {
    let mut items = Vec::new();
    for plugin in plugins {
        let mut reporter = DiagnosticReporter::new(context, plugin.name());
        plugin.visit_graph(context, &mut reporter);
        let found = reporter.into_items();
        tracing::debug!("{} found {} issues", plugin.name(), found.len());
        items.extend(found);
    }
    items
}
