use crate::{
    declaration::DeclarationKind,
    diagnostic::{DiagnosticKind, DiagnosticReporter, Severity},
    types::Scope,
};

use super::{ValidationContext, ValidationPlugin};

/// Reports scoped bindings owned by a component without that scope
pub struct IncompatibleScopeValidation;

impl ValidationPlugin for IncompatibleScopeValidation {
    fn name(&self) -> &'static str {
        "wrapp/IncompatibleScope"
    }

    fn visit_graph(&self, context: &ValidationContext, reporter: &mut DiagnosticReporter) {
        let tree = context.store.tree();
        for (index, node) in context.graph.binding_nodes() {
            let Some(scope) = node.binding.scope(context.store) else {
                continue;
            };
            let component = tree.get(node.owner.current());
            if scope.is_reusable() || component.scopes.contains(scope) {
                continue;
            }

            // Injection declarations render their own scope
            let site = match node.binding.declaration().map(|id| context.store.declaration(id)) {
                Some(declaration) if declaration.kind == DeclarationKind::Injection => {
                    declaration.to_string()
                }
                Some(declaration) => format!("{scope} {declaration}"),
                None => format!("{scope} {}", node.key),
            };
            let message = if component.scopes.is_empty() {
                format!(
                    "{} (unscoped) may not reference scoped bindings:\n    {site}",
                    component.name
                )
            } else {
                format!(
                    "{} scoped with {} may not reference bindings with different scopes:\n    {site}",
                    component.name,
                    render_scopes(&component.scopes)
                )
            };

            reporter.report_binding(
                DiagnosticKind::IncompatibleScope,
                Severity::Error,
                index,
                message,
            );
        }
    }
}

/// Reports components repeating a scope one of their ancestors declares
pub struct ConflictingScopesValidation;

impl ValidationPlugin for ConflictingScopesValidation {
    fn name(&self) -> &'static str {
        "wrapp/ConflictingScopes"
    }

    fn visit_graph(&self, context: &ValidationContext, reporter: &mut DiagnosticReporter) {
        let Some(severity) = context.options.scope_cycle_validation.severity() else {
            return;
        };

        let tree = context.store.tree();
        for (index, node) in context.graph.component_nodes() {
            let component = tree.get(node.path.current());
            let mut conflicts = Vec::new();
            for ancestor in &node.path.components()[..node.path.depth()] {
                let ancestor = tree.get(*ancestor);
                for scope in &ancestor.scopes {
                    if !scope.is_reusable() && component.scopes.contains(scope) {
                        conflicts.push(format!("{} also has {scope}", ancestor.name));
                    }
                }
            }
            if conflicts.is_empty() {
                continue;
            }

            let mut message = format!("{} has conflicting scopes:", component.name);
            for conflict in conflicts {
                message.push_str(&format!("\n    {conflict}"));
            }
            reporter.report_component(DiagnosticKind::ConflictingScopes, severity, index, message);
        }
    }
}

fn render_scopes(scopes: &[Scope]) -> String {
    scopes
        .iter()
        .map(Scope::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
