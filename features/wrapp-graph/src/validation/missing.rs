use crate::{
    diagnostic::{DiagnosticKind, DiagnosticReporter, Severity},
    resolver::Binding,
};

use super::{ValidationContext, ValidationPlugin};

/// Reports keys nothing satisfies
///
/// Deferred as a note while every component on the owning path is incomplete,
/// a complete component including them reports it later.
pub struct MissingBindingValidation;

impl ValidationPlugin for MissingBindingValidation {
    fn name(&self) -> &'static str {
        "wrapp/MissingBinding"
    }

    fn visit_graph(&self, context: &ValidationContext, reporter: &mut DiagnosticReporter) {
        let tree = context.store.tree();
        for (index, node) in context.graph.binding_nodes() {
            if node.binding != Binding::Missing {
                continue;
            }

            let deferred = node
                .owner
                .components()
                .iter()
                .all(|component| tree.get(*component).incomplete);
            let severity = if deferred {
                Severity::Note
            } else {
                Severity::Error
            };

            let mut message = format!(
                "{} cannot be provided without an injectable constructor or a provision method.",
                node.key
            );
            for component in tree.iter() {
                let path = tree.path_of(component.id);
                let elsewhere = context
                    .store
                    .declarations_for(&node.key, &path)
                    .iter()
                    .any(|visible| visible.component == Some(component.id));
                if elsewhere && !node.owner.contains(component.id) {
                    message.push_str(&format!(
                        "\nA binding for {} exists in {}",
                        node.key,
                        path.display(tree)
                    ));
                }
            }

            reporter.report_binding(DiagnosticKind::MissingBinding, severity, index, message);
        }
    }
}
