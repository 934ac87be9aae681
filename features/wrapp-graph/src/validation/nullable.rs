use crate::{
    diagnostic::{DiagnosticKind, DiagnosticReporter},
    request::RequestKind,
};

use super::{ValidationContext, ValidationPlugin};

/// Reports nullable bindings injected as plain instances where null is not accepted
pub struct NullableValidation;

impl ValidationPlugin for NullableValidation {
    fn name(&self) -> &'static str {
        "wrapp/Nullable"
    }

    fn visit_graph(&self, context: &ValidationContext, reporter: &mut DiagnosticReporter) {
        let Some(severity) = context.options.nullable_validation.severity() else {
            return;
        };

        let graph = context.graph;
        for (index, edge) in graph.edges() {
            let Some(request) = edge.request() else {
                continue;
            };
            if request.nullable || request.kind != RequestKind::Instance {
                continue;
            }
            let Some(target) = graph.node(edge.target).as_binding() else {
                continue;
            };
            let Some(declaration) = target.binding.declaration() else {
                continue;
            };
            if !context.store.declaration(declaration).nullable {
                continue;
            }

            reporter.report_dependency(
                DiagnosticKind::NullableToNonNullable,
                severity,
                index,
                format!(
                    "{} is not nullable, but is being provided by {}",
                    request.key,
                    context.store.declaration(declaration)
                ),
            );
        }
    }
}
