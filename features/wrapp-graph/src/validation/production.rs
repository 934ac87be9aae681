use crate::diagnostic::{DiagnosticKind, DiagnosticReporter, Severity};

use super::{ValidationContext, ValidationPlugin};

/// Reports synchronous requests ending at a production binding
///
/// A production binding may depend on provisions, never the other way around.
/// Asynchronous requests are left to the request kind check.
pub struct ProvisionDependencyOnProductionValidation;

impl ValidationPlugin for ProvisionDependencyOnProductionValidation {
    fn name(&self) -> &'static str {
        "wrapp/ProvisionDependsOnProduction"
    }

    fn visit_graph(&self, context: &ValidationContext, reporter: &mut DiagnosticReporter) {
        let graph = context.graph;
        for (index, edge) in graph.edges() {
            let Some(request) = edge.request() else {
                continue;
            };
            if request.kind.is_async() {
                continue;
            }
            let produced = graph
                .node(edge.target)
                .as_binding()
                .is_some_and(|target| target.binding.is_production(context.store));
            if !produced {
                continue;
            }

            let from_provision = request.kind.is_provider_wrapped()
                || edge.is_entry_point()
                || !context.is_production_context(edge.source);
            if !from_provision {
                continue;
            }

            let request_type = request.request_type(&context.options.framework_names);
            let message = if edge.is_entry_point() {
                format!("{request_type} is a provision entry-point, which cannot depend on a production.")
            } else {
                format!("{request_type} is a provision, which cannot depend on a production.")
            };
            reporter.report_dependency(
                DiagnosticKind::ProvisionFromProductionViolation,
                Severity::Error,
                index,
                message,
            );
        }
    }
}
