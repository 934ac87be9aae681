use crate::{
    diagnostic::{DiagnosticKind, DiagnosticReporter, Severity},
    request::RequestKind,
};

use super::{ValidationContext, ValidationPlugin};

/// Reports asynchronous requests made outside a production context
pub struct RequestKindValidation;

impl ValidationPlugin for RequestKindValidation {
    fn name(&self) -> &'static str {
        "wrapp/RequestKind"
    }

    fn visit_graph(&self, context: &ValidationContext, reporter: &mut DiagnosticReporter) {
        let graph = context.graph;
        for (index, edge) in graph.edges() {
            let Some(request) = edge.request() else {
                continue;
            };
            if !request.kind.is_async() {
                continue;
            }

            let request_type = request.request_type(&context.options.framework_names);
            let message = if request.kind == RequestKind::Future && !edge.is_entry_point() {
                Some(format!(
                    "{request_type} may only be requested by production component entry points."
                ))
            } else if !context.is_production_context(edge.source) {
                if edge.is_entry_point() {
                    Some(format!(
                        "{request_type} may only be requested by production components."
                    ))
                } else {
                    Some(format!(
                        "{request_type} may only be injected into production bindings."
                    ))
                }
            } else {
                None
            };

            if let Some(message) = message {
                reporter.report_dependency(
                    DiagnosticKind::AmbiguousRequestKind,
                    Severity::Error,
                    index,
                    message,
                );
            }
        }
    }
}
