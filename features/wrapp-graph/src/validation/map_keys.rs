use std::collections::BTreeMap;

use crate::{
    declaration::{AggregateKind, ContributionType, Declaration},
    diagnostic::{DiagnosticKind, DiagnosticReporter, Severity},
    resolver::Binding,
    types::TypeName,
};

use super::{ValidationContext, ValidationPlugin};

/// Reports map contributions without exactly one map key, or sharing a key
pub struct MapKeysValidation;

impl ValidationPlugin for MapKeysValidation {
    fn name(&self) -> &'static str {
        "wrapp/MapKeys"
    }

    fn visit_graph(&self, context: &ValidationContext, reporter: &mut DiagnosticReporter) {
        for (index, node) in context.graph.binding_nodes() {
            let Binding::Multibound {
                aggregate: AggregateKind::Map,
                contributions,
                ..
            } = &node.binding
            else {
                continue;
            };

            let mut by_value: BTreeMap<&str, Vec<&Declaration>> = BTreeMap::new();
            let mut by_annotation: BTreeMap<&TypeName, Vec<&Declaration>> = BTreeMap::new();
            for id in contributions {
                let declaration = context.store.declaration(*id);
                let map_keys = match &declaration.contribution {
                    ContributionType::IntoMap { map_keys } => map_keys.as_slice(),
                    _ => &[],
                };
                let [map_key] = map_keys else {
                    reporter.report_binding(
                        DiagnosticKind::InvalidMultibindingMapKey,
                        Severity::Error,
                        index,
                        format!(
                            "{declaration} must have exactly one map key annotation, found {}",
                            map_keys.len()
                        ),
                    );
                    continue;
                };
                by_value.entry(map_key.value.as_ref()).or_default().push(declaration);
                by_annotation
                    .entry(&map_key.annotation)
                    .or_default()
                    .push(declaration);
            }

            for (value, declarations) in &by_value {
                if declarations.len() < 2 {
                    continue;
                }
                let mut message =
                    format!("The same map key ({value}) is bound more than once for {}", node.key);
                for declaration in declarations {
                    message.push_str(&format!("\n    {declaration}"));
                }
                reporter.report_binding(
                    DiagnosticKind::InvalidMultibindingMapKey,
                    Severity::Error,
                    index,
                    message,
                );
            }

            if by_annotation.len() > 1 {
                let mut message = format!("{} uses more than one map key annotation type", node.key);
                for (annotation, declarations) in &by_annotation {
                    message.push_str(&format!("\n    @{annotation}:"));
                    for declaration in declarations {
                        message.push_str(&format!("\n        {declaration}"));
                    }
                }
                reporter.report_binding(
                    DiagnosticKind::InvalidMultibindingMapKey,
                    Severity::Error,
                    index,
                    message,
                );
            }
        }
    }
}
