use std::collections::HashSet;

use crate::{
    declaration::{Declaration, DeclarationId, DeclarationKind},
    diagnostic::{DiagnosticKind, DiagnosticReporter, Severity},
    graph::BindingNode,
    resolver::Binding,
    store::DeclarationStore,
};

use super::{ValidationContext, ValidationPlugin};

const INDENT: &str = "    ";

/// Reports keys claimed by more than one declaration
///
/// Covers conflicting declarations in one component, unique declarations mixed with
/// multibindings, and scoped declarations shadowing or shadowed across components.
pub struct DuplicateBindingsValidation;

impl ValidationPlugin for DuplicateBindingsValidation {
    fn name(&self) -> &'static str {
        "wrapp/DuplicateBindings"
    }

    fn visit_graph(&self, context: &ValidationContext, reporter: &mut DiagnosticReporter) {
        let store = context.store;
        let mut reported: HashSet<Vec<DeclarationId>> = HashSet::new();

        for (index, node) in context.graph.binding_nodes() {
            if let Binding::Duplicate {
                declarations,
                incompatible,
            } = &node.binding
            {
                if !reported.insert(declarations.clone()) {
                    continue;
                }
                let message = if *incompatible {
                    incompatible_message(node, declarations, store)
                } else {
                    bound_multiple_times(node, declarations, store)
                };
                reporter.report_binding(
                    DiagnosticKind::DuplicateBinding,
                    Severity::Error,
                    index,
                    message,
                );
                continue;
            }

            if node.shadowed.is_empty() {
                continue;
            }
            let Some(severity) = context.options.scoped_shadowing_validation.severity() else {
                continue;
            };
            let mut involved = node.binding.declarations();
            involved.extend(&node.shadowed);
            involved.sort();
            let scoped = involved
                .iter()
                .any(|id| store.declaration(*id).scope.is_some());
            if !scoped || !reported.insert(involved.clone()) {
                continue;
            }

            let mut message = bound_multiple_times(node, &involved, store);
            message.push_str("\nA scoped binding may not shadow, or be shadowed by, a binding of another component.");
            reporter.report_binding(DiagnosticKind::DuplicateBinding, severity, index, message);
        }
    }
}

fn bound_multiple_times(
    node: &BindingNode,
    declarations: &[DeclarationId],
    store: &DeclarationStore,
) -> String {
    let mut message = format!("{} is bound multiple times:", node.key);
    for declaration in sorted_sites(declarations, store) {
        message.push_str(&format!("\n{INDENT}{}", declaration_site(declaration)));
    }
    message
}

fn incompatible_message(
    node: &BindingNode,
    declarations: &[DeclarationId],
    store: &DeclarationStore,
) -> String {
    let sites = sorted_sites(declarations, store);
    let groups: [(&str, fn(&Declaration) -> bool); 3] = [
        ("Unique bindings and declarations:", |declaration| {
            !declaration.is_multibinding_contribution()
                && !matches!(
                    declaration.kind,
                    DeclarationKind::Multibinds(_) | DeclarationKind::OptionalOf
                )
        }),
        ("Multibindings and declarations:", |declaration| {
            declaration.is_multibinding_contribution()
                || matches!(declaration.kind, DeclarationKind::Multibinds(_))
        }),
        ("Optional bindings and declarations:", |declaration| {
            declaration.kind == DeclarationKind::OptionalOf
        }),
    ];

    let mut message = format!("{} has incompatible bindings or declarations:", node.key);
    for (title, belongs) in groups {
        let members = sites
            .iter()
            .filter(|declaration| belongs(declaration))
            .collect::<Vec<_>>();
        if members.is_empty() {
            continue;
        }
        message.push_str(&format!("\n{INDENT}{title}"));
        for declaration in members {
            message.push_str(&format!("\n{INDENT}{INDENT}{}", declaration_site(declaration)));
        }
    }
    message
}

/// Declarations ordered by module, then element
fn sorted_sites<'a>(declarations: &[DeclarationId], store: &'a DeclarationStore) -> Vec<&'a Declaration> {
    let mut sites = declarations
        .iter()
        .map(|id| store.declaration(*id))
        .collect::<Vec<_>>();
    sites.sort_by(|a, b| {
        a.module
            .cmp(&b.module)
            .then_with(|| a.element.cmp(&b.element))
    });
    sites
}

fn declaration_site(declaration: &Declaration) -> String {
    match &declaration.scope {
        Some(scope) if declaration.kind != DeclarationKind::Injection => {
            format!("{scope} {declaration}")
        }
        _ => declaration.to_string(),
    }
}
