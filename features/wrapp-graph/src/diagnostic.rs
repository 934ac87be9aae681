//! Structured findings of the validation plugins and their dependency traces.
//!
//! Traces read from the offending request back up to the entry point:
//!
//! ```text
//! Heater is injected at
//!     Pump(heater)
//! Pump is injected at
//!     CoffeeMaker(heater, pump)
//! CoffeeMaker is requested at
//!     CoffeeShop.maker()
//! ```

use std::fmt;

use miette::Diagnostic;

use crate::{
    graph::{EdgeIndex, Node, NodeIndex},
    validation::ValidationContext,
};

const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
            Severity::Note => f.write_str("note"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    MissingBinding,
    DuplicateBinding,
    DependencyCycle,
    IncompatibleScope,
    ProvisionFromProductionViolation,
    InvalidMultibindingMapKey,
    AmbiguousRequestKind,
    NullableToNonNullable,
    ConflictingScopes,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::MissingBinding => "missing_binding",
            DiagnosticKind::DuplicateBinding => "duplicate_binding",
            DiagnosticKind::DependencyCycle => "dependency_cycle",
            DiagnosticKind::IncompatibleScope => "incompatible_scope",
            DiagnosticKind::ProvisionFromProductionViolation => "provision_from_production",
            DiagnosticKind::InvalidMultibindingMapKey => "invalid_map_key",
            DiagnosticKind::AmbiguousRequestKind => "ambiguous_request_kind",
            DiagnosticKind::NullableToNonNullable => "nullable_to_non_nullable",
            DiagnosticKind::ConflictingScopes => "conflicting_scopes",
        }
    }
}

/// What a diagnostic is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Component(NodeIndex),
    Binding(NodeIndex),
    Dependency(EdgeIndex),
}

/// One finding of a validation plugin
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticItem {
    pub plugin: &'static str,
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub anchor: Anchor,
    pub message: String,
    /// Rendered dependency trace, empty when the finding has none
    pub trace: String,
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.plugin, self.message)?;
        if !self.trace.is_empty() {
            write!(f, "\n{}", self.trace)?;
        }
        Ok(())
    }
}

impl Diagnostic for DiagnosticItem {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("wrapp::{}", self.kind.code())))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Note => miette::Severity::Advice,
        })
    }
}

/// Collects the findings of one plugin and renders their traces
pub struct DiagnosticReporter<'a> {
    context: &'a ValidationContext<'a>,
    plugin: &'static str,
    items: Vec<DiagnosticItem>,
}

impl<'a> DiagnosticReporter<'a> {
    pub fn new(context: &'a ValidationContext<'a>, plugin: &'static str) -> Self {
        Self {
            context,
            plugin,
            items: Vec::new(),
        }
    }

    pub fn into_items(self) -> Vec<DiagnosticItem> {
        self.items
    }

    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        severity: Severity,
        anchor: Anchor,
        message: impl Into<String>,
        trace: String,
    ) {
        let message = message.into();
        tracing::debug!("{} reported {severity}: {message}", self.plugin);
        self.items.push(DiagnosticItem {
            plugin: self.plugin,
            kind,
            severity,
            anchor,
            message,
            trace,
        });
    }

    pub fn report_component(
        &mut self,
        kind: DiagnosticKind,
        severity: Severity,
        component: NodeIndex,
        message: impl Into<String>,
    ) {
        self.report(kind, severity, Anchor::Component(component), message, String::new());
    }

    /// Reports a binding node with the trace from its nearest entry point
    pub fn report_binding(
        &mut self,
        kind: DiagnosticKind,
        severity: Severity,
        node: NodeIndex,
        message: impl Into<String>,
    ) {
        let graph = self.context.graph;
        let path = graph.entry_point_path(node);
        let mut trace = self.render_trace(&path);

        let others = graph
            .dependent_entry_points(node)
            .into_iter()
            .filter(|edge| path.first() != Some(edge))
            .collect::<Vec<_>>();
        if !others.is_empty() {
            trace.push_str("\n\nThe following other entry points also depend on it:");
            for edge in others {
                trace.push_str(&format!("\n{INDENT}{}", self.request_site(edge)));
            }
        }

        self.report(kind, severity, Anchor::Binding(node), message, trace);
    }

    /// Reports a dependency edge with the trace from the entry point through it
    pub fn report_dependency(
        &mut self,
        kind: DiagnosticKind,
        severity: Severity,
        edge: EdgeIndex,
        message: impl Into<String>,
    ) {
        let graph = self.context.graph;
        let source = graph.edge(edge).source;
        let mut path = match graph.node(source) {
            Node::Binding(_) => graph.entry_point_path(source),
            Node::Component(_) => Vec::new(),
        };
        path.push(edge);

        let trace = self.render_trace(&path);
        self.report(kind, severity, Anchor::Dependency(edge), message, trace);
    }

    /// Renders a chain of dependency edges given entry point first, innermost request on top
    pub fn render_trace(&self, path: &[EdgeIndex]) -> String {
        let graph = self.context.graph;
        let names = &self.context.options.framework_names;
        path.iter()
            .rev()
            .filter_map(|index| {
                let edge = graph.edge(*index);
                let request = edge.request()?;
                let verb = if edge.is_entry_point() {
                    "requested"
                } else {
                    "injected"
                };
                Some(format!(
                    "{} is {verb} at\n{INDENT}{}",
                    request.request_type(names),
                    self.request_site(*index)
                ))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Where a request is made, prefixed by the component path outside the root component
    fn request_site(&self, index: EdgeIndex) -> String {
        let graph = self.context.graph;
        let store = self.context.store;
        let edge = graph.edge(index);
        let source = graph.node(edge.source);

        let element = match (edge.request().and_then(|request| request.element.clone()), source) {
            (Some(element), _) => element.to_string(),
            (None, Node::Component(component)) => {
                store.tree().name(component.path.current()).to_string()
            }
            (None, Node::Binding(binding)) => match binding.binding.declaration() {
                Some(declaration) => store.declaration(declaration).to_string(),
                None => format!("{} ({})", binding.key, binding.binding.describe()),
            },
        };

        let path = source.path();
        if path.at_root() {
            element
        } else {
            format!("[{}] {element}", path.display(store.tree()))
        }
    }
}
