use miette::Diagnostic;
use thiserror::Error;

use crate::{diagnostic::DiagnosticItem, types::TypeName};

/// The collected declarations do not describe a consistent component hierarchy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Component '{0}' is declared more than once")]
    DuplicateComponent(TypeName),
    #[error("Module '{0}' is declared more than once")]
    DuplicateModule(TypeName),
    #[error("'{referenced_by}' references module '{module}' but it is not declared")]
    UnknownModule {
        module: TypeName,
        referenced_by: String,
    },
    #[error("Component '{component}' declares parent '{parent}' but it is not declared")]
    UnknownParent {
        component: TypeName,
        parent: TypeName,
    },
    #[error("Component '{0}' is its own ancestor")]
    ParentCycle(TypeName),
    #[error("Module '{module}' lists subcomponent '{subcomponent}' but it is not declared")]
    UnknownSubcomponent {
        module: TypeName,
        subcomponent: TypeName,
    },
    #[error("Module '{module}' lists subcomponent '{subcomponent}' which has no creator type")]
    SubcomponentWithoutCreator {
        module: TypeName,
        subcomponent: TypeName,
    },
    #[error("Module '{module}' lists subcomponent '{subcomponent}' but is installed in '{component}' which is not its parent")]
    SubcomponentNotAChild {
        module: TypeName,
        subcomponent: TypeName,
        component: TypeName,
    },
    #[error("'{element}' must have exactly one dependency but has {actual}")]
    InvalidDependencyCount { element: String, actual: usize },
    #[error("No component named '{0}' is declared")]
    UnknownComponent(TypeName),
    #[error("'{0}' is not a root component")]
    NotARoot(TypeName),
}

/// Every error-severity diagnostic of one resolution
#[derive(Error, Debug, Clone, Diagnostic)]
#[diagnostic(code(wrapp::graph))]
pub struct GraphErrors {
    pub component: TypeName,
    #[related]
    pub errors: Vec<DiagnosticItem>,
}

impl std::fmt::Display for GraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push(format!(
            "The binding graph of '{}' had one or more errors:",
            self.component
        ));
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}
