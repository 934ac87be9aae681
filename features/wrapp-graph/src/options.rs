//! Compiler options and the framework type names used when rendering requests.
//!
//! Options are plain values passed by reference into every stage of a resolution.
//! They are usually parsed from the `key=value` processor options of the front end:
//!
//! ```rust
//! use wrapp_graph::options::{CompilerOptions, ValidationType};
//!
//! let options = CompilerOptions::from_processor_options([
//!     ("wrapp.scopeCycleValidation", "warning"),
//!     ("wrapp.nullableValidation", "error"),
//! ])
//! .unwrap();
//!
//! assert_eq!(options.scope_cycle_validation, ValidationType::Warning);
//! ```

use std::{fmt, str::FromStr};

use crate::{diagnostic::Severity, types::TypeName};

pub const SCOPE_CYCLE_VALIDATION_KEY: &str = "wrapp.scopeCycleValidation";
pub const NULLABLE_VALIDATION_KEY: &str = "wrapp.nullableValidation";
pub const SCOPED_SHADOWING_VALIDATION_KEY: &str = "wrapp.scopedShadowingValidation";

/// How a configurable check reports its findings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationType {
    Error,
    Warning,
    None,
}

impl ValidationType {
    /// Severity of the reported item, `None` if the check is disabled
    pub fn severity(self) -> Option<Severity> {
        match self {
            ValidationType::Error => Some(Severity::Error),
            ValidationType::Warning => Some(Severity::Warning),
            ValidationType::None => None,
        }
    }
}

impl FromStr for ValidationType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(ValidationType::Error),
            "warning" => Ok(ValidationType::Warning),
            "none" => Ok(ValidationType::None),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ValidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationType::Error => f.write_str("error"),
            ValidationType::Warning => f.write_str("warning"),
            ValidationType::None => f.write_str("none"),
        }
    }
}

/// Errors while reading processor options
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Invalid value '{value}' for option '{key}', expected one of: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Names of the framework wrapper types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkNames {
    pub provider: TypeName,
    pub lazy: TypeName,
    pub producer: TypeName,
    pub produced: TypeName,
    pub future: TypeName,
}

impl Default for FrameworkNames {
    fn default() -> Self {
        Self {
            provider: TypeName::new("Provider"),
            lazy: TypeName::new("Lazy"),
            producer: TypeName::new("Producer"),
            produced: TypeName::new("Produced"),
            future: TypeName::new("ListenableFuture"),
        }
    }
}

/// Options controlling resolution and validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// A component repeating a scope of one of its ancestors
    pub scope_cycle_validation: ValidationType,
    /// A nullable binding injected where null is not accepted
    pub nullable_validation: ValidationType,
    /// A scoped binding shadowed by, or shadowing, a binding of another component
    pub scoped_shadowing_validation: ValidationType,
    pub framework_names: FrameworkNames,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            scope_cycle_validation: ValidationType::Error,
            nullable_validation: ValidationType::Error,
            scoped_shadowing_validation: ValidationType::Error,
            framework_names: FrameworkNames::default(),
        }
    }
}

impl CompilerOptions {
    /// Reads options from `key=value` pairs, starting from the defaults
    ///
    /// Unknown keys are ignored.
    pub fn from_processor_options<I, K, V>(options: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = Self::default();
        for (key, value) in options {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                SCOPE_CYCLE_VALIDATION_KEY => {
                    parsed.scope_cycle_validation = parse_validation(key, value, true)?
                }
                NULLABLE_VALIDATION_KEY => {
                    parsed.nullable_validation = parse_validation(key, value, false)?
                }
                SCOPED_SHADOWING_VALIDATION_KEY => {
                    parsed.scoped_shadowing_validation = parse_validation(key, value, true)?
                }
                other => tracing::warn!("Ignoring unknown processor option '{other}'"),
            }
        }

        Ok(parsed)
    }

    pub fn with_scope_cycle_validation(mut self, validation: ValidationType) -> Self {
        self.scope_cycle_validation = validation;
        self
    }

    pub fn with_nullable_validation(mut self, validation: ValidationType) -> Self {
        self.nullable_validation = validation;
        self
    }

    pub fn with_scoped_shadowing_validation(mut self, validation: ValidationType) -> Self {
        self.scoped_shadowing_validation = validation;
        self
    }
}

fn parse_validation(
    key: &str,
    value: &str,
    allow_none: bool,
) -> Result<ValidationType, OptionsError> {
    let invalid = || OptionsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: if allow_none {
            "error, warning, none"
        } else {
            "error, warning"
        },
    };

    match value.parse::<ValidationType>() {
        Ok(ValidationType::None) if !allow_none => Err(invalid()),
        Ok(validation) => Ok(validation),
        Err(()) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_report_errors() {
        let options = CompilerOptions::from_processor_options(Vec::<(&str, &str)>::new()).unwrap();
        assert_eq!(options, CompilerOptions::default());
        assert_eq!(options.nullable_validation.severity(), Some(Severity::Error));
    }

    #[test]
    fn parses_known_options_and_skips_unknown_ones() {
        let options = CompilerOptions::from_processor_options([
            ("wrapp.scopeCycleValidation", "NONE"),
            ("wrapp.scopedShadowingValidation", "warning"),
            ("some.otherTool", "whatever"),
        ])
        .unwrap();

        assert_eq!(options.scope_cycle_validation, ValidationType::None);
        assert_eq!(options.scoped_shadowing_validation, ValidationType::Warning);
        assert_eq!(options.nullable_validation, ValidationType::Error);
    }

    #[test]
    fn rejects_invalid_values() {
        let error =
            CompilerOptions::from_processor_options([("wrapp.nullableValidation", "none")])
                .unwrap_err();

        assert_eq!(
            error,
            OptionsError::InvalidValue {
                key: "wrapp.nullableValidation".to_string(),
                value: "none".to_string(),
                expected: "error, warning",
            }
        );
    }
}
