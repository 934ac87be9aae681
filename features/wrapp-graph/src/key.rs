use std::{fmt, sync::Arc};

use crate::types::{Qualifier, TypeName};

/// Identifies one contributed element of a multibinding aggregate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContributionId {
    /// Module declaring the contribution
    pub module: Option<TypeName>,
    /// Name of the contributing element inside its module
    pub element: Arc<str>,
}

impl fmt::Display for ContributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{module}#{}", self.element),
            None => f.write_str(&self.element),
        }
    }
}

/// Lookup identity of a dependency
///
/// Keys are equal iff type, qualifier and contribution all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    ty: TypeName,
    qualifier: Option<Qualifier>,
    contribution: Option<ContributionId>,
}

impl Key {
    pub fn new(
        ty: impl Into<TypeName>,
        qualifier: Option<Qualifier>,
        contribution: Option<ContributionId>,
    ) -> Self {
        Self {
            ty: ty.into(),
            qualifier,
            contribution,
        }
    }

    /// Unqualified key for a type
    pub fn of(ty: impl Into<TypeName>) -> Self {
        Self::new(ty, None, None)
    }

    pub fn qualified(ty: impl Into<TypeName>, qualifier: Qualifier) -> Self {
        Self::new(ty, Some(qualifier), None)
    }

    pub fn ty(&self) -> &TypeName {
        &self.ty
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    pub fn contribution(&self) -> Option<&ContributionId> {
        self.contribution.as_ref()
    }

    /// Key of a single contributed element of this aggregate key
    pub fn with_contribution(&self, contribution: ContributionId) -> Self {
        Self {
            contribution: Some(contribution),
            ..self.clone()
        }
    }

    /// The aggregate key a contribution key belongs to
    pub fn without_contribution(&self) -> Self {
        Self {
            contribution: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{qualifier} ")?;
        }
        write!(f, "{}", self.ty)?;
        if let Some(contribution) = &self.contribution {
            write!(f, " [contribution {contribution}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keys_are_structural() {
        let plain = Key::of("Heater");
        let hot = Key::qualified("Heater", Qualifier::named("Named", "\"hot\""));

        let mut seen = HashSet::new();
        seen.insert(plain.clone());
        seen.insert(Key::of(" Heater"));
        seen.insert(hot.clone());

        assert_eq!(seen.len(), 2);
        assert_ne!(plain, hot);
        assert_eq!(hot.to_string(), "@Named(\"hot\") Heater");
    }

    #[test]
    fn contribution_keys_differ_from_their_aggregate() {
        let aggregate = Key::of("Set<Plugin>");
        let element = aggregate.with_contribution(ContributionId {
            module: Some(TypeName::new("PluginModule")),
            element: "first".into(),
        });

        assert_ne!(aggregate, element);
        assert_eq!(element.without_contribution(), aggregate);
        assert_eq!(
            element.to_string(),
            "Set<Plugin> [contribution PluginModule#first]"
        );
    }
}
