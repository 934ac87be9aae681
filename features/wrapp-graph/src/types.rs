use std::{collections::BTreeMap, fmt, sync::Arc};

/// Primitive type names and the boxed names they are keyed under
const BOXED_PRIMITIVES: [(&str, &str); 8] = [
    ("boolean", "java.lang.Boolean"),
    ("byte", "java.lang.Byte"),
    ("char", "java.lang.Character"),
    ("short", "java.lang.Short"),
    ("int", "java.lang.Integer"),
    ("long", "java.lang.Long"),
    ("float", "java.lang.Float"),
    ("double", "java.lang.Double"),
];

/// Normalized name of a type
///
/// Two spellings of the same type compare equal:
/// whitespace is canonicalized, wildcard bounds are erased and primitives are boxed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(normalize(name.as_ref()).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name without its package prefix and type arguments, used for short labels
    pub fn simple_name(&self) -> &str {
        let raw = self.0.split('<').next().unwrap_or(&self.0);
        raw.rsplit('.').next().unwrap_or(raw)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        TypeName::new(name)
    }
}

fn normalize(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let unbounded = collapsed.replace("? extends ", "").replace("? super ", "");

    let mut out = String::with_capacity(unbounded.len());
    let mut chars = unbounded.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ' ' => {
                // Keep a space only between two identifier characters
                let prev_ident = out.chars().last().is_some_and(is_ident_char);
                let next_ident = chars.peek().copied().is_some_and(is_ident_char);
                if prev_ident && next_ident {
                    out.push(' ');
                }
            }
            ',' => {
                out.push_str(", ");
                while chars.peek() == Some(&' ') {
                    chars.next();
                }
            }
            c => out.push(c),
        }
    }

    match BOXED_PRIMITIVES.iter().find(|(primitive, _)| *primitive == out) {
        Some((_, boxed)) => boxed.to_string(),
        None => out,
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// A qualifier annotation value, compared by annotation type and members
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qualifier {
    pub annotation: TypeName,
    pub members: BTreeMap<Arc<str>, Arc<str>>,
}

impl Qualifier {
    pub fn new(annotation: impl Into<TypeName>) -> Self {
        Self {
            annotation: annotation.into(),
            members: BTreeMap::new(),
        }
    }

    /// Shorthand for a qualifier with a single `value` member, e.g. `@Named("hot")`
    pub fn named(annotation: impl Into<TypeName>, value: impl AsRef<str>) -> Self {
        Self::new(annotation).with_member("value", value)
    }

    pub fn with_member(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.members
            .insert(name.as_ref().into(), value.as_ref().into());
        self
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.annotation)?;
        if self.members.is_empty() {
            return Ok(());
        }

        if self.members.len() == 1 {
            if let Some(value) = self.members.get("value") {
                return write!(f, "({value})");
            }
        }

        let members = self
            .members
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>();
        write!(f, "({})", members.join(", "))
    }
}

/// Lifecycle marker of a binding or a component
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// May be cached in any component, never pins ownership
    Reusable,
    Named(TypeName),
}

impl Scope {
    pub fn named(annotation: impl Into<TypeName>) -> Self {
        Scope::Named(annotation.into())
    }

    pub fn is_reusable(&self) -> bool {
        matches!(self, Scope::Reusable)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Reusable => f.write_str("@Reusable"),
            Scope::Named(annotation) => write!(f, "@{annotation}"),
        }
    }
}

/// Map-key annotation carried by a map contribution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapKey {
    pub annotation: TypeName,
    pub value: Arc<str>,
}

impl MapKey {
    pub fn new(annotation: impl Into<TypeName>, value: impl AsRef<str>) -> Self {
        Self {
            annotation: annotation.into(),
            value: value.as_ref().into(),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}({})", self.annotation, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn type_names_are_normalized() {
        assert_eq!(TypeName::new("Map< String ,Foo >").as_str(), "Map<String, Foo>");
        assert_eq!(TypeName::new("Set<? extends Plugin>"), TypeName::new("Set<Plugin>"));
        assert_eq!(TypeName::new(" int "), TypeName::new("java.lang.Integer"));
        assert_eq!(TypeName::new("com.example.Heater").simple_name(), "Heater");
    }

    #[test]
    fn qualifiers_compare_by_members() {
        let hot = Qualifier::named("Named", "\"hot\"");
        let cold = Qualifier::named("Named", "\"cold\"");

        assert_ne!(hot, cold);
        assert_eq!(hot, Qualifier::named("Named", "\"hot\""));
        assert_eq!(hot.to_string(), "@Named(\"hot\")");
        assert_eq!(
            Qualifier::new("Tagged")
                .with_member("b", "2")
                .with_member("a", "1")
                .to_string(),
            "@Tagged(a=1, b=2)"
        );
    }
}
