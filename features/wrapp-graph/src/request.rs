use std::{fmt, sync::Arc};

use crate::{key::Key, options::FrameworkNames};

/// How a dependency is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestKind {
    /// The value itself
    Instance,
    /// A factory handle, each `get` may construct anew
    Provider,
    /// A memoizing handle, constructed on first access
    Lazy,
    /// A factory of memoizing handles
    ProviderOfLazy,
    /// An asynchronous producer handle
    Producer,
    /// The produced result, success or failure
    Produced,
    /// A future of the value, only valid on entry points
    Future,
}

impl RequestKind {
    /// Whether the request defers construction, so a cycle through it can be built at runtime
    pub fn breaks_cycle(self) -> bool {
        matches!(
            self,
            RequestKind::Provider | RequestKind::Lazy | RequestKind::ProviderOfLazy
        )
    }

    /// Whether the request can only be served inside a production context
    pub fn is_async(self) -> bool {
        matches!(
            self,
            RequestKind::Producer | RequestKind::Produced | RequestKind::Future
        )
    }

    /// Whether the value is handed out through a `Provider` or `Lazy` handle
    ///
    /// Such handles are called synchronously, even from a production binding.
    pub fn is_provider_wrapped(self) -> bool {
        self.breaks_cycle()
    }

    /// Renders the requested type, e.g. `Provider<Lazy<Heater>>`
    pub fn request_type(self, ty: &str, names: &FrameworkNames) -> String {
        match self {
            RequestKind::Instance => ty.to_string(),
            RequestKind::Provider => format!("{}<{ty}>", names.provider),
            RequestKind::Lazy => format!("{}<{ty}>", names.lazy),
            RequestKind::ProviderOfLazy => {
                format!("{}<{}<{ty}>>", names.provider, names.lazy)
            }
            RequestKind::Producer => format!("{}<{ty}>", names.producer),
            RequestKind::Produced => format!("{}<{ty}>", names.produced),
            RequestKind::Future => format!("{}<{ty}>", names.future),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::Instance => "instance",
            RequestKind::Provider => "provider",
            RequestKind::Lazy => "lazy",
            RequestKind::ProviderOfLazy => "provider of lazy",
            RequestKind::Producer => "producer",
            RequestKind::Produced => "produced",
            RequestKind::Future => "future",
        };
        f.write_str(name)
    }
}

/// A request for a [Key] made by a binding or by a component entry point
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyRequest {
    pub key: Key,
    pub kind: RequestKind,
    /// The requesting element, e.g. `CoffeeMaker(heater)` or `CoffeeShop.maker()`
    pub element: Option<Arc<str>>,
    /// Whether the requesting element accepts null
    pub nullable: bool,
}

impl DependencyRequest {
    pub fn new(key: Key, kind: RequestKind) -> Self {
        Self {
            key,
            kind,
            element: None,
            nullable: false,
        }
    }

    pub fn instance(key: Key) -> Self {
        Self::new(key, RequestKind::Instance)
    }

    pub fn provider(key: Key) -> Self {
        Self::new(key, RequestKind::Provider)
    }

    pub fn lazy(key: Key) -> Self {
        Self::new(key, RequestKind::Lazy)
    }

    /// Names the requesting element
    pub fn at(mut self, element: impl AsRef<str>) -> Self {
        self.element = Some(element.as_ref().into());
        self
    }

    pub fn allowing_null(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The type as written at the request site
    pub fn request_type(&self, names: &FrameworkNames) -> String {
        let ty = match self.key.qualifier() {
            Some(qualifier) => format!("{qualifier} {}", self.key.ty()),
            None => self.key.ty().to_string(),
        };
        self.kind.request_type(&ty, names)
    }
}
