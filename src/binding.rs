//! Bind targets and the type-erased service handle
//!
//! Every object the container hands out is a `Svc`: an `Arc<dyn Any>` that
//! callers downcast back to the concrete type. Bindings store a
//! [`BindTarget`] describing how to produce that object: another name, a
//! factory closure, or a raw pre-built value.

use crate::recipe::Params;
use crate::{Container, ContainerError, Result};
use std::any::Any;
use std::sync::Arc;

/// Type-erased, shareable service handle
pub type Svc = Arc<dyn Any + Send + Sync>;

/// Factory closure invoked with the container and caller-supplied parameters
pub type FactoryFn = Arc<dyn Fn(&Container, &Params) -> Result<Svc> + Send + Sync>;

/// Marker trait for values the container can hold.
///
/// Automatically implemented for all `Send + Sync + 'static` types; never
/// implement it manually.
pub trait Injectable: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Injectable for T {}

/// Erase a value into a [`Svc`] handle
#[inline]
pub fn svc<T: Injectable>(value: T) -> Svc {
    Arc::new(value)
}

/// Downcast a [`Svc`] back to its concrete type.
///
/// `context` names the service or argument for the error message.
#[inline]
pub fn downcast_svc<T: Injectable>(value: Svc, context: &str) -> Result<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| ContainerError::type_mismatch::<T>(context))
}

/// What a binding produces when resolved.
///
/// Enum-based rather than a trait object: three variants, all code paths
/// visible to the resolution engine's match.
#[derive(Clone)]
pub enum BindTarget {
    /// Another service name: a concrete class name or a further abstract
    Name(String),
    /// Factory closure invoked as `(container, params)`
    Factory(FactoryFn),
    /// Raw pre-built value returned without construction
    Value(Svc),
}

impl BindTarget {
    /// Target naming another service
    #[inline]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Target wrapping a factory closure
    #[inline]
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Container, &Params) -> Result<Svc> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    /// Target holding a raw value
    #[inline]
    pub fn value<T: Injectable>(value: T) -> Self {
        Self::Value(svc(value))
    }

    /// Short kind label for logs and introspection
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Factory(_) => "factory",
            Self::Value(_) => "value",
        }
    }
}

impl From<&str> for BindTarget {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for BindTarget {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl std::fmt::Debug for BindTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(n) => f.debug_tuple("Name").field(n).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Value(_) => f.write_str("Value(..)"),
        }
    }
}

/// Key accepted by `bind`: a plain name, or an `(alias, name)` pair that
/// registers the alias before binding the name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindKey {
    Name(String),
    Aliased { alias: String, name: String },
}

impl From<&str> for BindKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for BindKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<(&str, &str)> for BindKey {
    fn from((alias, name): (&str, &str)) -> Self {
        Self::Aliased {
            alias: alias.to_string(),
            name: name.to_string(),
        }
    }
}

impl From<(String, String)> for BindKey {
    fn from((alias, name): (String, String)) -> Self {
        Self::Aliased { alias, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svc_roundtrip() {
        let handle = svc(42u32);
        let back = downcast_svc::<u32>(handle, "answer").unwrap();
        assert_eq!(*back, 42);
    }

    #[test]
    fn test_downcast_mismatch() {
        let handle = svc("hello".to_string());
        let err = downcast_svc::<u32>(handle, "greeting").unwrap_err();
        assert!(matches!(err, ContainerError::TypeMismatch { .. }));
        assert!(err.to_string().contains("greeting"));
    }

    #[test]
    fn test_target_kinds() {
        assert_eq!(BindTarget::name("Logger").kind(), "name");
        assert_eq!(BindTarget::value(1u8).kind(), "value");
        let factory = BindTarget::factory(|_, _| Ok(svc(1u8)));
        assert_eq!(factory.kind(), "factory");
    }

    #[test]
    fn test_bind_key_from_pair() {
        let key: BindKey = ("log", "app::Logger").into();
        assert_eq!(
            key,
            BindKey::Aliased {
                alias: "log".into(),
                name: "app::Logger".into()
            }
        );
    }
}
