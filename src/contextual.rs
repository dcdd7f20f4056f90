//! Contextual bindings: per-consumer dependency overrides
//!
//! `container.when("ReportGenerator").needs("Logger").give("FileLogger")`
//! makes `ReportGenerator` receive `FileLogger` wherever it declares a
//! `Logger` dependency, while every other consumer keeps the global binding.
//!
//! Nothing is validated at registration time; an unresolvable implementation
//! only surfaces when the override is exercised during `make`.

use crate::binding::BindTarget;
use crate::registry::normalize;
use crate::Container;
use ahash::RandomState;
use dashmap::DashMap;
use std::collections::HashMap;

#[cfg(feature = "logging")]
use tracing::debug;

/// Store of `(consumer, dependency) -> implementation` overrides
pub(crate) struct ContextualBindings {
    map: DashMap<String, HashMap<String, BindTarget, RandomState>, RandomState>,
}

impl ContextualBindings {
    pub(crate) fn new() -> Self {
        Self {
            map: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
        }
    }

    pub(crate) fn give(&self, consumer: String, dependency: String, target: BindTarget) {
        self.map
            .entry(consumer)
            .or_default()
            .insert(dependency, target);
    }

    /// Override for `(consumer, dependency)`, cloned out of the map
    pub(crate) fn get(&self, consumer: &str, dependency: &str) -> Option<BindTarget> {
        self.map
            .get(consumer)
            .and_then(|deps| deps.get(dependency).cloned())
    }

    pub(crate) fn len(&self) -> usize {
        self.map.iter().map(|e| e.value().len()).sum()
    }
}

impl std::fmt::Debug for ContextualBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextualBindings")
            .field("overrides", &self.len())
            .finish()
    }
}

/// First step of the fluent contextual API; created by `Container::when`
pub struct ContextualBindingBuilder<'c> {
    container: &'c Container,
    consumer: String,
}

impl<'c> ContextualBindingBuilder<'c> {
    #[inline]
    pub(crate) fn new(container: &'c Container, consumer: &str) -> Self {
        Self {
            container,
            consumer: normalize(consumer),
        }
    }

    /// Name the dependency being overridden for this consumer
    #[inline]
    pub fn needs(self, dependency: &str) -> ContextualNeedsBuilder<'c> {
        ContextualNeedsBuilder {
            container: self.container,
            consumer: self.consumer,
            dependency: normalize(dependency),
        }
    }
}

/// Second step: commits the override with `give`
pub struct ContextualNeedsBuilder<'c> {
    container: &'c Container,
    consumer: String,
    dependency: String,
}

impl ContextualNeedsBuilder<'_> {
    /// Commit the override: a service name, a factory, or a raw value
    pub fn give(self, implementation: impl Into<BindTarget>) {
        let target = implementation.into();

        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            consumer = %self.consumer,
            dependency = %self.dependency,
            implementation = target.kind(),
            "Registering contextual binding"
        );

        self.container
            .contextual()
            .give(self.consumer, self.dependency, target);
    }
}
