//! The container: binding registration and the resolution engine
//!
//! A `Container` is a cheaply clonable handle over shared registry state.
//! Services are registered under string names (`bind`, `singleton`,
//! `bind_value`, `alias`), described by recipes (`define`), and resolved
//! with `make`/`call`. Once a name has been resolved its binding is
//! immutable: late re-registration is a hard error instead of a silent
//! graph corruption.
//!
//! # Examples
//!
//! ```rust
//! use bindery::{Args, Container, Param, Recipe};
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let container = Container::new();
//! container.define(
//!     "Greeter",
//!     Recipe::new(|args: Args| {
//!         Ok(Greeter {
//!             greeting: args.value::<String>(0)?,
//!         })
//!     })
//!     .param(Param::value("greeting").default_to("hello".to_string())),
//! );
//! container.bind_self("Greeter").unwrap();
//!
//! let greeter = container.make_as::<Greeter>("Greeter").unwrap();
//! assert_eq!(greeter.greeting, "hello");
//! ```

use crate::binding::{downcast_svc, BindKey, BindTarget, Injectable, Svc};
use crate::contextual::{ContextualBindingBuilder, ContextualBindings};
use crate::recipe::{Callable, Params, Recipe};
use crate::registry::{normalize, BindingInfo, Registry};
use crate::{resolve, stack, ContainerError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Name-keyed IoC container.
///
/// Clone freely: clones share the same registry, contextual store, and
/// wiring table.
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
    contextual: Arc<ContextualBindings>,
    recipes: Arc<DashMap<String, Recipe, RandomState>>,
}

impl Container {
    /// Create an empty container.
    pub fn new() -> Self {
        #[cfg(feature = "logging")]
        debug!(target: "bindery", "Creating new container");

        Self {
            registry: Arc::new(Registry::new()),
            contextual: Arc::new(ContextualBindings::new()),
            recipes: Arc::new(DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            )),
        }
    }

    /// Identity key for this container's build stack: the registry
    /// allocation address, unique per root container.
    #[inline]
    pub(crate) fn stack_key(&self) -> usize {
        Arc::as_ptr(&self.registry) as usize
    }

    #[inline]
    pub(crate) fn contextual(&self) -> &ContextualBindings {
        &self.contextual
    }

    #[inline]
    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Recipe for a class name, cloned out of the wiring table
    #[inline]
    pub(crate) fn recipe(&self, name: &str) -> Option<Recipe> {
        self.recipes.get(name).map(|r| r.clone())
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register a binding. The key is a plain name or an `(alias, name)`
    /// pair; the pair registers the alias first. A `Value` target under a
    /// plain name short-circuits into the raw-value store.
    ///
    /// Returns the stored target. Fails with `AlreadyResolved` once the
    /// name has been resolved.
    pub fn bind(
        &self,
        key: impl Into<BindKey>,
        target: impl Into<BindTarget>,
    ) -> Result<BindTarget> {
        self.bind_inner(key.into(), target.into(), false)
    }

    /// Register a shared binding: the built instance is cached and reused.
    pub fn singleton(
        &self,
        key: impl Into<BindKey>,
        target: impl Into<BindTarget>,
    ) -> Result<BindTarget> {
        self.bind_inner(key.into(), target.into(), true)
    }

    /// Bind a name to itself, marking it auto-buildable from its recipe
    /// (the omitted-concrete case).
    pub fn bind_self(&self, name: &str) -> Result<BindTarget> {
        let name = normalize(name);
        self.bind_inner(BindKey::Name(name.clone()), BindTarget::Name(name), false)
    }

    /// Shared variant of [`bind_self`](Self::bind_self).
    pub fn singleton_self(&self, name: &str) -> Result<BindTarget> {
        let name = normalize(name);
        self.bind_inner(BindKey::Name(name.clone()), BindTarget::Name(name), true)
    }

    /// Bind a raw value, returned on `make` without any construction.
    pub fn bind_value<T: Injectable>(&self, name: &str, value: T) -> Result<BindTarget> {
        self.bind_inner(
            BindKey::Name(name.to_string()),
            BindTarget::value(value),
            false,
        )
    }

    fn bind_inner(&self, key: BindKey, target: BindTarget, shared: bool) -> Result<BindTarget> {
        let (name, alias_pair) = match key {
            BindKey::Name(name) => (normalize(&name), false),
            BindKey::Aliased { alias, name } => {
                let name = normalize(&name);
                self.registry.insert_alias(&normalize(&alias), &name);
                (name, true)
            }
        };
        if name.is_empty() {
            return Err(ContainerError::InvalidName(name));
        }

        // Raw values short-circuit: no binding object is created
        if !alias_pair {
            if let BindTarget::Value(value) = &target {
                self.registry.insert_value(&name, value.clone())?;

                #[cfg(feature = "logging")]
                debug!(
                    target: "bindery",
                    service = %name,
                    "Registering raw value"
                );

                return Ok(target);
            }
        }

        self.registry.insert_binding(&name, target.clone(), shared)?;

        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            service = %name,
            concrete = target.kind(),
            shared = shared,
            "Registering binding"
        );

        Ok(target)
    }

    /// Record `alias -> target`. Pure indirection: resolving the alias
    /// never instantiates anything by itself.
    pub fn alias(&self, alias: &str, target: &str) {
        let alias = normalize(alias);
        let target = normalize(target);

        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            alias = %alias,
            aliased_to = %target,
            "Registering alias"
        );

        self.registry.insert_alias(&alias, &target);
    }

    /// Register (or replace) the constructor recipe for a class name.
    ///
    /// Recipes are code-level wiring and are not subject to the
    /// resolved-immutability rule.
    pub fn define(&self, name: &str, recipe: Recipe) {
        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            class = %normalize(name),
            params = recipe.params().len(),
            "Defining constructor recipe"
        );

        self.recipes.insert(normalize(name), recipe);
    }

    /// Decorate the current binding of `name`: rebinds it to a factory
    /// that resolves the original target and passes the instance plus the
    /// container through `decorator`. The shared flag is preserved.
    ///
    /// Fails with `NotYetBound` when nothing is bound under `name`.
    pub fn extend<F>(&self, name: &str, decorator: F) -> Result<()>
    where
        F: Fn(&Container, Svc) -> Result<Svc> + Send + Sync + 'static,
    {
        let name = normalize(name);
        let (original, shared) = self
            .registry
            .binding(&name)
            .ok_or_else(|| ContainerError::NotYetBound(name.clone()))?;

        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            service = %name,
            original = original.kind(),
            "Extending binding with decorator"
        );

        let inner_name = name.clone();
        let wrapper = BindTarget::factory(move |container, params| {
            let previous = container.resolve_target(&original, &inner_name, params)?;
            decorator(container, previous)
        });
        self.registry.insert_binding(&name, wrapper, shared)?;
        Ok(())
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve a name into a ready-to-use instance.
    pub fn make(&self, name: &str) -> Result<Svc> {
        self.make_with(name, Params::new())
    }

    /// Resolve with caller-supplied parameter overrides.
    pub fn make_with(&self, name: &str, params: Params) -> Result<Svc> {
        if name.trim().is_empty() {
            return Err(ContainerError::InvalidName(name.to_string()));
        }

        let alias = self.registry.resolve_alias(&normalize(name))?;
        if !self.registry.bound(&alias) {
            #[cfg(feature = "logging")]
            debug!(
                target: "bindery",
                service = %alias,
                "Service not bound"
            );
            return Err(ContainerError::not_found(alias));
        }

        // Cached singleton instance or raw value: no rebuild
        if let Some(cached) = self.registry.cached(&alias) {
            #[cfg(feature = "logging")]
            trace!(
                target: "bindery",
                service = %alias,
                location = "instance_cache",
                "Service resolved from cache"
            );
            self.registry.mark_resolved(&alias);
            return Ok(cached);
        }

        let concrete = self.concrete_for(&alias);

        #[cfg(feature = "logging")]
        trace!(
            target: "bindery",
            service = %alias,
            concrete = concrete.kind(),
            "Resolving service"
        );

        let built = self
            .resolve_target(&concrete, &alias, &params)
            .map_err(|source| ContainerError::resolution_failed(&alias, source))?;

        self.registry.cache_if_shared(&alias, &built);
        self.registry.mark_resolved(&alias);

        // Racing first resolves of a shared binding may each build; the
        // cache's first write wins, so hand out the canonical instance
        Ok(self.registry.cached(&alias).unwrap_or(built))
    }

    /// Typed sugar over [`make`](Self::make).
    pub fn make_as<T: Injectable>(&self, name: &str) -> Result<Arc<T>> {
        downcast_svc(self.make(name)?, name)
    }

    /// Typed sugar over [`make_with`](Self::make_with).
    pub fn make_with_as<T: Injectable>(&self, name: &str, params: Params) -> Result<Arc<T>> {
        downcast_svc(self.make_with(name, params)?, name)
    }

    /// Invoke a callable with resolved arguments.
    pub fn call(&self, callable: &Callable, params: Params) -> Result<Svc> {
        resolve::resolve_callable(self, callable, &params)
    }

    /// Typed sugar over [`call`](Self::call).
    pub fn call_as<T: Injectable>(&self, callable: &Callable, params: Params) -> Result<Arc<T>> {
        downcast_svc(self.call(callable, params)?, callable.name())
    }

    /// The concrete to build for `alias`: the contextual override for the
    /// current consumer if one exists, else the registered binding target,
    /// else the alias itself (auto-buildable class name).
    fn concrete_for(&self, alias: &str) -> BindTarget {
        if let Some(consumer) = stack::consumer(self.stack_key()) {
            if let Some(overridden) = self.contextual.get(&consumer, alias) {
                #[cfg(feature = "logging")]
                debug!(
                    target: "bindery",
                    service = %alias,
                    consumer = %consumer,
                    "Applying contextual override"
                );
                return overridden;
            }
        }
        match self.registry.binding_target(alias) {
            Some(target) => target,
            None => BindTarget::name(alias),
        }
    }

    /// Build the target directly when it is buildable (a factory, a value,
    /// or a class name equal to the alias); otherwise it names a further
    /// abstract and resolution recurses.
    fn resolve_target(&self, target: &BindTarget, alias: &str, params: &Params) -> Result<Svc> {
        match target {
            BindTarget::Name(concrete) if concrete != alias => {
                self.make_with(concrete, params.clone())
            }
            buildable => self.build(buildable, params),
        }
    }

    fn build(&self, target: &BindTarget, params: &Params) -> Result<Svc> {
        match target {
            BindTarget::Factory(factory) => factory(self, params),
            BindTarget::Value(value) => Ok(value.clone()),
            BindTarget::Name(class) => resolve::resolve_class(self, class, params),
        }
    }

    // =========================================================================
    // Contextual Bindings
    // =========================================================================

    /// Start a contextual binding:
    /// `when(consumer).needs(dependency).give(implementation)`.
    pub fn when(&self, consumer: &str) -> ContextualBindingBuilder<'_> {
        ContextualBindingBuilder::new(self, consumer)
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// True if the name has a binding, a cached instance, a raw value, or
    /// is an alias.
    pub fn bound(&self, name: &str) -> bool {
        self.registry.bound(&normalize(name))
    }

    /// True if a shared binding exists for the name (aliases chased) or an
    /// instance is already cached.
    pub fn is_singleton(&self, name: &str) -> bool {
        let name = normalize(name);
        let alias = self.registry.resolve_alias(&name).unwrap_or(name);
        self.registry.is_singleton(&alias)
    }

    /// True if the name ever passed through `bind` or `alias`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.is_known(&normalize(name))
    }

    /// True once the name has been resolved (and its binding frozen).
    pub fn is_resolved(&self, name: &str) -> bool {
        self.registry.is_resolved(&normalize(name))
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Snapshot of all registered bindings, sorted by name.
    pub fn get_bindings(&self) -> Vec<BindingInfo> {
        self.registry.bindings_snapshot()
    }

    /// The registered target for a name without resolving it.
    pub fn get_raw(&self, name: &str) -> Option<BindTarget> {
        self.registry.raw(&normalize(name))
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.registry.len())
            .field("contextual", &self.contextual.len())
            .field("recipes", &self.recipes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::svc;
    use crate::recipe::{Args, Param};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FileLogger {
        path: String,
    }

    fn define_file_logger(container: &Container) {
        container.define(
            "FileLogger",
            Recipe::new(|args: Args| {
                Ok(FileLogger {
                    path: args.value::<String>(0)?,
                })
            })
            .param(Param::value("path").default_to("/var/log/app.log".to_string())),
        );
    }

    #[test]
    fn test_bind_and_make_class() {
        let container = Container::new();
        define_file_logger(&container);
        container.bind("Logger", "FileLogger").unwrap();
        container.bind_self("FileLogger").unwrap();

        let logger = container.make_as::<FileLogger>("Logger").unwrap();
        assert_eq!(logger.path, "/var/log/app.log");
    }

    #[test]
    fn test_make_unbound_fails() {
        let container = Container::new();
        let err = container.make("Missing").unwrap_err();
        assert!(matches!(err, ContainerError::NotFound(n) if n == "Missing"));
    }

    #[test]
    fn test_make_blank_name_rejected() {
        let container = Container::new();
        assert!(matches!(
            container.make("  ").unwrap_err(),
            ContainerError::InvalidName(_)
        ));
    }

    #[test]
    fn test_factory_binding_short_circuits_reflection() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container
            .bind(
                "counter",
                BindTarget::factory(|_, _| {
                    Ok(svc(CALLS.fetch_add(1, Ordering::SeqCst)))
                }),
            )
            .unwrap();

        let first = container.make_as::<u32>("counter").unwrap();
        let second = container.make_as::<u32>("counter").unwrap();
        assert_eq!(*first, 0);
        assert_eq!(*second, 1);
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_singleton_factory_invoked_once() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container
            .singleton(
                "counter",
                BindTarget::factory(|_, _| {
                    Ok(svc(CALLS.fetch_add(1, Ordering::SeqCst)))
                }),
            )
            .unwrap();

        let first = container.make_as::<u32>("counter").unwrap();
        let second = container.make_as::<u32>("counter").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_raw_value_returned_without_building() {
        let container = Container::new();
        container.bind_value("retries", 3u32).unwrap();

        assert!(container.bound("retries"));
        let value = container.make_as::<u32>("retries").unwrap();
        assert_eq!(*value, 3);
    }

    #[test]
    fn test_immutable_after_resolve() {
        let container = Container::new();
        container.bind_value("retries", 3u32).unwrap();
        let _ = container.make("retries").unwrap();

        let err = container.bind_value("retries", 5u32).unwrap_err();
        assert!(matches!(err, ContainerError::AlreadyResolved(n) if n == "retries"));
        assert!(container.is_resolved("retries"));
    }

    #[test]
    fn test_factory_binding_immutable_after_resolve() {
        let container = Container::new();
        container
            .bind("stamp", BindTarget::factory(|_, _| Ok(svc(1u8))))
            .unwrap();
        let _ = container.make("stamp").unwrap();

        let err = container
            .bind("stamp", BindTarget::factory(|_, _| Ok(svc(2u8))))
            .unwrap_err();
        assert!(matches!(err, ContainerError::AlreadyResolved(n) if n == "stamp"));
    }

    #[test]
    fn test_rebind_allowed_before_first_make() {
        let container = Container::new();
        define_file_logger(&container);
        container.bind("Logger", "NullLogger").unwrap();
        container.bind("Logger", "FileLogger").unwrap();
        container.bind_self("FileLogger").unwrap();

        assert!(container.make_as::<FileLogger>("Logger").is_ok());
    }

    #[test]
    fn test_alias_pair_key_registers_alias_first() {
        let container = Container::new();
        define_file_logger(&container);
        container.bind(("log", "FileLogger"), "FileLogger").unwrap();

        assert!(container.bound("log"));
        assert!(container.is_registered("log"));
        let logger = container.make_as::<FileLogger>("log").unwrap();
        assert_eq!(logger.path, "/var/log/app.log");
    }

    #[test]
    fn test_is_singleton_queries() {
        let container = Container::new();
        container
            .singleton("shared", BindTarget::factory(|_, _| Ok(svc(1u8))))
            .unwrap();
        container
            .bind("fresh", BindTarget::factory(|_, _| Ok(svc(1u8))))
            .unwrap();
        container.alias("shared_alias", "shared");

        assert!(container.is_singleton("shared"));
        assert!(container.is_singleton("shared_alias"));
        assert!(!container.is_singleton("fresh"));
    }

    #[test]
    fn test_extend_wraps_previous_instance() {
        let container = Container::new();
        container
            .bind("greeting", BindTarget::factory(|_, _| Ok(svc("hello".to_string()))))
            .unwrap();
        container
            .extend("greeting", |_, previous| {
                let base = downcast_svc::<String>(previous, "greeting")?;
                Ok(svc(format!("{base}, world")))
            })
            .unwrap();

        let greeting = container.make_as::<String>("greeting").unwrap();
        assert_eq!(greeting.as_str(), "hello, world");
    }

    #[test]
    fn test_extend_unbound_fails() {
        let container = Container::new();
        let err = container.extend("ghost", |_, prev| Ok(prev)).unwrap_err();
        assert!(matches!(err, ContainerError::NotYetBound(n) if n == "ghost"));
    }

    #[test]
    fn test_extend_preserves_shared_flag() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container
            .singleton(
                "counter",
                BindTarget::factory(|_, _| {
                    Ok(svc(CALLS.fetch_add(1, Ordering::SeqCst)))
                }),
            )
            .unwrap();
        container
            .extend("counter", |_, previous| Ok(previous))
            .unwrap();

        let first = container.make_as::<u32>("counter").unwrap();
        let second = container.make_as::<u32>("counter").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_build_errors_wrapped_with_cause() {
        let container = Container::new();
        container
            .bind(
                "broken",
                BindTarget::factory(|_, _| {
                    Err(ContainerError::MissingRecipe("inner".into()))
                }),
            )
            .unwrap();

        let err = container.make("broken").unwrap_err();
        assert!(matches!(err, ContainerError::ResolutionFailed { ref name, .. } if name == "broken"));
        assert!(matches!(
            err.root_cause(),
            ContainerError::MissingRecipe(n) if n == "inner"
        ));
    }

    #[test]
    fn test_normalized_names_share_entry() {
        let container = Container::new();
        container.bind_value("::retries", 3u32).unwrap();
        assert!(container.bound("retries"));
        assert_eq!(*container.make_as::<u32>("retries").unwrap(), 3);
    }

    #[test]
    fn test_get_raw_and_bindings_snapshot() {
        let container = Container::new();
        container.bind("Logger", "FileLogger").unwrap();
        container.bind_value("retries", 3u32).unwrap();

        let raw = container.get_raw("Logger").unwrap();
        assert!(matches!(raw, BindTarget::Name(n) if n == "FileLogger"));

        let bindings = container.get_bindings();
        let names: Vec<_> = bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Logger", "retries"]);
        assert_eq!(bindings[1].kind, "value");
    }

    #[test]
    fn test_circular_dependency_detected() {
        let container = Container::new();
        container.define(
            "A",
            Recipe::new(|_| Ok(())).param(Param::service("b", "B")),
        );
        container.define(
            "B",
            Recipe::new(|_| Ok(())).param(Param::service("a", "A")),
        );
        container.bind_self("A").unwrap();
        container.bind_self("B").unwrap();

        let err = container.make("A").unwrap_err();
        match err.root_cause() {
            ContainerError::CircularDependency { path } => {
                assert_eq!(path, &vec!["A".to_string(), "B".into(), "A".into()]);
            }
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }
}
