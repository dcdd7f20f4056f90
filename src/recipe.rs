//! The wiring table: constructor and callable descriptors
//!
//! There is no runtime reflection in Rust, so class constructors are
//! described explicitly. A [`Recipe`] pairs an ordered parameter list with a
//! construct closure; the resolution engine resolves the parameters (see
//! `resolve`) and hands them to the closure as an [`Args`] list. A
//! [`Callable`] is the same shape for free functions and methods, consumed
//! by `Container::call`.
//!
//! # Example
//!
//! ```rust
//! use bindery::{Args, Param, Recipe};
//! use std::sync::Arc;
//!
//! struct FileLogger;
//!
//! struct Service {
//!     logger: Arc<FileLogger>,
//!     retries: u32,
//! }
//!
//! let recipe = Recipe::new(|args: Args| {
//!     Ok(Service {
//!         logger: args.get::<FileLogger>(0)?,
//!         retries: args.value::<u32>(1)?,
//!     })
//! })
//! .param(Param::service("logger", "FileLogger"))
//! .param(Param::value("retries").default_to(3u32));
//! # let _ = recipe;
//! ```

use crate::binding::{downcast_svc, svc, Injectable, Svc};
use crate::{Container, ContainerError, Result};
use ahash::RandomState;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

// =============================================================================
// Declared parameters
// =============================================================================

/// Where a declared parameter's argument comes from when the caller does not
/// supply it
#[derive(Clone, Debug)]
pub(crate) enum ParamSource {
    /// Service-typed parameter: resolved by a recursive `make` on the name
    Service(String),
    /// Plain value: must be supplied or defaulted
    Value,
}

/// One declared constructor/function parameter
#[derive(Clone, Debug)]
pub struct Param {
    pub(crate) name: &'static str,
    pub(crate) source: ParamSource,
    pub(crate) default: Option<Svc>,
}

impl Param {
    /// A parameter whose declared type is a service name; unsupplied, it is
    /// resolved by recursing into the container
    #[inline]
    pub fn service(name: &'static str, dependency: impl Into<String>) -> Self {
        Self {
            name,
            source: ParamSource::Service(dependency.into()),
            default: None,
        }
    }

    /// A plain value parameter with no service type
    #[inline]
    pub fn value(name: &'static str) -> Self {
        Self {
            name,
            source: ParamSource::Value,
            default: None,
        }
    }

    /// Attach a declared default, used when nothing else satisfies the
    /// parameter
    #[inline]
    pub fn default_to<T: Injectable>(mut self, value: T) -> Self {
        self.default = Some(svc(value));
        self
    }

    /// The declared parameter name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// =============================================================================
// Resolved arguments
// =============================================================================

/// Fully-ordered resolved argument list handed to construct/invoke closures.
///
/// Indexes follow declaration order; caller-supplied positional extras are
/// appended after the declared parameters. Carries the build-stack snapshot
/// taken at resolution time so access errors name the target being built.
pub struct Args {
    values: Vec<Svc>,
    trace: Vec<String>,
}

impl Args {
    #[inline]
    pub(crate) fn new(values: Vec<Svc>, trace: Vec<String>) -> Self {
        Self { values, trace }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Shared handle to the argument at `index`, downcast to `T`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>> {
        let value = self.raw(index)?;
        downcast_svc::<T>(value, &format!("argument #{index}"))
    }

    /// Owned copy of the argument at `index` (for plain values)
    pub fn value<T: Injectable + Clone>(&self, index: usize) -> Result<T> {
        Ok(self.get::<T>(index)?.as_ref().clone())
    }

    /// Type-erased argument at `index`
    pub fn raw(&self, index: usize) -> Result<Svc> {
        self.values.get(index).cloned().ok_or_else(|| {
            ContainerError::UnresolvableDependency {
                parameter: format!("#{index}"),
                build_stack: self.trace.clone(),
            }
        })
    }
}

// =============================================================================
// Recipes
// =============================================================================

type ConstructFn = Arc<dyn Fn(Args) -> Result<Svc> + Send + Sync>;

/// Constructor descriptor for a class name: declared parameters plus the
/// construct closure. Registered with `Container::define`.
#[derive(Clone)]
pub struct Recipe {
    pub(crate) params: Vec<Param>,
    pub(crate) construct: ConstructFn,
}

impl Recipe {
    /// Describe a constructor. The closure receives the resolved arguments
    /// in declaration order.
    pub fn new<T, F>(construct: F) -> Self
    where
        T: Injectable,
        F: Fn(Args) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            construct: Arc::new(move |args| Ok(svc(construct(args)?))),
        }
    }

    /// Append a declared parameter (declaration order matters)
    #[inline]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// The declared parameters
    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

impl std::fmt::Debug for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recipe")
            .field("params", &self.params.len())
            .finish()
    }
}

// =============================================================================
// Callables
// =============================================================================

type InvokeFn = Arc<dyn Fn(&Container, Args) -> Result<Svc> + Send + Sync>;

/// A function or method target for `Container::call`.
///
/// Same parameter-resolution shape as a [`Recipe`]; the name is pushed onto
/// the build stack for error messages only.
#[derive(Clone)]
pub struct Callable {
    name: String,
    pub(crate) params: Vec<Param>,
    pub(crate) invoke: InvokeFn,
}

impl Callable {
    /// Describe a free function
    pub fn function<T, F>(name: impl Into<String>, invoke: F) -> Self
    where
        T: Injectable,
        F: Fn(&Container, Args) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            invoke: Arc::new(move |container, args| Ok(svc(invoke(container, args)?))),
        }
    }

    /// Describe a bound method; name it `Type::method` by convention
    pub fn method<T, F>(name: impl Into<String>, invoke: F) -> Self
    where
        T: Injectable,
        F: Fn(&Container, Args) -> Result<T> + Send + Sync + 'static,
    {
        Self::function(name, invoke)
    }

    /// Append a declared parameter
    #[inline]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .finish()
    }
}

// =============================================================================
// Caller-supplied parameters
// =============================================================================

/// Caller-supplied overrides for `make`/`call`, keyed by parameter name or
/// positional index.
///
/// Positional entries use a `BTreeMap` so trailing extras merge in a
/// deterministic index order.
#[derive(Clone, Default)]
pub struct Params {
    named: HashMap<String, Svc, RandomState>,
    positional: BTreeMap<usize, Svc>,
}

impl Params {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply an argument by parameter name
    #[inline]
    pub fn with<T: Injectable>(mut self, name: impl Into<String>, value: T) -> Self {
        self.named.insert(name.into(), svc(value));
        self
    }

    /// Supply a pre-erased handle by parameter name
    #[inline]
    pub fn with_svc(mut self, name: impl Into<String>, value: Svc) -> Self {
        self.named.insert(name.into(), value);
        self
    }

    /// Supply an argument by positional index
    #[inline]
    pub fn at<T: Injectable>(mut self, index: usize, value: T) -> Self {
        self.positional.insert(index, svc(value));
        self
    }

    /// Supply a pre-erased handle by positional index
    #[inline]
    pub fn at_svc(mut self, index: usize, value: Svc) -> Self {
        self.positional.insert(index, value);
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }

    #[inline]
    pub(crate) fn named(&self, name: &str) -> Option<Svc> {
        self.named.get(name).cloned()
    }

    #[inline]
    pub(crate) fn positional(&self, index: usize) -> Option<Svc> {
        self.positional.get(&index).cloned()
    }

    /// Positional entries in ascending index order
    #[inline]
    pub(crate) fn positional_entries(&self) -> impl Iterator<Item = (usize, Svc)> + '_ {
        self.positional.iter().map(|(i, v)| (*i, v.clone()))
    }
}

impl std::fmt::Debug for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Params")
            .field("named", &self.named.len())
            .field("positional", &self.positional.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_typed_access() {
        let args = Args::new(vec![svc(7u32), svc("db".to_string())], Vec::new());
        assert_eq!(args.value::<u32>(0).unwrap(), 7);
        assert_eq!(args.get::<String>(1).unwrap().as_str(), "db");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_args_out_of_range_reports_trace() {
        let args = Args::new(vec![], vec!["Broken".to_string()]);
        match args.raw(0).unwrap_err() {
            ContainerError::UnresolvableDependency {
                parameter,
                build_stack,
            } => {
                assert_eq!(parameter, "#0");
                assert_eq!(build_stack, vec!["Broken"]);
            }
            other => panic!("expected UnresolvableDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_args_wrong_type() {
        let args = Args::new(vec![svc(7u32)], Vec::new());
        let err = args.get::<String>(0).unwrap_err();
        assert!(matches!(err, ContainerError::TypeMismatch { .. }));
    }

    #[test]
    fn test_recipe_param_order_preserved() {
        let recipe = Recipe::new(|_| Ok(()))
            .param(Param::service("logger", "Logger"))
            .param(Param::value("retries"));

        let names: Vec<_> = recipe.params().iter().map(Param::name).collect();
        assert_eq!(names, vec!["logger", "retries"]);
    }

    #[test]
    fn test_param_default() {
        let param = Param::value("retries").default_to(3u32);
        let default = param.default.unwrap();
        assert_eq!(*default.downcast::<u32>().unwrap(), 3);
    }

    #[test]
    fn test_params_lookup() {
        let params = Params::new().with("retries", 5u32).at(1, "x".to_string());

        assert!(params.named("retries").is_some());
        assert!(params.named("timeout").is_none());
        assert!(params.positional(1).is_some());
        assert!(params.positional(0).is_none());
    }

    #[test]
    fn test_positional_entries_ordered() {
        let params = Params::new()
            .at(2, 2u8)
            .at(0, 0u8)
            .at(1, 1u8);
        let order: Vec<usize> = params.positional_entries().map(|(i, _)| i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
