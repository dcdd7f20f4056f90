//! Parameter resolution
//!
//! Turns a declared parameter list plus caller-supplied overrides into a
//! fully-ordered argument list. Per parameter, in declaration order:
//! supplied by name, supplied by position, service-typed recursion into the
//! container, declared default, else `UnresolvableDependency`. Remaining
//! unconsumed positional extras are appended afterwards in index order.

use crate::binding::Svc;
use crate::recipe::{Args, Callable, Param, ParamSource, Params, Recipe};
use crate::stack::{self, BuildFrame};
use crate::{Container, ContainerError, Result};
use std::collections::HashSet;

#[cfg(feature = "logging")]
use tracing::trace;

pub(crate) fn resolve_parameters(
    container: &Container,
    declared: &[Param],
    supplied: &Params,
) -> Result<Vec<Svc>> {
    let mut args = Vec::with_capacity(declared.len());
    let mut consumed: HashSet<usize> = HashSet::with_capacity(declared.len());

    for (index, param) in declared.iter().enumerate() {
        if let Some(value) = supplied.named(param.name) {
            args.push(value);
            continue;
        }
        if let Some(value) = supplied.positional(index) {
            consumed.insert(index);
            args.push(value);
            continue;
        }
        if let ParamSource::Service(dependency) = &param.source {
            // The consumer stays on the build stack here, so the recursive
            // make sees it as the contextual scope.
            args.push(container.make(dependency)?);
            continue;
        }
        if let Some(default) = &param.default {
            args.push(default.clone());
            continue;
        }
        return Err(ContainerError::UnresolvableDependency {
            parameter: param.name.to_string(),
            build_stack: stack::snapshot(container.stack_key()),
        });
    }

    // Trailing caller-supplied extras are appended, not dropped
    for (index, value) in supplied.positional_entries() {
        if !consumed.contains(&index) {
            args.push(value);
        }
    }

    Ok(args)
}

/// Reflection-equivalent class construction: look up the recipe, resolve its
/// declared parameters under a class frame, then construct.
pub(crate) fn resolve_class(
    container: &Container,
    class: &str,
    supplied: &Params,
) -> Result<Svc> {
    let recipe: Recipe = container
        .recipe(class)
        .ok_or_else(|| ContainerError::MissingRecipe(class.to_string()))?;

    #[cfg(feature = "logging")]
    trace!(
        target: "bindery",
        class = class,
        params = recipe.params().len(),
        "Building class from recipe"
    );

    let (args, trace) = {
        let _frame = BuildFrame::for_class(container.stack_key(), class)?;
        let args = resolve_parameters(container, recipe.params(), supplied)?;
        // Snapshot while the frame is live so argument errors inside the
        // construct closure still name this target
        (args, stack::snapshot(container.stack_key()))
    };
    (recipe.construct)(Args::new(args, trace))
}

/// Resolve a callable's parameters and invoke it. The frame carries the
/// callable's own name for error messages; no cycle check applies.
pub(crate) fn resolve_callable(
    container: &Container,
    callable: &Callable,
    supplied: &Params,
) -> Result<Svc> {
    #[cfg(feature = "logging")]
    trace!(
        target: "bindery",
        callable = callable.name(),
        params = callable.params.len(),
        "Resolving callable arguments"
    );

    let (args, trace) = {
        let _frame = BuildFrame::for_callable(container.stack_key(), callable.name());
        let args = resolve_parameters(container, &callable.params, supplied)?;
        (args, stack::snapshot(container.stack_key()))
    };
    (callable.invoke)(container, Args::new(args, trace))
}
