//! Error types for container operations

use thiserror::Error;

/// Errors that can occur while registering or resolving services
#[derive(Error, Debug)]
pub enum ContainerError {
    /// No binding, alias, or raw value is registered under the name
    #[error("service not found: \"{0}\"")]
    NotFound(String),

    /// The name was already resolved and its binding is now immutable
    #[error("\"{0}\" has already been resolved and can no longer be rebound")]
    AlreadyResolved(String),

    /// `extend` was called on a name with no binding
    #[error("cannot extend \"{0}\": nothing is bound under that name")]
    NotYetBound(String),

    /// Building the service failed; carries the underlying error as cause
    #[error("failed to resolve \"{name}\": {source}")]
    ResolutionFailed {
        name: String,
        #[source]
        source: Box<ContainerError>,
    },

    /// A declared parameter could not be satisfied by name, position,
    /// service recursion, or default value
    #[error("unresolvable parameter \"{parameter}\" while building [{}]", .build_stack.join(" -> "))]
    UnresolvableDependency {
        parameter: String,
        build_stack: Vec<String>,
    },

    /// Circular dependency detected during recursive construction
    #[error("circular dependency detected: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    /// A blank or otherwise unusable service name was supplied
    #[error("invalid service name: {0:?}")]
    InvalidName(String),

    /// Alias chain revisits a name and can never terminate
    #[error("alias chain for \"{0}\" loops back on itself")]
    AliasLoop(String),

    /// A class name was asked to build reflectively but no recipe is defined
    #[error("no constructor recipe defined for \"{0}\"")]
    MissingRecipe(String),

    /// A snapshot names a factory binding that was not supplied on import
    #[error("snapshot has a factory binding for \"{0}\" but no factory was supplied on import")]
    MissingFactory(String),

    /// A resolved service could not be downcast to the requested type
    #[error("type mismatch for \"{context}\": expected {expected}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
    },
}

impl ContainerError {
    /// Create a NotFound error
    #[inline]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Wrap a build error with the name that was being resolved
    #[inline]
    pub fn resolution_failed(name: impl Into<String>, source: ContainerError) -> Self {
        Self::ResolutionFailed {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create a TypeMismatch error for the requested type
    #[inline]
    pub fn type_mismatch<T>(context: impl Into<String>) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Walk the `ResolutionFailed` wrapper chain down to the original error.
    ///
    /// `make` wraps every build failure at each recursion level, so deep
    /// graphs produce nested wrappers; this unwraps them for matching.
    pub fn root_cause(&self) -> &ContainerError {
        match self {
            Self::ResolutionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, ContainerError>;
