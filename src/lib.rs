//! # Bindery - Name-Keyed Dependency Injection for Rust
//!
//! A contextual, string-keyed inversion-of-control container: services are
//! registered under names, described by explicit constructor recipes, and
//! resolved recursively with per-consumer overrides.
//!
//! ## Features
//!
//! - ⚡ **Lock-free** - Uses `DashMap` for concurrent access without blocking
//! - 🔗 **Name-keyed** - Abstract names map to concrete classes, factories, or values
//! - 🧭 **Contextual** - `when(consumer).needs(dep).give(impl)` per-consumer overrides
//! - 🏭 **Recipes** - Explicit constructor wiring with recursive dependency resolution
//! - ♻️ **Singletons** - Shared bindings cache their instance on first resolve
//! - 🔒 **Freeze-on-resolve** - Resolved names can never be silently rebound
//! - 🌀 **Cycle-safe** - Circular constructor graphs fail with the full path
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use bindery::{Args, Container, Param, Recipe};
//! use std::sync::Arc;
//!
//! struct FileLogger {
//!     path: String,
//! }
//!
//! struct ReportService {
//!     logger: Arc<FileLogger>,
//!     retries: u32,
//! }
//!
//! let container = Container::new();
//!
//! // Describe how each class is constructed
//! container.define(
//!     "FileLogger",
//!     Recipe::new(|args: Args| {
//!         Ok(FileLogger { path: args.value::<String>(0)? })
//!     })
//!     .param(Param::value("path").default_to("/var/log/report.log".to_string())),
//! );
//! container.define(
//!     "ReportService",
//!     Recipe::new(|args: Args| {
//!         Ok(ReportService {
//!             logger: args.get::<FileLogger>(0)?,
//!             retries: args.value::<u32>(1)?,
//!         })
//!     })
//!     .param(Param::service("logger", "Logger"))
//!     .param(Param::value("retries").default_to(3u32)),
//! );
//!
//! // Map the abstract name to its concrete class
//! container.singleton("Logger", "FileLogger").unwrap();
//! container.bind_self("FileLogger").unwrap();
//! container.bind_self("ReportService").unwrap();
//!
//! let report = container.make_as::<ReportService>("ReportService").unwrap();
//! assert_eq!(report.retries, 3);
//! assert_eq!(report.logger.path, "/var/log/report.log");
//! ```
//!
//! ## Contextual Bindings
//!
//! ```rust
//! use bindery::{Args, Container, Param, Recipe};
//!
//! struct Channel(&'static str);
//! struct Mailer(&'static str);
//!
//! let container = Container::new();
//! container.define("SmtpChannel", Recipe::new(|_| Ok(Channel("smtp"))));
//! container.define("LogChannel", Recipe::new(|_| Ok(Channel("log"))));
//! container.define(
//!     "Mailer",
//!     Recipe::new(|args: Args| Ok(Mailer(args.get::<Channel>(0)?.0)))
//!         .param(Param::service("channel", "Channel")),
//! );
//! container.bind("Channel", "SmtpChannel").unwrap();
//! container.bind_self("SmtpChannel").unwrap();
//! container.bind_self("LogChannel").unwrap();
//! container.bind_self("Mailer").unwrap();
//!
//! // Mailer alone gets the log channel; everyone else keeps smtp
//! container.when("Mailer").needs("Channel").give("LogChannel");
//!
//! let mailer = container.make_as::<Mailer>("Mailer").unwrap();
//! assert_eq!(mailer.0, "log");
//! let channel = container.make_as::<Channel>("Channel").unwrap();
//! assert_eq!(channel.0, "smtp");
//! ```
//!
//! ## Caller-Supplied Parameters
//!
//! ```rust
//! use bindery::{Args, Container, Param, Params, Recipe};
//!
//! struct HttpClient {
//!     timeout: u64,
//! }
//!
//! let container = Container::new();
//! container.define(
//!     "HttpClient",
//!     Recipe::new(|args: Args| Ok(HttpClient { timeout: args.value::<u64>(0)? }))
//!         .param(Param::value("timeout").default_to(30u64)),
//! );
//! container.bind_self("HttpClient").unwrap();
//!
//! let slow = container
//!     .make_with_as::<HttpClient>("HttpClient", Params::new().with("timeout", 120u64))
//!     .unwrap();
//! assert_eq!(slow.timeout, 120);
//! ```
//!
//! ## Performance
//!
//! - **Lock-free reads**: `DashMap` shards instead of a global `RwLock`
//! - **AHash**: Faster hashing for string keys
//! - **Thread-local build stacks**: Concurrent resolutions never contend
//! - **Zero-copy resolve**: Services are handed out as `Arc` clones

mod binding;
mod container;
mod contextual;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
mod recipe;
mod registry;
mod resolve;
mod snapshot;
mod stack;

pub use binding::*;
pub use container::*;
pub use contextual::*;
pub use error::*;
pub use recipe::*;
pub use registry::*;
pub use snapshot::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Args, BindKey, BindTarget, Callable, Container, ContainerError, ContainerState,
        Injectable, Param, Params, Recipe, Result, Svc,
    };
    pub use std::sync::Arc;
}
