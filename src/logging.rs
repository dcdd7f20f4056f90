//! Tracing setup for container diagnostics
//!
//! The container emits `debug!` events under the `"bindery"` target when
//! bindings, aliases, and contextual overrides are registered, and `trace!`
//! events as names resolve. This module installs a `tracing-subscriber`
//! that formats those events; embedding applications that already run their
//! own subscriber can ignore it entirely.
//!
//! # Features
//!
//! - `logging` - emit events (default); bring your own subscriber
//! - `logging-json` - JSON output, for log aggregation pipelines
//! - `logging-pretty` - human-readable output, for development
//!
//! # Example
//!
//! ```rust,ignore
//! // Show only this crate's resolution events, down to TRACE
//! bindery::logging::LogConfig::new()
//!     .with_level(tracing::Level::TRACE)
//!     .crate_only()
//!     .pretty()
//!     .init();
//! ```

use tracing::Level;

/// Output format for the bundled subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON lines
    #[default]
    Json,
    /// Human-readable multi-line output
    Pretty,
}

/// Subscriber configuration for container diagnostics.
///
/// Registration events log at DEBUG; per-resolution events log at TRACE,
/// so `with_level(Level::TRACE)` shows every step of a `make` call.
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: Level,
    format: LogFormat,
    crate_only: bool,
    respect_env: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            crate_only: false,
            respect_env: false,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Restrict output to this crate's `"bindery"` target
    pub fn crate_only(mut self) -> Self {
        self.crate_only = true;
        self
    }

    /// Let a `RUST_LOG` environment filter, when set, override the
    /// configured level and target
    pub fn respect_env(mut self) -> Self {
        self.respect_env = true;
        self
    }

    /// Use JSON output
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use human-readable output
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Install the global subscriber.
    ///
    /// Panics if a global subscriber is already set, matching
    /// `tracing_subscriber`'s own `init` behavior.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let directive = if self.crate_only {
            format!("bindery={}", self.level)
        } else {
            self.level.to_string()
        };
        let filter = if self.respect_env {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&directive))
        } else {
            EnvFilter::new(&directive)
        };

        match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true))
                .init(),
            // Without the json feature the plain fmt layer stands in
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_target(true))
                .init(),
        }
    }

    /// Without a subscriber feature there is nothing to install
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Install the default subscriber: JSON format, DEBUG level
pub fn init() {
    LogConfig::new().init();
}

/// Install a JSON subscriber
pub fn init_json() {
    LogConfig::new().json().init();
}

/// Install a human-readable subscriber
pub fn init_pretty() {
    LogConfig::new().pretty().init();
}
