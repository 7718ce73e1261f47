//! Subscriber setup for the injector's `tracing` events
//!
//! Every event is emitted under the [`TARGET`] target: bootstrap phases at
//! `INFO`, per-component decisions (priorities, collisions, instantiation)
//! at `DEBUG`, lookups and factory calls at `TRACE`.
//!
//! Installing a subscriber needs `logging-json` or `logging-pretty`; with
//! only `logging` enabled the init functions do nothing and the application
//! is expected to install its own subscriber.
//!
//! # Example
//!
//! ```rust,ignore
//! use component_injector::logging;
//!
//! // Bootstrap phases only, from this crate only
//! logging::builder().info().injector_only().pretty().init();
//! ```
//!
//! `RUST_LOG`, when set, takes precedence over the builder's level and
//! target unless [`LoggingBuilder::ignore_env`] is used.

use tracing::Level;

/// Target of every event emitted by this crate.
pub const TARGET: &str = "component_injector";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line, colored
    Pretty,
    /// Single line per event
    #[default]
    Compact,
}

/// Builder for the subscriber.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
    respect_env: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::default(),
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
            respect_env: true,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Only show events from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show events from this crate
    pub fn injector_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Do not read `RUST_LOG`
    pub fn ignore_env(mut self) -> Self {
        self.respect_env = false;
        self
    }

    /// The `EnvFilter` directive built from level and target.
    pub fn directive(&self) -> String {
        match self.target {
            Some(target) => format!("{target}={}", self.level),
            None => self.level.to_string(),
        }
    }

    /// Install the subscriber globally.
    ///
    /// Fails if a global subscriber is already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn try_init(self) -> Result<(), tracing_subscriber::util::TryInitError> {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let fallback = || EnvFilter::new(self.directive());
        let filter = if self.respect_env {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
        } else {
            fallback()
        };

        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);

        let registry = tracing_subscriber::registry().with(filter);
        match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => registry.with(layer.json()).try_init(),
            // Without the json feature, fall back to single-line output
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => registry.with(layer.compact()).try_init(),
            LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
            LogFormat::Compact => registry.with(layer.compact()).try_init(),
        }
    }

    /// Install the subscriber, ignoring an already installed one.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// No-op: no subscriber implementation is compiled in.
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Start configuring a subscriber
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Install the default subscriber: JSON when `logging-json` is enabled,
/// pretty otherwise.
pub fn init() {
    #[cfg(feature = "logging-json")]
    init_json();
    #[cfg(not(feature = "logging-json"))]
    init_pretty();
}

/// JSON output at `DEBUG`.
///
/// ```json
/// {"timestamp":"...","level":"DEBUG","fields":{"message":"Component scheduled","component":"app::Service","priority":1},"target":"component_injector"}
/// ```
pub fn init_json() {
    builder().json().debug().init();
}

/// Pretty output at `DEBUG`.
pub fn init_pretty() {
    builder().pretty().debug().init();
}

/// This crate's events only, at `DEBUG`.
pub fn init_injector_only() {
    builder().injector_only().debug().init();
}
