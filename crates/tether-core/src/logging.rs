//! Logging configuration and optional subscriber setup.
//!
//! Tether logs through `tracing`. Libraries never install a subscriber on
//! their own; [`crate::init`] does so only when the `tracing-json` feature is
//! enabled *and* `TETHER_LOG` is set.
//!
//! | Variable            | Meaning                                  |
//! |---------------------|------------------------------------------|
//! | `TETHER_LOG`        | `EnvFilter` directive, e.g. `tether=debug` |
//! | `TETHER_LOG_FORMAT` | `text` (default) or `json`               |

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace};

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging settings resolved from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive; `None` means logging stays off.
    pub filter: Option<String>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Read `TETHER_LOG` and `TETHER_LOG_FORMAT` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Resolve settings through a custom environment lookup.
    ///
    /// Blank filters count as unset; unknown formats fall back to text.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let filter = get_env("TETHER_LOG")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());
        let format = get_env("TETHER_LOG_FORMAT")
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or_default();
        Self { filter, format }
    }

    /// Builder-style filter override.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Builder-style format override.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Install a global fmt subscriber for `config`.
///
/// Returns `false` when logging is disabled or another subscriber is
/// already installed.
#[cfg(feature = "tracing-json")]
pub fn init_subscriber(config: &LogConfig) -> bool {
    use tracing_subscriber::EnvFilter;

    let Some(filter) = config.filter.as_deref() else {
        return false;
    };
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::new(filter));
    match config.format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}

/// Install the subscriber described by the process environment.
///
/// Returns whether a subscriber was installed. When `TETHER_LOG` is set but
/// another global subscriber already exists, the refusal is logged at
/// `debug` through that existing subscriber.
#[cfg(feature = "tracing-json")]
pub fn install_from(config: &LogConfig) -> bool {
    if config.filter.is_none() {
        return false;
    }
    let installed = init_subscriber(config);
    if !installed {
        debug!(
            filter = config.filter.as_deref().unwrap_or_default(),
            "tether subscriber not installed: a global subscriber is already set"
        );
    }
    installed
}
