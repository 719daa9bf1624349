//! Logging setup
//!
//! Results go to stdout, so every log line is written to stderr.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::DeployerError;

/// Level applied to this crate's own events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
            .map_err(|_| format!("Invalid log level: {}", s))
    }
}

/// How the front-end wants its logs
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub log_level: LogLevel,

    /// Install no subscriber at all (`--quiet`)
    pub quiet: bool,

    /// One JSON object per line (`--json`)
    pub json_format: bool,
}

impl LogOptions {
    /// Filter directive used when `RUST_LOG` is unset. HTTP internals stay
    /// at `warn` whatever the crate level is.
    pub fn directive(&self) -> String {
        format!("warn,deployerai={}", self.log_level.as_str())
    }
}

/// Install the global subscriber. A no-op when quiet.
pub fn init_logging(options: &LogOptions) -> Result<(), DeployerError> {
    if options.quiet {
        return Ok(());
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(options.directive()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if options.json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    installed.map_err(|e| DeployerError::ConfigError(format!("logging already initialized: {}", e)))
}
