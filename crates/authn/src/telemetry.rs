//! Log subscriber construction.
//!
//! The library only emits `tracing` events; it never installs a global
//! subscriber on its own. Services that embed it build one here, either
//! human-readable for development or JSON for production log pipelines, and
//! install it themselves (or call [`try_init`] once at startup).
//!
//! ```
//! use bearer_authn::telemetry::{LogFormat, subscriber};
//!
//! let subscriber = subscriber(LogFormat::Json, "info,bearer_authn=debug")?;
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::info!("inside the scoped subscriber");
//! });
//! # Ok::<(), bearer_authn::telemetry::TelemetryError>(())
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored output for local development.
    #[default]
    Pretty,
    /// One JSON object per event, including the current span.
    Json,
}

impl LogFormat {
    /// The lowercase name used in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(TelemetryError::UnknownFormat(s.to_owned())),
        }
    }
}

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive string could not be parsed.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    /// The format name is neither `pretty` nor `json`.
    #[error("unknown log format '{0}', expected 'pretty' or 'json'")]
    UnknownFormat(String),

    /// A global subscriber was already installed.
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Builds a subscriber writing `format` output for events matching `filter`.
///
/// `filter` uses `EnvFilter` directive syntax, e.g. `"info,bearer_authn=debug"`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if `filter` does not parse.
pub fn subscriber(
    format: LogFormat,
    filter: &str,
) -> Result<Box<dyn Subscriber + Send + Sync + 'static>, TelemetryError> {
    let env_filter =
        EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;
    let registry = tracing_subscriber::registry().with(env_filter);

    Ok(match format {
        LogFormat::Pretty => {
            Box::new(registry.with(tracing_fmt::layer().pretty().with_target(true)))
        },
        LogFormat::Json => Box::new(
            registry.with(
                tracing_fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true),
            ),
        ),
    })
}

/// Builds a subscriber and installs it as the global default.
///
/// The `RUST_LOG` environment variable, when set and valid, takes precedence
/// over `default_filter`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if the effective filter does not
/// parse, or [`TelemetryError::SubscriberInit`] if a global subscriber is
/// already installed.
pub fn try_init(format: LogFormat, default_filter: &str) -> Result<(), TelemetryError> {
    let filter = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|directives| EnvFilter::try_new(directives).is_ok())
        .unwrap_or_else(|| default_filter.to_owned());

    tracing::subscriber::set_global_default(subscriber(format, &filter)?)
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_names() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!(" JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!("xml".parse::<LogFormat>(), Err(TelemetryError::UnknownFormat(_))));
    }

    #[test]
    fn test_format_serde_lowercase() {
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
        assert_eq!(serde_json::from_str::<LogFormat>("\"pretty\"").unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_default_format_is_pretty() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
        assert_eq!(LogFormat::default().to_string(), "pretty");
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let result = subscriber(LogFormat::Json, "bearer_authn=notalevel");
        assert!(matches!(result, Err(TelemetryError::InvalidFilter(_))));
    }

    #[test]
    fn test_subscriber_can_be_scoped() {
        for format in [LogFormat::Pretty, LogFormat::Json] {
            let subscriber = subscriber(format, "debug").unwrap();
            tracing::subscriber::with_default(subscriber, || {
                tracing::debug!(format = %format, "scoped subscriber");
            });
        }
    }
}
