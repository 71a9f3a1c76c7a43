//! Validation policy configuration.
//!
//! [`ValidationConfig`] carries the few knobs the pipeline exposes. The
//! defaults apply the claim policy exactly: no clock-skew allowance, no
//! length cap, and a token without `exp` never expires.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use bearer_authn::ValidationConfig;
//!
//! let config = ValidationConfig::builder()
//!     .require_expiration(true)
//!     .leeway(Duration::from_secs(30))
//!     .build();
//!
//! assert!(config.require_expiration());
//! assert_eq!(config.max_token_length(), None);
//! ```
//!
//! Configuration files use human-readable durations:
//!
//! ```
//! use bearer_authn::ValidationConfig;
//!
//! let config: ValidationConfig =
//!     serde_json::from_str(r#"{"leeway": "1m 30s", "max_token_length": 4096}"#)?;
//! assert_eq!(config.leeway().as_secs(), 90);
//! assert_eq!(config.max_token_length(), Some(4096));
//! # Ok::<(), serde_json::Error>(())
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Policy applied by [`TokenValidator`](crate::pipeline::TokenValidator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Reject tokens without an `exp` claim as malformed.
    #[serde(default)]
    #[builder(default)]
    pub(crate) require_expiration: bool,

    /// Clock-skew allowance applied to `exp` and `nbf`.
    #[serde(with = "humantime_serde", default)]
    #[builder(default)]
    pub(crate) leeway: Duration,

    /// When set, tokens longer than this many bytes are rejected before
    /// decoding. Unbounded by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) max_token_length: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { require_expiration: false, leeway: Duration::ZERO, max_token_length: None }
    }
}

impl ValidationConfig {
    /// Whether a missing `exp` claim is a rejection.
    #[must_use]
    pub fn require_expiration(&self) -> bool {
        self.require_expiration
    }

    /// Clock-skew allowance.
    #[must_use]
    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    /// Maximum accepted raw token length in bytes, if one is configured.
    #[must_use]
    pub fn max_token_length(&self) -> Option<usize> {
        self.max_token_length
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_strict_policy() {
        let config = ValidationConfig::default();
        assert!(!config.require_expiration());
        assert_eq!(config.leeway(), Duration::ZERO);
        assert_eq!(config.max_token_length(), None);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        assert_eq!(ValidationConfig::builder().build(), ValidationConfig::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ValidationConfig::builder()
            .require_expiration(true)
            .leeway(Duration::from_secs(5))
            .max_token_length(1024)
            .build();
        assert!(config.require_expiration());
        assert_eq!(config.leeway(), Duration::from_secs(5));
        assert_eq!(config.max_token_length(), Some(1024));
    }

    #[test]
    fn test_deserialize_empty_object_uses_defaults() {
        let config: ValidationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ValidationConfig::default());
    }

    #[test]
    fn test_deserialize_humantime_leeway() {
        let config: ValidationConfig =
            serde_json::from_str(r#"{"leeway": "2m", "require_expiration": true}"#).unwrap();
        assert_eq!(config.leeway(), Duration::from_secs(120));
        assert!(config.require_expiration());
    }

    #[test]
    fn test_deserialize_max_token_length() {
        let config: ValidationConfig =
            serde_json::from_str(r#"{"max_token_length": 2048}"#).unwrap();
        assert_eq!(config.max_token_length(), Some(2048));
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let result = serde_json::from_str::<ValidationConfig>(r#"{"leway": "2m"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_round_trips_through_humantime() {
        let config = ValidationConfig::builder().leeway(Duration::from_secs(45)).build();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("45s"), "leeway should serialize as humantime: {json}");
        let back: ValidationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
