//! The validation pipeline.
//!
//! A raw token is accepted only if every stage passes, in this order:
//!
//! 1. decode ([`decode_token`], or [`decode_token_bounded`] when a length cap is
//!    configured)
//! 2. key resolution ([`KeySet::resolve`])
//! 3. signature ([`verify_signature`])
//! 4. claims ([`validate_claims`])
//!
//! The first failing stage determines the error. Claims are never inspected
//! for a token whose signature did not verify.
//!
//! # Example
//!
//! ```
//! use bearer_authn::{KeySet, TokenValidator, ValidationError};
//! use chrono::Utc;
//!
//! let validator = TokenValidator::new(Default::default());
//! let result =
//!     validator.validate("not-a-token", "https://example.org/user", &KeySet::empty(), Utc::now());
//! assert!(matches!(result, Err(ValidationError::MalformedToken { .. })));
//! ```

use chrono::{DateTime, Utc};

use crate::{
    claims::{VerifiedClaims, validate_claims},
    config::ValidationConfig,
    decoder::{decode_token, decode_token_bounded},
    error::Result,
    keyset::KeySet,
    signature::{JwtSignatureVerifier, SignatureVerifier, verify_signature},
};

/// Runs the full validation pipeline with a fixed policy and verifier.
///
/// Holds no per-token state: one validator can be shared across threads and
/// used concurrently, each call supplying its own key set snapshot and clock.
#[derive(Debug, Clone, Default)]
pub struct TokenValidator<V = JwtSignatureVerifier> {
    config: ValidationConfig,
    verifier: V,
}

impl TokenValidator<JwtSignatureVerifier> {
    /// Creates a validator with the default `jsonwebtoken` verifier.
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self { config, verifier: JwtSignatureVerifier }
    }
}

impl<V: SignatureVerifier> TokenValidator<V> {
    /// Creates a validator with a custom signature verifier.
    #[must_use]
    pub fn with_verifier(config: ValidationConfig, verifier: V) -> Self {
        Self { config, verifier }
    }

    /// The policy this validator applies.
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate `token` for `expected_subject` against `key_set` at instant `now`.
    ///
    /// # Arguments
    ///
    /// * `token` - Compact serialization, `header.payload.signature`
    /// * `expected_subject` - The subject the token must be issued to
    /// * `key_set` - Snapshot of trusted public keys
    /// * `now` - Evaluation instant; the pipeline never reads the clock itself
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`](crate::ValidationError) of the first
    /// stage that fails.
    #[tracing::instrument(
        skip_all,
        fields(expected_subject = %expected_subject, keys = key_set.len())
    )]
    pub fn validate(
        &self,
        token: &str,
        expected_subject: &str,
        key_set: &KeySet,
        now: DateTime<Utc>,
    ) -> Result<VerifiedClaims> {
        let result = self.run(token, expected_subject, key_set, now);

        match &result {
            Ok(claims) => {
                tracing::debug!(subject = %claims.subject, "Token validated");
            },
            Err(e) => {
                tracing::debug!(kind = %e.kind(), stage = %e.stage(), error = %e, "Token rejected");
            },
        }

        result
    }

    fn run(
        &self,
        token: &str,
        expected_subject: &str,
        key_set: &KeySet,
        now: DateTime<Utc>,
    ) -> Result<VerifiedClaims> {
        // 1. Decode
        let decoded = match self.config.max_token_length() {
            Some(max_length) => decode_token_bounded(token, max_length)?,
            None => decode_token(token)?,
        };

        // 2. Resolve the signing key
        let record = key_set.resolve(&decoded.header.kid)?;

        // 3. Verify signature over the original header.payload bytes
        verify_signature(
            decoded.signed_bytes(),
            &decoded.signature,
            record,
            decoded.header.algorithm,
            &self.verifier,
        )?;

        // 4. Apply claim policy
        validate_claims(decoded.claims, expected_subject, now, &self.config)
    }
}

/// Validate `token` with the default policy and verifier.
///
/// Equivalent to `TokenValidator::new(ValidationConfig::default()).validate(...)`.
///
/// # Errors
///
/// Returns the [`ValidationError`](crate::ValidationError) of the first
/// stage that fails.
pub fn validate_token(
    token: &str,
    expected_subject: &str,
    key_set: &KeySet,
    now: DateTime<Utc>,
) -> Result<VerifiedClaims> {
    TokenValidator::new(ValidationConfig::default()).validate(token, expected_subject, key_set, now)
}
