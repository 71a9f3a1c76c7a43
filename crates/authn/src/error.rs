//! Validation and key-set error types.
//!
//! Every failure on the validation path is exactly one [`ValidationError`]
//! variant. Key-set construction (programmatic or from a JWKS document) has
//! its own [`KeySetError`] and never surfaces on the validation path.

use std::fmt;

use thiserror::Error;

use crate::algorithm::Algorithm;

/// Maximum number of bytes of a key ID echoed into errors and log fields.
const MAX_DISPLAYED_KID_LEN: usize = 128;

/// Reasons a token was rejected.
///
/// The variant identifies the stage that failed; the payload carries
/// diagnostics for logs and metrics. Services should never echo the
/// variant back to the presenter of the token (collapse every kind to a
/// single "unauthenticated" response instead).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The token is not a well-formed compact JWS with the mandatory fields.
    #[error("Malformed token: {reason}")]
    MalformedToken {
        /// What was wrong with the token structure.
        reason: String,
    },

    /// No key in the supplied key set carries the token's `kid`.
    #[error("Signing key not found: {kid}")]
    KeyNotFound {
        /// Sanitized key ID from the token header.
        kid: String,
    },

    /// The header's `alg` differs from the algorithm published for the key.
    #[error("Algorithm mismatch: token declares {declared}, key is published for {expected}")]
    AlgorithmMismatch {
        /// Algorithm declared in the token header.
        declared: Algorithm,
        /// Algorithm attached to the resolved key record.
        expected: Algorithm,
    },

    /// Cryptographic verification of the signature failed.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// `now` is at or after the token's `exp`.
    #[error("Token expired")]
    Expired,

    /// `now` is before the token's `nbf`.
    #[error("Token not yet valid")]
    NotYetValid,

    /// The token's `sub` does not equal the expected subject.
    #[error("Subject mismatch")]
    SubjectMismatch,
}

impl ValidationError {
    /// Creates a new `MalformedToken` error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken { reason: reason.into() }
    }

    /// Creates a new `KeyNotFound` error, sanitizing the key ID.
    #[must_use]
    pub fn key_not_found(kid: &str) -> Self {
        Self::KeyNotFound { kid: sanitize_kid(kid) }
    }

    /// Creates a new `AlgorithmMismatch` error.
    #[must_use]
    pub fn algorithm_mismatch(declared: Algorithm, expected: Algorithm) -> Self {
        Self::AlgorithmMismatch { declared, expected }
    }

    /// Creates a new `SignatureInvalid` error.
    #[must_use]
    pub fn signature_invalid() -> Self {
        Self::SignatureInvalid
    }

    /// Creates a new `Expired` error.
    #[must_use]
    pub fn expired() -> Self {
        Self::Expired
    }

    /// Creates a new `NotYetValid` error.
    #[must_use]
    pub fn not_yet_valid() -> Self {
        Self::NotYetValid
    }

    /// Creates a new `SubjectMismatch` error.
    #[must_use]
    pub fn subject_mismatch() -> Self {
        Self::SubjectMismatch
    }

    /// The field-less kind of this error, for metrics and matching.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedToken { .. } => ErrorKind::MalformedToken,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::AlgorithmMismatch { .. } => ErrorKind::AlgorithmMismatch,
            Self::SignatureInvalid => ErrorKind::SignatureInvalid,
            Self::Expired => ErrorKind::Expired,
            Self::NotYetValid => ErrorKind::NotYetValid,
            Self::SubjectMismatch => ErrorKind::SubjectMismatch,
        }
    }

    /// The pipeline stage that produced this error.
    ///
    /// `MalformedToken` always maps to [`Stage::Decode`], including a missing
    /// `exp` rejected by a policy that requires one.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::MalformedToken { .. } => Stage::Decode,
            Self::KeyNotFound { .. } => Stage::KeyResolution,
            Self::AlgorithmMismatch { .. } | Self::SignatureInvalid => Stage::Signature,
            Self::Expired | Self::NotYetValid | Self::SubjectMismatch => Stage::Claims,
        }
    }

    /// Whether retrying with a freshly fetched key set could change the outcome.
    ///
    /// Only `KeyNotFound` qualifies: it may be a rotation race where the
    /// token was signed by a key published after the caller's snapshot.
    #[must_use]
    pub fn is_retryable_with_fresh_keys(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

/// Field-less discriminant of [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ValidationError::MalformedToken`].
    MalformedToken,
    /// See [`ValidationError::KeyNotFound`].
    KeyNotFound,
    /// See [`ValidationError::AlgorithmMismatch`].
    AlgorithmMismatch,
    /// See [`ValidationError::SignatureInvalid`].
    SignatureInvalid,
    /// See [`ValidationError::Expired`].
    Expired,
    /// See [`ValidationError::NotYetValid`].
    NotYetValid,
    /// See [`ValidationError::SubjectMismatch`].
    SubjectMismatch,
}

impl ErrorKind {
    /// Stable snake_case label suitable for metric tags and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedToken => "malformed_token",
            Self::KeyNotFound => "key_not_found",
            Self::AlgorithmMismatch => "algorithm_mismatch",
            Self::SignatureInvalid => "signature_invalid",
            Self::Expired => "expired",
            Self::NotYetValid => "not_yet_valid",
            Self::SubjectMismatch => "subject_mismatch",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages of the validation pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Splitting and parsing the compact token.
    Decode,
    /// Looking up the header's `kid` in the key set.
    KeyResolution,
    /// Algorithm binding and cryptographic verification.
    Signature,
    /// Expiration, not-before and subject checks.
    Claims,
}

impl Stage {
    /// Stable snake_case label for log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::KeyResolution => "key_resolution",
            Self::Signature => "signature",
            Self::Claims => "claims",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building a [`KeySet`](crate::keyset::KeySet).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KeySetError {
    /// The JWKS document is not valid JSON or does not have the JWKS shape.
    #[error("Invalid JWKS document: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    /// Two records share the same key ID.
    #[error("Duplicate key ID: {kid}")]
    DuplicateKeyId {
        /// The repeated key ID.
        kid: String,
    },

    /// A JWK carries no `kid` and cannot be addressed by tokens.
    #[error("Key at index {index} has no key ID")]
    MissingKeyId {
        /// Position of the key in the JWKS `keys` array.
        index: usize,
    },

    /// The key type or curve cannot be used for signature verification.
    #[error("Unsupported key for {kid}: {reason}")]
    UnsupportedKey {
        /// Key ID of the offending key.
        kid: String,
        /// Why the key was rejected.
        reason: String,
    },

    /// The algorithm tag cannot be used with the supplied key material.
    #[error("Algorithm {algorithm} is incompatible with the key material for {kid}")]
    IncompatibleAlgorithm {
        /// Key ID of the offending key.
        kid: String,
        /// The algorithm that was requested.
        algorithm: Algorithm,
    },
}

impl KeySetError {
    /// Creates a new `UnsupportedKey` error.
    #[must_use]
    pub fn unsupported_key(kid: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedKey { kid: sanitize_kid(kid), reason: reason.into() }
    }
}

/// Result type alias for validation operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Sanitize a key ID for safe inclusion in error messages and log fields.
///
/// Control characters become U+FFFD and the result is truncated to
/// [`MAX_DISPLAYED_KID_LEN`] bytes on a character boundary.
pub(crate) fn sanitize_kid(kid: &str) -> String {
    let clean: String = kid.chars().map(|c| if c.is_control() { '\u{FFFD}' } else { c }).collect();
    if clean.len() > MAX_DISPLAYED_KID_LEN {
        let end = clean.floor_char_boundary(MAX_DISPLAYED_KID_LEN);
        format!("{}...(truncated)", &clean[..end])
    } else {
        clean
    }
}
