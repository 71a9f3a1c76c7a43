//! # Bearer Authn
//!
//! Validation of signed bearer tokens (compact JWS) against a caller-supplied
//! set of public keys.
//!
//! This crate provides:
//! - **Key sets**: immutable snapshots of public keys, built programmatically
//!   or from a JWKS document, with exact `kid` resolution
//! - **Decoding**: strict parsing of the three-segment compact form
//! - **Signature verification**: algorithm binding plus a pluggable
//!   cryptographic primitive
//! - **Claims validation**: expiration, not-before and subject checks
//!   against a caller-supplied clock
//!
//! ## Features
//!
//! - `none` is never accepted, and HMAC algorithms can never verify because
//!   key sets only hold public keys
//! - The engine performs no I/O: key fetching, caching and refresh belong to
//!   the caller (see [`SharedKeySet`] for rotation)
//! - Every rejection is one [`ValidationError`] variant
//!
//! ## Example
//!
//! ```no_run
//! use bearer_authn::{KeySet, TokenValidator, ValidationConfig};
//! use chrono::Utc;
//!
//! # fn example(jwks_json: &str, token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let key_set = KeySet::from_jwks_json(jwks_json)?;
//! let validator = TokenValidator::new(ValidationConfig::default());
//!
//! let claims = validator.validate(token, "https://example.org/user", &key_set, Utc::now())?;
//! println!("Verified subject: {}", claims.subject);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// JWS algorithm names and families.
pub mod algorithm;
/// Claim sets and the claims validator.
pub mod claims;
/// Validation policy.
pub mod config;
/// Compact token decoding.
pub mod decoder;
/// Validation error types.
pub mod error;
/// Public key sets and resolution.
pub mod keyset;
/// The validation pipeline.
pub mod pipeline;
/// Atomic key-set rotation.
pub mod shared;
/// Signature verification.
pub mod signature;
/// Log subscriber construction.
pub mod telemetry;

/// Shared test utilities (requires `testutil` feature).
#[cfg(feature = "testutil")]
pub mod testutil;

// Re-export key types for convenience
pub use algorithm::{Algorithm, FORBIDDEN_ALGORITHMS};
pub use claims::{ClaimSet, VerifiedClaims};
pub use config::ValidationConfig;
pub use decoder::{DecodedToken, TokenHeader, decode_token, decode_token_bounded};
pub use error::{ErrorKind, KeySetError, Result, Stage, ValidationError};
pub use keyset::{EcCurve, KeyMaterial, KeyRecord, KeySet};
pub use pipeline::{TokenValidator, validate_token};
pub use shared::SharedKeySet;
pub use signature::{JwtSignatureVerifier, SignatureVerifier};
