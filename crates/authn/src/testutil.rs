//! Shared test utilities for token validation testing.
//!
//! This module provides fixture RSA and EC keys, Ed25519 key generation, helpers
//! that sign tokens the way a real issuer would, raw-token crafting (for
//! attack testing) and an assertion macro for [`ValidationError`] variants.
//! It is feature-gated behind `testutil` to prevent leaking into production
//! builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! bearer-authn = { path = ".", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use bearer_authn::testutil::{rsa_key_set, sign_rs256, token_claims};
//! ```
//!
//! [`ValidationError`]: crate::ValidationError

#![allow(clippy::expect_used)]

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{EncodingKey, Header};
use rand_core::OsRng;
use serde_json::{Value, json};
use zeroize::Zeroizing;

use crate::{
    algorithm::Algorithm,
    keyset::{KeyMaterial, KeyRecord, KeySet},
};

/// PKCS#1 PEM private key of the primary RSA-2048 fixture.
pub const RSA_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/rsa_private.pem");

/// SPKI PEM public key of the primary RSA-2048 fixture.
pub const RSA_PUBLIC_KEY_PEM: &str = include_str!("../fixtures/rsa_public.pem");

/// Base64url modulus of the primary RSA fixture.
pub const RSA_PUBLIC_MODULUS: &str = include_str!("../fixtures/rsa_public.n");

/// PKCS#1 PEM private key of a second, unrelated RSA-2048 fixture.
pub const RSA_OTHER_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/rsa_other_private.pem");

/// Base64url modulus of the second RSA fixture.
pub const RSA_OTHER_PUBLIC_MODULUS: &str = include_str!("../fixtures/rsa_other_public.n");

/// PKCS#8 PEM private key of the P-256 fixture.
pub const EC_P256_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/ec_p256_private.pem");

/// Base64url X coordinate of the P-256 fixture's public point.
pub const EC_P256_PUBLIC_X: &str = include_str!("../fixtures/ec_p256_public.x");

/// Base64url Y coordinate of the P-256 fixture's public point.
pub const EC_P256_PUBLIC_Y: &str = include_str!("../fixtures/ec_p256_public.y");

/// PKCS#8 PEM private key of the P-384 fixture.
pub const EC_P384_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/ec_p384_private.pem");

/// Base64url X coordinate of the P-384 fixture's public point.
pub const EC_P384_PUBLIC_X: &str = include_str!("../fixtures/ec_p384_public.x");

/// Base64url Y coordinate of the P-384 fixture's public point.
pub const EC_P384_PUBLIC_Y: &str = include_str!("../fixtures/ec_p384_public.y");

/// Base64url public exponent shared by both RSA fixtures (65537).
pub const RSA_PUBLIC_EXPONENT: &str = "AQAB";

/// Subject used throughout the test suites.
pub const TEST_SUBJECT: &str = "https://example.org/user";

/// Creates an RS256 key record for the primary RSA fixture.
///
/// # Panics
///
/// Never in practice: the fixture material is RSA.
pub fn rsa_key_record(kid: &str) -> KeyRecord {
    KeyRecord::new(
        kid,
        Algorithm::RS256,
        KeyMaterial::RsaComponents {
            n: RSA_PUBLIC_MODULUS.trim().to_owned(),
            e: RSA_PUBLIC_EXPONENT.to_owned(),
        },
    )
    .expect("RSA fixture record")
}

/// Creates a key set holding only the primary RSA fixture under `kid`.
///
/// # Panics
///
/// Never in practice: a single record cannot collide.
pub fn rsa_key_set(kid: &str) -> KeySet {
    KeySet::new([rsa_key_record(kid)]).expect("single-key set")
}

/// Generates a test Ed25519 key pair.
///
/// Returns `(pkcs8_der, public_key_base64url)` where:
/// - `pkcs8_der` is the private key in PKCS#8 DER format wrapped in [`Zeroizing`] (suitable for
///   [`EncodingKey::from_ed_der`])
/// - `public_key_base64url` is the 32-byte public key encoded as base64url without padding
///   (suitable for [`KeyMaterial::Ed25519`])
///
/// Each call generates a fresh random key pair.
pub fn generate_test_keypair() -> (Zeroizing<Vec<u8>>, String) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let public_key_b64 = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().to_bytes());

    let private_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(signing_key.to_bytes());
    let mut pkcs8_der = Zeroizing::new(vec![
        0x30, 0x2e, // SEQUENCE, 46 bytes
        0x02, 0x01, 0x00, // INTEGER version 0
        0x30, 0x05, // SEQUENCE, 5 bytes (algorithm identifier)
        0x06, 0x03, 0x2b, 0x65, 0x70, // OID 1.3.101.112 (Ed25519)
        0x04, 0x22, // OCTET STRING, 34 bytes
        0x04, 0x20, // OCTET STRING, 32 bytes (the actual key)
    ]);
    pkcs8_der.extend_from_slice(&*private_bytes);

    (pkcs8_der, public_key_b64)
}

/// Creates an EdDSA key record for a base64url Ed25519 public key.
///
/// # Panics
///
/// Never in practice: EdDSA always fits Ed25519 material.
pub fn ed25519_key_record(kid: &str, public_key_b64: &str) -> KeyRecord {
    KeyRecord::new(kid, Algorithm::EdDSA, KeyMaterial::Ed25519 { x: public_key_b64.to_owned() })
        .expect("Ed25519 record")
}

/// Claims of a token valid from `now` for 24 hours, issued to `subject`.
pub fn token_claims(subject: &str, now: DateTime<Utc>) -> Value {
    json!({
        "sub": subject,
        "iat": now.timestamp(),
        "nbf": now.timestamp(),
        "exp": (now + TimeDelta::hours(24)).timestamp(),
    })
}

/// Signs `claims` with an arbitrary key, setting `alg` and `kid` in the header.
///
/// # Panics
///
/// Panics if the key cannot sign with `algorithm`.
pub fn sign_token(
    algorithm: jsonwebtoken::Algorithm,
    kid: &str,
    claims: &Value,
    key: &EncodingKey,
) -> String {
    let mut header = Header::new(algorithm);
    header.kid = Some(kid.to_owned());
    jsonwebtoken::encode(&header, claims, key).expect("Failed to encode test token")
}

/// Signs `claims` with the primary RSA fixture under RS256.
///
/// # Panics
///
/// Panics if the fixture key fails to load (should not happen).
pub fn sign_rs256(kid: &str, claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(RSA_PRIVATE_KEY_PEM.as_bytes()).expect("RSA fixture key");
    sign_token(jsonwebtoken::Algorithm::RS256, kid, claims, &key)
}

/// Signs `claims` with an Ed25519 key in PKCS#8 DER format.
pub fn sign_eddsa(pkcs8_der: &[u8], kid: &str, claims: &Value) -> String {
    sign_token(jsonwebtoken::Algorithm::EdDSA, kid, claims, &EncodingKey::from_ed_der(pkcs8_der))
}

/// Signs `claims` with the P-256 fixture under ES256.
///
/// # Panics
///
/// Panics if the fixture key fails to load (should not happen).
pub fn sign_es256(kid: &str, claims: &Value) -> String {
    let key =
        EncodingKey::from_ec_pem(EC_P256_PRIVATE_KEY_PEM.as_bytes()).expect("P-256 fixture key");
    sign_token(jsonwebtoken::Algorithm::ES256, kid, claims, &key)
}

/// Signs `claims` with the P-384 fixture under ES384.
///
/// # Panics
///
/// Panics if the fixture key fails to load (should not happen).
pub fn sign_es384(kid: &str, claims: &Value) -> String {
    let key =
        EncodingKey::from_ec_pem(EC_P384_PRIVATE_KEY_PEM.as_bytes()).expect("P-384 fixture key");
    sign_token(jsonwebtoken::Algorithm::ES384, kid, claims, &key)
}

/// Signs an arbitrary header and payload, bypassing header construction.
///
/// The header is serialized as given, so it may declare any `alg`, omit
/// `kid` or carry extra members. The signature is computed with `algorithm`
/// and `key` regardless of what the header claims, which is how
/// substitution attacks are produced.
///
/// # Panics
///
/// Panics if the key cannot sign with `algorithm`.
pub fn sign_with_header(
    header_json: &Value,
    payload_json: &Value,
    algorithm: jsonwebtoken::Algorithm,
    key: &EncodingKey,
) -> String {
    let signing_input = signing_input(header_json, payload_json);
    let signature = jsonwebtoken::crypto::sign(signing_input.as_bytes(), key, algorithm)
        .expect("Failed to sign test token");
    format!("{signing_input}.{signature}")
}

/// Creates a raw token string from arbitrary header and payload JSON.
///
/// The result has the structure `{header_b64}.{payload_b64}.` with an empty
/// signature, for testing rejection of malformed or unsigned tokens.
///
/// # Panics
///
/// Panics if JSON serialization fails.
pub fn craft_raw_token(header_json: &Value, payload_json: &Value) -> String {
    format!("{}.", signing_input(header_json, payload_json))
}

fn signing_input(header_json: &Value, payload_json: &Value) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header_json).expect("header json"));
    let payload_b64 =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload_json).expect("payload json"));
    format!("{header_b64}.{payload_b64}")
}

/// Asserts that a [`Result<T, ValidationError>`](crate::ValidationError) is an
/// `Err` matching the given variant.
///
/// Works with any variant. On failure, prints the expected variant and the
/// actual result for debugging.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use bearer_authn::{ValidationError, assert_validation_error};
///
/// let result: Result<(), ValidationError> = Err(ValidationError::expired());
/// assert_validation_error!(result, Expired);
/// ```
#[macro_export]
macro_rules! assert_validation_error {
    ($result:expr, $variant:ident) => {
        assert!(
            matches!($result, Err($crate::error::ValidationError::$variant { .. })),
            "expected ValidationError::{}, got: {:?}",
            stringify!($variant),
            $result,
        );
    };
    ($result:expr, $variant:ident, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::ValidationError::$variant { .. })),
            "{}: expected ValidationError::{}, got: {:?}",
            $msg,
            stringify!($variant),
            $result,
        );
    };
}
