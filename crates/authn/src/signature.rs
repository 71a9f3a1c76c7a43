//! Signature verification.
//!
//! [`verify_signature`] enforces algorithm agreement between the token header
//! and the resolved key record, then delegates the cryptographic check to a
//! [`SignatureVerifier`]. The default verifier, [`JwtSignatureVerifier`], is
//! backed by `jsonwebtoken`'s crypto primitives.
//!
//! # Security
//!
//! The algorithm comparison happens before any key material is touched. A
//! token declaring `HS256` against an RSA record never reaches a MAC
//! computation, which closes the classic public-key-as-HMAC-secret
//! substitution.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::DecodingKey;

use crate::{
    algorithm::Algorithm,
    error::{Result, ValidationError},
    keyset::{KeyMaterial, KeyRecord},
};

/// A cryptographic signature check over raw bytes.
///
/// Implementations must be deterministic and must report `false` for any
/// failure, including key material they cannot use.
pub trait SignatureVerifier: Send + Sync {
    /// Whether `signature` is a valid signature by `key` over `message` under `algorithm`.
    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        key: &KeyMaterial,
        algorithm: Algorithm,
    ) -> bool;
}

/// [`SignatureVerifier`] backed by `jsonwebtoken`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtSignatureVerifier;

impl SignatureVerifier for JwtSignatureVerifier {
    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        key: &KeyMaterial,
        algorithm: Algorithm,
    ) -> bool {
        if signature.is_empty() {
            return false;
        }

        let decoding_key = match decoding_key(key) {
            Ok(decoding_key) => decoding_key,
            Err(e) => {
                tracing::debug!(error = %e, "Key material could not be loaded for verification");
                return false;
            },
        };

        let signature_b64 = URL_SAFE_NO_PAD.encode(signature);
        let algorithm = to_jwt_algorithm(algorithm);
        jsonwebtoken::crypto::verify(&signature_b64, message, &decoding_key, algorithm)
            .unwrap_or(false)
    }
}

/// Build a `jsonwebtoken` decoding key from published key material.
fn decoding_key(key: &KeyMaterial) -> jsonwebtoken::errors::Result<DecodingKey> {
    match key {
        KeyMaterial::RsaComponents { n, e } => DecodingKey::from_rsa_components(n, e),
        KeyMaterial::RsaPem(pem) => DecodingKey::from_rsa_pem(pem.as_bytes()),
        KeyMaterial::EcPoint { x, y, .. } => DecodingKey::from_ec_components(x, y),
        KeyMaterial::Ed25519 { x } => DecodingKey::from_ed_components(x),
    }
}

fn to_jwt_algorithm(algorithm: Algorithm) -> jsonwebtoken::Algorithm {
    match algorithm {
        Algorithm::HS256 => jsonwebtoken::Algorithm::HS256,
        Algorithm::HS384 => jsonwebtoken::Algorithm::HS384,
        Algorithm::HS512 => jsonwebtoken::Algorithm::HS512,
        Algorithm::RS256 => jsonwebtoken::Algorithm::RS256,
        Algorithm::RS384 => jsonwebtoken::Algorithm::RS384,
        Algorithm::RS512 => jsonwebtoken::Algorithm::RS512,
        Algorithm::PS256 => jsonwebtoken::Algorithm::PS256,
        Algorithm::PS384 => jsonwebtoken::Algorithm::PS384,
        Algorithm::PS512 => jsonwebtoken::Algorithm::PS512,
        Algorithm::ES256 => jsonwebtoken::Algorithm::ES256,
        Algorithm::ES384 => jsonwebtoken::Algorithm::ES384,
        Algorithm::EdDSA => jsonwebtoken::Algorithm::EdDSA,
    }
}

/// Verify that `signature` over `signed_bytes` was produced by `record`.
///
/// # Errors
///
/// - [`ValidationError::AlgorithmMismatch`] if `declared` differs from the
///   record's algorithm; checked first, before any cryptography
/// - [`ValidationError::SignatureInvalid`] if the verifier rejects the
///   signature for any reason
pub fn verify_signature<V>(
    signed_bytes: &[u8],
    signature: &[u8],
    record: &KeyRecord,
    declared: Algorithm,
    verifier: &V,
) -> Result<()>
where
    V: SignatureVerifier + ?Sized,
{
    if declared != record.algorithm() {
        return Err(ValidationError::algorithm_mismatch(declared, record.algorithm()));
    }

    if verifier.verify(signed_bytes, signature, record.material(), declared) {
        Ok(())
    } else {
        Err(ValidationError::signature_invalid())
    }
}
