//! Public key sets and key resolution.
//!
//! A [`KeySet`] is an immutable snapshot of the public keys a token may be
//! signed with. It is built by the caller, either programmatically or from a
//! JWKS document, and passed whole into every validation. The engine never
//! fetches, caches or refreshes keys; see
//! [`SharedKeySet`](crate::shared::SharedKeySet) for swapping snapshots on
//! rotation.
//!
//! # Resolution
//!
//! [`KeySet::resolve`] matches the token's `kid` exactly and
//! case-sensitively. There is no prefix matching and no fallback to "the only
//! key" or to a key with a matching algorithm.

use jsonwebtoken::jwk::{
    AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse,
};

use crate::{
    algorithm::{Algorithm, KeyFamily},
    error::{KeySetError, ValidationError},
};

/// Elliptic curves usable for ECDSA verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    /// NIST P-256 (ES256).
    P256,
    /// NIST P-384 (ES384).
    P384,
}

/// Public key material in a form the signature primitive can consume.
///
/// Component values are base64url-encoded without padding, exactly as they
/// appear in a JWK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// RSA modulus and public exponent.
    RsaComponents {
        /// Modulus `n`.
        n: String,
        /// Public exponent `e`.
        e: String,
    },
    /// PEM-encoded RSA public key (`PUBLIC KEY` or `RSA PUBLIC KEY`).
    RsaPem(String),
    /// Uncompressed elliptic-curve point.
    EcPoint {
        /// Curve the point lies on.
        curve: EcCurve,
        /// X coordinate.
        x: String,
        /// Y coordinate.
        y: String,
    },
    /// Raw 32-byte Ed25519 public key.
    Ed25519 {
        /// Public key bytes.
        x: String,
    },
}

impl KeyMaterial {
    /// The key family of this material.
    #[must_use]
    pub fn family(&self) -> KeyFamily {
        match self {
            Self::RsaComponents { .. } | Self::RsaPem(_) => KeyFamily::Rsa,
            Self::EcPoint { curve: EcCurve::P256, .. } => KeyFamily::EcP256,
            Self::EcPoint { curve: EcCurve::P384, .. } => KeyFamily::EcP384,
            Self::Ed25519 { .. } => KeyFamily::Ed25519,
        }
    }

    /// Algorithm assumed for a JWK that omits `alg`.
    #[must_use]
    pub fn default_algorithm(&self) -> Algorithm {
        match self.family() {
            KeyFamily::Rsa | KeyFamily::Hmac => Algorithm::RS256,
            KeyFamily::EcP256 => Algorithm::ES256,
            KeyFamily::EcP384 => Algorithm::ES384,
            KeyFamily::Ed25519 => Algorithm::EdDSA,
        }
    }

    /// Whether `algorithm` can verify with this material.
    #[must_use]
    pub fn supports(&self, algorithm: Algorithm) -> bool {
        algorithm.family() == self.family()
    }
}

/// One public key published under a key ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    kid: String,
    algorithm: Algorithm,
    material: KeyMaterial,
}

impl KeyRecord {
    /// Creates a key record, checking the algorithm against the material.
    ///
    /// # Errors
    ///
    /// Returns [`KeySetError::IncompatibleAlgorithm`] if the algorithm's key
    /// family differs from the material's (this always rejects HMAC
    /// algorithms, since a key set carries no shared secrets).
    pub fn new(
        kid: impl Into<String>,
        algorithm: Algorithm,
        material: KeyMaterial,
    ) -> Result<Self, KeySetError> {
        let kid = kid.into();
        if !material.supports(algorithm) {
            return Err(KeySetError::IncompatibleAlgorithm { kid, algorithm });
        }
        Ok(Self { kid, algorithm, material })
    }

    /// Key ID tokens reference in their `kid` header.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Algorithm the key was published for.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Public key material.
    #[must_use]
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }
}

/// An immutable, ordered set of public keys with unique key IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    records: Vec<KeyRecord>,
}

impl KeySet {
    /// Creates an empty key set. Every resolution against it fails.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a key set from records, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`KeySetError::DuplicateKeyId`] if two records share a key ID.
    pub fn new(records: impl IntoIterator<Item = KeyRecord>) -> Result<Self, KeySetError> {
        let mut collected: Vec<KeyRecord> = Vec::new();
        for record in records {
            if collected.iter().any(|existing| existing.kid == record.kid) {
                return Err(KeySetError::DuplicateKeyId { kid: record.kid });
            }
            collected.push(record);
        }
        Ok(Self { records: collected })
    }

    /// Parses a JWKS JSON document (`{"keys": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns [`KeySetError::InvalidDocument`] if the JSON does not have the
    /// JWKS shape, or any error from [`KeySet::from_jwk_set`].
    pub fn from_jwks_json(json: &str) -> Result<Self, KeySetError> {
        let jwks: JwkSet = serde_json::from_str(json).map_err(KeySetError::InvalidDocument)?;
        Self::from_jwk_set(&jwks)
    }

    /// Converts a parsed JWKS into a key set.
    ///
    /// RSA, EC (P-256, P-384) and OKP (Ed25519) keys are accepted. A key
    /// without `alg` gets the default algorithm of its family. Symmetric keys,
    /// encryption keys and keys without `kid` are rejected: a key set that
    /// silently dropped keys would turn a publishing mistake into
    /// `KeyNotFound` at validation time.
    ///
    /// # Errors
    ///
    /// Returns a [`KeySetError`] describing the first key that cannot be used.
    pub fn from_jwk_set(jwks: &JwkSet) -> Result<Self, KeySetError> {
        let records = jwks
            .keys
            .iter()
            .enumerate()
            .map(|(index, jwk)| record_from_jwk(index, jwk))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(records)
    }

    /// Finds the record whose key ID equals `kid` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::KeyNotFound`] if no record matches, which
    /// includes every lookup against an empty set.
    pub fn resolve(&self, kid: &str) -> Result<&KeyRecord, ValidationError> {
        self.records
            .iter()
            .find(|record| record.kid == kid)
            .ok_or_else(|| ValidationError::key_not_found(kid))
    }

    /// Records in publication order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyRecord> {
        self.records.iter()
    }

    /// Number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a KeyRecord;
    type IntoIter = std::slice::Iter<'a, KeyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn record_from_jwk(index: usize, jwk: &Jwk) -> Result<KeyRecord, KeySetError> {
    let kid = jwk
        .common
        .key_id
        .as_deref()
        .filter(|kid| !kid.is_empty())
        .ok_or(KeySetError::MissingKeyId { index })?;

    if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
        return Err(KeySetError::unsupported_key(kid, "key is published for encryption"));
    }

    #[allow(unreachable_patterns)]
    let material = match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            KeyMaterial::RsaComponents { n: rsa.n.clone(), e: rsa.e.clone() }
        },
        AlgorithmParameters::EllipticCurve(ec) => {
            let curve = match ec.curve {
                EllipticCurve::P256 => EcCurve::P256,
                EllipticCurve::P384 => EcCurve::P384,
                ref other => {
                    return Err(KeySetError::unsupported_key(
                        kid,
                        format!("unsupported EC curve {other:?}"),
                    ));
                },
            };
            KeyMaterial::EcPoint { curve, x: ec.x.clone(), y: ec.y.clone() }
        },
        AlgorithmParameters::OctetKeyPair(okp) => match okp.curve {
            EllipticCurve::Ed25519 => KeyMaterial::Ed25519 { x: okp.x.clone() },
            ref other => {
                return Err(KeySetError::unsupported_key(
                    kid,
                    format!("unsupported OKP curve {other:?}"),
                ));
            },
        },
        AlgorithmParameters::OctetKey(_) => {
            return Err(KeySetError::unsupported_key(kid, "symmetric keys are not accepted"));
        },
        _ => return Err(KeySetError::unsupported_key(kid, "unsupported key type")),
    };

    let algorithm = match jwk.common.key_algorithm {
        Some(key_algorithm) => algorithm_from_jwk(kid, key_algorithm)?,
        None => material.default_algorithm(),
    };

    KeyRecord::new(kid, algorithm, material)
}

/// Map a JWK `alg` to a signature algorithm, rejecting encryption algorithms.
fn algorithm_from_jwk(kid: &str, key_algorithm: KeyAlgorithm) -> Result<Algorithm, KeySetError> {
    match key_algorithm {
        KeyAlgorithm::HS256 => Ok(Algorithm::HS256),
        KeyAlgorithm::HS384 => Ok(Algorithm::HS384),
        KeyAlgorithm::HS512 => Ok(Algorithm::HS512),
        KeyAlgorithm::RS256 => Ok(Algorithm::RS256),
        KeyAlgorithm::RS384 => Ok(Algorithm::RS384),
        KeyAlgorithm::RS512 => Ok(Algorithm::RS512),
        KeyAlgorithm::PS256 => Ok(Algorithm::PS256),
        KeyAlgorithm::PS384 => Ok(Algorithm::PS384),
        KeyAlgorithm::PS512 => Ok(Algorithm::PS512),
        KeyAlgorithm::ES256 => Ok(Algorithm::ES256),
        KeyAlgorithm::ES384 => Ok(Algorithm::ES384),
        KeyAlgorithm::EdDSA => Ok(Algorithm::EdDSA),
        other => Err(KeySetError::unsupported_key(
            kid,
            format!("algorithm {other:?} is not a signature algorithm"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    const RSA_N: &str = include_str!("../fixtures/rsa_public.n");

    fn rsa_record(kid: &str) -> KeyRecord {
        KeyRecord::new(
            kid,
            Algorithm::RS256,
            KeyMaterial::RsaComponents { n: RSA_N.trim().to_owned(), e: "AQAB".into() },
        )
        .unwrap()
    }

    fn ed_record(kid: &str) -> KeyRecord {
        KeyRecord::new(kid, Algorithm::EdDSA, KeyMaterial::Ed25519 { x: "AAAA".into() }).unwrap()
    }

    // ===== Resolution =====

    #[test]
    fn test_resolve_exact_match() {
        let set = KeySet::new([rsa_record("k1"), ed_record("k2")]).unwrap();
        assert_eq!(set.resolve("k1").unwrap().kid(), "k1");
        assert_eq!(set.resolve("k2").unwrap().algorithm(), Algorithm::EdDSA);
    }

    #[test]
    fn test_resolve_unknown_kid() {
        let set = KeySet::new([rsa_record("k1")]).unwrap();
        let err = set.resolve("k9").unwrap_err();
        assert_eq!(err, ValidationError::KeyNotFound { kid: "k9".into() });
    }

    #[test]
    fn test_resolve_empty_set() {
        let err = KeySet::empty().resolve("k1").unwrap_err();
        assert!(matches!(err, ValidationError::KeyNotFound { .. }));
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let set = KeySet::new([rsa_record("Key-1")]).unwrap();
        assert!(set.resolve("key-1").is_err());
        assert!(set.resolve("KEY-1").is_err());
        assert!(set.resolve("Key-1").is_ok());
    }

    #[test]
    fn test_resolve_has_no_prefix_or_whitespace_matching() {
        let set = KeySet::new([rsa_record("k1")]).unwrap();
        assert!(set.resolve("k").is_err());
        assert!(set.resolve("k10").is_err());
        assert!(set.resolve(" k1").is_err());
        assert!(set.resolve("").is_err());
    }

    #[test]
    fn test_resolve_single_key_is_not_a_fallback() {
        // A set with one key still requires the kid to match.
        let set = KeySet::new([rsa_record("only")]).unwrap();
        assert!(set.resolve("other").is_err());
    }

    // ===== Construction =====

    #[test]
    fn test_new_rejects_duplicate_kid() {
        let err = KeySet::new([rsa_record("k1"), ed_record("k1")]).unwrap_err();
        assert!(matches!(err, KeySetError::DuplicateKeyId { kid } if kid == "k1"));
    }

    #[test]
    fn test_new_preserves_order() {
        let set = KeySet::new([ed_record("b"), rsa_record("a")]).unwrap();
        let kids: Vec<_> = set.iter().map(KeyRecord::kid).collect();
        assert_eq!(kids, ["b", "a"]);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_record_rejects_hmac_algorithm() {
        let err = KeyRecord::new(
            "k1",
            Algorithm::HS256,
            KeyMaterial::RsaComponents { n: "n".into(), e: "AQAB".into() },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            KeySetError::IncompatibleAlgorithm { algorithm: Algorithm::HS256, .. }
        ));
    }

    #[test]
    fn test_record_rejects_cross_family_algorithm() {
        let err = KeyRecord::new("k1", Algorithm::ES256, KeyMaterial::Ed25519 { x: "AAAA".into() })
            .unwrap_err();
        assert!(matches!(err, KeySetError::IncompatibleAlgorithm { .. }));

        let p384 = KeyMaterial::EcPoint { curve: EcCurve::P384, x: "x".into(), y: "y".into() };
        assert!(KeyRecord::new("k2", Algorithm::ES256, p384.clone()).is_err());
        assert!(KeyRecord::new("k2", Algorithm::ES384, p384).is_ok());
    }

    #[test]
    fn test_rsa_material_supports_pss() {
        let pem = KeyMaterial::RsaPem(include_str!("../fixtures/rsa_public.pem").to_owned());
        assert!(pem.supports(Algorithm::PS256));
        assert!(pem.supports(Algorithm::RS512));
        assert!(!pem.supports(Algorithm::EdDSA));
    }

    // ===== JWKS =====

    const EC_X: &str = "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU";
    const EC_Y: &str = "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0";
    const ED_X: &str = "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo";

    fn rsa_jwk(kid: &str, extra: &Value) -> Value {
        let mut jwk = json!({"kty": "RSA", "kid": kid, "n": RSA_N.trim(), "e": "AQAB"});
        if let (Some(jwk), Some(extra)) = (jwk.as_object_mut(), extra.as_object()) {
            jwk.extend(extra.clone());
        }
        jwk
    }

    #[test]
    fn test_from_jwks_json_mixed_key_types() {
        let doc = json!({
            "keys": [
                rsa_jwk("rsa-1", &json!({"alg": "RS256", "use": "sig"})),
                {"kty": "EC", "kid": "ec-1", "crv": "P-256", "x": EC_X, "y": EC_Y},
                {"kty": "OKP", "kid": "ed-1", "crv": "Ed25519", "x": ED_X}
            ]
        });
        let set = KeySet::from_jwks_json(&doc.to_string()).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.resolve("rsa-1").unwrap().algorithm(), Algorithm::RS256);
        assert_eq!(set.resolve("ec-1").unwrap().algorithm(), Algorithm::ES256);
        assert_eq!(set.resolve("ed-1").unwrap().algorithm(), Algorithm::EdDSA);
        assert!(matches!(
            set.resolve("ec-1").unwrap().material(),
            KeyMaterial::EcPoint { curve: EcCurve::P256, .. }
        ));
    }

    #[test]
    fn test_from_jwks_json_defaults_rsa_algorithm() {
        let doc = json!({"keys": [{"kty": "RSA", "kid": "k1", "n": RSA_N.trim(), "e": "AQAB"}]});
        let set = KeySet::from_jwks_json(&doc.to_string()).unwrap();
        assert_eq!(set.resolve("k1").unwrap().algorithm(), Algorithm::RS256);
    }

    #[test]
    fn test_from_jwks_json_keeps_declared_pss() {
        let doc = json!({"keys": [rsa_jwk("k1", &json!({"alg": "PS384"}))]});
        let set = KeySet::from_jwks_json(&doc.to_string()).unwrap();
        assert_eq!(set.resolve("k1").unwrap().algorithm(), Algorithm::PS384);
    }

    #[test]
    fn test_from_jwks_json_rejects_symmetric_key() {
        let doc = json!({"keys": [{"kty": "oct", "kid": "hmac", "alg": "HS256", "k": "c2VjcmV0"}]});
        let err = KeySet::from_jwks_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, KeySetError::UnsupportedKey { ref kid, .. } if kid == "hmac"));
    }

    #[test]
    fn test_from_jwks_json_rejects_missing_kid() {
        let doc = json!({"keys": [{"kty": "RSA", "n": RSA_N.trim(), "e": "AQAB"}]});
        let err = KeySet::from_jwks_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, KeySetError::MissingKeyId { index: 0 }));
    }

    #[test]
    fn test_from_jwks_json_rejects_encryption_use() {
        let doc = json!({"keys": [rsa_jwk("enc", &json!({"use": "enc"}))]});
        let err = KeySet::from_jwks_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, KeySetError::UnsupportedKey { .. }));
    }

    #[test]
    fn test_from_jwks_json_rejects_alg_incompatible_with_key_type() {
        let doc = json!({"keys": [rsa_jwk("k1", &json!({"alg": "ES256"}))]});
        let err = KeySet::from_jwks_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, KeySetError::IncompatibleAlgorithm { .. }));
    }

    #[test]
    fn test_from_jwks_json_rejects_duplicate_kid() {
        let doc = json!({
            "keys": [
                {"kty": "RSA", "kid": "k1", "n": RSA_N.trim(), "e": "AQAB"},
                {"kty": "OKP", "kid": "k1", "crv": "Ed25519", "x": ED_X}
            ]
        });
        let err = KeySet::from_jwks_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, KeySetError::DuplicateKeyId { .. }));
    }

    #[test]
    fn test_from_jwks_json_invalid_document() {
        assert!(matches!(
            KeySet::from_jwks_json("not json"),
            Err(KeySetError::InvalidDocument(_))
        ));
        assert!(matches!(
            KeySet::from_jwks_json(r#"{"no_keys": []}"#),
            Err(KeySetError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_from_jwks_json_empty_keys() {
        let set = KeySet::from_jwks_json(r#"{"keys": []}"#).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_key_set_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeySet>();
        assert_send_sync::<KeyRecord>();
    }
}
