//! JWS signature algorithms.
//!
//! Token headers and key records both carry an [`Algorithm`]. The decoder
//! rejects any `alg` string that is not listed here (including `none`), and
//! the signature stage requires the header's algorithm to equal the one the
//! key was published for.
//!
//! # Security
//!
//! - `none` is never an algorithm, so unsigned tokens fail at decode time.
//! - HMAC algorithms parse (so a substitution attempt is reported precisely),
//!   but no key record can carry them: key sets only hold public keys.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header values that are refused outright rather than reported as unknown.
pub const FORBIDDEN_ALGORITHMS: &[&str] = &["none"];

/// A JWS signature algorithm (RFC 7518 §3.1, RFC 8037).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum Algorithm {
    /// HMAC using SHA-256.
    HS256,
    /// HMAC using SHA-384.
    HS384,
    /// HMAC using SHA-512.
    HS512,
    /// RSASSA-PKCS1-v1_5 using SHA-256.
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384.
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512.
    RS512,
    /// RSASSA-PSS using SHA-256.
    PS256,
    /// RSASSA-PSS using SHA-384.
    PS384,
    /// RSASSA-PSS using SHA-512.
    PS512,
    /// ECDSA using P-256 and SHA-256.
    ES256,
    /// ECDSA using P-384 and SHA-384.
    ES384,
    /// Edwards-curve signatures (Ed25519).
    EdDSA,
}

/// Key families an algorithm can be used with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    /// Shared-secret MAC. Never present in a key set.
    Hmac,
    /// RSA public keys (PKCS#1 v1.5 and PSS).
    Rsa,
    /// NIST P-256 public keys.
    EcP256,
    /// NIST P-384 public keys.
    EcP384,
    /// Ed25519 public keys.
    Ed25519,
}

impl Algorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 12] = [
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
        Self::ES256,
        Self::ES384,
        Self::EdDSA,
    ];

    /// The registered JWS name, e.g. `"RS256"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::EdDSA => "EdDSA",
        }
    }

    /// The key family this algorithm verifies with.
    #[must_use]
    pub fn family(self) -> KeyFamily {
        match self {
            Self::HS256 | Self::HS384 | Self::HS512 => KeyFamily::Hmac,
            Self::RS256 | Self::RS384 | Self::RS512 | Self::PS256 | Self::PS384 | Self::PS512 => {
                KeyFamily::Rsa
            },
            Self::ES256 => KeyFamily::EcP256,
            Self::ES384 => KeyFamily::EcP384,
            Self::EdDSA => KeyFamily::Ed25519,
        }
    }

    /// Whether this is a shared-secret algorithm.
    #[must_use]
    pub fn is_symmetric(self) -> bool {
        self.family() == KeyFamily::Hmac
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `alg` value that is not a supported JWS algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAlgorithmError {
    /// The value is on the [`FORBIDDEN_ALGORITHMS`] list.
    #[error("algorithm '{0}' is not allowed")]
    Forbidden(String),
    /// The value is not a known algorithm name.
    #[error("unknown algorithm '{0}'")]
    Unknown(String),
}

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    /// Parses a registered JWS name. Matching is case-sensitive, as in RFC 7515.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if FORBIDDEN_ALGORITHMS.contains(&s) {
            return Err(ParseAlgorithmError::Forbidden(s.to_owned()));
        }
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == s)
            .ok_or_else(|| ParseAlgorithmError::Unknown(s.chars().take(32).collect()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_algorithm_by_name() {
        for alg in Algorithm::ALL {
            assert_eq!(alg.as_str().parse::<Algorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn test_parse_none_is_forbidden() {
        let err = "none".parse::<Algorithm>().unwrap_err();
        assert_eq!(err, ParseAlgorithmError::Forbidden("none".into()));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(matches!("rs256".parse::<Algorithm>(), Err(ParseAlgorithmError::Unknown(_))));
        assert!(matches!("EDDSA".parse::<Algorithm>(), Err(ParseAlgorithmError::Unknown(_))));
        assert!(matches!("None".parse::<Algorithm>(), Err(ParseAlgorithmError::Unknown(_))));
    }

    #[test]
    fn test_parse_unknown_truncates_echoed_value() {
        let long = "X".repeat(500);
        let Err(ParseAlgorithmError::Unknown(echoed)) = long.parse::<Algorithm>() else {
            panic!("expected unknown algorithm");
        };
        assert_eq!(echoed.len(), 32);
    }

    #[test]
    fn test_families() {
        assert_eq!(Algorithm::HS256.family(), KeyFamily::Hmac);
        assert_eq!(Algorithm::RS384.family(), KeyFamily::Rsa);
        assert_eq!(Algorithm::PS512.family(), KeyFamily::Rsa);
        assert_eq!(Algorithm::ES256.family(), KeyFamily::EcP256);
        assert_eq!(Algorithm::ES384.family(), KeyFamily::EcP384);
        assert_eq!(Algorithm::EdDSA.family(), KeyFamily::Ed25519);
    }

    #[test]
    fn test_only_hmac_is_symmetric() {
        let symmetric: Vec<_> = Algorithm::ALL.into_iter().filter(|a| a.is_symmetric()).collect();
        assert_eq!(symmetric, vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512]);
    }

    #[test]
    fn test_serde_uses_registered_names() {
        assert_eq!(serde_json::to_string(&Algorithm::EdDSA).unwrap(), "\"EdDSA\"");
        let alg: Algorithm = serde_json::from_str("\"PS256\"").unwrap();
        assert_eq!(alg, Algorithm::PS256);
        assert!(serde_json::from_str::<Algorithm>("\"none\"").is_err());
    }
}
