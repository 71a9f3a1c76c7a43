//! Claim sets and the claims validator.
//!
//! The payload of a token is decoded into a [`ClaimSet`]: the registered
//! claims the policy reads (`sub`, `iat`, `nbf`, `exp`) as typed optional
//! fields, and every other claim in a residual map. Type errors in the
//! registered claims are decode failures, so the validator only ever sees
//! well-typed values.
//!
//! [`validate_claims`] applies the fixed policy, in order:
//!
//! 1. expiration (`Expired` when `now >= exp`)
//! 2. not-before (`NotYetValid` when `now < nbf`)
//! 3. subject (`SubjectMismatch` unless `sub` equals the expected subject)

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::{Map, Number, Value};

use crate::{config::ValidationConfig, error::ValidationError};

/// Claims decoded from a token payload. Not yet trusted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClaimSet {
    /// Subject (`sub`).
    #[serde(rename = "sub", default)]
    pub subject: Option<String>,

    /// Issued-at (`iat`).
    #[serde(rename = "iat", default, deserialize_with = "numeric_date")]
    pub issued_at: Option<DateTime<Utc>>,

    /// Not-before (`nbf`).
    #[serde(rename = "nbf", default, deserialize_with = "numeric_date")]
    pub not_before: Option<DateTime<Utc>>,

    /// Expiration (`exp`).
    #[serde(rename = "exp", default, deserialize_with = "numeric_date")]
    pub expiration: Option<DateTime<Utc>>,

    /// Every claim not listed above, unvalidated.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClaimSet {
    /// Looks up an unrecognized claim by name.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Claims of a token that passed every validation stage.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    /// Subject; always equal to the subject the caller expected.
    pub subject: String,
    /// Expiration, if the token carries one.
    pub expiration: Option<DateTime<Utc>>,
    /// Issued-at, if the token carries one.
    pub issued_at: Option<DateTime<Utc>>,
    /// Not-before, if the token carries one.
    pub not_before: Option<DateTime<Utc>>,
    /// Every other claim, as it appeared in the payload.
    pub extra: Map<String, Value>,
}

impl VerifiedClaims {
    /// Looks up an unrecognized claim by name.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Validate decoded claims against the policy at instant `now`.
///
/// # Arguments
///
/// * `claims` - Claims from a token whose signature has been verified
/// * `expected_subject` - Compared byte-for-byte with `sub`; no normalization
/// * `now` - Evaluation instant, supplied by the caller
/// * `config` - Leeway and the absent-`exp` policy
///
/// # Errors
///
/// Returns the first failing check:
/// - [`ValidationError::MalformedToken`] if `exp` is absent and the config requires it
/// - [`ValidationError::Expired`] if `now >= exp` (less leeway)
/// - [`ValidationError::NotYetValid`] if `now < nbf` (less leeway)
/// - [`ValidationError::SubjectMismatch`] if `sub` is absent or different
pub fn validate_claims(
    claims: ClaimSet,
    expected_subject: &str,
    now: DateTime<Utc>,
    config: &ValidationConfig,
) -> Result<VerifiedClaims, ValidationError> {
    let leeway = TimeDelta::from_std(config.leeway()).unwrap_or(TimeDelta::MAX);

    // Check expiration
    match claims.expiration {
        Some(exp) => {
            let shifted_now = now.checked_sub_signed(leeway).unwrap_or(DateTime::<Utc>::MIN_UTC);
            if shifted_now >= exp {
                return Err(ValidationError::expired());
            }
        },
        None if config.require_expiration() => {
            return Err(ValidationError::malformed("token has no 'exp' claim"));
        },
        None => {},
    }

    // Check not-before if present
    if let Some(nbf) = claims.not_before {
        let shifted_now = now.checked_add_signed(leeway).unwrap_or(DateTime::<Utc>::MAX_UTC);
        if shifted_now < nbf {
            return Err(ValidationError::not_yet_valid());
        }
    }

    // Check subject
    let subject = match claims.subject {
        Some(subject) if subject == expected_subject => subject,
        _ => return Err(ValidationError::subject_mismatch()),
    };

    Ok(VerifiedClaims {
        subject,
        expiration: claims.expiration,
        issued_at: claims.issued_at,
        not_before: claims.not_before,
        extra: claims.extra,
    })
}

/// Deserialize an RFC 7519 NumericDate (integer or fractional seconds since the epoch).
fn numeric_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    numeric_date_from_number(&number)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("NumericDate {number} is out of range")))
}

fn numeric_date_from_number(number: &Number) -> Option<DateTime<Utc>> {
    if let Some(secs) = number.as_i64() {
        return DateTime::from_timestamp(secs, 0);
    }
    let value = number.as_f64()?;
    if !value.is_finite() {
        return None;
    }
    let secs = value.floor();
    if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
        return None;
    }
    let nanos = ((value - secs) * 1e9) as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
}
