//! Fuzz target for claim decoding and the claims validator.
//!
//! Interprets the input as a JSON payload. Extreme timestamps, odd types and
//! deeply nested values must all produce an error or a verdict, never a
//! panic.

#![no_main]

use bearer_authn::{ClaimSet, ValidationConfig, claims::validate_claims};
use chrono::DateTime;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(claims) = serde_json::from_slice::<ClaimSet>(data) else {
        return;
    };

    let lenient = ValidationConfig::builder().leeway(std::time::Duration::MAX).build();
    let strict = ValidationConfig::builder().require_expiration(true).build();

    for secs in [i64::MIN / 1_000_000, 0, 1_700_000_000, i64::MAX / 1_000_000] {
        let Some(now) = DateTime::from_timestamp(secs, 0) else {
            continue;
        };
        let subject = claims.subject.clone().unwrap_or_default();
        let _ = validate_claims(claims.clone(), &subject, now, &lenient);
        let _ = validate_claims(claims.clone(), &subject, now, &strict);
    }
});
