//! Fuzz target for token decoding and the full validation pipeline.
//!
//! Feeds arbitrary byte strings as tokens. Every result must be either
//! `Ok(...)` or `Err(ValidationError)`; any panic or hang is a bug.

#![no_main]

use bearer_authn::{
    decode_token,
    testutil::{TEST_SUBJECT, rsa_key_set},
    validate_token,
};
use chrono::DateTime;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Tokens are always UTF-8 strings
    let Ok(token) = std::str::from_utf8(data) else {
        return;
    };

    let decoded = decode_token(token);

    let Some(now) = DateTime::from_timestamp(1_700_000_000, 0) else {
        return;
    };
    let result = validate_token(token, TEST_SUBJECT, &rsa_key_set("k1"), now);

    // A token that fails to decode must fail validation the same way.
    if let Err(e) = decoded {
        assert_eq!(result.err(), Some(e));
    } else if let Ok(claims) = result {
        assert_eq!(claims.subject, TEST_SUBJECT);
    }
});
