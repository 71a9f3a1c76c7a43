//! Compact token decoding.
//!
//! Splits a compact JWS (`header.payload.signature`) into its segments,
//! base64url-decodes each one and parses the header and payload JSON. Nothing
//! here is trusted: a syntactically valid token with a forged signature
//! decodes successfully, and trust is only established by
//! [`verify_signature`](crate::signature::verify_signature).
//!
//! The signed bytes are the original `header.payload` text of the token.
//! Re-encoding the parsed JSON would change whitespace and key order and
//! break verification of perfectly valid tokens.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};

use crate::{
    algorithm::{Algorithm, ParseAlgorithmError},
    claims::ClaimSet,
    error::{Result, ValidationError},
};

/// Segment separator of the compact serialization.
const SEGMENT_SEPARATOR: char = '.';

/// Header fields the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Declared signature algorithm (`alg`).
    pub algorithm: Algorithm,
    /// Key ID (`kid`).
    pub kid: String,
    /// Media type (`typ`), if present. Informational only.
    pub typ: Option<String>,
}

/// A token split into its parts. Not yet trusted.
///
/// Implements a custom `Debug` that redacts claims and signature so decoded
/// tokens can't leak through debug formatting or error chains.
#[derive(Clone)]
pub struct DecodedToken {
    /// Parsed header.
    pub header: TokenHeader,
    /// Parsed claims.
    pub claims: ClaimSet,
    /// `header.payload` exactly as it appeared in the token.
    pub signing_input: String,
    /// Decoded signature bytes.
    pub signature: Vec<u8>,
}

impl DecodedToken {
    /// The bytes the signature must cover.
    #[must_use]
    pub fn signed_bytes(&self) -> &[u8] {
        self.signing_input.as_bytes()
    }
}

impl fmt::Debug for DecodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedToken")
            .field("header", &self.header)
            .field("claims", &"[REDACTED]")
            .field("signing_input", &"[REDACTED]")
            .field("signature", &"[REDACTED]")
            .finish()
    }
}

/// Decode a compact token of any length.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedToken`] if:
/// - The token does not have exactly 3 segments separated by dots
/// - A segment is not valid unpadded base64url
/// - The header or payload is not a JSON object
/// - The header lacks a string `alg` or `kid`, or carries `crit`
/// - `alg` is not a supported algorithm (including `none`)
/// - A registered claim has the wrong JSON type
pub fn decode_token(token: &str) -> Result<DecodedToken> {
    let parts: Vec<&str> = token.split(SEGMENT_SEPARATOR).collect();
    let [header_b64, payload_b64, signature_b64] = parts[..] else {
        return Err(ValidationError::malformed(format!(
            "expected 3 segments separated by dots, found {}",
            parts.len()
        )));
    };

    let header_json = decode_object(header_b64, "header")?;
    let payload_json = decode_object(payload_b64, "payload")?;
    let signature = decode_segment(signature_b64, "signature")?;

    let header = parse_header(&header_json)?;
    let claims: ClaimSet = serde_json::from_value(Value::Object(payload_json))
        .map_err(|e| ValidationError::malformed(format!("invalid claims: {e}")))?;

    // Header and payload segments are ASCII, so this slice is on a char boundary.
    let signing_input = token[..header_b64.len() + 1 + payload_b64.len()].to_owned();

    Ok(DecodedToken { header, claims, signing_input, signature })
}

/// Decode a compact token no longer than `max_length` bytes.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedToken`] if the token is longer than
/// `max_length`, or for any of the reasons listed on [`decode_token`].
pub fn decode_token_bounded(token: &str, max_length: usize) -> Result<DecodedToken> {
    if token.len() > max_length {
        return Err(ValidationError::malformed(format!(
            "token length {} exceeds maximum of {max_length} bytes",
            token.len()
        )));
    }
    decode_token(token)
}

/// Base64url-decode a segment.
fn decode_segment(encoded: &str, segment: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| ValidationError::malformed(format!("{segment} is not valid base64url")))
}

/// Base64url-decode a segment and parse it as a JSON object.
fn decode_object(encoded: &str, segment: &str) -> Result<Map<String, Value>> {
    let bytes = decode_segment(encoded, segment)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::malformed(format!("{segment} is not a JSON object"))),
        Err(e) => Err(ValidationError::malformed(format!("{segment} is not valid JSON: {e}"))),
    }
}

fn parse_header(header: &Map<String, Value>) -> Result<TokenHeader> {
    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::malformed("header missing 'alg' field"))?;

    let algorithm = alg.parse::<Algorithm>().map_err(|e: ParseAlgorithmError| {
        ValidationError::malformed(format!("header 'alg': {e}"))
    })?;

    let kid = header
        .get("kid")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::malformed("header missing 'kid' field"))?
        .to_owned();

    // RFC 7515 §4.1.11: a recipient that does not understand a critical
    // extension must reject the token. None are understood here.
    if header.contains_key("crit") {
        return Err(ValidationError::malformed("critical header extensions are not supported"));
    }

    let typ = header.get("typ").and_then(Value::as_str).map(str::to_owned);

    Ok(TokenHeader { algorithm, kid, typ })
}
