//! HS256 JWT issue/verify for the report-access bearer token (spec §4.5
//! "Auth"). Hand-rolled against `ring`/`data-encoding` rather than a JWT
//! crate, since spec.md §8 states the verification steps as byte-level
//! testable properties (signature recomputation, claim bounds) rather than
//! "accepts a valid token".

use data_encoding::BASE64URL_NOPAD;
use ring::hmac;
use serde::{Deserialize, Serialize};

use vantage_types::ProtocolError;

/// Fixed wire-contract audience (`original_source/src/wsauth.c`).
pub const AUDIENCE: &str = "goaccess_ws";
/// Fixed wire-contract scope (`original_source/src/wsauth.c`).
pub const SCOPE: &str = "report_access";

const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub scope: String,
}

/// Sign a fresh token for `subject`, valid for `expire_secs` from `now`.
#[must_use]
pub fn issue(secret: &[u8], issuer: &str, subject: &str, now: i64, expire_secs: i64) -> String {
    let claims = Claims {
        iss: issuer.to_string(),
        sub: subject.to_string(),
        iat: now,
        exp: now + expire_secs,
        aud: AUDIENCE.to_string(),
        scope: SCOPE.to_string(),
    };
    let header_b64 = BASE64URL_NOPAD.encode(HEADER_JSON.as_bytes());
    let payload_json = serde_json::to_vec(&claims).expect("Claims serialization cannot fail");
    let payload_b64 = BASE64URL_NOPAD.encode(&payload_json);
    let signing_input = format!("{header_b64}.{payload_b64}");

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let tag = hmac::sign(&key, signing_input.as_bytes());
    let sig_b64 = BASE64URL_NOPAD.encode(tag.as_ref());

    format!("{signing_input}.{sig_b64}")
}

/// Verify signature and claim bounds (spec §4.5: iss matches hostname, aud
/// fixed, scope fixed, `iat > 0 && exp > iat && now in [iat, exp]`).
pub fn verify(token: &str, secret: &[u8], expected_issuer: &str, now: i64) -> Result<Claims, ProtocolError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(ProtocolError::Unauthorized)?;
    let payload_b64 = parts.next().ok_or(ProtocolError::Unauthorized)?;
    let sig_b64 = parts.next().ok_or(ProtocolError::Unauthorized)?;
    if parts.next().is_some() {
        return Err(ProtocolError::Unauthorized);
    }

    let signing_input = format!("{header_b64}.{payload_b64}");
    let sig = BASE64URL_NOPAD
        .decode(sig_b64.as_bytes())
        .map_err(|_| ProtocolError::Unauthorized)?;

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    hmac::verify(&key, signing_input.as_bytes(), &sig).map_err(|_| ProtocolError::Unauthorized)?;

    let payload = BASE64URL_NOPAD
        .decode(payload_b64.as_bytes())
        .map_err(|_| ProtocolError::Unauthorized)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| ProtocolError::Unauthorized)?;

    if claims.iss != expected_issuer
        || claims.aud != AUDIENCE
        || claims.scope != SCOPE
        || claims.iat <= 0
        || claims.exp <= claims.iat
        || now < claims.iat
        || now > claims.exp
    {
        return Err(ProtocolError::Unauthorized);
    }

    Ok(claims)
}
