//! HTTP/1.1 upgrade handshake (spec §4.5 "Handshake").

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::digest::{SHA1_FOR_LEGACY_USE_ONLY, digest};

/// `WS_MAX_HEAD_SZ`: re-exported here since the handshake reader is the
/// component that enforces it.
pub const MAX_HEADER_SIZE: usize = crate::frame::MAX_HEADER_SIZE;

const WS_MAGIC: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("malformed HTTP request line")]
    MalformedRequest,
    #[error("missing required header `{0}`")]
    MissingHeader(&'static str),
    #[error("not a websocket upgrade request")]
    NotUpgrade,
    #[error("origin `{0}` not allowed")]
    OriginRejected(String),
}

#[derive(Debug, Clone, Default)]
pub struct HandshakeRequest {
    pub path: String,
    headers: HashMap<String, String>,
}

impl HandshakeRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Parse an HTTP/1.1 `GET` request up to the header-terminating blank line
/// (spec §4.5: "HTTP/1.1 `GET` ending in `\r\n\r\n`").
pub fn parse_request(buf: &[u8]) -> Result<HandshakeRequest, HandshakeError> {
    let text = String::from_utf8_lossy(buf);
    let mut lines = text.split("\r\n");
    let request_line = lines.next().ok_or(HandshakeError::MalformedRequest)?;

    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or(HandshakeError::MalformedRequest)?;
    let path = parts.next().ok_or(HandshakeError::MalformedRequest)?;
    if method != "GET" {
        return Err(HandshakeError::MalformedRequest);
    }

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    Ok(HandshakeRequest { path: path.to_string(), headers })
}

/// Validate the required upgrade headers (and, when configured, the
/// `Origin` header) and compute `Sec-WebSocket-Accept` (spec §4.5).
pub fn validate_and_accept(
    req: &HandshakeRequest,
    required_origin: Option<&str>,
) -> Result<String, HandshakeError> {
    let upgrade = req.header("upgrade").ok_or(HandshakeError::MissingHeader("Upgrade"))?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(HandshakeError::NotUpgrade);
    }

    let connection = req
        .header("connection")
        .ok_or(HandshakeError::MissingHeader("Connection"))?;
    if !connection
        .split(',')
        .any(|tok| tok.trim().eq_ignore_ascii_case("upgrade"))
    {
        return Err(HandshakeError::NotUpgrade);
    }

    req.header("host").ok_or(HandshakeError::MissingHeader("Host"))?;
    let key = req
        .header("sec-websocket-key")
        .ok_or(HandshakeError::MissingHeader("Sec-WebSocket-Key"))?;
    req.header("sec-websocket-version")
        .ok_or(HandshakeError::MissingHeader("Sec-WebSocket-Version"))?;

    if let Some(expected) = required_origin {
        let origin = req.header("origin").unwrap_or("");
        if origin != expected {
            return Err(HandshakeError::OriginRejected(origin.to_string()));
        }
    }

    Ok(accept_key(key))
}

/// `base64(SHA1(key ++ "258EAFA5-E914-47DA-95CA-C5AB0DC85B11"))` (spec §4.5,
/// §8 "WS accept" testable property).
#[must_use]
pub fn accept_key(key: &str) -> String {
    let mut input = String::with_capacity(key.len() + WS_MAGIC.len());
    input.push_str(key);
    input.push_str(WS_MAGIC);
    let hash = digest(&SHA1_FOR_LEGACY_USE_ONLY, input.as_bytes());
    BASE64.encode(hash.as_ref())
}

#[must_use]
pub fn switching_protocols_response(accept: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept}\r\n\r\n"
    )
}

#[must_use]
pub fn bad_request_response() -> &'static str {
    "HTTP/1.1 400 Bad Request\r\n\r\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_key_matches_rfc6455_test_vector() {
        assert_eq!(
            accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    fn sample_request() -> Vec<u8> {
        b"GET /ws HTTP/1.1\r\n\
          Host: example.com\r\n\
          Upgrade: websocket\r\n\
          Connection: Upgrade\r\n\
          Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
          Sec-WebSocket-Version: 13\r\n\r\n"
            .to_vec()
    }

    #[test]
    fn parses_well_formed_upgrade_request() {
        let req = parse_request(&sample_request()).unwrap();
        assert_eq!(req.path, "/ws");
        let accept = validate_and_accept(&req, None).unwrap();
        assert_eq!(accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn rejects_missing_upgrade_header() {
        let raw = b"GET /ws HTTP/1.1\r\nHost: example.com\r\nConnection: Upgrade\r\n\r\n";
        let req = parse_request(raw).unwrap();
        assert!(validate_and_accept(&req, None).is_err());
    }

    #[test]
    fn rejects_mismatched_origin() {
        let mut raw = sample_request();
        raw.extend_from_slice(b"");
        let raw = b"GET /ws HTTP/1.1\r\nHost: example.com\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\nOrigin: https://evil.example\r\n\r\n";
        let req = parse_request(raw).unwrap();
        assert!(validate_and_accept(&req, Some("https://good.example")).is_err());
    }
}
