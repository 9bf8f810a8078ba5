use thiserror::Error;

/// Why a log line failed to parse (spec §7 `InvalidLine`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("literal mismatch at byte {offset}")]
    LiteralMismatch { offset: usize },
    #[error("required field `{field}` missing")]
    FieldMissing { field: &'static str },
    #[error("host `{0}` is not a valid IPv4 or IPv6 address")]
    InvalidHost(String),
    #[error("date `{0}` does not match the configured date format")]
    InvalidDate(String),
    #[error("time `{0}` does not match the configured time format")]
    InvalidTime(String),
    #[error("status code `{0}` is not three digits")]
    InvalidStatus(String),
    #[error("response size `{0}` is not numeric")]
    InvalidSize(String),
    #[error("unterminated quoted field")]
    UnterminatedQuote,
}

/// A CLI/config contradiction, fatal before the event loop starts (spec §7
/// `ConfigError`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown log format `{0}`")]
    UnknownFormat(String),
    #[error("invalid sort spec `{0}`")]
    InvalidSort(String),
    #[error("invalid CIDR range `{0}`")]
    InvalidCidr(String),
    #[error("TLS requested but cert or key path missing")]
    MissingTlsMaterial,
    #[error("{0}")]
    Other(String),
}

/// A per-client WebSocket protocol violation (spec §7 `ClientProtocolError`).
/// Closes only the offending connection; other clients are unaffected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("close 1002: protocol error")]
    Protocol,
    #[error("close 1007: invalid UTF-8 in text frame")]
    InvalidUtf8,
    #[error("close 1009: frame exceeds maximum size")]
    TooLarge,
    #[error("close 1011: unexpected condition")]
    Unexpected,
    #[error("close 1008: token missing, malformed, or failed verification")]
    Unauthorized,
}

impl ProtocolError {
    #[must_use]
    pub fn close_code(self) -> u16 {
        match self {
            ProtocolError::Protocol => 1002,
            ProtocolError::InvalidUtf8 => 1007,
            ProtocolError::TooLarge => 1009,
            ProtocolError::Unexpected => 1011,
            ProtocolError::Unauthorized => 1008,
        }
    }
}

/// Top-level error union for callers that cross component boundaries.
#[derive(Debug, Error)]
pub enum VantageError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
