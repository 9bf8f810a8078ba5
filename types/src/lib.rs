//! Core domain types for vantage.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod error;
mod holder;
mod log_item;
mod metrics;
mod module;
mod sort;
mod store;
mod ws_client;

pub use error::{ConfigError, ParseError, ProtocolError, VantageError};
pub use holder::{HolderItem, HolderSnapshot};
pub use log_item::LogItem;
pub use metrics::{MetricsRecord, SubItem};
pub use module::Module;
pub use sort::{Sort, SortField, SortOrder};
pub use store::{GeoRecord, HostAgentsSet, ModuleStore};
pub use ws_client::{ClientStatus, WsClient};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string guaranteed to be non-empty (after trimming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Error)]
#[error("value must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Replace any byte sequence that is not valid UTF-8 with `?`.
///
/// Used when a source field (user-agent, referrer, request line) may carry
/// raw bytes from the log line that don't decode cleanly — snapshots emitted
/// as JSON must stay valid UTF-8 (testable property, spec §8).
#[must_use]
pub fn sanitize_utf8(input: &[u8]) -> String {
    match std::str::from_utf8(input) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(input).replace('\u{FFFD}', "?"),
    }
}

/// Fold status code `444` to `404` when the `code444-as-404` policy is active.
#[must_use]
pub fn fold_code444(status: &str, enabled: bool) -> String {
    if enabled && status == "444" {
        "404".to_string()
    } else {
        status.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_string_rejects_blank() {
        assert!(NonEmptyString::new("   ").is_err());
        assert!(NonEmptyString::new("x").is_ok());
    }

    #[test]
    fn sanitize_utf8_replaces_invalid_bytes() {
        let bytes = [0x68, 0x69, 0xff, 0xfe];
        let out = sanitize_utf8(&bytes);
        assert!(out.starts_with("hi"));
        assert!(!out.as_bytes().iter().any(|&b| b >= 0x80));
    }

    #[test]
    fn fold_code444_only_when_enabled() {
        assert_eq!(fold_code444("444", true), "404");
        assert_eq!(fold_code444("444", false), "444");
        assert_eq!(fold_code444("200", true), "200");
    }
}
