//! Log-format tokenizer and field parser.
//!
//! Turns a format spec (e.g. `%h %^[%d:%t %^] "%r" %s %b "%R" "%u"`) plus a
//! raw log line into a [`vantage_types::LogItem`]. No IO, no async: this
//! crate is pure text-in, struct-out.

#![allow(clippy::missing_errors_doc)]

mod cidr;
mod date_time;
mod formats;
mod ignore;
mod request;
mod token;

pub use cidr::CidrMatcher;
pub use date_time::{parse_date, parse_time, parse_time_served};
pub use formats::{predefined_format, PredefinedFormat};
pub use ignore::IgnoreRules;
pub use request::{classify_static, split_request};
pub use token::{tokenize, Specifier, Token};

use vantage_types::{sanitize_utf8, LogItem, ParseError};

/// Runtime knobs the field parser needs that aren't part of the format spec
/// itself (spec §4.1b).
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub date_format: String,
    pub time_format: String,
    pub ignore_qstr: bool,
    pub double_decode: bool,
    pub code444_as_404: bool,
    pub static_extensions: Vec<String>,
    pub ignore_crawlers: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            date_format: "%d/%b/%Y".to_string(),
            time_format: "%H:%M:%S".to_string(),
            ignore_qstr: false,
            double_decode: false,
            code444_as_404: false,
            static_extensions: default_static_extensions(),
            ignore_crawlers: false,
        }
    }
}

#[must_use]
pub fn default_static_extensions() -> Vec<String> {
    [
        "jpg", "jpeg", "gif", "png", "css", "js", "ico", "swf", "woff", "woff2", "ttf", "svg",
        "webp", "eot", "otf",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Apply a tokenized format against one raw line, producing a [`LogItem`].
///
/// This is the sole entry point for component B (spec §4.1b). Errors map
/// onto the `InvalidLine` kinds described in spec §7; the caller decides
/// whether to count the line as invalid or silently ignore it (ignore
/// rules are applied separately via [`IgnoreRules`]).
pub fn parse_line(tokens: &[Token], line: &[u8], opts: &ParseOptions) -> Result<LogItem, ParseError> {
    let mut item = LogItem::default();
    let mut cursor = 0usize;

    for tok in tokens {
        match tok {
            Token::Literal(lit) => {
                cursor = match_literal(line, cursor, lit)?;
            }
            Token::Specifier(spec) => {
                let (field, next) = read_field(line, cursor, *spec, tokens)?;
                cursor = next;
                apply_field(&mut item, *spec, field, opts)?;
            }
        }
    }

    Ok(item)
}

fn match_literal(line: &[u8], cursor: usize, lit: &[u8]) -> Result<usize, ParseError> {
    let end = cursor + lit.len();
    if end > line.len() || &line[cursor..end] != lit {
        return Err(ParseError::LiteralMismatch { offset: cursor });
    }
    Ok(end)
}

/// Read the raw bytes for one specifier, honoring quoted-field scanning and
/// the specifier's configured delimiter (the next literal token, or
/// end-of-line).
fn read_field<'a>(
    line: &'a [u8],
    cursor: usize,
    spec: Specifier,
    tokens: &[Token],
) -> Result<(&'a [u8], usize), ParseError> {
    if cursor < line.len() && line[cursor] == b'"' {
        // Quoted field: scan to the matching unescaped quote.
        let start = cursor + 1;
        let mut i = start;
        let bytes = line;
        loop {
            if i >= bytes.len() {
                return Err(ParseError::UnterminatedQuote);
            }
            if bytes[i] == b'"' && bytes[i - 1] != b'\\' {
                break;
            }
            i += 1;
        }
        return Ok((&bytes[start..i], i + 1));
    }

    let delim = next_literal_byte(spec, tokens);
    let slice = &line[cursor..];
    let end = match delim {
        Some(d) => slice.iter().position(|&b| b == d).unwrap_or(slice.len()),
        None => slice.len(),
    };
    Ok((&slice[..end], cursor + end))
}

/// The byte that terminates an unquoted specifier: the first byte of the
/// next literal token in sequence, if any.
fn next_literal_byte(spec: Specifier, tokens: &[Token]) -> Option<u8> {
    let mut found = false;
    for tok in tokens {
        if found {
            if let Token::Literal(lit) = tok {
                return lit.first().copied();
            }
            return None;
        }
        if let Token::Specifier(s) = tok {
            if *s == spec {
                found = true;
            }
        }
    }
    None
}

fn apply_field(
    item: &mut LogItem,
    spec: Specifier,
    field: &[u8],
    opts: &ParseOptions,
) -> Result<(), ParseError> {
    let text = sanitize_utf8(field);
    match spec {
        Specifier::Skip => {}
        Specifier::Host => {
            validate_host(&text)?;
            item.host = Some(text);
        }
        Specifier::Date => {
            let parsed = parse_date(&opts.date_format, &text)
                .map_err(|_| ParseError::InvalidDate(text.clone()))?;
            item.date = Some(parsed);
        }
        Specifier::Time => {
            let parsed = parse_time(&opts.time_format, &text)
                .map_err(|_| ParseError::InvalidTime(text.clone()))?;
            item.time = Some(parsed);
        }
        Specifier::DateTime => {
            let (date, time) = date_time::parse_combined(&text)
                .map_err(|_| ParseError::InvalidDate(text.clone()))?;
            item.date = Some(date);
            item.time = Some(time);
        }
        Specifier::Request => {
            let (method, url, protocol) = split_request(&text, opts.ignore_qstr, opts.double_decode);
            item.is_static = classify_static(&url, &opts.static_extensions);
            item.request = Some(url);
            item.method = method;
            item.protocol = protocol;
        }
        Specifier::Method => item.method = Some(text),
        Specifier::Url => {
            item.is_static = classify_static(&text, &opts.static_extensions);
            item.request = Some(text);
        }
        Specifier::Protocol => item.protocol = Some(text),
        Specifier::Query => {
            if let Some(req) = item.request.as_mut() {
                if !opts.ignore_qstr {
                    req.push('?');
                    req.push_str(&text);
                }
            }
        }
        Specifier::Status => {
            let trimmed = text.trim();
            if trimmed.len() != 3 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseError::InvalidStatus(text));
            }
            item.status = Some(vantage_types::fold_code444(trimmed, opts.code444_as_404));
        }
        Specifier::Size => {
            item.resp_size = if trimmed_is_dash(&text) {
                0
            } else {
                text.trim()
                    .parse()
                    .map_err(|_| ParseError::InvalidSize(text))?
            };
        }
        Specifier::Referrer => item.referrer = Some(text),
        Specifier::UserAgent => item.user_agent = Some(text),
        Specifier::Vhost => item.vhost = Some(text),
        Specifier::RemoteUser => item.remote_user = Some(text),
        Specifier::CacheStatus => item.cache_status = Some(text),
        Specifier::TimeServedUs => {
            item.time_served_us = text
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidSize(text))?;
        }
        Specifier::TimeServedSec => {
            item.time_served_us = date_time::parse_time_served(&text, 1_000_000)
                .map_err(|_| ParseError::InvalidSize(text))?;
        }
        Specifier::TimeServedMs => {
            item.time_served_us = date_time::parse_time_served(&text, 1_000)
                .map_err(|_| ParseError::InvalidSize(text))?;
        }
    }
    Ok(())
}

fn trimmed_is_dash(s: &str) -> bool {
    s.trim() == "-"
}

fn validate_host(text: &str) -> Result<(), ParseError> {
    use std::net::IpAddr;
    text.parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| ParseError::InvalidHost(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_format_parses_scenario_one() {
        let tokens = tokenize(formats::predefined_format(PredefinedFormat::Combined)).unwrap();
        let line = br#"127.0.0.1 - - [10/Jan/2015:12:34:56 +0000] "GET /x HTTP/1.1" 200 42 "-" "curl/7.0""#;
        let opts = ParseOptions::default();
        let item = parse_line(&tokens, line, &opts).unwrap();
        assert_eq!(item.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(item.date.as_deref(), Some("20150110"));
        assert_eq!(item.time.as_deref(), Some("12:34:56"));
        assert_eq!(item.method.as_deref(), Some("GET"));
        assert_eq!(item.request.as_deref(), Some("/x"));
        assert_eq!(item.protocol.as_deref(), Some("HTTP/1.1"));
        assert_eq!(item.status.as_deref(), Some("200"));
        assert_eq!(item.resp_size, 42);
        assert_eq!(item.user_agent.as_deref(), Some("curl/7.0"));
    }

    #[test]
    fn invalid_host_fails_the_line() {
        let tokens = tokenize(formats::predefined_format(PredefinedFormat::Combined)).unwrap();
        let line = br#"not-an-ip - - [10/Jan/2015:12:34:56 +0000] "GET /x HTTP/1.1" 200 42 "-" "curl/7.0""#;
        let opts = ParseOptions::default();
        assert!(parse_line(&tokens, line, &opts).is_err());
    }

    #[test]
    fn code_444_folds_to_404_when_enabled() {
        let tokens = tokenize(formats::predefined_format(PredefinedFormat::Combined)).unwrap();
        let line = br#"127.0.0.1 - - [10/Jan/2015:12:34:56 +0000] "GET /x HTTP/1.1" 444 42 "-" "curl/7.0""#;
        let mut opts = ParseOptions::default();
        opts.code444_as_404 = true;
        let item = parse_line(&tokens, line, &opts).unwrap();
        assert_eq!(item.status.as_deref(), Some("404"));
    }

    #[test]
    fn static_file_detected_by_extension() {
        assert!(classify_static("/img/logo.png", &default_static_extensions()));
        assert!(!classify_static("/api/users", &default_static_extensions()));
    }

    #[test]
    fn cloudstorage_format_parses_a_real_csv_line() {
        let tokens = tokenize(formats::predefined_format(PredefinedFormat::CloudStorage)).unwrap();
        let line = br#""1420893296000000","127.0.0.1",GET,200,"GET","/x","200",-,"42","1500",-,"-","curl/7.0""#;
        let opts = ParseOptions::default();
        let item = parse_line(&tokens, line, &opts).unwrap();
        assert_eq!(item.date.as_deref(), Some("20150110"));
        assert_eq!(item.time.as_deref(), Some("12:34:56"));
        assert_eq!(item.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(item.method.as_deref(), Some("GET"));
        assert_eq!(item.request.as_deref(), Some("/x"));
        assert_eq!(item.status.as_deref(), Some("200"));
        assert_eq!(item.resp_size, 42);
        assert_eq!(item.time_served_us, 1_500);
        assert_eq!(item.referrer.as_deref(), Some("-"));
        assert_eq!(item.user_agent.as_deref(), Some("curl/7.0"));
    }
}
