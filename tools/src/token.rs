use vantage_types::ParseError;

/// A recognized `%X` specifier (spec §4.1a, exhaustive list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Specifier {
    Host,
    Skip,
    Date,
    Time,
    DateTime,
    Request,
    Method,
    Url,
    Protocol,
    Query,
    Status,
    Size,
    Referrer,
    UserAgent,
    Vhost,
    RemoteUser,
    CacheStatus,
    TimeServedUs,
    TimeServedSec,
    TimeServedMs,
}

impl Specifier {
    fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            b'h' => Specifier::Host,
            b'^' => Specifier::Skip,
            b'd' => Specifier::Date,
            b't' => Specifier::Time,
            b'x' => Specifier::DateTime,
            b'r' => Specifier::Request,
            b'm' => Specifier::Method,
            b'U' => Specifier::Url,
            b'H' => Specifier::Protocol,
            b'q' => Specifier::Query,
            b's' => Specifier::Status,
            b'b' => Specifier::Size,
            b'R' => Specifier::Referrer,
            b'u' => Specifier::UserAgent,
            b'v' => Specifier::Vhost,
            b'e' => Specifier::RemoteUser,
            b'C' => Specifier::CacheStatus,
            b'D' => Specifier::TimeServedUs,
            b'T' => Specifier::TimeServedSec,
            b'L' => Specifier::TimeServedMs,
            _ => return None,
        })
    }
}

/// One element of a tokenized format spec: either literal bytes that must
/// match byte-for-byte, or a specifier to be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(Vec<u8>),
    Specifier(Specifier),
}

/// Split a format spec string into an ordered `[Literal | Specifier]` list
/// (spec §4.1a). `\t` escapes to one tab byte; `%~` is a literal space.
pub fn tokenize(spec: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = spec.as_bytes();
    let mut tokens = Vec::new();
    let mut literal = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 1 < bytes.len() && bytes[i + 1] == b'~' => {
                literal.push(b' ');
                i += 2;
            }
            b'%' if i + 1 < bytes.len() => {
                if let Some(s) = Specifier::from_byte(bytes[i + 1]) {
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(Token::Specifier(s));
                    i += 2;
                } else {
                    literal.push(bytes[i]);
                    i += 1;
                }
            }
            b'\\' if i + 1 < bytes.len() && bytes[i + 1] == b't' => {
                literal.push(b'\t');
                i += 2;
            }
            b => {
                literal.push(b);
                i += 1;
            }
        }
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_combined_format() {
        let tokens = tokenize(r#"%h %^[%d:%t %^] "%r" %s %b "%R" "%u""#).unwrap();
        assert!(tokens.iter().any(|t| matches!(t, Token::Specifier(Specifier::Host))));
        assert!(tokens.iter().any(|t| matches!(t, Token::Specifier(Specifier::Request))));
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::Literal(l) if l == b" ")));
    }

    #[test]
    fn tab_escape_becomes_literal_tab() {
        let tokens = tokenize(r"%d\t%t").unwrap();
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::Literal(l) if l == b"\t")));
    }

    #[test]
    fn tilde_specifier_is_literal_space() {
        let tokens = tokenize("%h%~%s").unwrap();
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::Literal(l) if l == b" ")));
    }

    #[test]
    fn unknown_specifier_kept_as_literal() {
        let tokens = tokenize("%Z").unwrap();
        assert_eq!(tokens, vec![Token::Literal(b"%Z".to_vec())]);
    }
}
