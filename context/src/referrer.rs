/// `scheme://host` parsed off a referrer URL, for `REFERRING_SITES` (spec
/// §4.2 item 5).
#[must_use]
pub fn referring_site(referrer: &str) -> Option<String> {
    let (scheme, rest) = referrer.split_once("://")?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    if host.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}"))
}

/// Extract the Google search `q=` parameter from a referrer URL, URL-decode
/// it once, and turn `+` into spaces (spec §4.2 item 5, `KEYPHRASES`).
/// Returns `None` when the referrer isn't a Google search URL or carries no
/// query.
#[must_use]
pub fn parse_keyphrase(referrer: &str) -> Option<String> {
    let host = referrer.split_once("://").map(|(_, rest)| rest)?;
    let host_only = host.split(['/', '?']).next().unwrap_or(host);
    if !host_only.contains("google.") {
        return None;
    }

    let query = referrer.split_once('?')?.1;
    let raw_q = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("q="))?;
    if raw_q.is_empty() {
        return None;
    }

    let spaced = raw_q.replace('+', " ");
    Some(percent_decode(&spaced))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referring_site_drops_path() {
        assert_eq!(
            referring_site("https://www.example.com/a/b?c=1"),
            Some("https://www.example.com".to_string())
        );
    }

    #[test]
    fn keyphrase_extracted_from_google_search() {
        assert_eq!(
            parse_keyphrase("https://www.google.com/search?q=hello+world"),
            Some("hello world".to_string())
        );
    }

    #[test]
    fn keyphrase_none_for_non_google_referrer() {
        assert_eq!(parse_keyphrase("https://www.bing.com/search?q=hello+world"), None);
    }

    #[test]
    fn keyphrase_none_without_query() {
        assert_eq!(parse_keyphrase("https://www.google.com/"), None);
    }
}
