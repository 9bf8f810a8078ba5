/// Split a quoted request line (`"GET /x?y=1 HTTP/1.1"`, already stripped of
/// surrounding quotes) into `(method, url, protocol)` (spec §4.1b).
///
/// `ignore_qstr` strips from the first `?`; `double_decode` URL-decodes the
/// path twice.
#[must_use]
pub fn split_request(text: &str, ignore_qstr: bool, double_decode: bool) -> (Option<String>, String, Option<String>) {
    let mut parts = text.split_whitespace();
    let method = parts.next().map(str::to_string);
    let url_raw = parts.next().unwrap_or("");
    let protocol = parts.next().map(str::to_string);

    let mut url = if ignore_qstr {
        url_raw.split('?').next().unwrap_or(url_raw).to_string()
    } else {
        url_raw.to_string()
    };

    if double_decode {
        url = percent_decode(&percent_decode(&url));
    }

    (method, url, protocol)
}

/// `true` iff `url`'s path (ignoring any query string) ends in one of the
/// configured static-file extensions (spec §4.1b; Open Question in §9
/// resolved in favor of extension-match, never MIME sniffing).
#[must_use]
pub fn classify_static(url: &str, extensions: &[String]) -> bool {
    let path = url.split('?').next().unwrap_or(url);
    let Some(dot) = path.rfind('.') else {
        return false;
    };
    let ext = &path[dot + 1..];
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
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
    fn splits_method_url_protocol() {
        let (method, url, protocol) = split_request("GET /x HTTP/1.1", false, false);
        assert_eq!(method.as_deref(), Some("GET"));
        assert_eq!(url, "/x");
        assert_eq!(protocol.as_deref(), Some("HTTP/1.1"));
    }

    #[test]
    fn ignore_qstr_strips_from_question_mark() {
        let (_, url, _) = split_request("GET /x?a=1 HTTP/1.1", true, false);
        assert_eq!(url, "/x");
    }

    #[test]
    fn double_decode_unwraps_twice() {
        let (_, url, _) = split_request("GET /a%2520b HTTP/1.1", false, true);
        assert_eq!(url, "/a b");
    }

    #[test]
    fn static_extension_match_is_case_insensitive() {
        let exts = vec!["png".to_string(), "js".to_string()];
        assert!(classify_static("/x/Y.PNG", &exts));
        assert!(classify_static("/x/y.js?v=2", &exts));
        assert!(!classify_static("/x/y.html", &exts));
    }
}
