//! Operating-system family classification, transcribed from the ordered
//! substring table in `original_source/src/opesys.c` (spec §4.3).

pub const DEFAULT_OS: &[(&str, &str)] = &[
    ("Android", "Android"),
    ("Windows NT 6.4", "Windows"),
    ("Windows NT 6.3; ARM", "Windows"),
    ("Windows NT 6.3", "Windows"),
    ("Windows NT 6.2; ARM", "Windows"),
    ("Windows NT 6.2", "Windows"),
    ("Windows NT 6.1", "Windows"),
    ("Windows NT 6.0", "Windows"),
    ("Windows NT 5.2", "Windows"),
    ("Windows NT 5.1", "Windows"),
    ("Windows NT 5.01", "Windows"),
    ("Windows NT 5.0", "Windows"),
    ("Windows NT 4.0", "Windows"),
    ("Windows NT", "Windows"),
    ("Win 9x 4.90", "Windows"),
    ("Windows 98", "Windows"),
    ("Windows 95", "Windows"),
    ("Windows CE", "Windows"),
    ("Windows Phone 8.1", "Windows"),
    ("Windows Phone 8.0", "Windows"),
    ("Googlebot", "Unix-like"),
    ("bingbot", "Windows"),
    ("iPad", "iOS"),
    ("iPod", "iOS"),
    ("iPhone", "iOS"),
    ("AppleTV", "iOS"),
    ("iTunes", "Macintosh"),
    ("OS X", "Macintosh"),
    ("Debian", "Linux"),
    ("Ubuntu", "Linux"),
    ("Fedora", "Linux"),
    ("Mint", "Linux"),
    ("SUSE", "Linux"),
    ("Mandriva", "Linux"),
    ("Red Hat", "Linux"),
    ("Gentoo", "Linux"),
    ("CentOS", "Linux"),
    ("PCLinuxOS", "Linux"),
    ("Linux", "Linux"),
    ("FreeBSD", "BSD"),
    ("NetBSD", "BSD"),
    ("OpenBSD", "BSD"),
    ("PlayStation", "BSD"),
    ("CrOS", "Chrome OS"),
    ("SunOS", "Unix-like"),
    ("QNX", "Unix-like"),
    ("BB10", "Unix-like"),
    ("BlackBerry", "Others"),
    ("Sony", "Others"),
    ("AmigaOS", "Others"),
    ("SymbianOS", "Others"),
    ("Nokia", "Others"),
    ("Nintendo", "Others"),
    ("Xbox One", "Windows"),
    ("Xbox", "Windows"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsMatch {
    pub family: String,
    pub token: String,
}

/// Classify a user-agent against the default OS table, optionally
/// translating the matched token to its marketing name when `real_os` is
/// set (spec §4.3).
#[must_use]
pub fn classify(agent: &str, real_os: bool) -> OsMatch {
    if agent.trim().is_empty() {
        return unknown();
    }

    for (needle, family) in DEFAULT_OS.iter().copied() {
        let Some(idx) = agent.find(needle) else {
            continue;
        };
        let matched = &agent[idx..];

        if family == "Windows" {
            let token = if real_os {
                real_windows_name(matched).unwrap_or_else(|| needle.to_string())
            } else {
                needle.to_string()
            };
            return OsMatch {
                family: family.to_string(),
                token,
            };
        }

        if matched.starts_with("Android") || needle == "Android" {
            let android = cut_at_delimiter(matched);
            let token = if real_os {
                android_codename(android)
            } else {
                android.to_string()
            };
            return OsMatch {
                family: family.to_string(),
                token,
            };
        }

        if matched.contains("OS X") {
            let osx = parse_osx(matched);
            let token = if real_os { mac_osx_codename(&osx) } else { osx };
            return OsMatch {
                family: family.to_string(),
                token,
            };
        }

        return OsMatch {
            family: family.to_string(),
            token: cut_at_delimiter(matched).to_string(),
        };
    }

    unknown()
}

fn unknown() -> OsMatch {
    OsMatch {
        family: "Unknown".to_string(),
        token: "Unknown".to_string(),
    }
}

fn cut_at_delimiter(s: &str) -> &str {
    let end = s.find([';', ')', '(']).unwrap_or(s.len());
    &s[..end]
}

/// `"_"` -> `"."`, stop at the 4th space past the match (`parse_osx`).
fn parse_osx(matched: &str) -> String {
    let mut out = String::new();
    let mut spaces = 0;
    for c in matched.chars() {
        if c == ';' || c == ')' || c == '(' {
            break;
        }
        if spaces > 3 {
            break;
        }
        if c == ' ' {
            spaces += 1;
        }
        out.push(if c == '_' { '.' } else { c });
    }
    out
}

fn android_codename(version: &str) -> String {
    let name = if version.contains("5.0") || version.contains("5.1") {
        "Lollipop"
    } else if version.contains("4.4") {
        "KitKat"
    } else if version.contains("4.3") || version.contains("4.2") || version.contains("4.1") {
        "Jelly Bean"
    } else if version.contains("4.0") {
        "Ice Cream Sandwich"
    } else if version.contains("3.") {
        "Honeycomb"
    } else if version.contains("2.3") {
        "Gingerbread"
    } else if version.contains("2.2") {
        "Froyo"
    } else if version.contains("2.0") || version.contains("2.1") {
        "Eclair"
    } else if version.contains("1.6") {
        "Donut"
    } else if version.contains("1.5") {
        "Cupcake"
    } else {
        return version.to_string();
    };
    name.to_string()
}

fn mac_osx_codename(version: &str) -> String {
    let name = if version.contains("10.10") {
        "OS X Yosemite"
    } else if version.contains("10.9") {
        "OS X Mavericks"
    } else if version.contains("10.8") {
        "OS X Mountain Lion"
    } else if version.contains("10.7") {
        "OS X Lion"
    } else if version.contains("10.6") {
        "OS X Snow Leopard"
    } else if version.contains("10.5") {
        "OS X Leopard"
    } else if version.contains("10.4") {
        "OS X Tiger"
    } else if version.contains("10.3") {
        "OS X Panther"
    } else if version.contains("10.2") {
        "OS X Jaguar"
    } else if version.contains("10.1") {
        "OS X Puma"
    } else if version.contains("10.0") {
        "OS X Cheetah"
    } else {
        return version.to_string();
    };
    name.to_string()
}

fn real_windows_name(matched: &str) -> Option<String> {
    let name = if matched.contains("6.4") {
        "Windows 10"
    } else if matched.contains("6.3; ARM") || matched.contains("6.2; ARM") {
        "Windows RT"
    } else if matched.contains("6.3") {
        "Windows 8.1"
    } else if matched.contains("6.2") {
        "Windows 8"
    } else if matched.contains("6.1") {
        "Windows 7"
    } else if matched.contains("6.0") {
        "Windows Vista"
    } else if matched.contains("5.2") {
        "Windows XP x64"
    } else if matched.contains("5.1") {
        "Windows XP"
    } else if matched.contains("5.0") {
        "Windows 2000"
    } else {
        return None;
    };
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_10_marketing_name() {
        let ua = "Mozilla/5.0 (Windows NT 6.4; Win64; x64)";
        assert_eq!(classify(ua, true).token, "Windows 10");
        assert_eq!(classify(ua, false).token, "Windows NT 6.4");
    }

    #[test]
    fn android_codename_translation() {
        let ua = "Mozilla/5.0 (Linux; Android 4.4; Nexus 5)";
        let m = classify(ua, true);
        assert_eq!(m.family, "Android");
        assert_eq!(m.token, "KitKat");
    }

    #[test]
    fn osx_underscore_becomes_dot() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_5)";
        let m = classify(ua, false);
        assert_eq!(m.family, "Macintosh");
        assert!(m.token.starts_with("10.9.5"));
    }

    #[test]
    fn unknown_for_unmatched_agent() {
        assert_eq!(classify("totally-unknown-client", false).family, "Unknown");
    }
}
