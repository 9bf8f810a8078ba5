//! Browser family classification, transcribed from the ordered substring
//! table in `original_source/src/browsers.c`. Order matters: specific
//! families (game systems, Edge, Chrome) are listed before the general
//! browsers they're built on (spec §4.3).

/// `(substring, family)`, scanned top-to-bottom; first match wins.
pub const DEFAULT_BROWSERS: &[(&str, &str)] = &[
    // Game systems: based on major browsers, must go first.
    ("Xbox One", "Game Systems"),
    ("Xbox", "Game Systems"),
    ("PlayStation", "Game Systems"),
    ("NintendoBrowser", "Game Systems"),
    ("Valve Steam", "Game Systems"),
    ("Origin", "Game Systems"),
    ("Raptr", "Game Systems"),
    // Based on Internet Explorer.
    ("Avant Browser", "Others"),
    ("IEMobile", "MSIE"),
    ("MSIE", "MSIE"),
    ("Trident/7.0", "MSIE"),
    // Microsoft Edge, ahead of Chrome.
    ("Edg", "Edge"),
    ("Edge", "Edge"),
    ("Surf", "Surf"),
    // Opera, ahead of Chrome/Safari.
    ("Opera Mini", "Opera"),
    ("Opera Mobi", "Opera"),
    ("Opera", "Opera"),
    ("OPR", "Opera"),
    ("OPiOS", "Opera"),
    ("Coast", "Opera"),
    // Miscellaneous clients.
    ("Homebrew", "Others"),
    ("APT-", "Others"),
    ("Apt-Cacher", "Others"),
    ("Aptly", "Others"),
    ("Chef Client", "Others"),
    ("Huawei", "Others"),
    ("HUAWEI", "Others"),
    ("BlackBerry", "Others"),
    ("BrowserX", "Others"),
    ("Dalvik", "Others"),
    ("Dillo", "Others"),
    ("ELinks", "Others"),
    ("Epiphany", "Others"),
    ("Firebird", "Others"),
    ("Galeon", "Others"),
    ("google-cloud-sdk", "Others"),
    ("IBrowse", "Others"),
    ("K-Meleon", "Others"),
    ("Konqueror", "Others"),
    ("Links", "Others"),
    ("Lynx", "Others"),
    ("Midori", "Others"),
    ("Minefield", "Others"),
    ("Mosaic", "Others"),
    ("Netscape", "Others"),
    ("SeaMonkey", "Others"),
    ("UCBrowser", "Others"),
    ("Wget", "Others"),
    ("libfetch", "Others"),
    ("check_http", "Others"),
    ("Go-http-client", "Others"),
    ("curl", "Others"),
    ("w3m", "Others"),
    ("MicroMessenger", "Others"),
    ("Apache", "Others"),
    ("JOSM", "Others"),
    ("pacman", "Others"),
    ("Pamac", "Others"),
    ("libwww-perl", "Others"),
    ("python-requests", "Others"),
    ("PackageKit", "Others"),
    ("F-Droid", "Others"),
    ("okhttp", "Others"),
    ("node", "Others"),
    ("PrivacyBrowser", "Others"),
    ("Transmission", "Others"),
    ("libmpv", "Others"),
    ("aria2", "Others"),
    // Feed-reader-as-a-service.
    ("AppleNewsBot", "Feeds"),
    ("Bloglines", "Feeds"),
    ("Digg Feed Fetcher", "Feeds"),
    ("Feedbin", "Feeds"),
    ("FeedHQ", "Feeds"),
    ("Feedly", "Feeds"),
    ("Flipboard", "Feeds"),
    ("inoreader.com", "Feeds"),
    ("Netvibes", "Feeds"),
    ("NewsBlur", "Feeds"),
    ("PinRSS", "Feeds"),
    ("theoldreader.com", "Feeds"),
    ("WordPress.com Reader", "Feeds"),
    ("YandexBlogs", "Feeds"),
    ("Brainstorm", "Feeds"),
    ("Mastodon", "Feeds"),
    ("Pleroma", "Feeds"),
    // Google crawlers, ahead of Firefox/Chrome since some share tokens.
    ("AdsBot-Google", "Crawlers"),
    ("AppEngine-Google", "Crawlers"),
    ("Mediapartners-Google", "Crawlers"),
    ("Google", "Crawlers"),
    ("WhatsApp", "Crawlers"),
    // Based on Firefox.
    ("Camino", "Others"),
    ("Iceweasel", "Firefox"),
    ("Waterfox", "Firefox"),
    ("PaleMoon", "Firefox"),
    ("Focus", "Firefox"),
    ("Klar", "Firefox"),
    ("Firefox", "Firefox"),
    // Based on Chromium.
    ("BeakerBrowser", "Beaker"),
    ("Brave", "Brave"),
    ("Vivaldi", "Vivaldi"),
    ("YaBrowser", "Yandex.Browser"),
    // Chrome must precede Safari.
    ("HeadlessChrome", "Chrome"),
    ("Chrome", "Chrome"),
    ("CriOS", "Chrome"),
    // Safari-based crawlers, ahead of Safari.
    ("AppleBot", "Crawlers"),
    ("facebookexternalhit", "Crawlers"),
    ("Twitter", "Crawlers"),
    ("Safari", "Safari"),
    // Remaining crawlers/bots.
    ("Slack", "Crawlers"),
    ("Sogou", "Crawlers"),
    ("Java", "Crawlers"),
    ("Jakarta Commons-HttpClient", "Crawlers"),
    ("netEstate", "Crawlers"),
    ("PiplBot", "Crawlers"),
    ("IstellaBot", "Crawlers"),
    ("heritrix", "Crawlers"),
    ("PagesInventory", "Crawlers"),
    ("rogerbot", "Crawlers"),
    ("fastbot", "Crawlers"),
    ("yacybot", "Crawlers"),
    ("PycURL", "Crawlers"),
    ("PHP", "Crawlers"),
    ("AndroidDownloadManager", "Crawlers"),
    ("Embedly", "Crawlers"),
    ("ruby", "Crawlers"),
    ("Ruby", "Crawlers"),
    ("python", "Crawlers"),
    ("Python", "Crawlers"),
    ("LinkedIn", "Crawlers"),
    ("Microsoft-WebDAV", "Crawlers"),
    ("DuckDuckGo-Favicons-Bot", "Crawlers"),
    ("bingbot", "Crawlers"),
    ("PetalBot", "Crawlers"),
    ("Discordbot", "Crawlers"),
    ("ZoominfoBot", "Crawlers"),
    ("Googlebot", "Crawlers"),
    ("DotBot", "Crawlers"),
    ("AhrefsBot", "Crawlers"),
    ("SemrushBot", "Crawlers"),
    ("Adsbot", "Crawlers"),
    ("BLEXBot", "Crawlers"),
    ("NetcraftSurveyAgent", "Crawlers"),
    ("Netcraft Web Server Survey", "Crawlers"),
    ("masscan", "Crawlers"),
    ("MJ12bot", "Crawlers"),
    ("Pandalytics", "Crawlers"),
    ("YandexBot", "Crawlers"),
    ("Nimbostratus-Bot", "Crawlers"),
    ("HTTP Banner Detection", "Crawlers"),
    ("Hakai", "Crawlers"),
    ("WinHttp.WinHttpRequest.5", "Crawlers"),
    ("NetSystemsResearch", "Crawlers"),
    ("Nextcloud Server Crawler", "Crawlers"),
    ("CFNetwork", "Crawlers"),
    ("GoScraper", "Crawlers"),
    ("Googlebot-Image", "Crawlers"),
    ("ZmEu", "Crawlers"),
    ("DowntimeDetector", "Crawlers"),
    ("MauiBot", "Crawlers"),
    ("Cloud", "Crawlers"),
    ("stagefright", "Crawlers"),
    ("DataForSeoBot", "Crawlers"),
    ("SeznamBot", "Crawlers"),
    ("coccocbot", "Crawlers"),
    ("Neevabot", "Crawlers"),
    // Podcast fetchers.
    ("Downcast", "Podcasts"),
    ("gPodder", "Podcasts"),
    ("Instacast", "Podcasts"),
    ("iTunes", "Podcasts"),
    ("Miro", "Podcasts"),
    ("Pocket Casts", "Podcasts"),
    ("BashPodder", "Podcasts"),
    // Feed reader clients.
    ("Akregator", "Feeds"),
    ("Apple-PubSub", "Feeds"),
    ("BTWebClient", "Feeds"),
    ("com.apple.Safari.WebFeedParser", "Feeds"),
    ("FeedDemon", "Feeds"),
    ("Feedy", "Feeds"),
    ("Fever", "Feeds"),
    ("FreshRSS", "Feeds"),
    ("Liferea", "Feeds"),
    ("NetNewsWire", "Feeds"),
    ("RSSOwl", "Feeds"),
    ("Tiny Tiny RSS", "Feeds"),
    ("Thunderbird", "Feeds"),
    ("Winds", "Feeds"),
    // Uptime monitors.
    ("Pingdom.com", "Uptime"),
    ("jetmon", "Uptime"),
    ("NodeUptime", "Uptime"),
    ("NewRelicPinger", "Uptime"),
    ("StatusCake", "Uptime"),
    ("internetVista", "Uptime"),
    ("Server Density Service Monitoring v2", "Uptime"),
    // Generic fallback: anything identifying as a Mozilla-derived client
    // that matched nothing more specific above.
    ("Mozilla", "Others"),
];

/// The five substrings that mark a UA as a crawler regardless of table
/// match (spec §4.3): `"; +http"`, `"; http"`, `" (+http"`, `" (http"`,
/// `";++http"`.
pub const CRAWLER_MARKERS: &[&str] = &["; +http", "; http", " (+http", " (http", ";++http"];

/// The family a matched user-agent resolves to, plus the specific version
/// token (spec §4.2 item 4: `BROWSERS[family]` with sub-item
/// `specific_name_version`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserMatch {
    pub family: String,
    pub token: String,
}

/// Classify a user-agent string against the default table plus any
/// user-supplied extension table (checked first, spec §4.3).
#[must_use]
pub fn classify(agent: &str, user_table: &[(String, String)]) -> BrowserMatch {
    if agent.trim().is_empty() {
        return unknown();
    }

    for (needle, family) in user_table {
        if let Some(idx) = agent.find(needle.as_str()) {
            return extract(agent, idx, needle, family);
        }
    }

    if let Some(marker_pos) = crawler_marker_position(agent) {
        if let Some(token) = extract_crawler_token(agent, marker_pos) {
            return BrowserMatch {
                family: "Crawlers".to_string(),
                token,
            };
        }
    }

    for (needle, family) in DEFAULT_BROWSERS.iter().copied() {
        if let Some(idx) = agent.find(needle) {
            return extract(agent, idx, needle, family);
        }
    }

    unknown()
}

fn unknown() -> BrowserMatch {
    BrowserMatch {
        family: "Unknown".to_string(),
        token: "Unknown".to_string(),
    }
}

fn crawler_marker_position(agent: &str) -> Option<usize> {
    CRAWLER_MARKERS.iter().find_map(|marker| agent.find(marker))
}

/// Walk backward from the marker to the previous delimiter (space or `+`)
/// and return the token in between, per `parse_crawler` in
/// `original_source/src/browsers.c`.
fn extract_crawler_token(agent: &str, marker_pos: usize) -> Option<String> {
    let bytes = agent.as_bytes();
    let mut start = marker_pos;
    let mut found = false;
    while start > 0 {
        start -= 1;
        if bytes[start] == b' ' || bytes[start] == b'+' {
            found = true;
            break;
        }
    }
    if start == 0 && !found {
        return None;
    }
    if found {
        start += 1;
    }
    let rest = &agent[start..];
    let end = rest.find([';', ' ']).unwrap_or(rest.len());
    let token = &rest[..end];
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Parse the version token out from the matched position, per
/// `parse_browser` in `original_source/src/browsers.c`: Internet Explorer
/// 11's `rv:11`/`Trident/7.0` special case, Opera's version-after-slash
/// rewrite, MSIE's semicolon/paren/dash cutoff, and the generic
/// cutoff-at-next-delimiter for everything else.
fn extract(agent: &str, idx: usize, needle: &str, family: &str) -> BrowserMatch {
    let matched = &agent[idx..];

    if matched.contains("rv:11") && agent.contains("Trident/7.0") {
        return BrowserMatch {
            family: family.to_string(),
            token: "MSIE/11.0".to_string(),
        };
    }

    if needle == "OPR" {
        if let Some(slash) = matched.find('/') {
            return BrowserMatch {
                family: family.to_string(),
                token: format!("Opera{}", cut_at_delimiter(&matched[slash..])),
            };
        }
    }

    if needle == "MSIE" {
        let cut = matched.find([';', ')', '-']).unwrap_or(matched.len());
        let token = matched[..cut].replace(' ', "/");
        return BrowserMatch {
            family: family.to_string(),
            token,
        };
    }

    let token = cut_at_delimiter(matched);
    BrowserMatch {
        family: family.to_string(),
        token: token.to_string(),
    }
}

fn cut_at_delimiter(s: &str) -> &str {
    let end = s.find([';', ')', ' ']).unwrap_or(s.len());
    &s[..end]
}

/// `true` iff the given user-agent classifies as a crawler (spec §4.3,
/// feeds `ignore-crawlers`).
#[must_use]
pub fn is_crawler(agent: &str, user_table: &[(String, String)]) -> bool {
    classify(agent, user_table).family == "Crawlers"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_precedes_safari() {
        let ua = "Mozilla/5.0 (Macintosh) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0 Safari/537.36";
        assert_eq!(classify(ua, &[]).family, "Chrome");
    }

    #[test]
    fn edge_precedes_chrome() {
        let ua = "Mozilla/5.0 Chrome/90.0 Edg/90.0.818.51";
        assert_eq!(classify(ua, &[]).family, "Edge");
    }

    #[test]
    fn curl_is_others() {
        assert_eq!(classify("curl/7.0", &[]).family, "Others");
    }

    #[test]
    fn crawler_marker_detected() {
        let ua = "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)";
        assert!(is_crawler(ua, &[]));
    }

    #[test]
    fn empty_agent_is_unknown() {
        assert_eq!(classify("", &[]).family, "Unknown");
    }

    #[test]
    fn user_table_checked_before_default() {
        let user = vec![("curl".to_string(), "MyTool".to_string())];
        assert_eq!(classify("curl/7.0", &user).family, "MyTool");
    }

    #[test]
    fn feed_reader_classifies_as_feeds() {
        assert_eq!(classify("Mozilla/5.0 (compatible; Feedly/1.0)", &[]).family, "Feeds");
        assert_eq!(classify("NetNewsWire/6.1", &[]).family, "Feeds");
    }
}
