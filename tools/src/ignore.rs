use globset::{Glob, GlobSet, GlobSetBuilder};
use vantage_types::{ConfigError, LogItem};

use crate::CidrMatcher;

/// The three "ignore, don't count as invalid" rules from spec §4.1b:
/// host CIDR ranges, referrer wildcard patterns, and crawler exclusion.
pub struct IgnoreRules {
    hosts: CidrMatcher,
    referrers: GlobSet,
    ignore_crawlers: bool,
}

impl IgnoreRules {
    pub fn new(
        ignore_hosts: impl IntoIterator<Item = impl AsRef<str>>,
        ignore_referrers: impl IntoIterator<Item = impl AsRef<str>>,
        ignore_crawlers: bool,
    ) -> Result<Self, ConfigError> {
        let hosts = CidrMatcher::new(ignore_hosts)?;

        let mut builder = GlobSetBuilder::new();
        for pattern in ignore_referrers {
            let glob = Glob::new(pattern.as_ref())
                .map_err(|e| ConfigError::Other(format!("invalid referrer pattern: {e}")))?;
            builder.add(glob);
        }
        let referrers = builder
            .build()
            .map_err(|e| ConfigError::Other(format!("invalid referrer pattern set: {e}")))?;

        Ok(Self {
            hosts,
            referrers,
            ignore_crawlers,
        })
    }

    /// `true` iff this line should be dropped silently — neither counted
    /// valid nor invalid — per spec §4.1b/§7 `IgnoredLine`.
    #[must_use]
    pub fn should_ignore(&self, item: &LogItem, is_crawler: bool) -> bool {
        if let Some(host) = &item.host {
            if self.hosts.matches(host) {
                return true;
            }
        }
        if let Some(referrer) = &item.referrer {
            if self.referrers.is_match(referrer) {
                return true;
            }
        }
        self.ignore_crawlers && is_crawler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(host: &str, referrer: &str) -> LogItem {
        LogItem {
            host: Some(host.to_string()),
            referrer: Some(referrer.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn ignores_host_in_cidr() {
        let rules = IgnoreRules::new(["10.0.0.0/8"], Vec::<&str>::new(), false).unwrap();
        assert!(rules.should_ignore(&item("10.1.2.3", "-"), false));
        assert!(!rules.should_ignore(&item("8.8.8.8", "-"), false));
    }

    #[test]
    fn ignores_referrer_by_wildcard() {
        let rules = IgnoreRules::new(Vec::<&str>::new(), ["*.internal.example.com/*"], false).unwrap();
        assert!(rules.should_ignore(&item("1.1.1.1", "https://a.internal.example.com/x"), false));
        assert!(!rules.should_ignore(&item("1.1.1.1", "https://example.com/x"), false));
    }

    #[test]
    fn ignores_crawlers_when_enabled() {
        let rules = IgnoreRules::new(Vec::<&str>::new(), Vec::<&str>::new(), true).unwrap();
        assert!(rules.should_ignore(&item("1.1.1.1", "-"), true));
        assert!(!rules.should_ignore(&item("1.1.1.1", "-"), false));
    }
}
