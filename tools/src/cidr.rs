use std::net::IpAddr;

use ipnet::IpNet;
use vantage_types::ConfigError;

/// A set of CIDR ranges used to ignore hosts before they reach the
/// aggregation store (spec §4.1b ignore-list, spec §7 `IgnoredLine`).
#[derive(Debug, Clone, Default)]
pub struct CidrMatcher {
    nets: Vec<IpNet>,
}

impl CidrMatcher {
    pub fn new(ranges: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self, ConfigError> {
        let mut nets = Vec::new();
        for range in ranges {
            let range = range.as_ref();
            let net = parse_range(range).ok_or_else(|| ConfigError::InvalidCidr(range.to_string()))?;
            nets.push(net);
        }
        Ok(Self { nets })
    }

    #[must_use]
    pub fn matches(&self, host: &str) -> bool {
        let Ok(addr) = host.parse::<IpAddr>() else {
            return false;
        };
        self.nets.iter().any(|net| net.contains(&addr))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }
}

/// Accept both a bare IP (treated as a `/32` or `/128` host route) and a
/// `IP/prefix` CIDR range.
fn parse_range(range: &str) -> Option<IpNet> {
    if range.contains('/') {
        return range.parse().ok();
    }
    match range.parse::<IpAddr>().ok()? {
        IpAddr::V4(v4) => Some(IpNet::from(v4)),
        IpAddr::V6(v6) => Some(IpNet::from(v6)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_exact_host() {
        let m = CidrMatcher::new(["10.0.0.1"]).unwrap();
        assert!(m.matches("10.0.0.1"));
        assert!(!m.matches("10.0.0.2"));
    }

    #[test]
    fn matches_cidr_range() {
        let m = CidrMatcher::new(["10.0.0.0/24"]).unwrap();
        assert!(m.matches("10.0.0.200"));
        assert!(!m.matches("10.0.1.1"));
    }

    #[test]
    fn rejects_malformed_range() {
        assert!(CidrMatcher::new(["not-a-cidr"]).is_err());
    }
}
