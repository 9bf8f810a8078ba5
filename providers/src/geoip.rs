use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;

use vantage_types::GeoRecord;

/// One geolocation back-end behind a single interface (spec §4.3): legacy
/// MaxMind "GeoIP" editions and the modern MMDB format both answer the same
/// `(continent_code, country_code, country_name, city, region, asn)` tuple.
pub trait GeoLookup: Send + Sync {
    fn lookup(&self, host: &str) -> GeoRecord;
}

/// Modern MMDB back-end: a single memory-mapped file queried by
/// nul-terminated string (in practice, `maxminddb` takes an `IpAddr`, which
/// this wraps).
pub struct Mmdb {
    reader: maxminddb::Reader<Vec<u8>>,
}

impl Mmdb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, maxminddb::MaxMindDbError> {
        let reader = maxminddb::Reader::open_readfile(path)?;
        Ok(Self { reader })
    }
}

impl GeoLookup for Mmdb {
    fn lookup(&self, host: &str) -> GeoRecord {
        let Ok(addr) = host.parse::<IpAddr>() else {
            return GeoRecord::unknown();
        };
        // IPv4 addresses are transparently mapped to IPv6 for v6-only
        // databases (spec §4.3).
        let lookup_addr = match addr {
            IpAddr::V4(v4) => map_v4_to_v6(v4),
            IpAddr::V6(v6) => IpAddr::V6(v6),
        };

        let Ok(Some(city)): Result<Option<geoip2::City>, _> = self.reader.lookup(lookup_addr) else {
            return GeoRecord::unknown();
        };

        let continent_code = city
            .continent
            .as_ref()
            .and_then(|c| c.code)
            .unwrap_or("--")
            .to_string();
        let country_code = city
            .country
            .as_ref()
            .and_then(|c| c.iso_code)
            .unwrap_or("--")
            .to_string();
        let country_name = city
            .country
            .as_ref()
            .and_then(|c| c.names.as_ref())
            .and_then(|n| n.get("en"))
            .copied()
            .unwrap_or("Unknown")
            .to_string();
        let city_name = city
            .city
            .as_ref()
            .and_then(|c| c.names.as_ref())
            .and_then(|n| n.get("en"))
            .copied()
            .unwrap_or("Unknown")
            .to_string();
        let region = city
            .subdivisions
            .as_ref()
            .and_then(|s| s.first())
            .and_then(|s| s.names.as_ref())
            .and_then(|n| n.get("en"))
            .copied()
            .unwrap_or("Unknown")
            .to_string();

        GeoRecord {
            continent_code,
            country_code,
            country_name,
            city: city_name,
            region,
            asn: "--".to_string(),
        }
    }
}

/// `::ffff:AABB:CCDD` mapping (spec §4.3).
fn map_v4_to_v6(v4: Ipv4Addr) -> IpAddr {
    IpAddr::V6(v4.to_ipv6_mapped())
}

/// Adapter for legacy MaxMind "GeoIP" `.dat` editions. No maintained Rust
/// reader exists for that format; this backend degrades to "Unknown / --"
/// and logs once at open time (spec §4.3/§9: stay on one trait boundary
/// regardless of which backend answers).
pub struct LegacyGeoIp;

impl LegacyGeoIp {
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        tracing::warn!(
            path = %path.as_ref().display(),
            "legacy GeoIP .dat databases are not supported at runtime; falling back to Unknown/--. Use an MMDB database instead."
        );
        Self
    }
}

impl GeoLookup for LegacyGeoIp {
    fn lookup(&self, _host: &str) -> GeoRecord {
        GeoRecord::unknown()
    }
}

/// Thin re-export module matching the shape `maxminddb`'s `geoip2` model
/// module exposes, so the lookup above reads naturally against the crate's
/// actual API.
mod geoip2 {
    pub use maxminddb::geoip2::City;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_backend_always_unknown() {
        let backend = LegacyGeoIp::open("/nonexistent/GeoIP.dat");
        let record = backend.lookup("8.8.8.8");
        assert_eq!(record.country_name, "Unknown");
    }

    #[test]
    fn v4_maps_to_v6() {
        let v4: Ipv4Addr = "8.8.8.8".parse().unwrap();
        let mapped = map_v4_to_v6(v4);
        assert!(mapped.is_ipv6());
    }
}
