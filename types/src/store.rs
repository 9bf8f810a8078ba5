use std::collections::{HashMap, HashSet};

use crate::MetricsRecord;

/// Mapping from key to `MetricsRecord` for a single module. Keys are unique
/// within a module; insertion order is irrelevant.
pub type ModuleStore = HashMap<String, MetricsRecord>;

/// host -> set of user-agent strings observed for that host (the "agents
/// per host" expansion). Bounded only by memory; no eviction.
pub type HostAgentsSet = HashMap<String, HashSet<String>>;

/// `(continent_code, country_code, country_name, city, region, asn)`, the
/// tuple every geolocation backend resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoRecord {
    pub continent_code: String,
    pub country_code: String,
    pub country_name: String,
    pub city: String,
    pub region: String,
    pub asn: String,
}

impl GeoRecord {
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            continent_code: "--".to_string(),
            country_code: "--".to_string(),
            country_name: "Unknown".to_string(),
            city: "Unknown".to_string(),
            region: "Unknown".to_string(),
            asn: "--".to_string(),
        }
    }

    /// `"{continent_code} {continent_name}"`, the GEO_LOCATION parent key
    /// under which every country in that continent rolls up as a sub-item
    /// (spec §4.2 item 7). Distinct from `country_name`: two hosts in
    /// different countries of the same continent must land under the same
    /// parent key.
    #[must_use]
    pub fn continent_key(&self) -> String {
        format!("{} {}", self.continent_code, continent_name(&self.continent_code))
    }
}

/// The fixed continent-code -> continent-name table (`original_source`'s
/// `geoip1.c::get_continent_name_and_code`).
#[must_use]
pub fn continent_name(continent_code: &str) -> &'static str {
    match continent_code {
        "NA" => "North America",
        "OC" => "Oceania",
        "EU" => "Europe",
        "SA" => "South America",
        "AF" => "Africa",
        "AN" => "Antarctica",
        "AS" => "Asia",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_countries_share_one_continent_key() {
        let us = GeoRecord {
            continent_code: "NA".to_string(),
            country_name: "United States".to_string(),
            ..GeoRecord::unknown()
        };
        let ca = GeoRecord {
            continent_code: "NA".to_string(),
            country_name: "Canada".to_string(),
            ..GeoRecord::unknown()
        };
        assert_eq!(us.continent_key(), "NA North America");
        assert_eq!(us.continent_key(), ca.continent_key());
    }

    #[test]
    fn unknown_continent_code_falls_back() {
        assert_eq!(GeoRecord::unknown().continent_key(), "-- Unknown");
    }
}
