use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tagged enumeration identifying what a counter map counts.
///
/// Every `ModuleStore`, `Sort` configuration, and `HolderSnapshot` is keyed
/// by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Module {
    Visitors,
    Requests,
    RequestsStatic,
    NotFound,
    Hosts,
    Os,
    Browsers,
    VisitTimes,
    Referrers,
    ReferringSites,
    Keyphrases,
    GeoLocation,
    StatusCodes,
}

impl Module {
    pub const ALL: [Module; 13] = [
        Module::Visitors,
        Module::Requests,
        Module::RequestsStatic,
        Module::NotFound,
        Module::Hosts,
        Module::Os,
        Module::Browsers,
        Module::VisitTimes,
        Module::Referrers,
        Module::ReferringSites,
        Module::Keyphrases,
        Module::GeoLocation,
        Module::StatusCodes,
    ];

    /// Whether entries in this module carry a sub-item list (spec §3).
    #[must_use]
    pub fn has_sub_items(self) -> bool {
        matches!(
            self,
            Module::Hosts | Module::Os | Module::Browsers | Module::StatusCodes | Module::GeoLocation
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Module::Visitors => "VISITORS",
            Module::Requests => "REQUESTS",
            Module::RequestsStatic => "REQUESTS_STATIC",
            Module::NotFound => "NOT_FOUND",
            Module::Hosts => "HOSTS",
            Module::Os => "OS",
            Module::Browsers => "BROWSERS",
            Module::VisitTimes => "VISIT_TIMES",
            Module::Referrers => "REFERRERS",
            Module::ReferringSites => "REFERRING_SITES",
            Module::Keyphrases => "KEYPHRASES",
            Module::GeoLocation => "GEO_LOCATION",
            Module::StatusCodes => "STATUS_CODES",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized module: {0}")]
pub struct UnknownModuleError(String);

impl FromStr for Module {
    type Err = UnknownModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "VISITORS" => Module::Visitors,
            "REQUESTS" => Module::Requests,
            "REQUESTS_STATIC" => Module::RequestsStatic,
            "NOT_FOUND" => Module::NotFound,
            "HOSTS" => Module::Hosts,
            "OS" => Module::Os,
            "BROWSERS" => Module::Browsers,
            "VISIT_TIMES" => Module::VisitTimes,
            "REFERRERS" => Module::Referrers,
            "REFERRING_SITES" => Module::ReferringSites,
            "KEYPHRASES" => Module::Keyphrases,
            "GEO_LOCATION" => Module::GeoLocation,
            "STATUS_CODES" => Module::StatusCodes,
            other => return Err(UnknownModuleError(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for m in Module::ALL {
            assert_eq!(m.as_str().parse::<Module>().unwrap(), m);
        }
    }

    #[test]
    fn sub_item_modules_match_spec() {
        assert!(Module::Hosts.has_sub_items());
        assert!(Module::Os.has_sub_items());
        assert!(Module::Browsers.has_sub_items());
        assert!(Module::StatusCodes.has_sub_items());
        assert!(Module::GeoLocation.has_sub_items());
        assert!(!Module::Requests.has_sub_items());
        assert!(!Module::Visitors.has_sub_items());
    }
}
