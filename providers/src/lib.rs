//! Browser, OS, and crawler classification from a user-agent string, plus
//! geolocation lookup from a client IP (spec §4.3).
//!
//! The default tables are transcribed from goaccess's own
//! `browsers.c`/`opesys.c`; this crate adds no new classification logic, only
//! the ability to extend those tables from a user-supplied TOML file.

#![allow(clippy::missing_errors_doc)]

mod browsers;
mod geoip;
mod opesys;
mod user_table;

pub use browsers::{classify as classify_browser, is_crawler, BrowserMatch, DEFAULT_BROWSERS};
pub use geoip::{GeoLookup, LegacyGeoIp, Mmdb};
pub use opesys::{classify as classify_os, OsMatch, DEFAULT_OS};
pub use user_table::{load_user_table, UserTableError};

/// The immutable-after-init classifier table set shared across the process
/// (spec §5: "one process-wide classifier table set (immutable after
/// init)").
#[derive(Debug, Clone, Default)]
pub struct ClassifierTables {
    pub user_browsers: Vec<(String, String)>,
    pub real_os: bool,
}

impl ClassifierTables {
    #[must_use]
    pub fn classify_browser(&self, agent: &str) -> BrowserMatch {
        browsers::classify(agent, &self.user_browsers)
    }

    #[must_use]
    pub fn classify_os(&self, agent: &str) -> OsMatch {
        opesys::classify(agent, self.real_os)
    }

    #[must_use]
    pub fn is_crawler(&self, agent: &str) -> bool {
        browsers::is_crawler(agent, &self.user_browsers)
    }
}
