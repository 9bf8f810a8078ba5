//! The single recognized-options record populated by whatever parses
//! command-line flags or an on-disk config file (spec §1: "it only sets
//! values on a config record"; §6 enumerates every field below).
//!
//! Flag parsing itself is out of scope (spec §1 Non-goals); this crate only
//! owns [`Config`], its defaults, and loading one from a TOML file with
//! `${VAR}` environment expansion, the way `forge`'s old `src/config.rs`
//! loaded `ForgeConfig`.

#![allow(clippy::missing_errors_doc)]

mod load;
mod sort_panel;

pub use load::{config_path, expand_env_vars, load_from_file, ConfigLoadError};
pub use sort_panel::parse_sort_panel_entry;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use vantage_types::{ConfigError, Module, Sort};

/// Output sink for non-WS report drivers (out of scope to implement, but the
/// field is still a recognized option — spec §1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Html,
}

/// The full `Config` record (spec §6's CLI surface, one field per flag).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_file: Option<PathBuf>,
    pub log_format: String,
    pub date_format: String,
    pub time_format: String,
    pub output_format: OutputFormat,
    pub config_file: Option<PathBuf>,

    pub agent_list: bool,
    pub no_query_string: bool,
    pub no_term_resolver: bool,
    pub with_mouse: bool,
    pub with_output_resolver: bool,
    pub http_method: Option<String>,
    pub http_protocol: Option<String>,

    pub exclude_ip: Vec<String>,
    pub ignore_referer: Vec<String>,
    pub ignore_panel: Vec<String>,
    pub ignore_crawlers: bool,
    pub code444_as_404: bool,
    pub double_decode: bool,
    pub static_extensions: Vec<String>,

    pub real_os: bool,
    pub no_color: bool,
    pub no_progress: bool,
    pub color_scheme: u8,

    pub geoip_database: Option<PathBuf>,

    pub ws_url: Option<String>,
    pub origin: Option<String>,
    pub port: u16,
    pub ssl_cert: Option<PathBuf>,
    pub ssl_key: Option<PathBuf>,
    pub fifo_in: Option<PathBuf>,
    pub fifo_out: Option<PathBuf>,
    pub ws_auth_secret: Option<String>,
    pub ws_auth_expire: u64,

    /// Raw `MODULE,FIELD,ORDER` strings as they appear on the CLI; resolve
    /// with [`Config::sort_panel`].
    pub sort_panel: Vec<String>,

    pub storage: bool,

    /// Seconds between snapshot ticks (spec §2's "configurable, default
    /// 1 s").
    pub tick_interval_secs: u64,
    /// Spec §4.4's `MAX_CHOICES`.
    pub max_choices: usize,
    /// Spec §4.6's resolver queue capacity.
    pub resolver_queue_capacity: usize,
    /// Spec §4.5's `WS_THROTTLE_THLD`.
    pub ws_throttle_threshold_bytes: usize,
    /// Optional on-disk counter cache directory (spec §6 "persisted
    /// state"). `None` disables the cache.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: None,
            log_format: "COMBINED".to_string(),
            date_format: "%d/%b/%Y".to_string(),
            time_format: "%H:%M:%S".to_string(),
            output_format: OutputFormat::default(),
            config_file: None,

            agent_list: false,
            no_query_string: false,
            no_term_resolver: false,
            with_mouse: false,
            with_output_resolver: false,
            http_method: None,
            http_protocol: None,

            exclude_ip: Vec::new(),
            ignore_referer: Vec::new(),
            ignore_panel: Vec::new(),
            ignore_crawlers: false,
            code444_as_404: false,
            double_decode: false,
            static_extensions: vantage_parser_defaults(),

            real_os: false,
            no_color: false,
            no_progress: false,
            color_scheme: 0,

            geoip_database: None,

            ws_url: None,
            origin: None,
            port: 7890,
            ssl_cert: None,
            ssl_key: None,
            fifo_in: None,
            fifo_out: None,
            ws_auth_secret: None,
            ws_auth_expire: 1800,

            sort_panel: Vec::new(),

            storage: false,

            tick_interval_secs: 1,
            max_choices: 366,
            resolver_queue_capacity: 400,
            ws_throttle_threshold_bytes: 2 * 1024 * 1024,
            cache_dir: None,
        }
    }
}

/// The extension allowlist duplicated here (rather than depending on
/// `vantage-parser` just for this one constant) so `vantage-config` stays a
/// leaf crate with no sibling-crate dependencies, matching how `forge-types`
/// avoids depending on its own consumers.
fn vantage_parser_defaults() -> Vec<String> {
    [
        "jpg", "jpeg", "gif", "png", "css", "js", "ico", "swf", "woff", "woff2", "ttf", "svg", "webp", "eot", "otf",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl Config {
    /// Resolve every raw `sort_panel` entry into a `Module -> Sort` map,
    /// per spec §6's `--sort-panel=MODULE,FIELD,ORDER`.
    pub fn sort_panel(&self) -> Result<HashMap<Module, Sort>, ConfigError> {
        self.sort_panel
            .iter()
            .map(|raw| parse_sort_panel_entry(raw))
            .collect()
    }

    /// Modules excluded from the live snapshot/broadcast, per
    /// `--ignore-panel=MODULE` (repeatable).
    pub fn ignored_modules(&self) -> Result<Vec<Module>, ConfigError> {
        self.ignore_panel
            .iter()
            .map(|s| s.parse::<Module>().map_err(|_| ConfigError::Other(format!("unknown panel `{s}`"))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.max_choices, 366);
        assert_eq!(cfg.resolver_queue_capacity, 400);
        assert_eq!(cfg.ws_throttle_threshold_bytes, 2 * 1024 * 1024);
        assert_eq!(cfg.ws_auth_expire, 1800);
        assert_eq!(cfg.tick_interval_secs, 1);
        assert_eq!(cfg.log_format, "COMBINED");
    }

    #[test]
    fn empty_sort_panel_resolves_to_empty_map() {
        let cfg = Config::default();
        assert!(cfg.sort_panel().unwrap().is_empty());
    }
}
