//! Snapshot-to-JSON bundle assembly (spec §4.5 "Outbound path": "the core
//! serializes the current HolderSnapshot bundle into a JSON document (shape:
//! `{general: {...}, per_module: {...}}`)").

use std::collections::HashMap;

use serde::Serialize;

use vantage_config::Config;
use vantage_core::build_snapshot;
use vantage_store::Store;
use vantage_types::{HolderSnapshot, Module};

#[derive(Debug, Clone, Serialize)]
pub struct GeneralStats {
    pub total_requests: u64,
    pub valid_requests: u64,
    pub invalid_requests: u64,
    pub unique_visitors: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bundle {
    pub general: GeneralStats,
    pub per_module: HashMap<String, HolderSnapshot>,
}

/// Builds the full cross-module bundle broadcast on each emission tick.
#[must_use]
pub fn build_bundle(store: &Store, config: &Config) -> Bundle {
    let total_hits = store.total_hits(Module::Requests);
    let general = GeneralStats {
        total_requests: total_hits + store.invalid,
        valid_requests: total_hits,
        invalid_requests: store.invalid,
        unique_visitors: store.total_hits(Module::Visitors),
    };

    let ignored = config.ignored_modules().unwrap_or_default();
    let sort_panel = config.sort_panel().unwrap_or_default();

    let mut per_module = HashMap::with_capacity(Module::ALL.len());
    for module in Module::ALL {
        if ignored.contains(&module) {
            continue;
        }
        let sort = sort_panel.get(&module).copied().unwrap_or_default();
        let snapshot = build_snapshot(store, module, sort, config.max_choices);
        per_module.insert(module.as_str().to_string(), snapshot);
    }

    Bundle { general, per_module }
}

/// Serializes a bundle to the JSON bytes that go out as one `TEXT` packet
/// payload (spec §4.5: "opcode per the header" — text bundles use
/// `WS_OPCODE_TEXT`).
pub fn serialize_bundle(bundle: &Bundle) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_types::Sort;

    #[test]
    fn empty_store_yields_zeroed_general_stats() {
        let store = Store::new();
        let config = Config::default();
        let bundle = build_bundle(&store, &config);
        assert_eq!(bundle.general.total_requests, 0);
        assert_eq!(bundle.general.unique_visitors, 0);
        assert!(bundle.per_module.contains_key(Module::Visitors.as_str()));
    }

    #[test]
    fn bundle_serializes_to_json_with_expected_top_level_keys() {
        let store = Store::new();
        let config = Config::default();
        let bundle = build_bundle(&store, &config);
        let bytes = serialize_bundle(&bundle).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value.get("general").is_some());
        assert!(value.get("per_module").is_some());
    }

    #[test]
    fn sort_panel_default_is_hits_desc_when_unconfigured() {
        let config = Config::default();
        let sort_panel = config.sort_panel().unwrap();
        assert_eq!(
            sort_panel.get(&Module::Hosts).copied().unwrap_or_default(),
            Sort::hits_desc()
        );
    }
}
