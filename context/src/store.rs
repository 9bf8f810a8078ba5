use std::collections::{HashMap, HashSet};

use vantage_types::{GeoRecord, HostAgentsSet, Module, ModuleStore};

/// The process-wide aggregation store (spec §3/§4.2, component D).
///
/// One `Store` per process, normally shared as `Arc<Mutex<Store>>` with the
/// parser/ingest task as its sole writer and the holder/snapshot builder
/// (spec §4.4) as its reader.
#[derive(Debug, Default)]
pub struct Store {
    pub(crate) modules: HashMap<Module, ModuleStore>,

    /// Composite `host|YYYYMMDD|agent` keys already counted as a visitor.
    /// One global set, never pruned during a run (spec §4.2).
    pub(crate) visitor_keys: HashSet<String>,

    pub(crate) date_bw: HashMap<String, u64>,
    pub(crate) file_bw: HashMap<String, u64>,
    pub(crate) host_bw: HashMap<String, u64>,
    pub(crate) file_usecs: HashMap<String, u64>,
    pub(crate) host_usecs: HashMap<String, u64>,

    /// "Agents per host" expansion (spec §3).
    pub(crate) host_agents: HostAgentsSet,

    /// Resolved/unresolved geolocation per host, populated lazily from the
    /// classifier's geoip lookup (spec §4.3).
    pub(crate) geo: HashMap<String, GeoRecord>,

    /// Hosts already enqueued to the DNS resolver, so repeat hits on the
    /// same host don't resubmit (spec §4.2 item 3, §4.6 dedup).
    pub(crate) resolved_hosts: HashSet<String>,

    /// Lines that failed to parse or were rejected by an ignore rule.
    pub invalid: u64,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn module(&self, module: Module) -> Option<&ModuleStore> {
        self.modules.get(&module)
    }

    pub(crate) fn module_mut(&mut self, module: Module) -> &mut ModuleStore {
        self.modules.entry(module).or_default()
    }

    #[must_use]
    pub fn is_new_visitor(&self, visitor_key: &str) -> bool {
        !self.visitor_keys.contains(visitor_key)
    }

    #[must_use]
    pub fn total_hits(&self, module: Module) -> u64 {
        self.modules
            .get(&module)
            .map(|m| m.values().map(|r| r.hits).sum())
            .unwrap_or(0)
    }

    /// Record a resolved hostname against a host key, replacing any earlier
    /// placeholder (spec §4.6: "store consumes completions on next host
    /// observation").
    pub fn apply_resolved_host(&mut self, ip: &str, hostname: String) {
        if let Some(entry) = self.modules.get_mut(&Module::Hosts).and_then(|m| m.get_mut(ip)) {
            for sub in &mut entry.sub_items {
                if sub.data == "resolved" {
                    sub.data = hostname.clone();
                    return;
                }
            }
            entry
                .sub_items
                .push(vantage_types::SubItem::new(hostname));
        }
    }

    #[must_use]
    pub fn host_agents(&self) -> &HostAgentsSet {
        &self.host_agents
    }

    #[must_use]
    pub fn geo_for(&self, host: &str) -> Option<&GeoRecord> {
        self.geo.get(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_has_no_modules() {
        let store = Store::new();
        assert!(store.module(Module::Visitors).is_none());
        assert_eq!(store.total_hits(Module::Visitors), 0);
    }

    #[test]
    fn visitor_keys_start_empty() {
        let store = Store::new();
        assert!(store.is_new_visitor("127.0.0.1|20150110|curl/7.0"));
    }
}
