//! Optional on-disk counter cache (spec §6: "a directory of one file per
//! module containing the serialized `MetricsRecord` map").
//!
//! This is resume-only state, never a query surface (spec §1 Non-goals):
//! [`Cache::load_into`] replays whatever was last flushed back into a
//! [`Store`] at startup, and [`Cache::flush`] is the only writer. The
//! on-disk layout is implementation-defined and not a compatibility
//! contract (spec §9).

use std::path::Path;

use vantage_types::{MetricsRecord, Module};
use vantage_utils::ensure_secure_dir;

use crate::store::Store;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to open cache directory: {0}")]
    Open(#[from] std::io::Error),
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("failed to decode cached record: {0}")]
    Decode(#[from] bincode::Error),
}

/// One `sled::Tree` per module, keyed by the module's own store key, each
/// value a `bincode`-serialized [`MetricsRecord`].
pub struct Cache {
    db: sled::Db,
}

impl Cache {
    /// Open (creating if absent) the cache directory at `path`, hardened to
    /// owner-only permissions the same way the WS server's TLS key file is
    /// (spec §4.2 supplement).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        ensure_secure_dir(path)?;
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn tree(&self, module: Module) -> Result<sled::Tree, CacheError> {
        Ok(self.db.open_tree(module.as_str())?)
    }

    /// Persist every module's current counters, overwriting prior entries
    /// for the same key.
    pub fn flush(&self, store: &Store) -> Result<(), CacheError> {
        for module in Module::ALL {
            let Some(map) = store.modules.get(&module) else {
                continue;
            };
            let tree = self.tree(module)?;
            for (key, record) in map {
                let bytes = bincode::serialize(record)?;
                tree.insert(key.as_bytes(), bytes)?;
            }
        }
        self.db.flush()?;
        Ok(())
    }

    /// Replay every cached module into `store`, skipping keys already
    /// present (so a mid-run call never clobbers live counters).
    pub fn load_into(&self, store: &mut Store) -> Result<(), CacheError> {
        for module in Module::ALL {
            let tree = self.tree(module)?;
            let map = store.module_mut(module);
            for entry in tree.iter() {
                let (key, value) = entry?;
                let key = String::from_utf8_lossy(&key).into_owned();
                if map.contains_key(&key) {
                    continue;
                }
                let record: MetricsRecord = bincode::deserialize(&value)?;
                map.insert(key, record);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_then_load_round_trips_counters() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::open(dir.path()).unwrap();

        let mut store = Store::new();
        store
            .module_mut(Module::Visitors)
            .entry("20150110".to_string())
            .or_default()
            .record_hit(100, true, None);
        cache.flush(&store).unwrap();

        let mut restored = Store::new();
        cache.load_into(&mut restored).unwrap();
        let record = &restored.module(Module::Visitors).unwrap()["20150110"];
        assert_eq!(record.hits, 1);
        assert_eq!(record.bandwidth, 100);
    }

    #[test]
    fn load_does_not_clobber_live_counters() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::open(dir.path()).unwrap();

        let mut seed = Store::new();
        seed.module_mut(Module::Visitors)
            .entry("20150110".to_string())
            .or_default()
            .record_hit(1, true, None);
        cache.flush(&seed).unwrap();

        let mut live = Store::new();
        live.module_mut(Module::Visitors)
            .entry("20150110".to_string())
            .or_default()
            .record_hit(999, true, None);
        cache.load_into(&mut live).unwrap();

        let record = &live.module(Module::Visitors).unwrap()["20150110"];
        assert_eq!(record.hits, 1);
        assert_eq!(record.bandwidth, 999);
    }
}
