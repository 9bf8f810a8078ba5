use serde::{Deserialize, Serialize};

/// The counter bundle stored per key per module.
///
/// Invariants: `hits >= visitors >= 1`, `cum_ts_us == avg_ts_us * hits`
/// (rounded to the latest observation), `max_ts_us >= avg_ts_us`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub hits: u64,
    pub visitors: u64,
    pub bandwidth: u64,
    pub avg_ts_us: u64,
    pub cum_ts_us: u64,
    pub max_ts_us: u64,
    pub method: Option<String>,
    pub protocol: Option<String>,
    /// Child classification rolled up under this entry (HOSTS, OS, BROWSERS,
    /// STATUS_CODES, GEO_LOCATION only).
    pub sub_items: Vec<SubItem>,
}

impl MetricsRecord {
    /// Record one more hit, optionally a new unique visitor, against this
    /// entry. `ts_us` is `None` when the module doesn't track timing.
    pub fn record_hit(&mut self, bytes: u64, is_new_visitor: bool, ts_us: Option<u64>) {
        self.hits += 1;
        if is_new_visitor {
            self.visitors += 1;
        }
        self.bandwidth += bytes;
        if let Some(ts) = ts_us {
            self.cum_ts_us += ts;
            self.avg_ts_us = self.cum_ts_us / self.hits;
            self.max_ts_us = self.max_ts_us.max(ts);
        }
    }

    /// Merge another record's counters into this one, summing counts and
    /// recomputing the running average. Used to coalesce duplicate
    /// sub-items observed within a single parent (spec §4.2).
    pub fn merge(&mut self, other: &MetricsRecord) {
        self.hits += other.hits;
        self.visitors += other.visitors;
        self.bandwidth += other.bandwidth;
        self.cum_ts_us += other.cum_ts_us;
        if self.hits > 0 {
            self.avg_ts_us = self.cum_ts_us / self.hits;
        }
        self.max_ts_us = self.max_ts_us.max(other.max_ts_us);
        if self.method.is_none() {
            self.method = other.method.clone();
        }
        if self.protocol.is_none() {
            self.protocol = other.protocol.clone();
        }
    }

    /// Percentage of `hits` against the process-wide total, clamped to
    /// `[0, 100]`. Returns `0.0` when `total` is `0`.
    #[must_use]
    pub fn percentage(&self, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            (100.0 * self.hits as f64 / total as f64).clamp(0.0, 100.0)
        }
    }
}

/// A child categorization rolled up under a parent key (e.g. OS family ->
/// specific OS version, or status-code class -> concrete code).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubItem {
    pub data: String,
    pub hits: u64,
    pub visitors: u64,
    pub bw: u64,
}

impl SubItem {
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn record_hit(&mut self, bytes: u64, is_new_visitor: bool) {
        self.hits += 1;
        if is_new_visitor {
            self.visitors += 1;
        }
        self.bw += bytes;
    }
}
