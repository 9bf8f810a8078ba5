use serde::{Deserialize, Serialize};

use crate::{MetricsRecord, SubItem};

/// One row of a `HolderSnapshot`: a module entry plus the metadata needed to
/// render it (percentage, method/protocol, sub-items).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderItem {
    pub data: String,
    pub metrics: MetricsRecord,
    pub method: Option<String>,
    pub protocol: Option<String>,
    pub sub_list: Vec<SubItem>,
    /// `100 * hits / process_total`, clamped to `[0, 100]`.
    pub percentage: f64,
}

/// A read-only, sorted, top-N view of a `ModuleStore`, built on demand and
/// freed when superseded (spec §3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderSnapshot {
    pub items: Vec<HolderItem>,
    /// Process-wide total hits across every entry before truncation, used
    /// for percentage computation.
    pub process_total_hits: u64,
    pub max_hits: u64,
    pub max_visitors: u64,
}
