//! Aggregation store: the per-module counter maps, sub-item hierarchies,
//! bandwidth/timing accumulators, and unique-visitor deduplication described
//! in spec §4.2.
//!
//! No IO beyond the optional on-disk cache in [`persistence`]; ingestion is
//! synchronous and single-threaded, consistent with spec §5's "parser
//! serializes update-then-build on the same thread" guarantee.

#![allow(clippy::missing_errors_doc)]

mod ingest;
pub mod persistence;
mod referrer;
mod store;

pub use ingest::IngestOutcome;
pub use referrer::{parse_keyphrase, referring_site};
pub use store::Store;
