//! Holder / snapshot builder (spec §4.4, component E).
//!
//! Turns a module's live [`vantage_store::Store`] counters into a read-only,
//! sorted, top-N [`HolderSnapshot`] on demand. Snapshots borrow nothing from
//! the store past the call that builds them — every key/record is copied
//! out, so the store is free to keep mutating concurrently (spec §3
//! "Ownership").

#![allow(clippy::missing_errors_doc)]

mod legal_sort;
mod snapshot;

pub use legal_sort::{is_legal_sort, legal_sort_fields};
pub use snapshot::{build_snapshot, DEFAULT_MAX_CHOICES};
