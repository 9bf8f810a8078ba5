//! Reverse-DNS resolver worker (spec §4.6, component F).
//!
//! A bounded queue of unique IPs feeds a single background task that
//! performs the reverse lookup and records completions in a shared map the
//! aggregation store drains opportunistically on the next observation of
//! that host (spec §4.2 item 3). This is the direct re-expression of
//! `forge-lsp::manager::LspManager`'s spawn-task-plus-event-channel shape,
//! substituting a reverse-DNS lookup for the spawned LSP subprocess.

#![allow(clippy::missing_errors_doc)]

mod worker;

pub use worker::{spawn, Resolver, ResolverHandle};

/// Default bounded queue capacity (spec §4.6).
pub const DEFAULT_QUEUE_CAPACITY: usize = 400;
