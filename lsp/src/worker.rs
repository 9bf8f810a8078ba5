use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Inner {
    tx: mpsc::Sender<String>,
    in_flight: Mutex<HashSet<String>>,
    completions: Mutex<HashMap<String, String>>,
    skip_term_resolver: bool,
}

/// The enqueue/drain handle shared by every caller that observes a host
/// (spec §4.6). Cloning is cheap (an `Arc` bump); every clone shares the
/// same queue, in-flight set, and completion map.
#[derive(Clone)]
pub struct Resolver(Arc<Inner>);

/// Owns the background worker task. Dropping every [`Resolver`] clone closes
/// the channel and lets the worker's `recv` loop end; `join` awaits that.
pub struct ResolverHandle {
    join: JoinHandle<()>,
}

impl ResolverHandle {
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.join.await
    }
}

/// Spawn the resolver worker with a bounded queue of `capacity` (spec §4.6
/// default 400). When `skip_term_resolver` is set, every `enqueue` call is a
/// silent no-op — the bypass is checked at the door, not in the worker, so
/// no task is ever spawned for a disabled resolver's lookups.
#[must_use]
pub fn spawn(capacity: usize, skip_term_resolver: bool) -> (Resolver, ResolverHandle) {
    let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));
    let inner = Arc::new(Inner {
        tx,
        in_flight: Mutex::new(HashSet::new()),
        completions: Mutex::new(HashMap::new()),
        skip_term_resolver,
    });

    let worker_inner = Arc::clone(&inner);
    let join = tokio::spawn(async move {
        while let Some(ip) = rx.recv().await {
            let hostname = tokio::task::spawn_blocking({
                let ip = ip.clone();
                move || reverse_lookup(&ip)
            })
            .await
            .ok()
            .flatten();

            if let Some(hostname) = hostname {
                worker_inner
                    .completions
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .insert(ip.clone(), hostname);
            }
            worker_inner
                .in_flight
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .remove(&ip);
        }
    });

    (Resolver(inner), ResolverHandle { join })
}

fn reverse_lookup(ip: &str) -> Option<String> {
    let addr: IpAddr = ip.parse().ok()?;
    let (hostname, _service) = dns_lookup::getnameinfo(&SocketAddr::new(addr, 0), 0).ok()?;
    Some(hostname)
}

impl Resolver {
    /// Enqueue `ip` for reverse lookup. Returns `true` iff the IP was newly
    /// submitted: `false` covers the `skip_term_resolver` bypass, an
    /// already-pending duplicate (spec: "duplicates are coalesced on
    /// enqueue"), and a full queue (spec: "enqueue on a full queue drops
    /// silently").
    pub fn enqueue(&self, ip: &str) -> bool {
        if self.0.skip_term_resolver {
            return false;
        }

        let mut in_flight = self.0.in_flight.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !in_flight.insert(ip.to_string()) {
            return false;
        }
        drop(in_flight);

        if self.0.tx.try_send(ip.to_string()).is_err() {
            self.0
                .in_flight
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .remove(ip);
            return false;
        }
        true
    }

    /// Drain every completion recorded so far, handing ownership to the
    /// caller (the aggregation store, spec §4.2 item 3).
    pub fn drain_completions(&self) -> Vec<(String, String)> {
        let mut completions = self.0.completions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        completions.drain().collect()
    }

    #[must_use]
    pub fn is_bypassed(&self) -> bool {
        self.0.skip_term_resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_then_drain_resolves_localhost() {
        let (resolver, handle) = spawn(10, false);
        assert!(resolver.enqueue("127.0.0.1"));

        let mut completions = Vec::new();
        for _ in 0..50 {
            completions = resolver.drain_completions();
            if !completions.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].0, "127.0.0.1");
        drop(resolver);
        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_enqueue_is_coalesced() {
        let (resolver, handle) = spawn(10, false);
        assert!(resolver.enqueue("127.0.0.1"));
        assert!(!resolver.enqueue("127.0.0.1"));
        drop(resolver);
        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn bypass_drops_every_enqueue() {
        let (resolver, handle) = spawn(10, true);
        assert!(resolver.is_bypassed());
        assert!(!resolver.enqueue("127.0.0.1"));
        drop(resolver);
        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn full_queue_drops_silently() {
        let (resolver, handle) = spawn(1, false);
        // Fill the one slot with an address that will block briefly in the
        // worker's blocking pool, then exhaust it with a second unique IP.
        assert!(resolver.enqueue("10.0.0.1"));
        let accepted = resolver.enqueue("10.0.0.2");
        // Either accepted (if the worker already drained the first) or
        // dropped — both are spec-legal; what must never happen is a panic
        // or an unbounded queue.
        let _ = accepted;
        drop(resolver);
        handle.join().await.unwrap();
    }
}
