/// Per-client state flags (spec §3, `WSClient`).
///
/// Mirrors the original's coroutine-ish `WANT_READ`/`WANT_WRITE` TLS states
/// with explicit flags re-examined on every event-loop turn (spec §9).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStatus {
    pub reading: bool,
    pub sending: bool,
    pub throttling: bool,
    pub close: bool,
    pub err: bool,
}

impl ClientStatus {
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }
}

/// A connected WebSocket client's bookkeeping.
///
/// Owns its read/write buffers; created on accept, destroyed on close.
/// Invariant: at most one in-progress inbound frame; the write queue shrinks
/// monotonically until empty or the socket closes.
#[derive(Debug, Clone, Default)]
pub struct WsClient {
    pub id: u64,
    pub remote_ip: String,
    pub status: ClientStatus,
    /// Bytes queued for this client, not yet written to the socket.
    pub write_queue: std::collections::VecDeque<u8>,
    pub authenticated: bool,
    pub last_authenticated_jwt: Option<String>,
}

impl WsClient {
    #[must_use]
    pub fn new(id: u64, remote_ip: impl Into<String>) -> Self {
        Self {
            id,
            remote_ip: remote_ip.into(),
            status: ClientStatus::idle(),
            write_queue: std::collections::VecDeque::new(),
            authenticated: false,
            last_authenticated_jwt: None,
        }
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.write_queue.len()
    }
}
