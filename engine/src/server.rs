//! The coordinator task: one listener accept loop, the outbound/inbound
//! FIFO bridge, and the per-client handle table (spec §4.5 "Event loop").
//!
//! The original is a single-threaded `select(2)` loop over the listener fd,
//! every client fd, both FIFOs, and a self-pipe. Here that becomes one
//! `tokio::select!` over an accept future, a packet-read future on the
//! outbound FIFO, the client-event channel, and a `watch` shutdown signal —
//! the self-pipe's async equivalent. Per-client sockets are driven by their
//! own tasks (`crate::client::run_client`); this task never touches a
//! socket directly, only the mpsc handles those tasks register.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio_rustls::TlsAcceptor;
use tracing::{info, warn};

use vantage_types::ProtocolError;

use crate::client::{ClientHandle, OutgoingFrame, ServerEvent, run_client};
use crate::fifo::{DynReader, DynWriter};
use crate::jwt;
use crate::packet::{self, Packet};

pub struct WsServerConfig {
    pub required_origin: Option<String>,
    pub hostname: String,
    pub auth_secret: Option<Vec<u8>>,
    pub tls_acceptor: Option<TlsAcceptor>,
}

/// Runs until `shutdown` fires. Consumes the inbound/outbound FIFO ends and
/// the bound listener; returns once every client has been asked to close.
pub async fn run(
    listener: TcpListener,
    mut outbound: DynReader,
    mut inbound: DynWriter,
    config: WsServerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let mut clients: HashMap<u64, ClientHandle> = HashMap::new();
    let mut next_id: u64 = 1;

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let Ok((socket, addr)) = accepted else { continue };
                let id = next_id;
                next_id += 1;
                spawn_accepted(socket, addr, id, &config, events_tx.clone());
            }

            packet = packet::read_packet(&mut outbound) => {
                match packet {
                    Ok(packet) => dispatch_outbound(packet, &clients),
                    Err(err) => {
                        warn!(error = %err, "outbound fifo read failed, will retry next tick");
                    }
                }
            }

            event = events_rx.recv() => {
                match event {
                    Some(ServerEvent::Connected(handle)) => {
                        info!(client_id = handle.id, remote_ip = %handle.remote_ip, "client connected");
                        clients.insert(handle.id, handle);
                    }
                    Some(ServerEvent::Message { id, message }) => {
                        handle_inbound_message(id, message, &config, &clients, &mut inbound).await;
                    }
                    Some(ServerEvent::Closed { id, .. }) => {
                        clients.remove(&id);
                    }
                    None => break,
                }
            }

            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    for handle in clients.values() {
        let _ = handle.try_send(OutgoingFrame(crate::frame::close_frame(1001, "shutting down")));
    }
}

fn spawn_accepted(
    socket: tokio::net::TcpStream,
    addr: SocketAddr,
    id: u64,
    config: &WsServerConfig,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
) {
    let required_origin = config.required_origin.clone();
    let tls_acceptor = config.tls_acceptor.clone();
    tokio::spawn(async move {
        let stream: crate::client::ClientStream = match tls_acceptor {
            Some(acceptor) => match acceptor.accept(socket).await {
                Ok(tls_stream) => Box::pin(tls_stream),
                Err(err) => {
                    warn!(%err, "TLS handshake failed");
                    return;
                }
            },
            None => Box::pin(socket),
        };
        run_client(stream, id, addr.ip(), required_origin, events_tx).await;
    });
}

/// Deliver one broadcaster packet to its target client(s) (spec §4.5:
/// "listener = 0 broadcast, else WS fd"), dropping frames for any client
/// already over `WS_THROTTLE_THLD`.
fn dispatch_outbound(packet: Packet, clients: &HashMap<u64, ClientHandle>) {
    let opcode = if packet.opcode == 2 {
        crate::frame::Opcode::Binary
    } else {
        crate::frame::Opcode::Text
    };
    let bytes = crate::frame::encode(true, opcode, &packet.payload);

    if packet.listener == 0 {
        for handle in clients.values() {
            if !handle.try_send(OutgoingFrame(bytes.clone())) {
                warn!(client_id = handle.id, "dropping broadcast frame, client is throttling");
            }
        }
    } else if let Some(handle) = clients.get(&u64::from(packet.listener)) {
        if !handle.try_send(OutgoingFrame(bytes)) {
            warn!(client_id = handle.id, "dropping frame, client is throttling");
        }
    }
}

/// Handle one reassembled client message: only `validate_token` is a
/// recognized action (spec §4.5 "Inbound path"); on success the frame is
/// still relayed to the core over the inbound FIFO so it can track
/// authentication state, keyed by client id as `listener`.
async fn handle_inbound_message(
    id: u64,
    message: crate::frame::Message,
    config: &WsServerConfig,
    clients: &HashMap<u64, ClientHandle>,
    inbound: &mut DynWriter,
) {
    let crate::frame::Message::Text(text) = message else {
        return;
    };

    if let Some(secret) = &config.auth_secret {
        if let Ok(action) = serde_json::from_str::<serde_json::Value>(&text) {
            if action.get("action").and_then(|v| v.as_str()) == Some("validate_token") {
                let token = action.get("token").and_then(|v| v.as_str()).unwrap_or("");
                let now = now_unix();
                let result = jwt::verify(token, secret, &config.hostname, now);
                if let Some(handle) = clients.get(&id) {
                    handle
                        .authenticated
                        .store(result.is_ok(), Ordering::Relaxed);
                    if let Err(err) = result {
                        let _ = handle.try_send(OutgoingFrame(crate::frame::close_frame(
                            ProtocolError::Unauthorized.close_code(),
                            &err.to_string(),
                        )));
                    }
                }
                return;
            }
        }
    }

    let packet = Packet {
        listener: id as u32,
        opcode: crate::frame::Opcode::Text.to_byte() as u32,
        payload: text.into_bytes(),
    };
    if packet::write_packet(inbound, &packet).await.is_err() {
        warn!("failed writing to inbound fifo, core will not see this client message");
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Spawns the coordinator as a background task, returning a handle the
/// caller can join on shutdown. Exists so `vantage-cli` doesn't need to know
/// the coordinator's internals, only that it owns a listener and two FIFO
/// ends.
pub fn spawn(
    listener: TcpListener,
    outbound: DynReader,
    inbound: DynWriter,
    config: WsServerConfig,
    shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(listener, outbound, inbound, config, shutdown))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatch_outbound_with_unknown_listener_is_a_noop() {
        let clients = HashMap::new();
        let packet = Packet { listener: 42, opcode: 1, payload: b"hi".to_vec() };
        dispatch_outbound(packet, &clients);
    }
}
