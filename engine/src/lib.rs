//! WebSocket broadcast server and FIFO bridge (spec §4.5, components G/H).
//!
//! The original is a single-threaded `select(2)` loop driving: a listener
//! socket, every connected client fd, an inbound FIFO (client→core) and an
//! outbound FIFO (core→clients), plus a self-pipe for shutdown. This crate
//! re-expresses that as a tokio coordinator task (`server::run`) fed by
//! per-client tasks (`client::run_client`) over mpsc channels, with the two
//! FIFOs abstracted behind [`fifo::DynReader`]/[`fifo::DynWriter`] so either
//! a real Unix named pipe or an in-memory `tokio::io::duplex` can stand in
//! for them.

pub mod broadcaster;
pub mod client;
pub mod fifo;
pub mod frame;
pub mod handshake;
pub mod jwt;
pub mod packet;
pub mod server;
pub mod tls;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::watch;

use vantage_config::Config;
use vantage_types::ConfigError;

pub use broadcaster::{Bundle, GeneralStats, build_bundle, serialize_bundle};
pub use client::{ClientHandle, OutgoingFrame, ServerEvent};
pub use fifo::{DynReader, DynWriter};
pub use frame::{Frame, MAX_FRAME_SIZE, Message, Opcode, Reassembler, THROTTLE_THRESHOLD};
pub use packet::Packet;
pub use server::{WsServerConfig, run};

/// Everything `vantage-cli` needs to spawn the coordinator: the bound
/// listener and the two FIFO ends named in `Config`. When `fifo_in`/
/// `fifo_out` are unset, in-memory pipes stand in and the peer ends are
/// handed back so the caller can drive them directly.
pub struct Bound {
    pub listener: TcpListener,
    pub outbound_reader: DynReader,
    pub inbound_writer: DynWriter,
    /// `Some` only when no `fifo_out` path was configured: the peer side of
    /// the in-memory outbound pipe, for the broadcaster to write into.
    pub outbound_peer: Option<tokio::io::DuplexStream>,
    /// `Some` only when no `fifo_in` path was configured: the peer side of
    /// the in-memory inbound pipe, for the core to read client messages
    /// from.
    pub inbound_peer: Option<tokio::io::DuplexStream>,
}

pub async fn bind(config: &Config) -> Result<Bound, ConfigError> {
    let addr: SocketAddr = match &config.ws_url {
        Some(url) => url
            .parse()
            .map_err(|_| ConfigError::Other(format!("invalid --ws-url `{url}`")))?,
        None => SocketAddr::from(([0, 0, 0, 0], config.port)),
    };
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ConfigError::Other(format!("binding {addr}: {e}")))?;

    let (outbound_reader, outbound_peer) = match &config.fifo_out {
        Some(path) => (fifo::open_fifo_reader(path).await?, None),
        None => {
            let (reader, _writer, peer) = fifo::in_memory_pipe();
            (reader, Some(peer))
        }
    };

    let (inbound_writer, inbound_peer) = match &config.fifo_in {
        Some(path) => (fifo::open_fifo_writer(path).await?, None),
        None => {
            let (_reader, writer, peer) = fifo::in_memory_pipe();
            (writer, Some(peer))
        }
    };

    Ok(Bound { listener, outbound_reader, inbound_writer, outbound_peer, inbound_peer })
}

/// Build the `WsServerConfig` (TLS acceptor, origin/auth policy) implied by
/// `config`, per spec §4.5.
pub fn server_config(config: &Config, hostname: String) -> Result<WsServerConfig, ConfigError> {
    let tls_acceptor = match (&config.ssl_cert, &config.ssl_key) {
        (Some(cert), Some(key)) => Some(tls::load_acceptor(cert, key)?),
        (None, None) => None,
        _ => return Err(ConfigError::MissingTlsMaterial),
    };

    Ok(WsServerConfig {
        required_origin: config.origin.clone(),
        hostname,
        auth_secret: config.ws_auth_secret.as_ref().map(|s| s.as_bytes().to_vec()),
        tls_acceptor,
    })
}

/// Spawns the coordinator task. Returns the join handle and a `watch`
/// sender the caller signals (to `true`) to trigger an orderly shutdown —
/// the async analogue of writing to the self-pipe.
pub fn spawn(
    bound: Bound,
    ws_config: WsServerConfig,
) -> (
    tokio::task::JoinHandle<()>,
    watch::Sender<bool>,
    Option<tokio::io::DuplexStream>,
    Option<tokio::io::DuplexStream>,
) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = server::spawn(bound.listener, bound.outbound_reader, bound.inbound_writer, ws_config, shutdown_rx);
    (handle, shutdown_tx, bound.outbound_peer, bound.inbound_peer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_to_an_ephemeral_port_when_ws_url_is_unset() {
        let mut config = Config::default();
        config.port = 0;
        let bound = bind(&config).await.unwrap();
        assert!(bound.outbound_peer.is_some());
        assert!(bound.inbound_peer.is_some());
    }

    #[test]
    fn mismatched_tls_material_is_a_config_error() {
        let mut config = Config::default();
        config.ssl_cert = Some("/tmp/does-not-matter.crt".into());
        config.ssl_key = None;
        assert!(server_config(&config, "example.com".to_string()).is_err());
    }
}
