//! Per-connection client actor (spec §3 `WSClient`, §4.5 "Event loop").
//!
//! One tokio task per accepted connection, generalizing the spec's
//! single-threaded `select(2)` client state machine into its natural async
//! form: each client task owns its socket and reassembler, and talks to the
//! one coordinator task (`crate::server::WsServer`) over a pair of mpsc
//! channels instead of a shared fd table.

use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use vantage_types::ProtocolError;

use crate::frame::{self, MAX_HEADER_SIZE, Message, Opcode, Reassembler};
use crate::handshake;

pub type ClientStream = Pin<Box<dyn AsyncReadWrite>>;

/// Blanket trait object bound for "a socket, possibly TLS-wrapped".
pub trait AsyncReadWrite: AsyncRead + AsyncWrite + Send {}
impl<T: AsyncRead + AsyncWrite + Send> AsyncReadWrite for T {}

/// A byte frame queued for delivery to one client, tracked against the
/// client's throttle counter.
#[derive(Debug, Clone)]
pub struct OutgoingFrame(pub Vec<u8>);

/// What the coordinator hands back to a caller that wants to reach one
/// client's write queue.
#[derive(Clone)]
pub struct ClientHandle {
    pub id: u64,
    pub remote_ip: IpAddr,
    pub tx: mpsc::UnboundedSender<OutgoingFrame>,
    pub queued_bytes: Arc<AtomicUsize>,
    pub authenticated: Arc<std::sync::atomic::AtomicBool>,
}

impl ClientHandle {
    /// Enqueues a frame unless the client is already over the throttle
    /// threshold, in which case the frame is dropped and the client is
    /// expected to be closed by the coordinator (spec §4.5 "Outbound path":
    /// slow readers are dropped, not buffered without bound).
    pub fn try_send(&self, frame: OutgoingFrame) -> bool {
        if self.queued_bytes.load(Ordering::Relaxed) + frame.0.len() > crate::frame::THROTTLE_THRESHOLD {
            return false;
        }
        self.queued_bytes.fetch_add(frame.0.len(), Ordering::Relaxed);
        self.tx.send(frame).is_ok()
    }
}

/// Events a client task reports back to the coordinator.
pub enum ServerEvent {
    Connected(ClientHandle),
    Message { id: u64, message: Message },
    Closed { id: u64, code: Option<u16> },
}

/// Runs the handshake, then the read/write loop, for one accepted
/// connection. Exits (dropping the socket) on any protocol error, EOF, or
/// coordinator shutdown.
pub async fn run_client(
    mut stream: ClientStream,
    id: u64,
    remote_ip: IpAddr,
    required_origin: Option<String>,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
) {
    let accept = match perform_handshake(&mut stream, required_origin.as_deref()).await {
        Ok(accept) => accept,
        Err(_) => {
            let _ = stream.write_all(handshake::bad_request_response().as_bytes()).await;
            return;
        }
    };

    if stream
        .write_all(handshake::switching_protocols_response(&accept).as_bytes())
        .await
        .is_err()
    {
        return;
    }

    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel();
    let queued_bytes = Arc::new(AtomicUsize::new(0));
    let authenticated = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let handle = ClientHandle {
        id,
        remote_ip,
        tx: outgoing_tx,
        queued_bytes: queued_bytes.clone(),
        authenticated,
    };
    if events_tx.send(ServerEvent::Connected(handle)).is_err() {
        return;
    }

    let mut reassembler = Reassembler::new();
    let close_code = loop {
        tokio::select! {
            frame = frame::read_frame(&mut stream) => {
                match frame {
                    Ok(frame) => match reassembler.feed(frame) {
                        Ok(Some(Message::Control(Opcode::Close, _))) => break Some(1000),
                        Ok(Some(Message::Control(Opcode::Ping, payload))) => {
                            if stream.write_all(&frame::encode(true, Opcode::Pong, &payload)).await.is_err() {
                                break Some(1011);
                            }
                        }
                        Ok(Some(Message::Control(Opcode::Pong, _))) => {}
                        Ok(Some(message)) => {
                            if events_tx.send(ServerEvent::Message { id, message }).is_err() {
                                break Some(1011);
                            }
                        }
                        Ok(None) => {}
                        Err(err) => break Some(err.close_code()),
                    },
                    Err(err) => break Some(err.close_code()),
                }
            }
            outgoing = outgoing_rx.recv() => {
                match outgoing {
                    Some(OutgoingFrame(bytes)) => {
                        queued_bytes.fetch_sub(bytes.len(), Ordering::Relaxed);
                        if stream.write_all(&bytes).await.is_err() {
                            break Some(1011);
                        }
                    }
                    None => break None,
                }
            }
        }
    };

    if let Some(code) = close_code {
        let _ = stream.write_all(&frame::close_frame(code, "")).await;
    }
    let _ = events_tx.send(ServerEvent::Closed { id, code: close_code });
}

async fn perform_handshake(
    stream: &mut ClientStream,
    required_origin: Option<&str>,
) -> Result<String, ProtocolError> {
    let mut buf = Vec::with_capacity(512);
    let mut byte = [0u8; 1];
    loop {
        if buf.len() > MAX_HEADER_SIZE {
            return Err(ProtocolError::TooLarge);
        }
        stream.read_exact(&mut byte).await.map_err(|_| ProtocolError::Unexpected)?;
        buf.push(byte[0]);
        if buf.ends_with(b"\r\n\r\n") {
            break;
        }
    }

    let request = handshake::parse_request(&buf).map_err(|_| ProtocolError::Protocol)?;
    handshake::validate_and_accept(&request, required_origin).map_err(|_| ProtocolError::Protocol)
}
