//! RFC 6455 frame encoding/decoding (spec §4.5 "Framing").

use tokio::io::{AsyncRead, AsyncReadExt};

use vantage_types::ProtocolError;

/// `WS_MAX_FRM_SZ`: oversize frames close with code 1009.
pub const MAX_FRAME_SIZE: usize = 1_048_576;
/// `WS_THROTTLE_THLD`: per-client queued-byte threshold before dropping.
pub const THROTTLE_THRESHOLD: usize = 2 * 1024 * 1024;
/// `WS_MAX_HEAD_SZ`: a reasonable ceiling on handshake request size.
pub const MAX_HEADER_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0x0 => Opcode::Continuation,
            0x1 => Opcode::Text,
            0x2 => Opcode::Binary,
            0x8 => Opcode::Close,
            0x9 => Opcode::Ping,
            0xA => Opcode::Pong,
            _ => return None,
        })
    }

    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            Opcode::Continuation => 0x0,
            Opcode::Text => 0x1,
            Opcode::Binary => 0x2,
            Opcode::Close => 0x8,
            Opcode::Ping => 0x9,
            Opcode::Pong => 0xA,
        }
    }

    #[must_use]
    pub fn is_control(self) -> bool {
        matches!(self, Opcode::Close | Opcode::Ping | Opcode::Pong)
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub payload: Vec<u8>,
}

/// Encode a server→client frame. Server frames are never masked (RFC 6455
/// §5.1: only client→server frames carry a mask).
#[must_use]
pub fn encode(fin: bool, opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 10);
    out.push((u8::from(fin) << 7) | opcode.to_byte());

    let len = payload.len();
    if len < 126 {
        out.push(len as u8);
    } else if len <= usize::from(u16::MAX) {
        out.push(126);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(127);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }
    out.extend_from_slice(payload);
    out
}

/// A 2-byte close-code payload plus an optional reason string.
#[must_use]
pub fn close_frame(code: u16, reason: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(2 + reason.len());
    payload.extend_from_slice(&code.to_be_bytes());
    payload.extend_from_slice(reason.as_bytes());
    encode(true, Opcode::Close, &payload)
}

/// Decode one client→server frame. RSV bits must be zero, control frames
/// must be unfragmented and ≤125 bytes, and the frame must be masked — any
/// violation is a `ProtocolError::Protocol` (close 1002). Oversize frames
/// are `TooLarge` (close 1009); a read failure is `Unexpected` (close 1011).
pub async fn read_frame<R: AsyncRead + Unpin>(r: &mut R) -> Result<Frame, ProtocolError> {
    let mut head = [0u8; 2];
    r.read_exact(&mut head)
        .await
        .map_err(|_| ProtocolError::Unexpected)?;

    let fin = head[0] & 0x80 != 0;
    let rsv = head[0] & 0x70;
    if rsv != 0 {
        return Err(ProtocolError::Protocol);
    }
    let opcode = Opcode::from_byte(head[0] & 0x0F).ok_or(ProtocolError::Protocol)?;

    let masked = head[1] & 0x80 != 0;
    if !masked {
        return Err(ProtocolError::Protocol);
    }

    let len7 = head[1] & 0x7F;
    let len: u64 = match len7 {
        126 => {
            let mut buf = [0u8; 2];
            r.read_exact(&mut buf)
                .await
                .map_err(|_| ProtocolError::Unexpected)?;
            u64::from(u16::from_be_bytes(buf))
        }
        127 => {
            let mut buf = [0u8; 8];
            r.read_exact(&mut buf)
                .await
                .map_err(|_| ProtocolError::Unexpected)?;
            u64::from_be_bytes(buf)
        }
        n => u64::from(n),
    };

    if opcode.is_control() && (len > 125 || !fin) {
        return Err(ProtocolError::Protocol);
    }
    if len as usize > MAX_FRAME_SIZE {
        return Err(ProtocolError::TooLarge);
    }

    let mut mask = [0u8; 4];
    r.read_exact(&mut mask)
        .await
        .map_err(|_| ProtocolError::Unexpected)?;

    let mut payload = vec![0u8; len as usize];
    r.read_exact(&mut payload)
        .await
        .map_err(|_| ProtocolError::Unexpected)?;
    for (i, b) in payload.iter_mut().enumerate() {
        *b ^= mask[i % 4];
    }

    Ok(Frame { fin, opcode, payload })
}

/// A fully reassembled client message (spec §4.5: "reassembled message is
/// UTF-8-validated for TEXT").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
    Control(Opcode, Vec<u8>),
}

/// Accumulates `CONTINUATION` frames into a complete message. One instance
/// per client connection (spec §3 `WSClient`: "at most one in-progress
/// inbound frame").
#[derive(Debug, Default)]
pub struct Reassembler {
    opcode: Option<Opcode>,
    buf: Vec<u8>,
}

impl Reassembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, frame: Frame) -> Result<Option<Message>, ProtocolError> {
        match frame.opcode {
            Opcode::Continuation => {
                let opcode = self.opcode.ok_or(ProtocolError::Protocol)?;
                self.buf.extend_from_slice(&frame.payload);
                if frame.fin {
                    let data = std::mem::take(&mut self.buf);
                    self.opcode = None;
                    finish(opcode, data).map(Some)
                } else {
                    Ok(None)
                }
            }
            Opcode::Text | Opcode::Binary => {
                if self.opcode.is_some() {
                    return Err(ProtocolError::Protocol);
                }
                if frame.fin {
                    finish(frame.opcode, frame.payload).map(Some)
                } else {
                    self.opcode = Some(frame.opcode);
                    self.buf = frame.payload;
                    Ok(None)
                }
            }
            Opcode::Close | Opcode::Ping | Opcode::Pong => {
                Ok(Some(Message::Control(frame.opcode, frame.payload)))
            }
        }
    }
}

fn finish(opcode: Opcode, data: Vec<u8>) -> Result<Message, ProtocolError> {
    match opcode {
        Opcode::Text => String::from_utf8(data)
            .map(Message::Text)
            .map_err(|_| ProtocolError::InvalidUtf8),
        Opcode::Binary => Ok(Message::Binary(data)),
        _ => Err(ProtocolError::Unexpected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_payload(payload: &mut [u8], mask: [u8; 4]) {
        for (i, b) in payload.iter_mut().enumerate() {
            *b ^= mask[i % 4];
        }
    }

    fn masked_frame(fin: bool, opcode: Opcode, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.push((u8::from(fin) << 7) | opcode.to_byte());
        let mask = [0x12, 0x34, 0x56, 0x78];
        let len = payload.len();
        assert!(len < 126);
        out.push(0x80 | len as u8);
        out.extend_from_slice(&mask);
        let mut masked = payload.to_vec();
        mask_payload(&mut masked, mask);
        out.extend_from_slice(&masked);
        out
    }

    #[tokio::test]
    async fn reassembles_masked_ping_frame() {
        let bytes = masked_frame(true, Opcode::Text, b"ping");
        let mut cursor = std::io::Cursor::new(bytes);
        let frame = read_frame(&mut cursor).await.unwrap();
        assert_eq!(frame.opcode, Opcode::Text);
        assert_eq!(frame.payload, b"ping");

        let mut reassembler = Reassembler::new();
        match reassembler.feed(frame).unwrap() {
            Some(Message::Text(text)) => assert_eq!(text, "ping"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unmasked_client_frame_is_a_protocol_error() {
        let mut out = vec![0x80 | Opcode::Text.to_byte(), 4];
        out.extend_from_slice(b"ping");
        let mut cursor = std::io::Cursor::new(out);
        assert_eq!(read_frame(&mut cursor).await.unwrap_err(), ProtocolError::Protocol);
    }

    #[tokio::test]
    async fn nonzero_rsv_bits_are_a_protocol_error() {
        let mut bytes = masked_frame(true, Opcode::Text, b"x");
        bytes[0] |= 0x40;
        let mut cursor = std::io::Cursor::new(bytes);
        assert_eq!(read_frame(&mut cursor).await.unwrap_err(), ProtocolError::Protocol);
    }

    #[test]
    fn invalid_utf8_text_message_is_rejected() {
        let mut reassembler = Reassembler::new();
        let frame = Frame {
            fin: true,
            opcode: Opcode::Text,
            payload: vec![0xff, 0xfe],
        };
        assert_eq!(reassembler.feed(frame).unwrap_err(), ProtocolError::InvalidUtf8);
    }

    #[test]
    fn fragmented_message_reassembles_across_continuation() {
        let mut reassembler = Reassembler::new();
        assert!(reassembler
            .feed(Frame { fin: false, opcode: Opcode::Text, payload: b"hel".to_vec() })
            .unwrap()
            .is_none());
        match reassembler
            .feed(Frame { fin: true, opcode: Opcode::Continuation, payload: b"lo".to_vec() })
            .unwrap()
        {
            Some(Message::Text(text)) => assert_eq!(text, "hello"),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
