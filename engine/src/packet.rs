//! FIFO packet framing (spec §6 "FIFO packet"): `be_u32 listener, be_u32
//! opcode, be_u32 length, bytes[length]`, in both directions.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use vantage_types::ProtocolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub listener: u32,
    pub opcode: u32,
    pub payload: Vec<u8>,
}

pub async fn write_packet<W: AsyncWrite + Unpin>(w: &mut W, packet: &Packet) -> Result<(), ProtocolError> {
    w.write_u32(packet.listener)
        .await
        .map_err(|_| ProtocolError::Unexpected)?;
    w.write_u32(packet.opcode)
        .await
        .map_err(|_| ProtocolError::Unexpected)?;
    w.write_u32(packet.payload.len() as u32)
        .await
        .map_err(|_| ProtocolError::Unexpected)?;
    w.write_all(&packet.payload)
        .await
        .map_err(|_| ProtocolError::Unexpected)?;
    w.flush().await.map_err(|_| ProtocolError::Unexpected)?;
    Ok(())
}

pub async fn read_packet<R: AsyncRead + Unpin>(r: &mut R) -> Result<Packet, ProtocolError> {
    let listener = r.read_u32().await.map_err(|_| ProtocolError::Unexpected)?;
    let opcode = r.read_u32().await.map_err(|_| ProtocolError::Unexpected)?;
    let length = r.read_u32().await.map_err(|_| ProtocolError::Unexpected)?;

    if length as usize > crate::frame::MAX_FRAME_SIZE {
        return Err(ProtocolError::TooLarge);
    }

    let mut payload = vec![0u8; length as usize];
    r.read_exact(&mut payload)
        .await
        .map_err(|_| ProtocolError::Unexpected)?;

    Ok(Packet { listener, opcode, payload })
}
