//! The inbound/outbound named-pipe bridge (spec §4.5 "Outbound path" /
//! §6 "FIFO packet"), plus an in-memory fallback transport so the crate and
//! its tests never require a real filesystem pipe when `--fifo-in`/
//! `--fifo-out` are left unset.
//!
//! Grounded on `original_source`'s `tcabinet.c`/event-loop convention of
//! treating the FIFO as just another `select(2)` fd: here each direction is
//! a boxed `AsyncRead`/`AsyncWrite`, so the server code driving them never
//! needs to know whether bytes cross a real pipe or an in-process channel.

use std::path::Path;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

use vantage_types::ConfigError;

pub type DynReader = Pin<Box<dyn AsyncRead + Send>>;
pub type DynWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Create (if needed) and open a Unix named pipe for reading.
#[cfg(unix)]
pub async fn open_fifo_reader(path: &Path) -> Result<DynReader, ConfigError> {
    ensure_fifo(path)?;
    let file = tokio::fs::OpenOptions::new()
        .read(true)
        .open(path)
        .await
        .map_err(|e| ConfigError::Other(format!("opening fifo {}: {e}", path.display())))?;
    Ok(Box::pin(file))
}

/// Create (if needed) and open a Unix named pipe for writing.
#[cfg(unix)]
pub async fn open_fifo_writer(path: &Path) -> Result<DynWriter, ConfigError> {
    ensure_fifo(path)?;
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(|e| ConfigError::Other(format!("opening fifo {}: {e}", path.display())))?;
    Ok(Box::pin(file))
}

#[cfg(unix)]
fn ensure_fifo(path: &Path) -> Result<(), ConfigError> {
    use std::ffi::CString;

    if path.exists() {
        return Ok(());
    }
    let c_path = CString::new(path.as_os_str().as_encoded_bytes())
        .map_err(|_| ConfigError::Other(format!("fifo path {} contains a NUL byte", path.display())))?;
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
    if rc != 0 {
        return Err(ConfigError::Other(format!(
            "mkfifo {} failed: {}",
            path.display(),
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn open_fifo_reader(_path: &Path) -> Result<DynReader, ConfigError> {
    Err(ConfigError::Other("named pipes are only supported on unix".to_string()))
}

#[cfg(not(unix))]
pub async fn open_fifo_writer(_path: &Path) -> Result<DynWriter, ConfigError> {
    Err(ConfigError::Other("named pipes are only supported on unix".to_string()))
}

/// An in-memory duplex pair standing in for a FIFO when none is configured.
/// Returns `(reader, writer)` for the "server" end; the caller keeps the
/// peer end for test drivers or a loopback consumer.
#[must_use]
pub fn in_memory_pipe() -> (DynReader, DynWriter, tokio::io::DuplexStream) {
    let (server_end, peer_end) = tokio::io::duplex(64 * 1024);
    let (read_half, write_half) = tokio::io::split(server_end);
    (Box::pin(read_half), Box::pin(write_half), peer_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{Packet, read_packet, write_packet};

    #[tokio::test]
    async fn in_memory_pipe_carries_a_packet_to_its_peer() {
        let (_reader, mut writer, mut peer) = in_memory_pipe();
        let packet = Packet { listener: 3, opcode: 1, payload: b"tick".to_vec() };
        write_packet(&mut writer, &packet).await.unwrap();
        let read_back = read_packet(&mut peer).await.unwrap();
        assert_eq!(read_back, packet);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn mkfifo_creates_a_real_named_pipe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vantage.fifo");
        ensure_fifo(&path).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        use std::os::unix::fs::FileTypeExt;
        assert!(metadata.file_type().is_fifo());
    }
}
