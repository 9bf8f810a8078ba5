//! Optional TLS termination for the WebSocket listener (spec §4.5:
//! "TLS is optional; when enabled, the server transitions each client
//! through an `SSL_accept` state machine before any framing").
//!
//! Grounded on the pack's TLS-serving examples, which build a
//! `rustls::ServerConfig` from a PEM cert chain plus PEM private key and
//! wrap the listener in a `tokio_rustls::TlsAcceptor` rather than drive
//! OpenSSL's state machine by hand — `tokio_rustls::Accept`'s own future
//! already is that state machine.

use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;

use vantage_types::ConfigError;

pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, ConfigError> {
    let cert_chain = load_certs(cert_path)?;
    let key = load_key(key_path)?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)
        .map_err(|e| ConfigError::Other(format!("building TLS server config: {e}")))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ConfigError> {
    let file = std::fs::File::open(path)
        .map_err(|e| ConfigError::Other(format!("opening cert file {}: {e}", path.display())))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::Other(format!("parsing cert file {}: {e}", path.display())))
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, ConfigError> {
    let file = std::fs::File::open(path)
        .map_err(|e| ConfigError::Other(format!("opening key file {}: {e}", path.display())))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| ConfigError::Other(format!("parsing key file {}: {e}", path.display())))?
        .ok_or_else(|| ConfigError::Other(format!("no private key found in {}", path.display())))
}
