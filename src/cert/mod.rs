pub mod selfsigned;
pub mod store;

use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;

pub use store::IdentityStore;

use crate::error::{Error, Result};

/// ALPN identifier advertised to clients. Bytes are relayed opaquely
/// regardless of what the client actually speaks.
const ALPN_HTTP1: &[u8] = b"http/1.1";

/// Build a rustls server config from the loaded identity.
pub fn build_server_config(
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<Arc<ServerConfig>> {
    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| Error::Tls(format!("failed to build TLS server config: {e}")))?;
    config.alpn_protocols = vec![ALPN_HTTP1.to_vec()];
    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loaded_identity_builds_a_server_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::new(dir.path().join("cert.pem"), dir.path().join("key.pem"));

        let (certs, key) = store.ensure().await.unwrap();
        let config = build_server_config(certs, key).unwrap();
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }
}
