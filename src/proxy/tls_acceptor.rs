use std::net::SocketAddr;
use std::sync::Arc;

use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::proxy::forwarder;

/// Run the TLS relay listener.
///
/// Accepts TLS connections, terminates TLS, and relays plaintext to the
/// backend address. Bind and accept failures are fatal and propagate to the
/// caller; handshake and dial failures cost only the affected connection.
pub async fn run(
    listen_addr: SocketAddr,
    backend_addr: SocketAddr,
    server_config: Arc<ServerConfig>,
) -> Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    serve(listener, backend_addr, server_config).await
}

/// Accept loop over an already-bound listener.
pub async fn serve(
    listener: TcpListener,
    backend_addr: SocketAddr,
    server_config: Arc<ServerConfig>,
) -> Result<()> {
    let acceptor = TlsAcceptor::from(server_config);
    info!(addr = %listener.local_addr()?, "TLS relay listening");

    loop {
        let (tcp_stream, peer_addr) = listener.accept().await?;
        debug!(peer = %peer_addr, "accepted TCP connection");

        let acceptor = acceptor.clone();
        tokio::spawn(async move {
            match acceptor.accept(tcp_stream).await {
                Ok(tls_stream) => {
                    if let Err(e) = forwarder::forward(tls_stream, backend_addr).await {
                        warn!(peer = %peer_addr, error = %e, "relay to backend failed");
                    }
                }
                Err(e) => {
                    debug!(peer = %peer_addr, error = %e, "TLS handshake failed");
                }
            }
        });
    }
}
