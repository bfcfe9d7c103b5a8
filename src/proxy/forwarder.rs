use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;
use tracing::debug;

use crate::error::Result;

const COPY_BUF_SIZE: usize = 1024;

/// Relay a TLS-terminated connection to the plaintext backend.
///
/// Dials the backend, then runs one copy task per direction until both
/// directions have ended. A dial failure affects only this connection.
pub async fn forward(tls_stream: TlsStream<TcpStream>, backend_addr: SocketAddr) -> Result<()> {
    let backend = TcpStream::connect(backend_addr).await?;

    let (client_read, client_write) = tokio::io::split(tls_stream);
    let (backend_read, backend_write) = backend.into_split();

    let client_to_backend = tokio::spawn(copy_until_closed(client_read, backend_write));
    let backend_to_client = tokio::spawn(copy_until_closed(backend_read, client_write));

    let (sent, received) = tokio::join!(client_to_backend, backend_to_client);

    debug!(
        client_to_backend = sent.unwrap_or_default(),
        backend_to_client = received.unwrap_or_default(),
        "connection closed"
    );

    Ok(())
}

/// Copy bytes from `src` to `dst` until the read side ends.
///
/// End-of-stream and read errors are not distinguished; a write error ends
/// the task the same way. On exit the destination's write half is shut down
/// so the peer observes EOF and the opposite direction can wind down.
async fn copy_until_closed<R, W>(mut src: R, mut dst: W) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; COPY_BUF_SIZE];
    let mut total = 0u64;

    loop {
        match src.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if dst.write_all(&buf[..n]).await.is_err() {
                    break;
                }
                total += n as u64;
            }
            Err(_) => break,
        }
    }

    let _ = dst.shutdown().await;
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copies_all_bytes_then_propagates_eof() {
        let (client, mut client_far) = tokio::io::duplex(8192);
        let (server, mut server_far) = tokio::io::duplex(8192);

        let (src, _client_wr) = tokio::io::split(client);
        let (_server_rd, dst) = tokio::io::split(server);
        let task = tokio::spawn(copy_until_closed(src, dst));

        let payload = vec![0xa5u8; 5000];
        client_far.write_all(&payload).await.unwrap();
        client_far.shutdown().await.unwrap();

        let mut out = Vec::new();
        server_far.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, payload);
        assert_eq!(task.await.unwrap(), payload.len() as u64);
    }

    #[tokio::test]
    async fn destination_failure_ends_the_task() {
        let (client, mut client_far) = tokio::io::duplex(64);
        let (server, server_far) = tokio::io::duplex(64);

        let (src, _client_wr) = tokio::io::split(client);
        let (_server_rd, dst) = tokio::io::split(server);
        drop(server_far);

        let task = tokio::spawn(copy_until_closed(src, dst));

        // Keep feeding until the broken destination is noticed.
        let feeder = tokio::spawn(async move {
            let chunk = [0u8; 512];
            while client_far.write_all(&chunk).await.is_ok() {}
        });

        task.await.unwrap();
        feeder.abort();
    }
}
