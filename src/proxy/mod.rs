pub mod forwarder;
pub mod tls_acceptor;
