//! Transparent TLS-terminating relay.
//!
//! Accepts TLS connections on one address and forwards the decrypted byte
//! stream to a plaintext TCP backend on another. The server identity is a
//! self-signed certificate generated on first run and reused afterwards.

pub mod cert;
pub mod config;
pub mod error;
pub mod proxy;

pub use cert::IdentityStore;
pub use config::Config;
pub use error::{Error, Result};
