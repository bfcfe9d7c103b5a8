use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("key generation failed: {0}")]
    KeyGen(String),

    #[error("certificate generation failed: {0}")]
    CertGen(String),

    #[error("certificate parse error: {0}")]
    CertParse(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
