use std::path::{Path, PathBuf};

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls_pemfile::Item;
use tokio::fs;
use tracing::info;

use crate::cert::selfsigned::{self, GeneratedIdentity};
use crate::error::{Error, Result};

/// Persists the server identity and guarantees one exists before startup.
pub struct IdentityStore {
    cert_path: PathBuf,
    key_path: PathBuf,
}

impl IdentityStore {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }

    /// Generate the identity if the certificate file is missing, then load
    /// both files back from disk.
    ///
    /// Only the certificate's presence is checked; a regeneration overwrites
    /// the key file as well. Not safe against concurrent processes sharing
    /// the same paths.
    pub async fn ensure(&self) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
        if !fs::try_exists(&self.cert_path).await? {
            info!(
                cert = %self.cert_path.display(),
                "no certificate on disk, generating a new identity"
            );
            let identity = selfsigned::generate()?;
            self.write(&identity).await?;
        }

        let cert = self.load_certificate().await?;
        let key = self.load_private_key().await?;
        Ok((vec![cert], key))
    }

    /// Write the certificate and key files atomically.
    async fn write(&self, identity: &GeneratedIdentity) -> Result<()> {
        atomic_write(&self.cert_path, &identity.cert_pem).await?;
        atomic_write(&self.key_path, &identity.key_pem).await?;
        info!(
            cert = %self.cert_path.display(),
            key = %self.key_path.display(),
            "identity files written"
        );
        Ok(())
    }

    async fn load_certificate(&self) -> Result<CertificateDer<'static>> {
        let data = fs::read(&self.cert_path).await?;
        match single_block(&self.cert_path, &data)? {
            Item::X509Certificate(cert) => Ok(cert),
            other => Err(Error::CertParse(format!(
                "{}: expected a CERTIFICATE block, found {}",
                self.cert_path.display(),
                block_type(&other)
            ))),
        }
    }

    async fn load_private_key(&self) -> Result<PrivateKeyDer<'static>> {
        let data = fs::read(&self.key_path).await?;
        match single_block(&self.key_path, &data)? {
            Item::Pkcs8Key(key) => Ok(key.into()),
            Item::Pkcs1Key(key) => Ok(key.into()),
            Item::Sec1Key(key) => Ok(key.into()),
            other => Err(Error::CertParse(format!(
                "{}: expected a private key block, found {}",
                self.key_path.display(),
                block_type(&other)
            ))),
        }
    }
}

const PEM_BEGIN: &[u8] = b"-----BEGIN ";

/// Decode exactly one PEM block from `data`.
///
/// Zero blocks or more than one block is an error, never repaired. The
/// section count is taken from the raw delimiters because rustls-pemfile
/// skips sections whose type tag it does not recognize; a stray block of
/// any type must still be fatal.
fn single_block(path: &Path, data: &[u8]) -> Result<Item> {
    let sections = data
        .windows(PEM_BEGIN.len())
        .filter(|w| *w == PEM_BEGIN)
        .count();
    if sections != 1 {
        return Err(Error::CertParse(format!(
            "{}: expected exactly one PEM block, found {sections}",
            path.display()
        )));
    }

    let mut reader = &data[..];
    let mut items = rustls_pemfile::read_all(&mut reader);
    match items.next() {
        Some(item) => item.map_err(|e| Error::CertParse(format!("{}: {e}", path.display()))),
        None => Err(Error::CertParse(format!(
            "{}: unrecognized PEM block type",
            path.display()
        ))),
    }
}

fn block_type(item: &Item) -> &'static str {
    match item {
        Item::X509Certificate(_) => "CERTIFICATE",
        Item::Pkcs1Key(_) => "RSA PRIVATE KEY",
        Item::Pkcs8Key(_) => "PRIVATE KEY",
        Item::Sec1Key(_) => "EC PRIVATE KEY",
        Item::Crl(_) => "X509 CRL",
        Item::Csr(_) => "CERTIFICATE REQUEST",
        _ => "an unrecognized block",
    }
}

/// Write `contents` to `path` atomically via a temporary file + rename.
async fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
