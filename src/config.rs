use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Runtime configuration, populated from command-line flags.
#[derive(Debug, Clone, Parser)]
#[command(name = "tls-relay", version, about = "TLS-terminating relay for a plaintext TCP backend")]
pub struct Config {
    /// Address to accept TLS connections on
    #[arg(long, default_value = "127.0.0.1:50002")]
    pub listen_addr: SocketAddr,

    /// Plaintext TCP backend to relay decrypted traffic to
    #[arg(long, default_value = "127.0.0.1:50001")]
    pub backend_addr: SocketAddr,

    /// Path of the PEM-encoded server certificate
    #[arg(long, default_value = "cert.pem")]
    pub cert_path: PathBuf,

    /// Path of the PEM-encoded server private key
    #[arg(long, default_value = "key.pem")]
    pub key_path: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::parse_from(["tls-relay"]);
        assert_eq!(config.listen_addr, "127.0.0.1:50002".parse().unwrap());
        assert_eq!(config.backend_addr, "127.0.0.1:50001".parse().unwrap());
        assert_eq!(config.cert_path, PathBuf::from("cert.pem"));
        assert_eq!(config.key_path, PathBuf::from("key.pem"));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::parse_from([
            "tls-relay",
            "--listen-addr",
            "0.0.0.0:8443",
            "--backend-addr",
            "10.0.0.5:80",
            "--log-format",
            "json",
        ]);
        assert_eq!(config.listen_addr, "0.0.0.0:8443".parse().unwrap());
        assert_eq!(config.backend_addr, "10.0.0.5:80".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
