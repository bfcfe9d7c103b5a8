use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tls_relay::config::{Config, LogFormat};
use tls_relay::{cert, proxy};

#[tokio::main]
async fn main() {
    let config = Config::parse();
    init_logging(config.log_format);

    info!(
        listen = %config.listen_addr,
        backend = %config.backend_addr,
        cert = %config.cert_path.display(),
        "tls-relay starting"
    );

    if let Err(e) = run(config).await {
        error!(error = %e, "tls-relay exited with error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> tls_relay::Result<()> {
    let store = cert::IdentityStore::new(&config.cert_path, &config.key_path);
    let (certs, key) = store.ensure().await?;
    let server_config = cert::build_server_config(certs, key)?;

    proxy::tls_acceptor::run(config.listen_addr, config.backend_addr, server_config).await
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
}
