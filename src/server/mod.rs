pub mod api;

use crate::cli::Args;
use crate::relay::ChatRelay;
use std::error::Error;
use std::net::SocketAddr;
use log::{ info, error };

pub struct Server {
    addr: String,
    relay: ChatRelay,
    args: Args,
}

impl Server {
    pub fn new(addr: String, relay: ChatRelay, args: Args) -> Self {
        Self { addr, relay, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()
            .map_err(|e| format!("Invalid server address '{}': {}", self.addr, e))?;
        let app = api::router(self.relay.clone());

        if !self.args.enable_tls {
            let listener = tokio::net::TcpListener::bind(addr).await
                .map_err(|e| format!("Failed to bind HTTP server to {}: {}", addr, e))?;
            info!("HTTP server listening on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
            return Ok(());
        }

        match (&self.args.tls_cert_path, &self.args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                    cert_path,
                    key_path
                ).await?;
                info!("HTTPS server listening on: https://{}", addr);
                axum_server::bind_rustls(addr, tls_config)
                    .serve(app.into_make_service())
                    .await?;
                Ok(())
            }
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                Err("Missing TLS certificate or key path".into())
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                Err("TLS enabled without cert/key".into())
            }
        }
    }
}
