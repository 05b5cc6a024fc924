// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Same-origin content proxy for SCORM packages.
//! The player frame loads `/scorm-proxy/{ticket}/{packageId}/...` from the
//! page origin; the gateway rewrites it onto package storage and streams the
//! response back.

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use clap::Parser;
use scorm_app_core::ConfigService;
use scorm_config_fs::FsConfigStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

mod prefs;
mod proxy;

use prefs::{GatewayPrefs, Overrides};

#[derive(Parser, Debug)]
#[command(author, version, about = "SCORM same-origin content proxy")]
struct Args {
    /// TCP listener for content requests (overrides stored prefs)
    #[arg(long)]
    listen: Option<SocketAddr>,
    /// Package storage base URL (overrides stored prefs)
    #[arg(long)]
    upstream: Option<Url>,
    /// Directory holding `proxy_gateway.json` (default: platform config dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// TLS certificate (PEM). If provided, key must also be provided.
    #[arg(long)]
    tls_cert: Option<PathBuf>,
    /// TLS private key (PEM). If provided, cert must also be provided.
    #[arg(long)]
    tls_key: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("open config store")?;
    let prefs = GatewayPrefs::load(&ConfigService::new(store));
    let settings = prefs
        .resolve(Overrides {
            listen: args.listen,
            upstream: args.upstream,
        })
        .context("resolve gateway settings")?;

    let http = reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .build()
        .context("build upstream http client")?;
    let app = proxy::router(proxy::Gateway::new(settings.upstream.clone(), http));

    let handle = Handle::new();
    // graceful shutdown on Ctrl+C
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to install ctrl-c handler");
            return;
        }
        info!("shutting down");
        shutdown.graceful_shutdown(None);
    });

    match (args.tls_cert, args.tls_key) {
        (Some(cert), Some(key)) => {
            let tls_config = load_tls(cert, key).await.context("load tls config")?;
            info!(listen = %settings.listen, upstream = %settings.upstream, "scorm proxy listening (TLS)");
            axum_server::bind_rustls(settings.listen, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        (None, None) => {
            info!(listen = %settings.listen, upstream = %settings.upstream, "scorm proxy listening");
            axum_server::bind(settings.listen)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        _ => {
            return Err(anyhow!(
                "must provide both --tls-cert and --tls-key or neither"
            ))
        }
    }

    Ok(())
}

async fn load_tls(cert_path: PathBuf, key_path: PathBuf) -> Result<RustlsConfig> {
    let cfg = RustlsConfig::from_pem_file(cert_path, key_path).await?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn flags_parse_into_overrides() {
        let args = Args::try_parse_from([
            "scorm-proxy-gateway",
            "--listen",
            "0.0.0.0:9000",
            "--upstream",
            "https://storage.example.edu/api/",
        ])
        .unwrap();
        assert_eq!(args.listen.unwrap().port(), 9000);
        assert_eq!(args.upstream.unwrap().host_str(), Some("storage.example.edu"));
        assert!(args.tls_cert.is_none() && args.tls_key.is_none());
    }

    #[test]
    fn no_flags_defer_to_prefs() {
        let args = Args::try_parse_from(["scorm-proxy-gateway"]).unwrap();
        assert!(args.listen.is_none());
        assert!(args.config_dir.is_none());
    }
}
