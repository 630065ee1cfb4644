// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use studysync_server::{
    api::router,
    auth::TokenCodec,
    config::{Config, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    state::AppState,
    storage::Store,
};

/// How long in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt().with_env_filter(filter).with_target(false);

    if std::env::var(LOG_FORMAT_ENV).is_ok_and(|format| format == "json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn run() -> Result<(), BoxError> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    let config = Config::from_env()?;
    info!(?config, "Loaded configuration");

    let store = Store::open_in(&config.data_dir)?;
    let tokens = Arc::new(TokenCodec::new(&config.jwt_secret, config.jwt_ttl));
    let state = AppState::new(store, tokens, config.auth_lookup_timeout)?;
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let shutdown = CancellationToken::new();
    let handle = Handle::new();
    tokio::spawn(watch_shutdown(shutdown.clone(), handle.clone()));
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    match &config.tls {
        Some((cert, key)) => {
            let tls_config = RustlsConfig::from_pem_file(cert, key).await?;
            info!("StudySync server listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("StudySync server listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn watch_shutdown(shutdown: CancellationToken, handle: Handle<SocketAddr>) {
    shutdown.cancelled().await;
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
