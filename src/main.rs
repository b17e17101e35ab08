// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;

use givechain_server::api::router;
use givechain_server::config::Settings;
use givechain_server::state::AppState;
use givechain_server::storage::DonationLedger;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    // Fatal: refuse to start with credentials or a network we cannot trust.
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let db_path = settings.data_dir.join("donations.redb");
    let ledger = match DonationLedger::open(&db_path) {
        Ok(ledger) => ledger,
        Err(e) => {
            tracing::error!(error = %e, path = %db_path.display(), "Failed to open donation ledger");
            std::process::exit(1);
        }
    };

    tracing::info!(
        network = settings.ledger.network.name(),
        mirror = %settings.mirror.base_url,
        "Donation settlement service starting"
    );

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .expect("Failed to parse bind address");

    let state = AppState::new(settings, ledger);
    let app = router(state);

    // Graceful shutdown: drain in-flight requests on SIGINT.
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!("Givechain server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .expect("HTTP server failed");
}
