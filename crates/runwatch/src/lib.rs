// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runwatch: live CI run monitor.
//!
//! Triggers workflow runs by committing to a sentinel status file and streams
//! run/job/step status to WebSocket subscribers by polling the upstream
//! provider on a fixed interval. One poll task serves all subscribers.

pub mod config;
pub mod credential;
pub mod engine;
pub mod error;
pub mod events;
pub mod provider;
pub mod registry;
pub mod state;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::credential::manager::TokenManager;
use crate::credential::mint::AppTokenMinter;
use crate::engine::MonitorEngine;
use crate::provider::client::GitHubClient;
use crate::provider::RunProvider;
use crate::registry::ConnectionRegistry;
use crate::state::AppState;
use crate::transport::build_router;

/// User agent presented on upstream API calls (GitHub rejects requests
/// without one).
pub const USER_AGENT: &str = concat!("runwatch/", env!("CARGO_PKG_VERSION"));

/// Run the monitor server until shutdown.
pub async fn run(config: MonitorConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();
    let registry = Arc::new(ConnectionRegistry::new());

    // Missing credentials disable monitoring but keep the server up: the
    // connection layer still greets subscribers and answers with errors.
    let (provider, engine) = match credential::load_credentials(&config) {
        Ok(creds) => {
            let http = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default();
            let minter =
                Arc::new(AppTokenMinter::new(http.clone(), config.api_base.clone(), &creds));
            let tokens = TokenManager::new(minter, config.token_margin());
            tokens.spawn_renewal(config.renew_lead(), shutdown.clone());

            let client: Arc<dyn RunProvider> = Arc::new(GitHubClient::new(
                http,
                config.api_base.clone(),
                creds.owner,
                creds.repo,
                tokens,
            ));
            let engine = MonitorEngine::new(
                Arc::clone(&client),
                Arc::clone(&registry),
                config.poll_interval(),
                config.discover_delay(),
                config.runs_page,
            );
            (Some(client), Some(engine))
        }
        Err(e) => {
            tracing::warn!(err = %e, "credentials unavailable, monitoring disabled");
            (None, None)
        }
    };

    let monitoring = if engine.is_some() { "enabled" } else { "disabled" };
    let state = Arc::new(AppState {
        config,
        registry,
        provider,
        engine,
        shutdown: shutdown.clone(),
    });

    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("runwatch listening on {addr} (monitoring {monitoring})");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}
