// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::engine::MonitorEngine;
use crate::provider::RunProvider;
use crate::registry::ConnectionRegistry;

/// Shared server state handed to every transport handler.
pub struct AppState {
    pub config: MonitorConfig,
    pub registry: Arc<ConnectionRegistry>,
    /// Present only when credentials loaded successfully at startup.
    pub provider: Option<Arc<dyn RunProvider>>,
    pub engine: Option<Arc<MonitorEngine>>,
    pub shutdown: CancellationToken,
}

/// Return current epoch seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
