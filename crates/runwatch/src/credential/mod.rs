// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credentials: loading long-lived inputs, minting short-lived bearer
//! tokens, and keeping the current token fresh.

pub mod manager;
pub mod mint;

use std::path::Path;

use async_trait::async_trait;

use crate::config::MonitorConfig;
use crate::error::ApiError;

/// Short-lived bearer credential presented on upstream calls.
///
/// Owned by the [`manager::TokenManager`]; replaced whole on renewal,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
    /// Absolute expiry, epoch seconds.
    pub expires_at: u64,
}

impl BearerToken {
    /// Remaining lifetime in seconds (zero when already expired).
    pub fn remaining_secs(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }
}

/// Long-lived inputs needed to mint provider tokens.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    /// PEM-encoded private key used to sign the app assertion.
    pub signing_key: String,
    pub app_id: String,
    pub installation_id: String,
    pub owner: String,
    pub repo: String,
}

/// Source of fresh bearer tokens.
#[async_trait]
pub trait TokenMinter: Send + Sync {
    async fn mint(&self) -> Result<BearerToken, ApiError>;
}

/// Secret file names as laid out in a secret-store mount.
const SECRET_OWNER: &str = "github-repo-owner";
const SECRET_REPO: &str = "github-repo-name";
const SECRET_APP_ID: &str = "github-app-id";
const SECRET_INSTALLATION_ID: &str = "github-app-installation-id";
const SECRET_PRIVATE_KEY: &str = "github-app-private-key";

/// Load credentials from the secrets directory with flag/env fallback.
///
/// Failure disables the monitoring features but never aborts the server.
pub fn load_credentials(config: &MonitorConfig) -> anyhow::Result<ProviderCredentials> {
    let dir = config.secrets_dir.as_deref();

    let owner = secret_or(dir, SECRET_OWNER, config.owner.as_deref())
        .ok_or_else(|| anyhow::anyhow!("repository owner not configured"))?;
    let repo = secret_or(dir, SECRET_REPO, config.repo.as_deref())
        .ok_or_else(|| anyhow::anyhow!("repository name not configured"))?;
    let app_id = secret_or(dir, SECRET_APP_ID, config.app_id.as_deref())
        .ok_or_else(|| anyhow::anyhow!("app id not configured"))?;
    let installation_id =
        secret_or(dir, SECRET_INSTALLATION_ID, config.installation_id.as_deref())
            .ok_or_else(|| anyhow::anyhow!("installation id not configured"))?;

    let signing_key = match secret_or(dir, SECRET_PRIVATE_KEY, None) {
        Some(key) => key,
        None => {
            let path = config
                .private_key_path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("signing key not configured"))?;
            std::fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("failed to read signing key {}: {e}", path.display())
            })?
        }
    };

    Ok(ProviderCredentials { signing_key, app_id, installation_id, owner, repo })
}

/// Read one secret file from `dir`, falling back to `fallback`.
///
/// Empty or unreadable files count as absent.
fn secret_or(dir: Option<&Path>, name: &str, fallback: Option<&str>) -> Option<String> {
    if let Some(dir) = dir {
        if let Ok(contents) = std::fs::read_to_string(dir.join(name)) {
            let trimmed = contents.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_owned());
            }
        }
    }
    fallback.map(str::to_owned)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
