// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token lifecycle: single-flight renewal with proactive scheduled refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::credential::{BearerToken, TokenMinter};
use crate::error::ApiError;
use crate::state::epoch_secs;

/// Delay before the one extra retry after a failed scheduled renewal.
const RETRY_DELAY: Duration = Duration::from_secs(60);

/// Lifecycle state of the managed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Uninitialized,
    Minting,
    Valid,
    Renewing,
    Invalid,
}

struct TokenSlot {
    token: Option<BearerToken>,
    status: TokenStatus,
}

/// Owns the current bearer token and keeps it fresh.
///
/// Renewal is single-flight: callers that find the token stale queue on
/// `renew_gate`, and whoever acquires it first mints while the rest re-check
/// and reuse the replacement. The slot is swapped whole, so readers never
/// observe a half-updated token.
pub struct TokenManager {
    minter: Arc<dyn TokenMinter>,
    margin: Duration,
    slot: RwLock<TokenSlot>,
    renew_gate: Mutex<()>,
}

impl TokenManager {
    pub fn new(minter: Arc<dyn TokenMinter>, margin: Duration) -> Arc<Self> {
        Arc::new(Self {
            minter,
            margin,
            slot: RwLock::new(TokenSlot { token: None, status: TokenStatus::Uninitialized }),
            renew_gate: Mutex::new(()),
        })
    }

    /// Current lifecycle status.
    pub async fn status(&self) -> TokenStatus {
        self.slot.read().await.status
    }

    /// Return a token with at least the safety margin of lifetime left,
    /// renewing first when the cached one is stale.
    pub async fn get_valid_token(&self) -> Result<BearerToken, ApiError> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let _gate = self.renew_gate.lock().await;
        // An in-flight renewal may have finished while we waited on the gate.
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }
        self.mint_locked().await
    }

    /// Renew only if `observed` is still the current token value.
    ///
    /// Used by the auth-retry path: when several calls fail on the same stale
    /// token, only the first triggers a mint; the rest see the replacement.
    pub async fn renew_if_current(&self, observed: &str) -> Result<(), ApiError> {
        let _gate = self.renew_gate.lock().await;
        {
            let slot = self.slot.read().await;
            if let Some(token) = slot.token.as_ref() {
                if token.value != observed {
                    return Ok(());
                }
            }
        }
        self.mint_locked().await.map(|_| ())
    }

    /// Unconditional renewal, used by the scheduled refresh task.
    pub async fn force_renew(&self) -> Result<BearerToken, ApiError> {
        let _gate = self.renew_gate.lock().await;
        self.mint_locked().await
    }

    async fn fresh_token(&self) -> Option<BearerToken> {
        let slot = self.slot.read().await;
        slot.token.as_ref().filter(|t| self.is_fresh(t)).cloned()
    }

    fn is_fresh(&self, token: &BearerToken) -> bool {
        token.remaining_secs(epoch_secs()) >= self.margin.as_secs()
    }

    /// Mint while holding the renewal gate, then swap the slot whole.
    async fn mint_locked(&self) -> Result<BearerToken, ApiError> {
        {
            let mut slot = self.slot.write().await;
            slot.status = if slot.token.is_some() {
                TokenStatus::Renewing
            } else {
                TokenStatus::Minting
            };
        }

        match self.minter.mint().await {
            Ok(token) => {
                let mut slot = self.slot.write().await;
                slot.token = Some(token.clone());
                slot.status = TokenStatus::Valid;
                tracing::info!(
                    expires_in = token.remaining_secs(epoch_secs()),
                    "bearer token renewed"
                );
                Ok(token)
            }
            Err(e) => {
                let mut slot = self.slot.write().await;
                slot.token = None;
                slot.status = TokenStatus::Invalid;
                tracing::warn!(err = %e, "token mint failed");
                Err(e)
            }
        }
    }

    /// Spawn the proactive renewal task.
    ///
    /// Sleeps until `lead` before expiry, renews, and on failure retries once
    /// after a short delay before falling back to access-triggered minting.
    pub fn spawn_renewal(self: &Arc<Self>, lead: Duration, cancel: CancellationToken) {
        let mgr = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let delay = mgr.next_renewal_delay(lead).await;
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
                if mgr.force_renew().await.is_ok() {
                    continue;
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
                if let Err(e) = mgr.force_renew().await {
                    tracing::warn!(err = %e, "scheduled renewal retry failed, next access will re-mint");
                }
            }
        });
    }

    async fn next_renewal_delay(&self, lead: Duration) -> Duration {
        let slot = self.slot.read().await;
        match slot.token.as_ref() {
            Some(token) => {
                let renew_at = token.expires_at.saturating_sub(lead.as_secs());
                Duration::from_secs(renew_at.saturating_sub(epoch_secs()).max(30))
            }
            // No token yet: the first scheduled pass doubles as the initial mint.
            None => Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
