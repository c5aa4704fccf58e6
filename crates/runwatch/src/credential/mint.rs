// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App token minting: a signed short-lived assertion is exchanged for an
//! installation-scoped bearer token.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credential::{BearerToken, ProviderCredentials, TokenMinter};
use crate::error::ApiError;
use crate::state::epoch_secs;

/// Clock-skew buffer subtracted from the assertion's issued-at.
const ISSUED_AT_SKEW_SECS: u64 = 60;
/// Assertion lifetime.
const ASSERTION_TTL_SECS: u64 = 600;
/// Assumed bearer token lifetime when upstream omits an expiry.
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Serialize)]
struct AppClaims {
    iat: u64,
    exp: u64,
    iss: String,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    token: String,
    #[serde(default)]
    expires_at: Option<String>,
}

/// Mints installation tokens from the long-lived app signing key.
///
/// Never retries: retry policy belongs to the token manager.
pub struct AppTokenMinter {
    http: reqwest::Client,
    api_base: String,
    app_id: String,
    installation_id: String,
    signing_key: String,
}

impl AppTokenMinter {
    pub fn new(http: reqwest::Client, api_base: String, creds: &ProviderCredentials) -> Self {
        Self {
            http,
            api_base,
            app_id: creds.app_id.clone(),
            installation_id: creds.installation_id.clone(),
            signing_key: creds.signing_key.clone(),
        }
    }

    /// Build the short-lived RS256 app assertion.
    fn app_assertion(&self) -> Result<String, ApiError> {
        let now = epoch_secs();
        let claims = AppClaims {
            iat: now.saturating_sub(ISSUED_AT_SKEW_SECS),
            exp: now + ASSERTION_TTL_SECS,
            iss: self.app_id.clone(),
        };
        let key = jsonwebtoken::EncodingKey::from_rsa_pem(self.signing_key.as_bytes())
            .map_err(|e| ApiError::Credential(format!("invalid signing key: {e}")))?;
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &key,
        )
        .map_err(|e| ApiError::Credential(format!("failed to sign assertion: {e}")))
    }
}

#[async_trait]
impl TokenMinter for AppTokenMinter {
    async fn mint(&self) -> Result<BearerToken, ApiError> {
        let assertion = self.app_assertion()?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base, self.installation_id
        );
        let resp = self
            .http
            .post(&url)
            .bearer_auth(assertion)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Credential(format!(
                "token exchange rejected ({status}): {body}"
            )));
        }

        let body: AccessTokenResponse =
            resp.json().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let expires_at = body
            .expires_at
            .as_deref()
            .and_then(parse_expiry)
            .unwrap_or_else(|| epoch_secs() + DEFAULT_TOKEN_TTL_SECS);

        Ok(BearerToken { value: body.token, expires_at })
    }
}

/// Parse an RFC 3339 expiry into epoch seconds.
fn parse_expiry(raw: &str) -> Option<u64> {
    chrono::DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.timestamp().max(0) as u64)
}

#[cfg(test)]
#[path = "mint_tests.rs"]
mod tests;
