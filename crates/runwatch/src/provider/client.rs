// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub Run Provider client with renew-and-retry on auth failures.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::credential::manager::TokenManager;
use crate::credential::BearerToken;
use crate::error::ApiError;
use crate::provider::{CommitResult, JobRecord, RunProvider, RunRecord};
use crate::state::epoch_ms;

/// Sentinel file whose commits cause the provider's automation to start a run.
const STATUS_FILE_PATH: &str = "ci-status.txt";

const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Deserialize)]
struct RunsResponse {
    #[serde(default)]
    workflow_runs: Vec<RunRecord>,
}

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<JobRecord>,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct UpdateFileResponse {
    commit: CommitInfo,
}

/// Typed wrapper over the provider REST API for one repository.
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    tokens: Arc<TokenManager>,
}

impl GitHubClient {
    pub fn new(
        http: reqwest::Client,
        api_base: String,
        owner: String,
        repo: String,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self { http, api_base, owner, repo, tokens }
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_base, self.owner, self.repo, path)
    }

    fn get(&self, url: &str, token: &BearerToken) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&token.value)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(API_VERSION_HEADER, API_VERSION)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
    }

    fn put(&self, url: &str, token: &BearerToken) -> reqwest::RequestBuilder {
        self.http
            .put(url)
            .bearer_auth(&token.value)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(API_VERSION_HEADER, API_VERSION)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
    }

    /// Run `op` once; on an auth-class failure renew the token (deduplicated
    /// against concurrent failures on the same token) and retry exactly once.
    async fn execute_with_retry<T, F, Fut>(&self, op: F) -> Result<T, ApiError>
    where
        F: Fn(BearerToken) -> Fut,
        Fut: std::future::Future<Output = Result<T, ApiError>>,
    {
        let token = self.tokens.get_valid_token().await?;
        match op(token.clone()).await {
            Err(e) if e.is_auth() => {
                tracing::debug!(err = %e, "auth failure, renewing token and retrying once");
                self.tokens.renew_if_current(&token.value).await?;
                let fresh = self.tokens.get_valid_token().await?;
                op(fresh).await
            }
            other => other,
        }
    }

    async fn list_runs_once(
        &self,
        limit: u32,
        token: BearerToken,
    ) -> Result<Vec<RunRecord>, ApiError> {
        let url = self.repo_url(&format!("/actions/runs?per_page={limit}"));
        let resp = self.get(&url, &token).send().await?;
        let resp = check_status(resp).await?;
        let body: RunsResponse =
            resp.json().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(body.workflow_runs)
    }

    async fn list_jobs_once(
        &self,
        run_id: u64,
        token: BearerToken,
    ) -> Result<Vec<JobRecord>, ApiError> {
        let url = self.repo_url(&format!("/actions/runs/{run_id}/jobs"));
        let resp = self.get(&url, &token).send().await?;
        let resp = check_status(resp).await?;
        let body: JobsResponse =
            resp.json().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(body.jobs)
    }

    async fn trigger_once(
        &self,
        message: &str,
        token: BearerToken,
    ) -> Result<CommitResult, ApiError> {
        let contents_url = self.repo_url(&format!("/contents/{STATUS_FILE_PATH}"));

        // The sentinel file may not exist yet; 404 just means no prior sha.
        let existing_sha = {
            let resp = self.get(&contents_url, &token).send().await?;
            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                None
            } else {
                let resp = check_status(resp).await?;
                let body: ContentsResponse =
                    resp.json().await.map_err(|e| ApiError::Transport(e.to_string()))?;
                Some(body.sha)
            }
        };

        let content = format!("CI pipeline triggered at: {}\n", epoch_ms());
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        let mut body = serde_json::json!({ "message": message, "content": encoded });
        if let Some(sha) = existing_sha {
            body["sha"] = serde_json::Value::String(sha);
        }

        let resp = self.put(&contents_url, &token).json(&body).send().await?;
        let resp = check_status(resp).await?;
        let parsed: UpdateFileResponse =
            resp.json().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(CommitResult { sha: parsed.commit.sha, message: message.to_owned() })
    }
}

#[async_trait]
impl RunProvider for GitHubClient {
    async fn trigger_run(&self, message: &str) -> Result<CommitResult, ApiError> {
        self.execute_with_retry(|token| self.trigger_once(message, token)).await
    }

    async fn list_runs(&self, limit: u32) -> Result<Vec<RunRecord>, ApiError> {
        self.execute_with_retry(|token| self.list_runs_once(limit, token)).await
    }

    async fn list_jobs(&self, run_id: u64) -> Result<Vec<JobRecord>, ApiError> {
        self.execute_with_retry(|token| self.list_jobs_once(run_id, token)).await
    }
}

/// Map non-2xx statuses into the error taxonomy.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        Err(ApiError::Auth(format!("{status}: {message}")))
    } else {
        Err(ApiError::Provider { status: status.as_u16(), message })
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
