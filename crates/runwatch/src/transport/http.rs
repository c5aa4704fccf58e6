// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Commit message used when the caller omits one.
const DEFAULT_TRIGGER_MESSAGE: &str = "Trigger CI pipeline";

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watching: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub sha: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    10
}

fn monitoring_unavailable() -> ApiError {
    ApiError::Credential("credentials not configured".to_owned())
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let watching = match s.engine.as_ref() {
        Some(engine) => engine.current_watch().await,
        None => None,
    };
    Json(HealthResponse {
        status: "running".to_owned(),
        connections: s.registry.len().await,
        watching,
    })
}

/// `POST /api/v1/trigger` — create a trigger commit and schedule discovery.
pub async fn trigger(
    State(s): State<Arc<AppState>>,
    Json(req): Json<TriggerRequest>,
) -> impl IntoResponse {
    let Some(engine) = s.engine.as_ref() else {
        return monitoring_unavailable().to_http_response().into_response();
    };

    let message = req.message.unwrap_or_else(|| DEFAULT_TRIGGER_MESSAGE.to_owned());
    match engine.trigger(message).await {
        Ok(result) => Json(TriggerResponse {
            success: true,
            sha: result.sha,
            message: result.message,
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(err = %e, "trigger failed");
            e.to_http_response().into_response()
        }
    }
}

/// `GET /api/v1/runs?limit=N`
pub async fn list_runs(
    State(s): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> impl IntoResponse {
    let Some(provider) = s.provider.as_ref() else {
        return monitoring_unavailable().to_http_response().into_response();
    };

    match provider.list_runs(query.limit).await {
        Ok(runs) => Json(runs).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

/// `GET /api/v1/runs/{run_id}/jobs`
pub async fn list_jobs(
    State(s): State<Arc<AppState>>,
    Path(run_id): Path<u64>,
) -> impl IntoResponse {
    let Some(provider) = s.provider.as_ref() else {
        return monitoring_unavailable().to_http_response().into_response();
    };

    match provider.list_jobs(run_id).await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}
