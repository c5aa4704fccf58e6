// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the HTTP API.
//!
//! Uses `axum_test::TestServer` — no real TCP needed.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;

use runwatch::error::ErrorResponse;
use runwatch::provider::{JobRecord, RunRecord, RunStatus};
use runwatch::state::AppState;
use runwatch::test_support::{job_fixture, run_fixture, test_state, FakeProvider};
use runwatch::transport::build_router;

fn test_server(state: Arc<AppState>) -> TestServer {
    TestServer::new(build_router(state)).expect("failed to create test server")
}

#[tokio::test]
async fn health_reports_running() {
    let server = test_server(test_state(Some(FakeProvider::new())));

    let resp = server.get("/api/v1/health").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "running");
    assert_eq!(body["connections"], 0);
}

#[tokio::test]
async fn list_runs_returns_provider_records() {
    let provider = FakeProvider::new();
    provider
        .set_runs(vec![
            run_fixture(2, RunStatus::InProgress),
            run_fixture(1, RunStatus::Completed),
        ])
        .await;
    let server = test_server(test_state(Some(provider)));

    let resp = server.get("/api/v1/runs").await;
    resp.assert_status_ok();

    let runs: Vec<RunRecord> = resp.json();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, 2);
    assert_eq!(runs[1].status, RunStatus::Completed);
}

#[tokio::test]
async fn list_runs_respects_limit() {
    let provider = FakeProvider::new();
    provider
        .set_runs(vec![
            run_fixture(3, RunStatus::InProgress),
            run_fixture(2, RunStatus::Completed),
            run_fixture(1, RunStatus::Completed),
        ])
        .await;
    let server = test_server(test_state(Some(provider)));

    let resp = server.get("/api/v1/runs").add_query_param("limit", 2).await;
    resp.assert_status_ok();

    let runs: Vec<RunRecord> = resp.json();
    assert_eq!(runs.len(), 2);
}

#[tokio::test]
async fn list_jobs_returns_nested_steps() {
    let provider = FakeProvider::new();
    provider.set_jobs(vec![job_fixture(7, RunStatus::InProgress)]).await;
    let server = test_server(test_state(Some(provider)));

    let resp = server.get("/api/v1/runs/1/jobs").await;
    resp.assert_status_ok();

    let jobs: Vec<JobRecord> = resp.json();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].steps.len(), 1);
    assert_eq!(jobs[0].steps[0].number, 1);
}

#[tokio::test]
async fn trigger_returns_commit_sha() {
    let server = test_server(test_state(Some(FakeProvider::new())));

    let resp = server
        .post("/api/v1/trigger")
        .json(&serde_json::json!({ "message": "ship it" }))
        .await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["sha"], "fake-sha");
    assert_eq!(body["message"], "ship it");
}

#[tokio::test]
async fn trigger_without_credentials_is_service_unavailable() {
    let server = test_server(test_state(None));

    let resp = server.post("/api/v1/trigger").json(&serde_json::json!({})).await;
    resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let body: ErrorResponse = resp.json();
    assert_eq!(body.error.code, "CREDENTIAL");
}

#[tokio::test]
async fn runs_without_credentials_is_service_unavailable() {
    let server = test_server(test_state(None));

    let resp = server.get("/api/v1/runs").await;
    resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}
