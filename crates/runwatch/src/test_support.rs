// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fakes and fixtures for unit and integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::credential::{BearerToken, TokenMinter};
use crate::engine::MonitorEngine;
use crate::error::ApiError;
use crate::provider::{
    CommitResult, JobRecord, RunConclusion, RunProvider, RunRecord, RunStatus, StepRecord,
};
use crate::registry::ConnectionRegistry;
use crate::state::{epoch_secs, AppState};

/// Scripted token minter: counts mint attempts, with optional per-mint delay
/// and queued failures.
pub struct FakeMinter {
    mints: AtomicU32,
    ttl: Duration,
    delay: Duration,
    failures: Mutex<VecDeque<ApiError>>,
}

impl FakeMinter {
    pub fn new(ttl: Duration) -> Arc<Self> {
        Self::with_delay(ttl, Duration::ZERO)
    }

    pub fn with_delay(ttl: Duration, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            mints: AtomicU32::new(0),
            ttl,
            delay,
            failures: Mutex::new(VecDeque::new()),
        })
    }

    /// Queue a failure for the next mint attempt.
    pub async fn fail_next(&self, err: ApiError) {
        self.failures.lock().await.push_back(err);
    }

    /// Total mint attempts, successful or not.
    pub fn mint_count(&self) -> u32 {
        self.mints.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenMinter for FakeMinter {
    async fn mint(&self) -> Result<BearerToken, ApiError> {
        let n = self.mints.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(err) = self.failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(BearerToken {
            value: format!("token-{n}"),
            expires_at: epoch_secs() + self.ttl.as_secs(),
        })
    }
}

/// Scripted run provider for engine and transport tests.
#[derive(Default)]
pub struct FakeProvider {
    pub runs: Mutex<Vec<RunRecord>>,
    pub jobs: Mutex<Vec<JobRecord>>,
    list_failures: Mutex<VecDeque<ApiError>>,
    pub list_calls: AtomicU32,
    pub trigger_calls: AtomicU32,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn set_runs(&self, runs: Vec<RunRecord>) {
        *self.runs.lock().await = runs;
    }

    pub async fn set_jobs(&self, jobs: Vec<JobRecord>) {
        *self.jobs.lock().await = jobs;
    }

    /// Queue a failure for the next `list_runs` call.
    pub async fn fail_next_list(&self, err: ApiError) {
        self.list_failures.lock().await.push_back(err);
    }
}

#[async_trait]
impl RunProvider for FakeProvider {
    async fn trigger_run(&self, message: &str) -> Result<CommitResult, ApiError> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CommitResult { sha: "fake-sha".to_owned(), message: message.to_owned() })
    }

    async fn list_runs(&self, limit: u32) -> Result<Vec<RunRecord>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.list_failures.lock().await.pop_front() {
            return Err(err);
        }
        let runs = self.runs.lock().await.clone();
        Ok(runs.into_iter().take(limit as usize).collect())
    }

    async fn list_jobs(&self, _run_id: u64) -> Result<Vec<JobRecord>, ApiError> {
        Ok(self.jobs.lock().await.clone())
    }
}

/// Run fixture with the given id and status.
pub fn run_fixture(id: u64, status: RunStatus) -> RunRecord {
    let conclusion = (status == RunStatus::Completed).then_some(RunConclusion::Success);
    RunRecord {
        id,
        name: "build".to_owned(),
        status,
        conclusion,
        created_at: "2026-01-01T00:00:00Z".to_owned(),
        updated_at: "2026-01-01T00:00:30Z".to_owned(),
        html_url: format!("https://github.test/acme/widgets/actions/runs/{id}"),
        head_sha: "0123abc".to_owned(),
    }
}

/// Job fixture with one checkout step.
pub fn job_fixture(id: u64, status: RunStatus) -> JobRecord {
    JobRecord {
        id,
        name: "test".to_owned(),
        status,
        conclusion: None,
        started_at: Some("2026-01-01T00:00:05Z".to_owned()),
        completed_at: None,
        steps: vec![StepRecord {
            number: 1,
            name: "checkout".to_owned(),
            status,
            conclusion: None,
            started_at: Some("2026-01-01T00:00:05Z".to_owned()),
            completed_at: None,
        }],
    }
}

/// Config fixture with fast intervals and no credential sources.
pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        api_base: "http://127.0.0.1:0".to_owned(),
        poll_ms: 50,
        discover_delay_ms: 10,
        runs_page: 10,
        token_margin_secs: 300,
        renew_lead_secs: 600,
        secrets_dir: None,
        owner: None,
        repo: None,
        app_id: None,
        installation_id: None,
        private_key_path: None,
    }
}

/// Build an `AppState` over the fake provider (`None` disables monitoring,
/// as when credentials fail to load).
pub fn test_state(provider: Option<Arc<FakeProvider>>) -> Arc<AppState> {
    let config = test_config();
    let registry = Arc::new(ConnectionRegistry::new());
    let (provider, engine) = match provider {
        Some(fake) => {
            let provider: Arc<dyn RunProvider> = fake;
            let engine = MonitorEngine::new(
                Arc::clone(&provider),
                Arc::clone(&registry),
                config.poll_interval(),
                config.discover_delay(),
                config.runs_page,
            );
            (Some(provider), Some(engine))
        }
        None => (None, None),
    };
    Arc::new(AppState {
        config,
        registry,
        provider,
        engine,
        shutdown: CancellationToken::new(),
    })
}
