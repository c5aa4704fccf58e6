// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll/broadcast engine: watches one run and pushes snapshots to subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::events::MonitorEvent;
use crate::provider::{CommitResult, RunProvider, RunStatus};
use crate::registry::ConnectionRegistry;
use crate::state::epoch_ms;

/// The single active watch.
struct Watch {
    run_id: u64,
    generation: u64,
    cancel: CancellationToken,
}

/// Outcome of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    Continue,
    Completed,
}

/// Polls the watched run on a fixed interval and broadcasts full snapshots.
///
/// At most one watch is active at a time; starting a new watch supersedes
/// the old one. All subscribers share the single polling stream.
pub struct MonitorEngine {
    provider: Arc<dyn RunProvider>,
    registry: Arc<ConnectionRegistry>,
    watch: Mutex<Option<Watch>>,
    generation: AtomicU64,
    poll_interval: Duration,
    discover_delay: Duration,
    runs_page: u32,
}

impl MonitorEngine {
    pub fn new(
        provider: Arc<dyn RunProvider>,
        registry: Arc<ConnectionRegistry>,
        poll_interval: Duration,
        discover_delay: Duration,
        runs_page: u32,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            registry,
            watch: Mutex::new(None),
            generation: AtomicU64::new(0),
            poll_interval,
            discover_delay,
            runs_page,
        })
    }

    /// The run id currently being watched, if any.
    pub async fn current_watch(&self) -> Option<u64> {
        self.watch.lock().await.as_ref().map(|w| w.run_id)
    }

    /// Start watching `run_id`, superseding any existing watch.
    ///
    /// The poll task's interval fires immediately, so subscribers get a first
    /// snapshot without waiting a full interval.
    pub async fn start_watch(self: &Arc<Self>, run_id: u64) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        {
            let mut watch = self.watch.lock().await;
            if let Some(prev) = watch.take() {
                tracing::debug!(run_id = prev.run_id, "superseding existing watch");
                prev.cancel.cancel();
            }
            *watch = Some(Watch { run_id, generation, cancel: cancel.clone() });
        }
        tracing::info!(run_id, "watch started");

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.poll_loop(run_id, generation, cancel).await;
        });
    }

    /// Stop the active watch; idempotent when idle.
    pub async fn stop_watch(&self) {
        let mut watch = self.watch.lock().await;
        if let Some(w) = watch.take() {
            w.cancel.cancel();
            tracing::info!(run_id = w.run_id, "watch stopped");
        }
    }

    /// Fetch the newest run, broadcast it, and auto-watch it when still active.
    ///
    /// A run already completed at discovery time is never (re)watched.
    pub async fn discover_latest(self: &Arc<Self>) {
        let runs = match self.provider.list_runs(1).await {
            Ok(runs) => runs,
            Err(e) => {
                tracing::warn!(err = %e, "failed to fetch latest run");
                self.registry
                    .broadcast(MonitorEvent::Error {
                        message: "Failed to fetch latest run".to_owned(),
                    })
                    .await;
                return;
            }
        };
        let Some(run) = runs.into_iter().next() else {
            tracing::debug!("no runs found");
            return;
        };

        let (id, status) = (run.id, run.status);
        self.registry.broadcast(MonitorEvent::LatestRun { run }).await;

        if matches!(status, RunStatus::Queued | RunStatus::InProgress) {
            self.start_watch(id).await;
        }
    }

    /// Create a trigger commit, then discover the resulting run after a short
    /// delay for the provider's automation to react.
    pub async fn trigger(self: &Arc<Self>, message: String) -> Result<CommitResult, ApiError> {
        let result = self.provider.trigger_run(&message).await?;
        tracing::info!(sha = %result.sha, "trigger commit created");

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(engine.discover_delay).await;
            engine.discover_latest().await;
        });

        Ok(result)
    }

    async fn poll_loop(self: Arc<Self>, run_id: u64, generation: u64, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if self.poll_once(run_id).await == Tick::Completed {
                self.clear_watch(generation).await;
                break;
            }
        }
    }

    /// One poll tick. Failures broadcast an error and the watch stays active.
    async fn poll_once(&self, run_id: u64) -> Tick {
        let runs = match self.provider.list_runs(self.runs_page).await {
            Ok(runs) => runs,
            Err(e) => {
                tracing::warn!(run_id, err = %e, "poll tick failed");
                self.registry
                    .broadcast(MonitorEvent::Error {
                        message: "Error fetching run status".to_owned(),
                    })
                    .await;
                return Tick::Continue;
            }
        };

        // The run list is eventually consistent; a missing id is not an error.
        let Some(run) = runs.into_iter().find(|r| r.id == run_id) else {
            return Tick::Continue;
        };

        let jobs = match self.provider.list_jobs(run_id).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!(run_id, err = %e, "job fetch failed");
                self.registry
                    .broadcast(MonitorEvent::Error {
                        message: "Error fetching run status".to_owned(),
                    })
                    .await;
                return Tick::Continue;
            }
        };

        let completed = run.status == RunStatus::Completed;
        self.registry
            .broadcast(MonitorEvent::RunUpdate {
                run: run.clone(),
                jobs: jobs.clone(),
                timestamp: epoch_ms(),
            })
            .await;

        if completed {
            self.registry.broadcast(MonitorEvent::RunCompleted { run, jobs }).await;
            tracing::info!(run_id, "run completed, watch finished");
            return Tick::Completed;
        }
        Tick::Continue
    }

    /// Clear the watch slot if it still belongs to `generation`.
    ///
    /// A newer `start_watch` owns the slot by then and must not be cleared.
    async fn clear_watch(&self, generation: u64) {
        let mut watch = self.watch.lock().await;
        if watch.as_ref().is_some_and(|w| w.generation == generation) {
            if let Some(w) = watch.take() {
                w.cancel.cancel();
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
