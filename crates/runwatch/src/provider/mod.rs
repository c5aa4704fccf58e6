// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream run provider: typed run/job/step records and the client trait.
//!
//! Field names match the provider's REST shape, so the same derives
//! deserialize upstream responses and round-trip on the subscriber wire.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Lifecycle status of a run, job, or step.
///
/// Serialized as the upstream's plain string; values outside the model
/// collapse to `Unknown` rather than failing the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    /// Upstream statuses outside the model (waiting, pending, requested...).
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            _ => Self::Unknown,
        }
    }
}

impl From<RunStatus> for String {
    fn from(s: RunStatus) -> Self {
        s.as_str().to_owned()
    }
}

/// Terminal conclusion of a completed run, job, or step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunConclusion {
    Success,
    Failure,
    Cancelled,
    /// Upstream conclusions outside the model (skipped, timed_out...).
    Other,
}

impl RunConclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        }
    }
}

impl From<String> for RunConclusion {
    fn from(s: String) -> Self {
        match s.as_str() {
            "success" => Self::Success,
            "failure" => Self::Failure,
            "cancelled" => Self::Cancelled,
            _ => Self::Other,
        }
    }
}

impl From<RunConclusion> for String {
    fn from(c: RunConclusion) -> Self {
        c.as_str().to_owned()
    }
}

/// One execution of the upstream automation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<RunConclusion>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub head_sha: String,
}

/// A named unit of work within a run.
///
/// Fetched only alongside its parent run, never stored independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<RunConclusion>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

/// One step within a job, ordered by `number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub number: u32,
    #[serde(default)]
    pub name: String,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<RunConclusion>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Result of a trigger commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitResult {
    pub sha: String,
    pub message: String,
}

/// Read and write operations against the upstream run provider.
#[async_trait]
pub trait RunProvider: Send + Sync {
    /// Create a status-file commit that causes the provider's automation to
    /// start a new run.
    async fn trigger_run(&self, message: &str) -> Result<CommitResult, ApiError>;

    /// Most-recent-first run listing, bounded by `limit`.
    async fn list_runs(&self, limit: u32) -> Result<Vec<RunRecord>, ApiError>;

    /// Jobs (with nested steps) for one run.
    async fn list_jobs(&self, run_id: u64) -> Result<Vec<JobRecord>, ApiError>;
}
