// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-format events and subscriber commands.
//!
//! Every message is one JSON object tagged with `type`. The event set is
//! closed so subscribers can handle it exhaustively.

use serde::{Deserialize, Serialize};

use crate::provider::{JobRecord, RunRecord};

/// Events pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Greeting sent once per connection.
    Connected { message: String, timestamp: u64 },
    /// Most recent run, sent on discovery regardless of its status.
    LatestRun { run: RunRecord },
    /// Full run + jobs snapshot for the watched run.
    RunUpdate { run: RunRecord, jobs: Vec<JobRecord>, timestamp: u64 },
    /// Terminal snapshot; nothing follows without a new watch.
    RunCompleted { run: RunRecord, jobs: Vec<JobRecord> },
    /// Best-effort failure notice; an active watch stays active.
    Error { message: String },
}

/// Commands accepted from subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    StartMonitoring {
        #[serde(rename = "runId")]
        run_id: u64,
    },
    StopMonitoring,
    GetLatestRun,
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
