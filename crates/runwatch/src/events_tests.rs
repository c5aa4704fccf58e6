// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{ClientCommand, MonitorEvent};
use crate::provider::{RunConclusion, RunRecord, RunStatus};
use crate::test_support::{job_fixture, run_fixture};

#[test]
fn run_update_round_trips() {
    let event = MonitorEvent::RunUpdate {
        run: run_fixture(42, RunStatus::InProgress),
        jobs: vec![job_fixture(7, RunStatus::InProgress)],
        timestamp: 1_700_000_000_000,
    };

    let text = serde_json::to_string(&event).expect("serialize");
    let parsed: MonitorEvent = serde_json::from_str(&text).expect("parse");

    assert_eq!(parsed, event);
}

#[test]
fn events_carry_snake_case_type_tags() {
    let text = serde_json::to_string(&MonitorEvent::RunCompleted {
        run: run_fixture(1, RunStatus::Completed),
        jobs: vec![],
    })
    .expect("serialize");
    let value: serde_json::Value = serde_json::from_str(&text).expect("parse");

    assert_eq!(value["type"], "run_completed");
    assert_eq!(value["run"]["status"], "completed");
    assert_eq!(value["run"]["conclusion"], "success");
}

#[test]
fn connected_greeting_has_message_and_timestamp() {
    let text = serde_json::to_string(&MonitorEvent::Connected {
        message: "WebSocket connection established".to_owned(),
        timestamp: 123,
    })
    .expect("serialize");
    let value: serde_json::Value = serde_json::from_str(&text).expect("parse");

    assert_eq!(value["type"], "connected");
    assert_eq!(value["timestamp"], 123);
}

#[test]
fn start_monitoring_parses_camel_case_run_id() {
    let parsed: ClientCommand =
        serde_json::from_str(r#"{"type":"start_monitoring","runId":42}"#).expect("parse");
    assert_eq!(parsed, ClientCommand::StartMonitoring { run_id: 42 });
}

#[test]
fn unrecognized_command_type_is_rejected() {
    assert!(serde_json::from_str::<ClientCommand>(r#"{"type":"reboot"}"#).is_err());
    assert!(serde_json::from_str::<ClientCommand>("not json").is_err());
}

#[test]
fn upstream_values_outside_model_map_to_catch_all() {
    let raw = r#"{"id":1,"name":"build","status":"waiting","conclusion":"timed_out"}"#;
    let run: RunRecord = serde_json::from_str(raw).expect("parse");

    assert_eq!(run.status, RunStatus::Unknown);
    assert_eq!(run.conclusion, Some(RunConclusion::Other));
}
