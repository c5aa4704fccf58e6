// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::handle_client_text;
use crate::events::MonitorEvent;
use crate::provider::RunStatus;
use crate::test_support::{run_fixture, test_state, FakeProvider};

#[tokio::test]
async fn unknown_message_type_gets_error_reply() {
    let state = test_state(Some(FakeProvider::new()));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = state.registry.add(tx).await;

    handle_client_text(&state, &id, r#"{"type":"reboot"}"#).await;

    assert_eq!(
        rx.recv().await,
        Some(MonitorEvent::Error { message: "Unknown message type".to_owned() })
    );
}

#[tokio::test]
async fn malformed_json_gets_error_reply() {
    let state = test_state(Some(FakeProvider::new()));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = state.registry.add(tx).await;

    handle_client_text(&state, &id, "not json").await;

    assert_eq!(
        rx.recv().await,
        Some(MonitorEvent::Error { message: "Unknown message type".to_owned() })
    );
}

#[tokio::test]
async fn start_monitoring_starts_a_watch() {
    let provider = FakeProvider::new();
    provider.set_runs(vec![run_fixture(9, RunStatus::InProgress)]).await;
    let state = test_state(Some(provider));
    let (tx, _rx) = mpsc::unbounded_channel();
    let id = state.registry.add(tx).await;

    handle_client_text(&state, &id, r#"{"type":"start_monitoring","runId":9}"#).await;

    tokio::time::sleep(Duration::from_millis(30)).await;
    let engine = state.engine.as_ref().expect("engine");
    assert_eq!(engine.current_watch().await, Some(9));
}

#[tokio::test]
async fn stop_monitoring_clears_the_watch() {
    let provider = FakeProvider::new();
    provider.set_runs(vec![run_fixture(3, RunStatus::InProgress)]).await;
    let state = test_state(Some(provider));
    let engine = Arc::clone(state.engine.as_ref().expect("engine"));
    engine.start_watch(3).await;
    let (tx, _rx) = mpsc::unbounded_channel();
    let id = state.registry.add(tx).await;

    handle_client_text(&state, &id, r#"{"type":"stop_monitoring"}"#).await;

    assert_eq!(engine.current_watch().await, None);
}

#[tokio::test]
async fn get_latest_run_broadcasts_latest() {
    let provider = FakeProvider::new();
    provider.set_runs(vec![run_fixture(4, RunStatus::Completed)]).await;
    let state = test_state(Some(provider));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = state.registry.add(tx).await;

    handle_client_text(&state, &id, r#"{"type":"get_latest_run"}"#).await;

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed");
    assert!(matches!(event, MonitorEvent::LatestRun { .. }));
}

#[tokio::test]
async fn commands_without_credentials_get_error_reply() {
    let state = test_state(None);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = state.registry.add(tx).await;

    handle_client_text(&state, &id, r#"{"type":"start_monitoring","runId":1}"#).await;

    match rx.recv().await {
        Some(MonitorEvent::Error { message }) => assert!(message.contains("credentials")),
        other => panic!("expected error reply, got {other:?}"),
    }
}
