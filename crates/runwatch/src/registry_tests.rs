// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio::sync::mpsc;

use super::ConnectionRegistry;
use crate::events::MonitorEvent;

fn event(msg: &str) -> MonitorEvent {
    MonitorEvent::Error { message: msg.to_owned() }
}

#[tokio::test]
async fn broadcast_reaches_all_connections() {
    let registry = ConnectionRegistry::new();
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    let (tx3, mut rx3) = mpsc::unbounded_channel();
    registry.add(tx1).await;
    registry.add(tx2).await;
    registry.add(tx3).await;

    registry.broadcast(event("hello")).await;

    assert_eq!(rx1.recv().await, Some(event("hello")));
    assert_eq!(rx2.recv().await, Some(event("hello")));
    assert_eq!(rx3.recv().await, Some(event("hello")));
}

#[tokio::test]
async fn dead_connection_is_pruned_and_others_still_receive() {
    let registry = ConnectionRegistry::new();
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, rx2) = mpsc::unbounded_channel();
    let (tx3, mut rx3) = mpsc::unbounded_channel();
    registry.add(tx1).await;
    registry.add(tx2).await;
    registry.add(tx3).await;
    drop(rx2);

    registry.broadcast(event("update")).await;

    assert_eq!(rx1.recv().await, Some(event("update")));
    assert_eq!(rx3.recv().await, Some(event("update")));
    assert_eq!(registry.len().await, 2);
}

#[tokio::test]
async fn per_connection_order_matches_broadcast_order() {
    let registry = ConnectionRegistry::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.add(tx).await;

    registry.broadcast(event("first")).await;
    registry.broadcast(event("second")).await;

    assert_eq!(rx.recv().await, Some(event("first")));
    assert_eq!(rx.recv().await, Some(event("second")));
}

#[tokio::test]
async fn send_to_targets_one_connection() {
    let registry = ConnectionRegistry::new();
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    let id1 = registry.add(tx1).await;
    registry.add(tx2).await;

    registry.send_to(&id1, event("direct")).await;

    assert_eq!(rx1.recv().await, Some(event("direct")));
    assert!(rx2.try_recv().is_err());
}

#[tokio::test]
async fn removed_connection_no_longer_receives() {
    let registry = ConnectionRegistry::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = registry.add(tx).await;
    registry.remove(&id).await;

    registry.broadcast(event("gone")).await;

    assert!(rx.try_recv().is_err());
    assert_eq!(registry.len().await, 0);
}
