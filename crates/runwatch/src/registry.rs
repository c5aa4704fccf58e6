// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of live subscriber connections.

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::events::MonitorEvent;

/// Tracks open subscriber connections and fans events out to them.
///
/// Broadcast iterates a snapshot of the membership, so connections may be
/// added or removed while a broadcast is in flight.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<Uuid, UnboundedSender<MonitorEvent>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, returning its id.
    pub async fn add(&self, sender: UnboundedSender<MonitorEvent>) -> Uuid {
        let id = Uuid::new_v4();
        self.connections.write().await.insert(id, sender);
        id
    }

    pub async fn remove(&self, id: &Uuid) {
        self.connections.write().await.remove(id);
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send to a single connection; a closed channel removes it.
    pub async fn send_to(&self, id: &Uuid, event: MonitorEvent) {
        let sender = self.connections.read().await.get(id).cloned();
        if let Some(sender) = sender {
            if sender.send(event).is_err() {
                self.remove(id).await;
            }
        }
    }

    /// Deliver `event` to every connection.
    ///
    /// A connection whose channel is closed is pruned and the rest still
    /// receive the event; broadcast never fails the caller.
    pub async fn broadcast(&self, event: MonitorEvent) {
        let snapshot: Vec<(Uuid, UnboundedSender<MonitorEvent>)> = {
            let connections = self.connections.read().await;
            connections.iter().map(|(id, tx)| (*id, tx.clone())).collect()
        };

        let mut stale = Vec::new();
        for (id, sender) in &snapshot {
            if sender.send(event.clone()).is_err() {
                stale.push(*id);
            }
        }

        if !stale.is_empty() {
            let mut connections = self.connections.write().await;
            for id in &stale {
                connections.remove(id);
            }
            tracing::debug!(removed = stale.len(), "pruned closed subscriber connections");
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
