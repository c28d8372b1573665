//! Side-effect events published once a mutation's invalidation has settled.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IntegrationEvent {
  TaskCompleted {
    task: String,
    completed_by: Option<String>,
    data: Value,
  },
  TaskCreated {
    name: String,
    data: Value,
  },
  TaskUpdated {
    task_id: u64,
    data: Value,
  },
  TaskDeleted {
    task_id: u64,
  },
  LeftoverCreated {
    name: String,
    assigned_users: Vec<String>,
    data: Value,
  },
  CompletionUpdated {
    completion_id: u64,
    data: Value,
  },
  CompletionDeleted {
    completion_id: u64,
  },
  DailyStateSet {
    username: String,
    data: Value,
  },
  CacheInvalidated,
}

/// Fan-out channel for integration events
pub struct EventBus {
  tx: broadcast::Sender<IntegrationEvent>,
}

impl EventBus {
  pub fn new(capacity: usize) -> Self {
    let (tx, _rx) = broadcast::channel(capacity);
    Self { tx }
  }

  /// Publish to current subscribers; having none is fine.
  pub fn publish(&self, event: IntegrationEvent) {
    match self.tx.send(event) {
      Ok(receivers) => debug!(receivers, "event published"),
      Err(broadcast::error::SendError(event)) => debug!(?event, "event dropped, no subscribers"),
    }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
    self.tx.subscribe()
  }
}
