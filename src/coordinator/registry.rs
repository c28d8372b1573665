//! Username to coordinator map owned by the integration context.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::daily_plan::DailyPlanCoordinator;

/// One daily-plan coordinator per configured user, plus the background tasks
/// keeping them warm.
#[derive(Default)]
pub struct CoordinatorRegistry {
  coordinators: HashMap<String, Arc<DailyPlanCoordinator>>,
  /// Usernames in configuration order
  order: Vec<String>,
  tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl CoordinatorRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a coordinator; a second one for the same user replaces the first.
  pub fn insert(&mut self, coordinator: DailyPlanCoordinator) -> Arc<DailyPlanCoordinator> {
    let username = coordinator.username().to_string();
    let coordinator = Arc::new(coordinator);
    if self
      .coordinators
      .insert(username.clone(), Arc::clone(&coordinator))
      .is_none()
    {
      self.order.push(username);
    }
    coordinator
  }

  pub fn get(&self, username: &str) -> Option<Arc<DailyPlanCoordinator>> {
    self.coordinators.get(username).cloned()
  }

  pub fn usernames(&self) -> &[String] {
    &self.order
  }

  /// Coordinators in configuration order.
  pub fn iter(&self) -> impl Iterator<Item = &Arc<DailyPlanCoordinator>> {
    self
      .order
      .iter()
      .filter_map(|username| self.coordinators.get(username))
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// Spawn the periodic refresh task of every coordinator.
  pub fn start(&self) {
    let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
    if !tasks.is_empty() {
      warn!("coordinator refresh tasks already running");
      return;
    }
    for coordinator in self.iter() {
      debug!(
        username = coordinator.username(),
        interval_secs = coordinator.update_interval().as_secs(),
        "starting daily plan refresh task"
      );
      tasks.push(coordinator.spawn_refresh_loop());
    }
  }

  /// Abort every periodic refresh task.
  pub fn shutdown(&self) {
    let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
    for task in tasks.drain(..) {
      task.abort();
    }
  }

  pub fn running_tasks(&self) -> usize {
    let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
    tasks.iter().filter(|task| !task.is_finished()).count()
  }
}
