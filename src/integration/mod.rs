//! Top-level integration context.
//!
//! `Integration` owns the shared cache, the coordinator registry, and the
//! event bus, and is handed by reference to everything that serves a request.
//! Read handlers live in `reads`, mutation handlers in `mutations`.

pub mod events;
pub mod invalidation;
mod mutations;
mod reads;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::config::{CacheConfig, Config};
use crate::coordinator::{CoordinatorRegistry, DailyPlanCoordinator};
use crate::tasktracker::types::{ApiResponse, DailyPlanParams};
use crate::tasktracker::{TaskTrackerApi, TaskTrackerKey};

use events::{EventBus, IntegrationEvent};
use invalidation::Invalidator;

const EVENT_CAPACITY: usize = 64;

pub struct Integration {
  api: Arc<dyn TaskTrackerApi>,
  cache: TtlCache<ApiResponse>,
  coordinators: CoordinatorRegistry,
  users: Vec<String>,
  ttls: CacheConfig,
  events: EventBus,
}

impl Integration {
  /// Build the context without touching the network.
  pub fn new(config: &Config, api: Arc<dyn TaskTrackerApi>) -> Self {
    let params = DailyPlanParams {
      select_recommended: config.daily_plan.select_recommended,
      fair_weather: config.daily_plan.fair_weather,
    };

    let mut coordinators = CoordinatorRegistry::new();
    for username in &config.users {
      coordinators.insert(DailyPlanCoordinator::new(
        username.clone(),
        Arc::clone(&api),
        params,
        config.daily_plan.update_interval(),
      ));
    }

    Self {
      api,
      cache: TtlCache::new(),
      coordinators,
      users: config.users.clone(),
      ttls: config.cache.clone(),
      events: EventBus::new(EVENT_CAPACITY),
    }
  }

  /// Build the context, fetch every user's first daily plan, and start the
  /// periodic refresh tasks. A failed first fetch is logged, not fatal.
  pub async fn setup(config: &Config, api: Arc<dyn TaskTrackerApi>) -> Self {
    let integration = Self::new(config, api);

    for coordinator in integration.coordinators.iter() {
      match coordinator.refresh().await {
        Ok(ApiResponse::Success(_)) => {}
        Ok(ApiResponse::Failure(failure)) => warn!(
          username = coordinator.username(),
          message = %failure.message,
          "initial daily plan fetch rejected"
        ),
        Err(e) => warn!(
          username = coordinator.username(),
          error = %e,
          "initial daily plan fetch failed"
        ),
      }
    }

    if integration.coordinators.is_empty() {
      info!("no users configured, daily plans are fetched on demand");
    }
    integration.coordinators.start();
    info!(
      coordinators = integration.coordinators.len(),
      refresh_tasks = integration.coordinators.running_tasks(),
      "TaskTracker integration ready"
    );
    integration
  }

  /// Stop the periodic refresh tasks.
  pub fn shutdown(&self) {
    self.coordinators.shutdown();
    info!("TaskTracker integration stopped");
  }

  pub fn users(&self) -> &[String] {
    &self.users
  }

  pub fn cache(&self) -> &TtlCache<ApiResponse> {
    &self.cache
  }

  pub fn coordinator(&self, username: &str) -> Option<Arc<DailyPlanCoordinator>> {
    self.coordinators.get(username)
  }

  pub fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
    self.events.subscribe()
  }

  fn invalidator(&self) -> Invalidator<'_> {
    Invalidator::new(&self.cache, &self.coordinators)
  }

  /// Drop one user's cached entries and refetch their daily plan.
  pub async fn invalidate_user_cache(&self, username: &str) {
    self.invalidator().invalidate_user_cache(username).await;
  }

  /// Drop every configured user's cached entries and refetch all daily plans.
  pub async fn invalidate_all_user_caches(&self) {
    self.invalidator().invalidate_all_user_caches().await;
  }

  fn ttl_for(&self, key: &TaskTrackerKey) -> Duration {
    let secs = match key {
      TaskTrackerKey::RecommendedTasks { .. } => self.ttls.recommended_tasks,
      TaskTrackerKey::AvailableTasks { .. } => self.ttls.available_tasks,
      TaskTrackerKey::AllTasks { .. } => self.ttls.all_tasks,
      TaskTrackerKey::RecentCompletions { .. } => self.ttls.recent_completions,
      TaskTrackerKey::Leftovers { .. } => self.ttls.leftovers,
      TaskTrackerKey::AvailableUsers => self.ttls.available_users,
      TaskTrackerKey::Encouragement { .. } => self.ttls.encouragement,
    };
    Duration::from_secs(secs)
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  use super::*;
  use crate::config::TaskTrackerConfig;
  use crate::tasktracker::testing::FakeTaskTracker;

  pub fn config(users: &[&str]) -> Config {
    let config = Config {
      tasktracker: TaskTrackerConfig {
        url: "http://tracker.local".to_string(),
        timeout_secs: 5,
      },
      users: Vec::new(),
      daily_plan: Default::default(),
      cache: Default::default(),
      logging: Default::default(),
    };
    config.with_users(users.iter().map(|u| u.to_string()).collect())
  }

  pub fn integration(users: &[&str]) -> (Arc<FakeTaskTracker>, Integration) {
    let fake = Arc::new(FakeTaskTracker::new());
    let api: Arc<dyn TaskTrackerApi> = fake.clone();
    (fake, Integration::new(&config(users), api))
  }
}
