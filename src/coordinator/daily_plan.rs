//! Per-user holder of the daily plan, refreshed in the background.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::logical_day;
use crate::tasktracker::types::{ApiResponse, DailyPlan, DailyPlanParams};
use crate::tasktracker::TaskTrackerApi;

/// How often the background task refreshes a coordinator
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(180);

#[derive(Debug, Default)]
struct CoordinatorState {
  data: Option<DailyPlan>,
  params: DailyPlanParams,
  last_update_success: bool,
}

/// Keeps one user's daily plan warm.
///
/// `data` survives failed refreshes; it is only dropped by `clear`, which the
/// foreground path uses when the logical day has rolled over.
pub struct DailyPlanCoordinator {
  username: String,
  api: Arc<dyn TaskTrackerApi>,
  update_interval: Duration,
  state: RwLock<CoordinatorState>,
  /// Serializes refreshes so two fetches never race to store `data`
  refresh_lock: Mutex<()>,
}

impl DailyPlanCoordinator {
  pub fn new(
    username: impl Into<String>,
    api: Arc<dyn TaskTrackerApi>,
    params: DailyPlanParams,
    update_interval: Duration,
  ) -> Self {
    Self {
      username: username.into(),
      api,
      update_interval,
      state: RwLock::new(CoordinatorState {
        params,
        ..CoordinatorState::default()
      }),
      refresh_lock: Mutex::new(()),
    }
  }

  pub fn username(&self) -> &str {
    &self.username
  }

  pub fn update_interval(&self) -> Duration {
    self.update_interval
  }

  pub async fn data(&self) -> Option<DailyPlan> {
    self.state.read().await.data.clone()
  }

  pub async fn last_update_success(&self) -> bool {
    self.state.read().await.last_update_success
  }

  pub async fn params(&self) -> DailyPlanParams {
    self.state.read().await.params
  }

  /// Make `params` the coordinator-wide defaults. Returns true if they differ
  /// from the ones used so far, meaning the cached plan no longer applies.
  pub async fn set_params(&self, params: DailyPlanParams) -> bool {
    let mut state = self.state.write().await;
    if state.params == params {
      return false;
    }
    debug!(username = %self.username, ?params, "daily plan parameters changed");
    state.params = params;
    true
  }

  /// Drop the cached plan so the next access starts cold.
  pub async fn clear(&self) {
    self.state.write().await.data = None;
  }

  /// Drop the plan if it belongs to an earlier logical day than `now`.
  ///
  /// Check and clear happen under one write lock, so a plan stored by a
  /// concurrent refresh is judged on its own date. Returns true if cleared.
  pub async fn clear_if_stale_for_new_day(&self, now: DateTime<Utc>) -> bool {
    let mut state = self.state.write().await;
    if !logical_day::is_stale_for_new_day(state.data.as_ref(), now) {
      return false;
    }
    state.data = None;
    true
  }

  /// Fetch the plan with the current parameters and record the outcome.
  ///
  /// The outcome is also returned so foreground callers can surface failures.
  /// A failure leaves any previous plan in place.
  pub async fn refresh(&self) -> Result<ApiResponse<DailyPlan>> {
    let _guard = self.refresh_lock.lock().await;
    let params = self.params().await;

    let outcome = self.api.fetch_daily_plan(&self.username, params).await;

    let mut state = self.state.write().await;
    match &outcome {
      Ok(ApiResponse::Success(plan)) => {
        state.data = Some(plan.clone());
        state.last_update_success = true;
        info!(username = %self.username, "daily plan refreshed");
      }
      Ok(ApiResponse::Failure(failure)) => {
        state.last_update_success = false;
        warn!(
          username = %self.username,
          message = %failure.message,
          "daily plan refresh rejected"
        );
      }
      Err(e) => {
        state.last_update_success = false;
        warn!(username = %self.username, error = %e, "daily plan refresh failed");
      }
    }

    outcome
  }

  /// Refresh every `update_interval` until the returned task is aborted.
  ///
  /// The first tick is one interval away; outcomes are recorded on the
  /// coordinator and never escape the task.
  pub fn spawn_refresh_loop(self: &Arc<Self>) -> JoinHandle<()> {
    let coordinator = Arc::clone(self);
    tokio::spawn(async move {
      let period = coordinator.update_interval;
      let mut ticker = time::interval_at(Instant::now() + period, period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

      loop {
        ticker.tick().await;
        debug!(username = %coordinator.username, "background daily plan refresh");
        let _ = coordinator.refresh().await;
      }
    })
  }
}
