use chrono::{DateTime, Utc};
use color_eyre::Result;
use tracing::{debug, info};

use super::Integration;
use crate::cache::{get_cached_or_fetch, CacheStats};
use crate::tasktracker::types::{ApiResponse, DailyPlan, DailyPlanParams};
use crate::tasktracker::TaskTrackerKey;

impl Integration {
  /// Daily plan for a user, served from their coordinator when it is still
  /// valid for the current logical day and the requested parameters.
  pub async fn daily_plan(
    &self,
    username: &str,
    params: Option<DailyPlanParams>,
    force_refresh: bool,
  ) -> Result<ApiResponse<DailyPlan>> {
    self
      .daily_plan_at(username, params, force_refresh, Utc::now())
      .await
  }

  pub(crate) async fn daily_plan_at(
    &self,
    username: &str,
    params: Option<DailyPlanParams>,
    force_refresh: bool,
    now: DateTime<Utc>,
  ) -> Result<ApiResponse<DailyPlan>> {
    let Some(coordinator) = self.coordinator(username) else {
      debug!(username, "no coordinator, fetching daily plan directly");
      let params = params.unwrap_or_default();
      return self.api.fetch_daily_plan(username, params).await;
    };

    let new_day = coordinator.clear_if_stale_for_new_day(now).await;
    if new_day {
      info!(username, "logical day changed, discarded cached daily plan");
    }

    let params_changed = match params {
      Some(params) => coordinator.set_params(params).await,
      None => false,
    };

    let needs_refresh = new_day
      || params_changed
      || force_refresh
      || !coordinator.last_update_success().await;

    if !needs_refresh {
      if let Some(plan) = coordinator.data().await {
        return Ok(ApiResponse::Success(plan));
      }
    }

    coordinator.refresh().await
  }

  /// Cached read of any list-shaped query.
  pub async fn list(&self, key: &TaskTrackerKey, force_refresh: bool) -> Result<ApiResponse> {
    let api = &self.api;
    get_cached_or_fetch(
      &self.cache,
      &key.cache_key(),
      self.ttl_for(key),
      || async move { api.fetch_list(key).await },
      force_refresh,
    )
    .await
  }

  pub async fn recommended_tasks(
    &self,
    username: &str,
    available_minutes: Option<u32>,
    force_refresh: bool,
  ) -> Result<ApiResponse> {
    let key = TaskTrackerKey::RecommendedTasks {
      username: username.to_string(),
      available_minutes,
    };
    self.list(&key, force_refresh).await
  }

  pub async fn available_tasks(
    &self,
    username: Option<&str>,
    force_refresh: bool,
  ) -> Result<ApiResponse> {
    let key = TaskTrackerKey::AvailableTasks {
      username: username.map(String::from),
    };
    self.list(&key, force_refresh).await
  }

  pub async fn all_tasks(
    &self,
    assigned_to: Option<&str>,
    force_refresh: bool,
  ) -> Result<ApiResponse> {
    let key = TaskTrackerKey::AllTasks {
      assigned_to: assigned_to.map(String::from),
    };
    self.list(&key, force_refresh).await
  }

  pub async fn recent_completions(
    &self,
    username: Option<&str>,
    days: Option<u32>,
    limit: Option<u32>,
    force_refresh: bool,
  ) -> Result<ApiResponse> {
    let key = TaskTrackerKey::RecentCompletions {
      username: username.map(String::from),
      days,
      limit,
    };
    self.list(&key, force_refresh).await
  }

  pub async fn leftovers(&self, username: &str, force_refresh: bool) -> Result<ApiResponse> {
    let key = TaskTrackerKey::Leftovers {
      username: username.to_string(),
    };
    self.list(&key, force_refresh).await
  }

  pub async fn available_users(&self, force_refresh: bool) -> Result<ApiResponse> {
    self
      .list(&TaskTrackerKey::AvailableUsers, force_refresh)
      .await
  }

  /// Encouragement is generated upstream by an LLM, so it always goes through
  /// the cache with the long TTL.
  pub async fn encouragement(&self, username: &str, force_refresh: bool) -> Result<ApiResponse> {
    let key = TaskTrackerKey::Encouragement {
      username: username.to_string(),
    };
    let api = &self.api;
    get_cached_or_fetch(
      &self.cache,
      &key.cache_key(),
      self.ttl_for(&key),
      || async move { api.fetch_encouragement(username).await },
      force_refresh,
    )
    .await
  }

  pub async fn cache_stats(&self) -> CacheStats {
    self.cache.get_stats().await
  }
}
