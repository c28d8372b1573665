//! Which cache entries and coordinators each mutation makes stale.
//!
//! Working out exactly who a mutation affects is often impossible (shared
//! tasks, undo), so every rule here errs towards evicting too much.

use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::coordinator::CoordinatorRegistry;
use crate::tasktracker::types::ApiResponse;

/// Prefixes of every cached list shared between users
pub const SHARED_LIST_PREFIXES: &[&str] = &[
  "recommended_tasks:",
  "available_tasks:",
  "all_tasks:",
  "recent_completions:",
  "leftovers:",
];

/// Lists that a new leftover can appear in
pub const LEFTOVER_PREFIXES: &[&str] = &["leftovers:", "available_tasks:", "all_tasks:"];

/// Pattern matching every key that carries `username` as a parameter.
pub fn user_pattern(username: &str) -> String {
  format!(":{}", username)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
  /// Completing a task by id or by name
  CompleteTask,
  CreateTask,
  UpdateTask,
  DeleteTask,
  /// An empty list means the leftover could not be attributed
  CreateLeftover { assigned_users: Vec<String> },
  UpdateCompletion,
  DeleteCompletion,
  SetDailyState { username: String },
  /// Explicit request to drop everything
  Manual,
}

/// Cache patterns to evict and users whose daily plan must be refetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
  pub patterns: Vec<String>,
  pub refresh_users: Vec<String>,
}

impl InvalidationPlan {
  fn add_pattern(&mut self, pattern: String) {
    if !self.patterns.contains(&pattern) {
      self.patterns.push(pattern);
    }
  }

  fn add_user(&mut self, username: &str) {
    self.add_pattern(user_pattern(username));
    if !self.refresh_users.iter().any(|u| u == username) {
      self.refresh_users.push(username.to_string());
    }
  }

  fn everything(known_users: &[String]) -> Self {
    let mut plan = Self::default();
    for prefix in SHARED_LIST_PREFIXES {
      plan.add_pattern(prefix.to_string());
    }
    for user in known_users {
      plan.add_user(user);
    }
    plan
  }
}

impl Mutation {
  pub fn plan(&self, known_users: &[String]) -> InvalidationPlan {
    match self {
      Mutation::CompleteTask
      | Mutation::CreateTask
      | Mutation::UpdateTask
      | Mutation::DeleteTask
      | Mutation::UpdateCompletion
      | Mutation::DeleteCompletion
      | Mutation::Manual => InvalidationPlan::everything(known_users),
      Mutation::CreateLeftover { assigned_users } => {
        let mut plan = InvalidationPlan::default();
        for prefix in LEFTOVER_PREFIXES {
          plan.add_pattern(prefix.to_string());
        }
        let affected = if assigned_users.is_empty() {
          known_users
        } else {
          assigned_users.as_slice()
        };
        for user in affected {
          plan.add_user(user);
        }
        plan
      }
      Mutation::SetDailyState { username } => {
        let mut plan = InvalidationPlan::default();
        plan.add_user(username);
        plan
      }
    }
  }
}

/// Applies invalidation plans to the shared cache and the coordinators.
pub struct Invalidator<'a> {
  cache: &'a TtlCache<ApiResponse>,
  coordinators: &'a CoordinatorRegistry,
}

impl<'a> Invalidator<'a> {
  pub fn new(cache: &'a TtlCache<ApiResponse>, coordinators: &'a CoordinatorRegistry) -> Self {
    Self {
      cache,
      coordinators,
    }
  }

  /// Evict every pattern, then clear and refetch each affected user's daily
  /// plan one user at a time. Returns once every refresh has finished.
  pub async fn apply(&self, plan: &InvalidationPlan) {
    let mut removed = 0;
    for pattern in &plan.patterns {
      removed += self.cache.invalidate(Some(pattern)).await;
    }
    info!(
      patterns = plan.patterns.len(),
      removed,
      users = plan.refresh_users.len(),
      "cache invalidated"
    );

    for username in &plan.refresh_users {
      let Some(coordinator) = self.coordinators.get(username) else {
        debug!(username = %username, "no coordinator to refresh");
        continue;
      };

      coordinator.clear().await;
      match coordinator.refresh().await {
        Ok(ApiResponse::Success(_)) => {}
        Ok(ApiResponse::Failure(failure)) => {
          warn!(username = %username, message = %failure.message, "post-mutation refresh rejected")
        }
        Err(e) => warn!(username = %username, error = %e, "post-mutation refresh failed"),
      }
    }
  }

  /// Drop one user's cached entries and refetch their daily plan.
  pub async fn invalidate_user_cache(&self, username: &str) {
    let mut plan = InvalidationPlan::default();
    plan.add_user(username);
    self.apply(&plan).await;
  }

  /// Drop every configured user's cached entries and refetch all daily plans.
  pub async fn invalidate_all_user_caches(&self) {
    let mut plan = InvalidationPlan::default();
    for username in self.coordinators.usernames() {
      plan.add_user(username);
    }
    self.apply(&plan).await;
  }
}
