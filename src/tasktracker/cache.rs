//! Caching implementations for TaskTracker types.

use crate::cache::{join_key, Cacheable};

use super::types::ApiResponse;

// ============================================================================
// Cacheable implementations
// ============================================================================

impl<T: Clone + Send + Sync> Cacheable for ApiResponse<T> {
  fn is_cacheable(&self) -> bool {
    self.is_success()
  }
}

// ============================================================================
// Query key types
// ============================================================================

/// Read operations served through the cache, one variant per upstream query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskTrackerKey {
  /// Tasks the service recommends for a user given the time they have
  RecommendedTasks {
    username: String,
    available_minutes: Option<u32>,
  },
  /// Tasks a user (or anyone) could pick up now
  AvailableTasks { username: Option<String> },
  /// Every task, optionally filtered by assignee
  AllTasks { assigned_to: Option<String> },
  /// Recently logged completions
  RecentCompletions {
    username: Option<String>,
    days: Option<u32>,
    limit: Option<u32>,
  },
  /// Leftovers assigned to a user
  Leftovers { username: String },
  /// Users known to the service
  AvailableUsers,
  /// LLM-written encouragement for a user
  Encouragement { username: String },
}

impl TaskTrackerKey {
  /// Operation tag, which is also the first component of the cache key.
  pub fn operation(&self) -> &'static str {
    match self {
      Self::RecommendedTasks { .. } => "recommended_tasks",
      Self::AvailableTasks { .. } => "available_tasks",
      Self::AllTasks { .. } => "all_tasks",
      Self::RecentCompletions { .. } => "recent_completions",
      Self::Leftovers { .. } => "leftovers",
      Self::AvailableUsers => "available_users",
      Self::Encouragement { .. } => "encouragement",
    }
  }

  pub fn cache_key(&self) -> String {
    let operation = self.operation();
    match self {
      Self::RecommendedTasks {
        username,
        available_minutes,
      } => join_key(operation, &[username, available_minutes]),
      Self::AvailableTasks { username } => join_key(operation, &[username]),
      Self::AllTasks { assigned_to } => join_key(operation, &[assigned_to]),
      Self::RecentCompletions {
        username,
        days,
        limit,
      } => join_key(operation, &[username, days, limit]),
      Self::Leftovers { username } => join_key(operation, &[username]),
      Self::AvailableUsers => join_key(operation, &[]),
      Self::Encouragement { username } => join_key(operation, &[username]),
    }
  }

  /// Endpoint path relative to the service base URL.
  pub fn path(&self) -> &'static str {
    match self {
      Self::RecommendedTasks { .. } => "api/tasks/recommended",
      Self::AvailableTasks { .. } => "api/tasks/available",
      Self::AllTasks { .. } => "api/tasks",
      Self::RecentCompletions { .. } => "api/completions/recent",
      Self::Leftovers { .. } => "api/leftovers",
      Self::AvailableUsers => "api/users",
      Self::Encouragement { .. } => "api/encouragement",
    }
  }

  /// Query-string filters; absent values are left out.
  pub fn query(&self) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    let mut push = |name: &'static str, value: Option<String>| {
      if let Some(value) = value {
        query.push((name, value));
      }
    };

    match self {
      Self::RecommendedTasks {
        username,
        available_minutes,
      } => {
        push("username", Some(username.clone()));
        push("available_minutes", available_minutes.map(|m| m.to_string()));
      }
      Self::AvailableTasks { username } => push("username", username.clone()),
      Self::AllTasks { assigned_to } => push("assigned_to", assigned_to.clone()),
      Self::RecentCompletions {
        username,
        days,
        limit,
      } => {
        push("username", username.clone());
        push("days", days.map(|d| d.to_string()));
        push("limit", limit.map(|l| l.to_string()));
      }
      Self::Leftovers { username } | Self::Encouragement { username } => {
        push("username", Some(username.clone()))
      }
      Self::AvailableUsers => {}
    }

    query
  }

  pub fn description(&self) -> String {
    match self {
      Self::RecommendedTasks {
        username,
        available_minutes,
      } => match available_minutes {
        Some(minutes) => format!("recommended tasks for {} ({} min)", username, minutes),
        None => format!("recommended tasks for {}", username),
      },
      Self::AvailableTasks { username } => match username {
        Some(u) => format!("tasks available to {}", u),
        None => "available tasks".to_string(),
      },
      Self::AllTasks { assigned_to } => match assigned_to {
        Some(u) => format!("tasks assigned to {}", u),
        None => "all tasks".to_string(),
      },
      Self::RecentCompletions { username, .. } => match username {
        Some(u) => format!("recent completions by {}", u),
        None => "recent completions".to_string(),
      },
      Self::Leftovers { username } => format!("leftovers for {}", username),
      Self::AvailableUsers => "available users".to_string(),
      Self::Encouragement { username } => format!("encouragement for {}", username),
    }
  }
}
