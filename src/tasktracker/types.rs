use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Outcome of a TaskTracker call that reached the service.
///
/// Transport problems are reported separately as `Err`; this type only
/// distinguishes the service saying yes from the service saying no.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T = Value> {
  Success(T),
  Failure(ApiFailure),
}

/// Error reported by the service itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiFailure {
  pub message: String,
  pub code: Option<String>,
}

impl<T> ApiResponse<T> {
  pub fn failure(message: impl Into<String>) -> Self {
    ApiResponse::Failure(ApiFailure {
      message: message.into(),
      code: None,
    })
  }

  pub fn is_success(&self) -> bool {
    matches!(self, ApiResponse::Success(_))
  }

  pub fn success(&self) -> Option<&T> {
    match self {
      ApiResponse::Success(data) => Some(data),
      ApiResponse::Failure(_) => None,
    }
  }
}

impl<T: Serialize> ApiResponse<T> {
  /// Render back into the `{success, data}` shape handed to callers.
  pub fn to_json(&self) -> Value {
    match self {
      ApiResponse::Success(data) => json!({ "success": true, "data": data }),
      ApiResponse::Failure(failure) => json!({
        "success": false,
        "message": failure.message,
        "code": failure.code,
      }),
    }
  }
}

/// A user's daily plan as returned by the service.
///
/// `user_context` is the envelope that wraps the task payload; it sits beside
/// `data`, never inside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPlan {
  pub data: Value,
  pub user_context: Option<Value>,
}

/// Per-user settings the service used to compute a daily plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
  #[serde(default)]
  pub username: String,
  /// IANA zone name
  pub timezone: String,
  /// `HH:MM:SS` local time at which the logical day starts
  pub daily_reset_time: String,
  /// ISO date of the logical day when the plan was computed
  pub current_logical_date: String,
}

/// Parameters that shape a daily plan request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyPlanParams {
  pub select_recommended: bool,
  pub fair_weather: bool,
}

/// How a task is identified when completing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TaskRef {
  #[serde(rename = "task_id")]
  Id(u64),
  #[serde(rename = "name")]
  Name(String),
}

impl std::fmt::Display for TaskRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TaskRef::Id(id) => write!(f, "#{}", id),
      TaskRef::Name(name) => write!(f, "{}", name),
    }
  }
}

// ============================================================================
// Mutation requests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteTask {
  #[serde(flatten)]
  pub task: TaskRef,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub completed_by: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTask {
  pub name: String,
  pub assigned_users: Vec<String>,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateTask {
  #[serde(skip)]
  pub task_id: u64,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteTask {
  pub task_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateLeftover {
  pub name: String,
  pub assigned_users: Vec<String>,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCompletion {
  #[serde(skip)]
  pub completion_id: u64,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteCompletion {
  pub completion_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetDailyState {
  pub username: String,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_complete_by_id_body() {
    let request = CompleteTask {
      task: TaskRef::Id(12),
      completed_by: Some("alice".to_string()),
      notes: None,
    };
    assert_eq!(
      serde_json::to_value(&request).unwrap(),
      json!({ "task_id": 12, "completed_by": "alice" })
    );
  }

  #[test]
  fn test_complete_by_name_body() {
    let request = CompleteTask {
      task: TaskRef::Name("Dishes".to_string()),
      completed_by: None,
      notes: Some("all of them".to_string()),
    };
    assert_eq!(
      serde_json::to_value(&request).unwrap(),
      json!({ "name": "Dishes", "notes": "all of them" })
    );
  }

  #[test]
  fn test_failure_json() {
    let response: ApiResponse = ApiResponse::failure("nope");
    assert_eq!(
      response.to_json(),
      json!({ "success": false, "message": "nope", "code": null })
    );
  }
}
