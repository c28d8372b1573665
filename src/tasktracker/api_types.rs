//! Serde-deserializable types matching TaskTracker API responses.
//!
//! Every endpoint answers with the same loose envelope. It is converted into
//! `ApiResponse` here so the rest of the crate never probes JSON keys.

use serde::Deserialize;
use serde_json::Value;

use super::types::{ApiFailure, ApiResponse, DailyPlan};

#[derive(Debug, Default, Deserialize)]
pub struct ApiEnvelope {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub data: Value,
  pub message: Option<String>,
  pub error: Option<String>,
  pub code: Option<String>,
  /// Only ever read from the top level of the envelope
  pub user_context: Option<Value>,
}

impl ApiEnvelope {
  fn into_failure(self) -> ApiFailure {
    ApiFailure {
      message: self
        .error
        .or(self.message)
        .unwrap_or_else(|| "request was not successful".to_string()),
      code: self.code,
    }
  }

  pub fn into_response(self) -> ApiResponse {
    if self.success {
      ApiResponse::Success(self.data)
    } else {
      ApiResponse::Failure(self.into_failure())
    }
  }

  pub fn into_daily_plan(self) -> ApiResponse<DailyPlan> {
    if self.success {
      ApiResponse::Success(DailyPlan {
        data: self.data,
        user_context: self.user_context,
      })
    } else {
      ApiResponse::Failure(self.into_failure())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn envelope(value: Value) -> ApiEnvelope {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_success_envelope() {
    let response = envelope(json!({ "success": true, "data": [1, 2] })).into_response();
    assert_eq!(response, ApiResponse::Success(json!([1, 2])));
  }

  #[test]
  fn test_failure_prefers_error_over_message() {
    let response = envelope(json!({
      "success": false,
      "error": "task not found",
      "message": "generic",
      "code": "NOT_FOUND"
    }))
    .into_response();

    assert_eq!(
      response,
      ApiResponse::Failure(ApiFailure {
        message: "task not found".to_string(),
        code: Some("NOT_FOUND".to_string()),
      })
    );
  }

  #[test]
  fn test_missing_success_is_failure() {
    let response = envelope(json!({ "data": {} })).into_response();
    assert!(!response.is_success());
  }

  #[test]
  fn test_daily_plan_keeps_top_level_context() {
    let plan = envelope(json!({
      "success": true,
      "data": { "tasks": [] },
      "user_context": { "username": "alice", "current_logical_date": "2024-06-15" }
    }))
    .into_daily_plan();

    let plan = plan.success().cloned().unwrap();
    assert_eq!(plan.data, json!({ "tasks": [] }));
    assert_eq!(plan.user_context.unwrap()["username"], "alice");
  }

  #[test]
  fn test_nested_context_is_not_lifted() {
    let plan = envelope(json!({
      "success": true,
      "data": { "user_context": { "username": "alice" } }
    }))
    .into_daily_plan();

    assert_eq!(plan.success().unwrap().user_context, None);
  }
}
