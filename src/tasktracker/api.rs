//! The operations the bridge needs from the TaskTracker service.

use async_trait::async_trait;
use color_eyre::Result;

use super::cache::TaskTrackerKey;
use super::types::{
  ApiResponse, CompleteTask, CreateLeftover, CreateTask, DailyPlan, DailyPlanParams,
  DeleteCompletion, DeleteTask, SetDailyState, UpdateCompletion, UpdateTask,
};

/// Request/response shim around the remote service.
///
/// `Err` means the service could not be reached or answered with something
/// unreadable; `Ok(ApiResponse::Failure)` means it answered and said no.
#[async_trait]
pub trait TaskTrackerApi: Send + Sync {
  async fn fetch_daily_plan(
    &self,
    username: &str,
    params: DailyPlanParams,
  ) -> Result<ApiResponse<DailyPlan>>;

  async fn fetch_list(&self, query: &TaskTrackerKey) -> Result<ApiResponse>;

  /// Expensive: the service generates this text with an LLM.
  async fn fetch_encouragement(&self, username: &str) -> Result<ApiResponse>;

  async fn complete_task(&self, request: &CompleteTask) -> Result<ApiResponse>;

  async fn create_task(&self, request: &CreateTask) -> Result<ApiResponse>;

  async fn update_task(&self, request: &UpdateTask) -> Result<ApiResponse>;

  async fn delete_task(&self, request: &DeleteTask) -> Result<ApiResponse>;

  async fn create_leftover(&self, request: &CreateLeftover) -> Result<ApiResponse>;

  async fn update_completion(&self, request: &UpdateCompletion) -> Result<ApiResponse>;

  async fn delete_completion(&self, request: &DeleteCompletion) -> Result<ApiResponse>;

  async fn set_daily_state(&self, request: &SetDailyState) -> Result<ApiResponse>;
}
