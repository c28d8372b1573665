use color_eyre::Result;
use serde_json::Value;
use tracing::info;

use super::events::IntegrationEvent;
use super::invalidation::Mutation;
use super::Integration;
use crate::tasktracker::types::{
  ApiResponse, CompleteTask, CreateLeftover, CreateTask, DeleteCompletion, DeleteTask,
  SetDailyState, UpdateCompletion, UpdateTask,
};

impl Integration {
  /// After a successful mutation: invalidate, wait for the affected daily
  /// plans to be refetched, then publish the event. A rejected mutation
  /// changes nothing locally.
  async fn settle(
    &self,
    response: ApiResponse,
    mutation: Mutation,
    event: impl FnOnce(&Value) -> IntegrationEvent,
  ) -> ApiResponse {
    if let ApiResponse::Success(data) = &response {
      let plan = mutation.plan(&self.users);
      self.invalidator().apply(&plan).await;
      self.events.publish(event(data));
    }
    response
  }

  pub async fn complete_task(&self, request: CompleteTask) -> Result<ApiResponse> {
    info!(task = %request.task, completed_by = ?request.completed_by, "completing task");
    let response = self.api.complete_task(&request).await?;
    Ok(
      self
        .settle(response, Mutation::CompleteTask, |data| {
          IntegrationEvent::TaskCompleted {
            task: request.task.to_string(),
            completed_by: request.completed_by.clone(),
            data: data.clone(),
          }
        })
        .await,
    )
  }

  pub async fn create_task(&self, request: CreateTask) -> Result<ApiResponse> {
    info!(name = %request.name, "creating task");
    let response = self.api.create_task(&request).await?;
    Ok(
      self
        .settle(response, Mutation::CreateTask, |data| {
          IntegrationEvent::TaskCreated {
            name: request.name.clone(),
            data: data.clone(),
          }
        })
        .await,
    )
  }

  pub async fn update_task(&self, request: UpdateTask) -> Result<ApiResponse> {
    info!(task_id = request.task_id, "updating task");
    let response = self.api.update_task(&request).await?;
    Ok(
      self
        .settle(response, Mutation::UpdateTask, |data| {
          IntegrationEvent::TaskUpdated {
            task_id: request.task_id,
            data: data.clone(),
          }
        })
        .await,
    )
  }

  pub async fn delete_task(&self, request: DeleteTask) -> Result<ApiResponse> {
    info!(task_id = request.task_id, "deleting task");
    let response = self.api.delete_task(&request).await?;
    Ok(
      self
        .settle(response, Mutation::DeleteTask, |_| {
          IntegrationEvent::TaskDeleted {
            task_id: request.task_id,
          }
        })
        .await,
    )
  }

  pub async fn create_leftover(&self, request: CreateLeftover) -> Result<ApiResponse> {
    info!(name = %request.name, assigned = ?request.assigned_users, "creating leftover");
    let response = self.api.create_leftover(&request).await?;
    let mutation = Mutation::CreateLeftover {
      assigned_users: request.assigned_users.clone(),
    };
    Ok(
      self
        .settle(response, mutation, |data| IntegrationEvent::LeftoverCreated {
          name: request.name.clone(),
          assigned_users: request.assigned_users.clone(),
          data: data.clone(),
        })
        .await,
    )
  }

  pub async fn update_completion(&self, request: UpdateCompletion) -> Result<ApiResponse> {
    info!(completion_id = request.completion_id, "updating completion");
    let response = self.api.update_completion(&request).await?;
    Ok(
      self
        .settle(response, Mutation::UpdateCompletion, |data| {
          IntegrationEvent::CompletionUpdated {
            completion_id: request.completion_id,
            data: data.clone(),
          }
        })
        .await,
    )
  }

  pub async fn delete_completion(&self, request: DeleteCompletion) -> Result<ApiResponse> {
    info!(completion_id = request.completion_id, "deleting completion");
    let response = self.api.delete_completion(&request).await?;
    Ok(
      self
        .settle(response, Mutation::DeleteCompletion, |_| {
          IntegrationEvent::CompletionDeleted {
            completion_id: request.completion_id,
          }
        })
        .await,
    )
  }

  pub async fn set_daily_state(&self, request: SetDailyState) -> Result<ApiResponse> {
    info!(username = %request.username, "setting daily state");
    let response = self.api.set_daily_state(&request).await?;
    let mutation = Mutation::SetDailyState {
      username: request.username.clone(),
    };
    Ok(
      self
        .settle(response, mutation, |data| IntegrationEvent::DailyStateSet {
          username: request.username.clone(),
          data: data.clone(),
        })
        .await,
    )
  }

  /// Drop every cached entry and refetch every daily plan.
  pub async fn invalidate_cache(&self) -> ApiResponse {
    info!("manual cache invalidation");
    self
      .settle(
        ApiResponse::Success(Value::Null),
        Mutation::Manual,
        |_| IntegrationEvent::CacheInvalidated,
      )
      .await
  }
}
