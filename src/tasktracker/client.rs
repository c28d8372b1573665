use crate::config::{Config, TaskTrackerConfig};
use crate::tasktracker::api::TaskTrackerApi;
use crate::tasktracker::api_types::ApiEnvelope;
use crate::tasktracker::cache::TaskTrackerKey;
use crate::tasktracker::types::{
  ApiResponse, CompleteTask, CreateLeftover, CreateTask, DailyPlan, DailyPlanParams,
  DeleteCompletion, DeleteTask, SetDailyState, UpdateCompletion, UpdateTask,
};
use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::{Client, Method, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP client for the TaskTracker REST API
#[derive(Clone)]
pub struct TaskTrackerClient {
  client: Client,
  base: Url,
  api_key: Option<String>,
}

impl TaskTrackerClient {
  pub fn new(config: &TaskTrackerConfig) -> Result<Self> {
    // Keep any path prefix when joining relative endpoints
    let mut url = config.url.clone();
    if !url.ends_with('/') {
      url.push('/');
    }
    let base =
      Url::parse(&url).map_err(|e| eyre!("Invalid TaskTracker URL {}: {}", config.url, e))?;

    let client = Client::builder()
      .user_agent(concat!("tasktracker-bridge/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base,
      api_key: Config::get_api_key(),
    })
  }

  fn url(&self, path: &str) -> Result<Url> {
    self
      .base
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint {}: {}", path, e))
  }

  async fn request<B: Serialize + ?Sized>(
    &self,
    method: Method,
    path: &str,
    query: &[(&str, String)],
    body: Option<&B>,
  ) -> Result<ApiEnvelope> {
    let url = self.url(path)?;
    debug!(%method, %url, "TaskTracker request");

    let mut request = self.client.request(method, url).query(query);
    if let Some(key) = &self.api_key {
      request = request.header("X-API-Key", key);
    }
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", path, e))?;

    Self::decode(path, response).await
  }

  /// The service reports logical failures in the body, often with a 4xx
  /// status, so the body is decoded before the status is considered.
  async fn decode(path: &str, response: Response) -> Result<ApiEnvelope> {
    let status = response.status();
    let bytes = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read response from {}: {}", path, e))?;

    match serde_json::from_slice::<ApiEnvelope>(&bytes) {
      Ok(envelope) => Ok(envelope),
      Err(e) if status.is_success() => {
        Err(eyre!("Failed to parse response from {}: {}", path, e))
      }
      Err(_) => Err(eyre!(
        "{} returned {}: {}",
        path,
        status,
        String::from_utf8_lossy(&bytes)
      )),
    }
  }

  async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiEnvelope> {
    self
      .request::<()>(Method::GET, path, query, None)
      .await
  }

  async fn send<B: Serialize + ?Sized>(
    &self,
    method: Method,
    path: &str,
    body: &B,
  ) -> Result<ApiResponse> {
    let envelope = self.request(method, path, &[], Some(body)).await?;
    Ok(envelope.into_response())
  }
}

#[async_trait]
impl TaskTrackerApi for TaskTrackerClient {
  async fn fetch_daily_plan(
    &self,
    username: &str,
    params: DailyPlanParams,
  ) -> Result<ApiResponse<DailyPlan>> {
    let query = [
      ("username", username.to_string()),
      ("select_recommended", params.select_recommended.to_string()),
      ("fair_weather", params.fair_weather.to_string()),
    ];
    let envelope = self.get("api/daily-plan", &query).await?;
    Ok(envelope.into_daily_plan())
  }

  async fn fetch_list(&self, query: &TaskTrackerKey) -> Result<ApiResponse> {
    debug!(query = %query.description(), "fetching list");
    let envelope = self.get(query.path(), &query.query()).await?;
    Ok(envelope.into_response())
  }

  async fn fetch_encouragement(&self, username: &str) -> Result<ApiResponse> {
    let key = TaskTrackerKey::Encouragement {
      username: username.to_string(),
    };
    self.fetch_list(&key).await
  }

  async fn complete_task(&self, request: &CompleteTask) -> Result<ApiResponse> {
    self.send(Method::POST, "api/tasks/complete", request).await
  }

  async fn create_task(&self, request: &CreateTask) -> Result<ApiResponse> {
    self.send(Method::POST, "api/tasks", request).await
  }

  async fn update_task(&self, request: &UpdateTask) -> Result<ApiResponse> {
    let path = format!("api/tasks/{}", request.task_id);
    self.send(Method::PUT, &path, request).await
  }

  async fn delete_task(&self, request: &DeleteTask) -> Result<ApiResponse> {
    let path = format!("api/tasks/{}", request.task_id);
    let envelope = self.request::<()>(Method::DELETE, &path, &[], None).await?;
    Ok(envelope.into_response())
  }

  async fn create_leftover(&self, request: &CreateLeftover) -> Result<ApiResponse> {
    self.send(Method::POST, "api/leftovers", request).await
  }

  async fn update_completion(&self, request: &UpdateCompletion) -> Result<ApiResponse> {
    let path = format!("api/completions/{}", request.completion_id);
    self.send(Method::PUT, &path, request).await
  }

  async fn delete_completion(&self, request: &DeleteCompletion) -> Result<ApiResponse> {
    let path = format!("api/completions/{}", request.completion_id);
    let envelope = self.request::<()>(Method::DELETE, &path, &[], None).await?;
    Ok(envelope.into_response())
  }

  async fn set_daily_state(&self, request: &SetDailyState) -> Result<ApiResponse> {
    self.send(Method::POST, "api/daily-state", request).await
  }
}
