//! Scripted in-memory stand-in for the TaskTracker service.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

use super::api::TaskTrackerApi;
use super::cache::TaskTrackerKey;
use super::types::{
  ApiResponse, CompleteTask, CreateLeftover, CreateTask, DailyPlan, DailyPlanParams,
  DeleteCompletion, DeleteTask, SetDailyState, UpdateCompletion, UpdateTask,
};

/// Queued outcome; `Err` stands for a transport failure.
pub type Scripted<T> = Result<ApiResponse<T>, String>;

/// Records every call and answers from per-kind queues.
///
/// When a queue is empty the fake succeeds: daily plans carry a UTC user
/// context for `plan_date` with a midnight reset.
pub struct FakeTaskTracker {
  calls: Mutex<Vec<String>>,
  plans: Mutex<VecDeque<Scripted<DailyPlan>>>,
  reads: Mutex<VecDeque<Scripted<Value>>>,
  mutations: Mutex<VecDeque<Scripted<Value>>>,
  plan_date: Mutex<String>,
}

impl FakeTaskTracker {
  pub fn new() -> Self {
    Self {
      calls: Mutex::new(Vec::new()),
      plans: Mutex::new(VecDeque::new()),
      reads: Mutex::new(VecDeque::new()),
      mutations: Mutex::new(VecDeque::new()),
      plan_date: Mutex::new("2024-06-15".to_string()),
    }
  }

  pub fn set_plan_date(&self, date: &str) {
    *self.plan_date.lock().unwrap() = date.to_string();
  }

  pub fn push_plan(&self, outcome: Scripted<DailyPlan>) {
    self.plans.lock().unwrap().push_back(outcome);
  }

  pub fn push_read(&self, outcome: Scripted<Value>) {
    self.reads.lock().unwrap().push_back(outcome);
  }

  pub fn push_mutation(&self, outcome: Scripted<Value>) {
    self.mutations.lock().unwrap().push_back(outcome);
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  /// Number of recorded calls starting with `prefix`.
  pub fn count(&self, prefix: &str) -> usize {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .filter(|call| call.starts_with(prefix))
      .count()
  }

  fn record(&self, call: String) {
    self.calls.lock().unwrap().push(call);
  }

  fn answer(queue: &Mutex<VecDeque<Scripted<Value>>>, default: Value) -> Result<ApiResponse> {
    match queue.lock().unwrap().pop_front() {
      Some(Ok(response)) => Ok(response),
      Some(Err(message)) => Err(eyre!(message)),
      None => Ok(ApiResponse::Success(default)),
    }
  }

  fn mutate(&self, call: &str) -> Result<ApiResponse> {
    self.record(call.to_string());
    Self::answer(&self.mutations, json!({ "ok": true }))
  }
}

/// A daily plan whose user context reports `date` as the logical day.
pub fn plan_for(username: &str, date: &str, timezone: &str, reset: &str) -> DailyPlan {
  DailyPlan {
    data: json!({ "tasks": [{ "id": 1, "name": "Dishes" }] }),
    user_context: Some(json!({
      "username": username,
      "timezone": timezone,
      "daily_reset_time": reset,
      "current_logical_date": date,
    })),
  }
}

#[async_trait]
impl TaskTrackerApi for FakeTaskTracker {
  async fn fetch_daily_plan(
    &self,
    username: &str,
    params: DailyPlanParams,
  ) -> Result<ApiResponse<DailyPlan>> {
    self.record(format!(
      "fetch_daily_plan:{}:{}:{}",
      username, params.select_recommended, params.fair_weather
    ));

    match self.plans.lock().unwrap().pop_front() {
      Some(Ok(response)) => Ok(response),
      Some(Err(message)) => Err(eyre!(message)),
      None => {
        let date = self.plan_date.lock().unwrap().clone();
        Ok(ApiResponse::Success(plan_for(
          username, &date, "UTC", "00:00:00",
        )))
      }
    }
  }

  async fn fetch_list(&self, query: &TaskTrackerKey) -> Result<ApiResponse> {
    let key = query.cache_key();
    self.record(format!("fetch_list:{}", key));
    Self::answer(&self.reads, json!({ "key": key }))
  }

  async fn fetch_encouragement(&self, username: &str) -> Result<ApiResponse> {
    self.record(format!("fetch_encouragement:{}", username));
    Self::answer(&self.reads, json!({ "message": "You've got this" }))
  }

  async fn complete_task(&self, _request: &CompleteTask) -> Result<ApiResponse> {
    self.mutate("complete_task")
  }

  async fn create_task(&self, _request: &CreateTask) -> Result<ApiResponse> {
    self.mutate("create_task")
  }

  async fn update_task(&self, _request: &UpdateTask) -> Result<ApiResponse> {
    self.mutate("update_task")
  }

  async fn delete_task(&self, _request: &DeleteTask) -> Result<ApiResponse> {
    self.mutate("delete_task")
  }

  async fn create_leftover(&self, _request: &CreateLeftover) -> Result<ApiResponse> {
    self.mutate("create_leftover")
  }

  async fn update_completion(&self, _request: &UpdateCompletion) -> Result<ApiResponse> {
    self.mutate("update_completion")
  }

  async fn delete_completion(&self, _request: &DeleteCompletion) -> Result<ApiResponse> {
    self.mutate("delete_completion")
  }

  async fn set_daily_state(&self, _request: &SetDailyState) -> Result<ApiResponse> {
    self.mutate("set_daily_state")
  }
}
