use color_eyre::Result;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::commands::{self, InvalidateTarget, Invocation};
use crate::event::{Event, EventHandler};
use crate::integration::Integration;

/// Line-oriented front end: one command in, one JSON document out.
pub struct App {
  integration: Arc<Integration>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(integration: Arc<Integration>) -> Self {
    Self {
      integration,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    let mut events = EventHandler::new(self.integration.subscribe());

    // Main loop
    while !self.should_quit {
      let Some(event) = events.next().await else {
        break;
      };
      self.handle_event(event).await?;
    }

    Ok(())
  }

  async fn handle_event(&mut self, event: Event) -> Result<()> {
    match event {
      Event::Line(line) => {
        if line.trim().is_empty() {
          return Ok(());
        }
        let output = self.handle_line(&line).await;
        print_json(&output)?;
      }
      Event::Eof => {
        debug!("input closed");
        self.should_quit = true;
      }
      Event::Interrupt => {
        info!("interrupted");
        self.should_quit = true;
      }
      Event::Integration(event) => {
        info!(event = ?event, "integration event");
      }
    }
    Ok(())
  }

  /// Parse and run one command line. Parse and transport errors are reported
  /// in the same `{success, message}` shape as service failures.
  pub async fn handle_line(&mut self, line: &str) -> Value {
    let result = match commands::parse(line) {
      Ok(invocation) => self.execute(invocation).await,
      Err(e) => Err(e),
    };
    match result {
      Ok(value) => value,
      Err(e) => {
        warn!(command = line, error = %e, "command failed");
        json!({ "success": false, "message": e.to_string() })
      }
    }
  }

  pub async fn execute(&mut self, invocation: Invocation) -> Result<Value> {
    let integration = &self.integration;

    let value = match invocation {
      Invocation::DailyPlan {
        username,
        params,
        force,
      } => integration
        .daily_plan(&username, params, force)
        .await?
        .to_json(),
      Invocation::Recommended {
        username,
        minutes,
        force,
      } => integration
        .recommended_tasks(&username, minutes, force)
        .await?
        .to_json(),
      Invocation::Available { username, force } => integration
        .available_tasks(username.as_deref(), force)
        .await?
        .to_json(),
      Invocation::AllTasks { assigned_to, force } => integration
        .all_tasks(assigned_to.as_deref(), force)
        .await?
        .to_json(),
      Invocation::Completions {
        username,
        days,
        limit,
        force,
      } => integration
        .recent_completions(username.as_deref(), days, limit, force)
        .await?
        .to_json(),
      Invocation::Leftovers { username, force } => {
        integration.leftovers(&username, force).await?.to_json()
      }
      Invocation::Users { force } => integration.available_users(force).await?.to_json(),
      Invocation::Encourage { username, force } => {
        integration.encouragement(&username, force).await?.to_json()
      }
      Invocation::Complete(request) => integration.complete_task(request).await?.to_json(),
      Invocation::Create(request) => integration.create_task(request).await?.to_json(),
      Invocation::Update(request) => integration.update_task(request).await?.to_json(),
      Invocation::Delete(request) => integration.delete_task(request).await?.to_json(),
      Invocation::Leftover(request) => integration.create_leftover(request).await?.to_json(),
      Invocation::EditCompletion(request) => {
        integration.update_completion(request).await?.to_json()
      }
      Invocation::Undo(request) => integration.delete_completion(request).await?.to_json(),
      Invocation::State(request) => integration.set_daily_state(request).await?.to_json(),
      Invocation::Invalidate(InvalidateTarget::Everything) => {
        integration.invalidate_cache().await.to_json()
      }
      Invocation::Invalidate(InvalidateTarget::User(username)) => {
        integration.invalidate_user_cache(&username).await;
        json!({ "success": true, "data": { "invalidated": [username] } })
      }
      Invocation::Invalidate(InvalidateTarget::AllUsers) => {
        integration.invalidate_all_user_caches().await;
        json!({ "success": true, "data": { "invalidated": integration.users() } })
      }
      Invocation::Stats => {
        let stats = integration.cache_stats().await;
        json!({
          "success": true,
          "data": {
            "stats": stats,
            "keys": integration.cache().keys().await,
            "users": integration.users(),
          }
        })
      }
      Invocation::Help => {
        let commands: Vec<Value> = commands::COMMANDS
          .iter()
          .map(|cmd| {
            json!({
              "name": cmd.name,
              "aliases": cmd.aliases,
              "usage": cmd.usage,
              "description": cmd.description,
            })
          })
          .collect();
        json!({ "success": true, "data": commands })
      }
      Invocation::Quit => {
        self.should_quit = true;
        json!({ "success": true, "data": null })
      }
    };

    Ok(value)
  }
}

fn print_json(value: &Value) -> Result<()> {
  let mut out = std::io::stdout().lock();
  serde_json::to_writer_pretty(&mut out, value)?;
  writeln!(out)?;
  out.flush()?;
  Ok(())
}
