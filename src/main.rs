mod app;
mod cache;
mod commands;
mod config;
mod coordinator;
mod event;
mod integration;
mod logging;
mod tasktracker;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use integration::Integration;
use tasktracker::{TaskTrackerApi, TaskTrackerClient};

#[derive(Parser, Debug)]
#[command(name = "ttb")]
#[command(about = "Cached bridge to a TaskTracker service with per-user daily plans")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/tasktracker-bridge/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// User to keep a daily plan for; repeat to replace the configured list
  #[arg(short, long = "user")]
  users: Vec<String>,

  #[command(subcommand)]
  command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
  /// Read commands from stdin and keep daily plans fresh (default)
  Run,
  /// Run a single command and exit
  Call {
    /// Command line, e.g. `plan alice fair=true`
    #[arg(required = true, trailing_var_arg = true)]
    words: Vec<String>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override users if specified on command line
  let config = if args.users.is_empty() {
    config
  } else {
    config.with_users(args.users)
  };

  let _log_guard = logging::init(&config.logging)?;

  let api: Arc<dyn TaskTrackerApi> = Arc::new(TaskTrackerClient::new(&config.tasktracker)?);

  match args.command.unwrap_or(Cmd::Run) {
    Cmd::Run => {
      let integration = Arc::new(Integration::setup(&config, api).await);
      let mut app = app::App::new(Arc::clone(&integration));
      let result = app.run().await;
      integration.shutdown();
      result?;
    }
    Cmd::Call { words } => {
      let line = words
        .iter()
        .map(|word| {
          if word.contains(char::is_whitespace) {
            format!("\"{}\"", word)
          } else {
            word.clone()
          }
        })
        .collect::<Vec<_>>()
        .join(" ");
      let integration = Arc::new(Integration::new(&config, api));
      let mut app = app::App::new(integration);
      let output = app.handle_line(&line).await;
      println!("{}", serde_json::to_string_pretty(&output)?);
    }
  }

  Ok(())
}
