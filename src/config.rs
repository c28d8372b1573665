use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub tasktracker: TaskTrackerConfig,
  /// Users that get a daily-plan coordinator
  #[serde(default)]
  pub users: Vec<String>,
  #[serde(default)]
  pub daily_plan: DailyPlanConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskTrackerConfig {
  pub url: String,
  /// Per-request timeout enforced by the HTTP client
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  10
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DailyPlanConfig {
  pub update_interval_secs: u64,
  /// Initial parameters of every coordinator
  pub select_recommended: bool,
  pub fair_weather: bool,
}

impl Default for DailyPlanConfig {
  fn default() -> Self {
    Self {
      update_interval_secs: 180,
      select_recommended: false,
      fair_weather: false,
    }
  }
}

impl DailyPlanConfig {
  pub fn update_interval(&self) -> Duration {
    Duration::from_secs(self.update_interval_secs)
  }
}

/// Read TTLs in seconds, per operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub recommended_tasks: u64,
  pub available_tasks: u64,
  pub all_tasks: u64,
  pub recent_completions: u64,
  pub leftovers: u64,
  pub available_users: u64,
  /// LLM-generated text is costly, so it is kept much longer
  pub encouragement: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      recommended_tasks: 60,
      available_tasks: 60,
      all_tasks: 60,
      recent_completions: 60,
      leftovers: 60,
      available_users: 3600,
      encouragement: 3600,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Default filter directive; RUST_LOG takes precedence
  pub level: String,
  /// Log file; stderr when unset
  pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      file: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./tasktracker.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/tasktracker-bridge/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/tasktracker-bridge/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("tasktracker.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("tasktracker-bridge").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.daily_plan.update_interval_secs == 0 {
      return Err(eyre!("daily_plan.update_interval_secs must be greater than zero"));
    }
    let users = config.users.clone();
    Ok(config.with_users(users))
  }

  /// Replace the user list, dropping blanks and repeats.
  pub fn with_users(self, users: Vec<String>) -> Self {
    let mut unique: Vec<String> = Vec::with_capacity(users.len());
    for user in users {
      let user = user.trim().to_string();
      if !user.is_empty() && !unique.contains(&user) {
        unique.push(user);
      }
    }
    Config {
      users: unique,
      ..self
    }
  }

  /// Get the TaskTracker API key from environment variables.
  ///
  /// Checks TASKTRACKER_API_KEY first, then TTB_API_KEY as fallback.
  pub fn get_api_key() -> Option<String> {
    std::env::var("TASKTRACKER_API_KEY")
      .or_else(|_| std::env::var("TTB_API_KEY"))
      .ok()
  }
}
