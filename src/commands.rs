/// Available commands, autocomplete logic, and command-line parsing
use color_eyre::{eyre::eyre, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::tasktracker::types::{
  CompleteTask, CreateLeftover, CreateTask, DailyPlanParams, DeleteCompletion, DeleteTask,
  SetDailyState, TaskRef, UpdateCompletion, UpdateTask,
};

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "plan",
    aliases: &["p", "daily-plan"],
    usage: "plan <user> [select=BOOL] [fair=BOOL] [force=BOOL]",
    description: "Show a user's daily plan",
  },
  Command {
    name: "recommended",
    aliases: &["r", "rec"],
    usage: "recommended <user> [minutes=N] [force=BOOL]",
    description: "Recommended tasks for the time available",
  },
  Command {
    name: "available",
    aliases: &["a", "avail"],
    usage: "available [user] [force=BOOL]",
    description: "Tasks that can be picked up now",
  },
  Command {
    name: "tasks",
    aliases: &["t", "all"],
    usage: "tasks [assignee] [force=BOOL]",
    description: "Every task",
  },
  Command {
    name: "completions",
    aliases: &["history"],
    usage: "completions [user] [days=N] [limit=N] [force=BOOL]",
    description: "Recently completed tasks",
  },
  Command {
    name: "leftovers",
    aliases: &["l"],
    usage: "leftovers <user> [force=BOOL]",
    description: "Leftovers assigned to a user",
  },
  Command {
    name: "users",
    aliases: &["u"],
    usage: "users [force=BOOL]",
    description: "Users known to TaskTracker",
  },
  Command {
    name: "encourage",
    aliases: &["e", "cheer"],
    usage: "encourage <user> [force=BOOL]",
    description: "A word of encouragement",
  },
  Command {
    name: "complete",
    aliases: &["c", "done"],
    usage: "complete <id|name> [by=USER] [notes=TEXT]",
    description: "Mark a task as done",
  },
  Command {
    name: "create",
    aliases: &["new", "add"],
    usage: "create name=TEXT [users=A,B] [FIELD=VALUE...]",
    description: "Create a task",
  },
  Command {
    name: "update",
    aliases: &["edit"],
    usage: "update <id> FIELD=VALUE...",
    description: "Change a task",
  },
  Command {
    name: "delete",
    aliases: &["rm", "del"],
    usage: "delete <id>",
    description: "Delete a task",
  },
  Command {
    name: "leftover",
    aliases: &["add-leftover"],
    usage: "leftover name=TEXT [users=A,B] [FIELD=VALUE...]",
    description: "Record a leftover",
  },
  Command {
    name: "edit-completion",
    aliases: &["fix"],
    usage: "edit-completion <id> FIELD=VALUE...",
    description: "Change a logged completion",
  },
  Command {
    name: "undo",
    aliases: &["uncomplete"],
    usage: "undo <completion id>",
    description: "Delete a logged completion",
  },
  Command {
    name: "state",
    aliases: &["s", "mood"],
    usage: "state <user> FIELD=VALUE...",
    description: "Set a user's daily state",
  },
  Command {
    name: "invalidate",
    aliases: &["i", "flush"],
    usage: "invalidate [user | scope=users]",
    description: "Drop cached data",
  },
  Command {
    name: "stats",
    aliases: &["cache"],
    usage: "stats",
    description: "Cache statistics",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "List commands",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit",
  },
];

fn ranked_suggestions(input: &str) -> Vec<(&'static Command, u32)> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().map(|cmd| (cmd, 0)).collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);
  matches
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  ranked_suggestions(input)
    .into_iter()
    .map(|(cmd, _)| cmd)
    .collect()
}

/// Resolve a command word: exact name or alias first, then an unambiguous
/// prefix. Fuzzy matches are only offered as hints.
pub fn resolve(word: &str) -> Result<&'static Command> {
  let ranked = ranked_suggestions(word);
  let best = ranked.first().map(|(_, rank)| *rank);

  match best {
    Some(0) | Some(1) => Ok(ranked[0].0),
    Some(rank @ (2 | 3)) => {
      let candidates: Vec<&str> = ranked
        .iter()
        .filter(|(_, r)| *r == rank)
        .map(|(cmd, _)| cmd.name)
        .collect();
      if candidates.len() == 1 {
        Ok(ranked[0].0)
      } else {
        Err(eyre!(
          "Ambiguous command '{}': {}",
          word,
          candidates.join(", ")
        ))
      }
    }
    Some(_) => Err(eyre!(
      "Unknown command '{}'. Did you mean {}?",
      word,
      ranked[0].0.name
    )),
    None => Err(eyre!("Unknown command '{}'. Type 'help' for a list.", word)),
  }
}

/// Which cached data an `invalidate` command drops
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidateTarget {
  Everything,
  User(String),
  AllUsers,
}

/// A fully parsed command line
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
  DailyPlan {
    username: String,
    params: Option<DailyPlanParams>,
    force: bool,
  },
  Recommended {
    username: String,
    minutes: Option<u32>,
    force: bool,
  },
  Available {
    username: Option<String>,
    force: bool,
  },
  AllTasks {
    assigned_to: Option<String>,
    force: bool,
  },
  Completions {
    username: Option<String>,
    days: Option<u32>,
    limit: Option<u32>,
    force: bool,
  },
  Leftovers {
    username: String,
    force: bool,
  },
  Users {
    force: bool,
  },
  Encourage {
    username: String,
    force: bool,
  },
  Complete(CompleteTask),
  Create(CreateTask),
  Update(UpdateTask),
  Delete(DeleteTask),
  Leftover(CreateLeftover),
  EditCompletion(UpdateCompletion),
  Undo(DeleteCompletion),
  State(SetDailyState),
  Invalidate(InvalidateTarget),
  Stats,
  Help,
  Quit,
}

/// Split a line on whitespace, keeping double-quoted runs together.
fn tokenize(line: &str) -> Result<Vec<String>> {
  let mut tokens = Vec::new();
  let mut current = String::new();
  let mut in_quotes = false;
  let mut has_token = false;

  for ch in line.chars() {
    match ch {
      '"' => {
        in_quotes = !in_quotes;
        has_token = true;
      }
      c if c.is_whitespace() && !in_quotes => {
        if has_token {
          tokens.push(std::mem::take(&mut current));
          has_token = false;
        }
      }
      c => {
        current.push(c);
        has_token = true;
      }
    }
  }

  if in_quotes {
    return Err(eyre!("Unterminated quote"));
  }
  if has_token {
    tokens.push(current);
  }
  Ok(tokens)
}

/// Positional and `key=value` arguments of one command
#[derive(Debug, Default)]
struct Args {
  positional: Vec<String>,
  named: BTreeMap<String, String>,
}

impl Args {
  fn new(tokens: impl IntoIterator<Item = String>) -> Self {
    let mut args = Args::default();
    for token in tokens {
      match token.split_once('=') {
        Some((key, value)) if !key.is_empty() => {
          args.named.insert(key.to_lowercase(), value.to_string());
        }
        _ => args.positional.push(token),
      }
    }
    args
  }

  fn take(&mut self, name: &str) -> Option<String> {
    self.named.remove(name)
  }

  fn positional(&mut self) -> Option<String> {
    if self.positional.is_empty() {
      None
    } else {
      Some(self.positional.remove(0))
    }
  }

  /// `user=NAME`, else the first positional argument.
  fn username(&mut self) -> Option<String> {
    self.take("user").or_else(|| self.positional())
  }

  fn required_username(&mut self) -> Result<String> {
    self.username().ok_or_else(|| eyre!("A username is required"))
  }

  fn number<T: std::str::FromStr>(&mut self, name: &str) -> Result<Option<T>> {
    match self.take(name) {
      Some(value) => value
        .parse()
        .map(Some)
        .map_err(|_| eyre!("{} must be a number, got '{}'", name, value)),
      None => Ok(None),
    }
  }

  /// `id=N`, else a numeric first positional argument.
  fn required_id(&mut self) -> Result<u64> {
    if let Some(id) = self.number("id")? {
      return Ok(id);
    }
    let value = self.positional().ok_or_else(|| eyre!("An id is required"))?;
    value
      .parse()
      .map_err(|_| eyre!("id must be a number, got '{}'", value))
  }

  fn flag(&mut self, name: &str) -> Result<Option<bool>> {
    match self.take(name) {
      Some(value) => match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(Some(true)),
        "false" | "no" | "off" | "0" => Ok(Some(false)),
        _ => Err(eyre!("{} must be true or false, got '{}'", name, value)),
      },
      None => Ok(None),
    }
  }

  fn force(&mut self) -> Result<bool> {
    Ok(self.flag("force")?.unwrap_or(false))
  }

  /// Comma-separated user list
  fn users(&mut self) -> Vec<String> {
    self
      .take("users")
      .map(|list| {
        list
          .split(',')
          .map(str::trim)
          .filter(|u| !u.is_empty())
          .map(String::from)
          .collect()
      })
      .unwrap_or_default()
  }

  /// Every remaining `key=value` pair as a JSON object. Values that parse as
  /// JSON keep their type; anything else is a string.
  fn into_fields(self) -> Result<Map<String, Value>> {
    if let Some(extra) = self.positional.first() {
      return Err(eyre!("Unexpected argument '{}'", extra));
    }
    Ok(
      self
        .named
        .into_iter()
        .map(|(key, value)| {
          let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
          (key, value)
        })
        .collect(),
    )
  }

  fn finish(self) -> Result<()> {
    if let Some(extra) = self.positional.first() {
      return Err(eyre!("Unexpected argument '{}'", extra));
    }
    if let Some(key) = self.named.keys().next() {
      return Err(eyre!("Unknown option '{}'", key));
    }
    Ok(())
  }
}

/// Parse one command line into an invocation.
pub fn parse(line: &str) -> Result<Invocation> {
  let mut tokens = tokenize(line)?.into_iter();
  let word = tokens.next().ok_or_else(|| eyre!("Empty command"))?;
  let command = resolve(&word)?;
  let mut args = Args::new(tokens);

  let invocation = match command.name {
    "plan" => {
      let username = args.required_username()?;
      let select = args.flag("select")?;
      let fair = args.flag("fair")?;
      let params = if select.is_some() || fair.is_some() {
        Some(DailyPlanParams {
          select_recommended: select.unwrap_or(false),
          fair_weather: fair.unwrap_or(false),
        })
      } else {
        None
      };
      let force = args.force()?;
      args.finish()?;
      Invocation::DailyPlan {
        username,
        params,
        force,
      }
    }
    "recommended" => {
      let username = args.required_username()?;
      let minutes = args.number("minutes")?;
      let force = args.force()?;
      args.finish()?;
      Invocation::Recommended {
        username,
        minutes,
        force,
      }
    }
    "available" => {
      let username = args.username();
      let force = args.force()?;
      args.finish()?;
      Invocation::Available { username, force }
    }
    "tasks" => {
      let assigned_to = args.take("assigned_to").or_else(|| args.username());
      let force = args.force()?;
      args.finish()?;
      Invocation::AllTasks { assigned_to, force }
    }
    "completions" => {
      let username = args.username();
      let days = args.number("days")?;
      let limit = args.number("limit")?;
      let force = args.force()?;
      args.finish()?;
      Invocation::Completions {
        username,
        days,
        limit,
        force,
      }
    }
    "leftovers" => {
      let username = args.required_username()?;
      let force = args.force()?;
      args.finish()?;
      Invocation::Leftovers { username, force }
    }
    "users" => {
      let force = args.force()?;
      args.finish()?;
      Invocation::Users { force }
    }
    "encourage" => {
      let username = args.required_username()?;
      let force = args.force()?;
      args.finish()?;
      Invocation::Encourage { username, force }
    }
    "complete" => {
      let task = match (args.number::<u64>("id")?, args.take("name")) {
        (Some(id), _) => TaskRef::Id(id),
        (None, Some(name)) => TaskRef::Name(name),
        (None, None) => match args.positional() {
          Some(value) => match value.parse() {
            Ok(id) => TaskRef::Id(id),
            Err(_) => TaskRef::Name(value),
          },
          None => return Err(eyre!("A task id or name is required")),
        },
      };
      let completed_by = args.take("by");
      let notes = args.take("notes");
      args.finish()?;
      Invocation::Complete(CompleteTask {
        task,
        completed_by,
        notes,
      })
    }
    "create" => {
      let name = args.take("name").ok_or_else(|| eyre!("name= is required"))?;
      let assigned_users = args.users();
      Invocation::Create(CreateTask {
        name,
        assigned_users,
        fields: args.into_fields()?,
      })
    }
    "update" => {
      let task_id = args.required_id()?;
      Invocation::Update(UpdateTask {
        task_id,
        fields: args.into_fields()?,
      })
    }
    "delete" => {
      let task_id = args.required_id()?;
      args.finish()?;
      Invocation::Delete(DeleteTask { task_id })
    }
    "leftover" => {
      let name = args.take("name").ok_or_else(|| eyre!("name= is required"))?;
      let assigned_users = args.users();
      Invocation::Leftover(CreateLeftover {
        name,
        assigned_users,
        fields: args.into_fields()?,
      })
    }
    "edit-completion" => {
      let completion_id = args.required_id()?;
      Invocation::EditCompletion(UpdateCompletion {
        completion_id,
        fields: args.into_fields()?,
      })
    }
    "undo" => {
      let completion_id = args.required_id()?;
      args.finish()?;
      Invocation::Undo(DeleteCompletion { completion_id })
    }
    "state" => {
      let username = args.required_username()?;
      Invocation::State(SetDailyState {
        username,
        fields: args.into_fields()?,
      })
    }
    "invalidate" => {
      let target = match args.take("scope").as_deref() {
        Some("users") => InvalidateTarget::AllUsers,
        Some("all") => InvalidateTarget::Everything,
        Some(other) => return Err(eyre!("Unknown scope '{}'", other)),
        None => match args.username() {
          Some(username) => InvalidateTarget::User(username),
          None => InvalidateTarget::Everything,
        },
      };
      args.finish()?;
      Invocation::Invalidate(target)
    }
    "stats" => {
      args.finish()?;
      Invocation::Stats
    }
    "help" => Invocation::Help,
    "quit" => Invocation::Quit,
    other => return Err(eyre!("Command '{}' is not handled", other)),
  };

  Ok(invocation)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("leftover");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "leftover");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("done");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "complete");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("enc");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "encourage");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("validat");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "invalidate");
  }

  #[test]
  fn test_resolve_prefers_exact_over_prefix() {
    assert_eq!(resolve("leftover").unwrap().name, "leftover");
    assert_eq!(resolve("leftovers").unwrap().name, "leftovers");
  }

  #[test]
  fn test_resolve_ambiguous_prefix() {
    // complete, completions
    assert!(resolve("com").is_err());
    assert!(resolve("compl").unwrap_err().to_string().contains("complete"));
    assert_eq!(resolve("inval").unwrap().name, "invalidate");
  }

  #[test]
  fn test_resolve_unknown() {
    assert!(resolve("zzz").is_err());
  }

  #[test]
  fn test_tokenize_keeps_quoted_text() {
    assert_eq!(
      tokenize(r#"complete name="Water plants" by=alice"#).unwrap(),
      vec!["complete", "name=Water plants", "by=alice"]
    );
    assert!(tokenize(r#"create name="oops"#).is_err());
  }

  #[test]
  fn test_parse_plan() {
    assert_eq!(
      parse("plan alice").unwrap(),
      Invocation::DailyPlan {
        username: "alice".to_string(),
        params: None,
        force: false,
      }
    );
    assert_eq!(
      parse("p user=bob fair=yes force=true").unwrap(),
      Invocation::DailyPlan {
        username: "bob".to_string(),
        params: Some(DailyPlanParams {
          select_recommended: false,
          fair_weather: true,
        }),
        force: true,
      }
    );
    assert!(parse("plan").is_err());
    assert!(parse("plan alice fair=maybe").is_err());
  }

  #[test]
  fn test_parse_reads() {
    assert_eq!(
      parse("recommended alice minutes=30").unwrap(),
      Invocation::Recommended {
        username: "alice".to_string(),
        minutes: Some(30),
        force: false,
      }
    );
    assert_eq!(
      parse("completions days=7").unwrap(),
      Invocation::Completions {
        username: None,
        days: Some(7),
        limit: None,
        force: false,
      }
    );
    assert_eq!(
      parse("tasks").unwrap(),
      Invocation::AllTasks {
        assigned_to: None,
        force: false,
      }
    );
    assert!(parse("recommended alice minutes=lots").is_err());
    assert!(parse("users bogus=1").is_err());
  }

  #[test]
  fn test_parse_complete_forms() {
    let by_id = parse("complete 12 by=alice").unwrap();
    assert_eq!(
      by_id,
      Invocation::Complete(CompleteTask {
        task: TaskRef::Id(12),
        completed_by: Some("alice".to_string()),
        notes: None,
      })
    );

    let by_name = parse(r#"done "Take out trash""#).unwrap();
    assert_eq!(
      by_name,
      Invocation::Complete(CompleteTask {
        task: TaskRef::Name("Take out trash".to_string()),
        completed_by: None,
        notes: None,
      })
    );

    assert!(parse("complete").is_err());
  }

  #[test]
  fn test_parse_create_collects_fields() {
    let invocation = parse("create name=Vacuum users=alice,bob points=3 room=hall").unwrap();
    let Invocation::Create(request) = invocation else {
      panic!("expected create");
    };
    assert_eq!(request.name, "Vacuum");
    assert_eq!(request.assigned_users, vec!["alice", "bob"]);
    assert_eq!(request.fields.get("points"), Some(&json!(3)));
    assert_eq!(request.fields.get("room"), Some(&json!("hall")));
  }

  #[test]
  fn test_parse_ids() {
    assert_eq!(
      parse("delete 5").unwrap(),
      Invocation::Delete(DeleteTask { task_id: 5 })
    );
    assert_eq!(
      parse("undo id=8").unwrap(),
      Invocation::Undo(DeleteCompletion { completion_id: 8 })
    );
    assert!(parse("delete five").is_err());
  }

  #[test]
  fn test_parse_invalidate_targets() {
    assert_eq!(
      parse("invalidate").unwrap(),
      Invocation::Invalidate(InvalidateTarget::Everything)
    );
    assert_eq!(
      parse("flush alice").unwrap(),
      Invocation::Invalidate(InvalidateTarget::User("alice".to_string()))
    );
    assert_eq!(
      parse("invalidate scope=users").unwrap(),
      Invocation::Invalidate(InvalidateTarget::AllUsers)
    );
  }
}
