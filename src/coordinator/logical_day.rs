//! Detect when a cached daily plan belongs to a logical day that has ended.
//!
//! The service's "today" depends on the user's timezone and a per-user reset
//! time, so a plan can go stale long before any TTL or refresh interval runs
//! out. The logical date the service reported is compared with the logical
//! date it would report now.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use color_eyre::{eyre::eyre, Result};
use tracing::debug;

use crate::tasktracker::types::{DailyPlan, UserContext};

/// Logical date at `now` for a user in `tz` whose day starts at `reset`.
///
/// Before the reset time the previous calendar date is still current.
pub fn logical_date(now: DateTime<Utc>, tz: Tz, reset: NaiveTime) -> NaiveDate {
  let local = now.with_timezone(&tz);
  let today = local.date_naive();
  if local.time() < reset {
    today.pred_opt().unwrap_or(today)
  } else {
    today
  }
}

/// Logical date at `now` according to a user context.
pub fn current_logical_date(context: &UserContext, now: DateTime<Utc>) -> Result<NaiveDate> {
  let tz: Tz = context
    .timezone
    .parse()
    .map_err(|e| eyre!("Invalid timezone {}: {}", context.timezone, e))?;
  let reset = NaiveTime::parse_from_str(&context.daily_reset_time, "%H:%M:%S").map_err(|e| {
    eyre!(
      "Invalid daily reset time {}: {}",
      context.daily_reset_time,
      e
    )
  })?;

  Ok(logical_date(now, tz, reset))
}

/// Whether a cached plan was computed for an earlier logical day.
///
/// No plan means nothing to discard. Anything that prevents the check, such as
/// a missing or malformed user context, counts as stale.
pub fn is_stale_for_new_day(plan: Option<&DailyPlan>, now: DateTime<Utc>) -> bool {
  let Some(plan) = plan else {
    return false;
  };

  match compare_logical_dates(plan, now) {
    Ok(stale) => stale,
    Err(e) => {
      debug!(error = %e, "cannot verify logical day of cached plan");
      true
    }
  }
}

fn compare_logical_dates(plan: &DailyPlan, now: DateTime<Utc>) -> Result<bool> {
  let raw = plan
    .user_context
    .as_ref()
    .ok_or_else(|| eyre!("Cached plan has no user context"))?;
  let context: UserContext = serde_json::from_value(raw.clone())
    .map_err(|e| eyre!("Malformed user context: {}", e))?;

  let current = current_logical_date(&context, now)?
    .format("%Y-%m-%d")
    .to_string();

  if current != context.current_logical_date {
    debug!(
      username = %context.username,
      cached = %context.current_logical_date,
      current = %current,
      "logical day rolled over"
    );
    return Ok(true);
  }

  Ok(false)
}
