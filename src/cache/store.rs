//! In-memory TTL cache shared by every request handler.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

/// A single cached value and the moment it was last written.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
  value: V,
  stored_at: Instant,
}

/// Age statistics over every entry held at the time of the call.
///
/// Ages are reported in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
  pub total_entries: usize,
  pub oldest_age: f64,
  pub newest_age: f64,
  pub average_age: f64,
}

/// Key/value store whose freshness is decided by the reader.
///
/// The TTL is supplied on every `get` rather than stored with the entry, so two
/// callers may disagree on whether the same entry is still usable. Every
/// operation runs under one lock for the whole cache, which keeps compound
/// operations such as pattern invalidation atomic.
pub struct TtlCache<V> {
  entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
  pub fn new() -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
    }
  }

  /// Return the value if it is younger than `ttl`.
  ///
  /// An expired entry is evicted on the spot, so a later read with a longer
  /// TTL still misses.
  pub async fn get(&self, key: &str, ttl: Duration) -> Option<V> {
    let mut entries = self.entries.lock().await;

    let Some(entry) = entries.get(key) else {
      debug!(key, "cache miss");
      return None;
    };

    let age = entry.stored_at.elapsed();
    if age < ttl {
      debug!(key, age_secs = age.as_secs_f64(), "cache hit");
      return Some(entry.value.clone());
    }

    entries.remove(key);
    debug!(key, age_secs = age.as_secs_f64(), "cache entry expired");
    None
  }

  /// Store `value` under `key`, replacing any previous value.
  pub async fn set(&self, key: &str, value: V) {
    let mut entries = self.entries.lock().await;
    entries.insert(
      key.to_string(),
      CacheEntry {
        value,
        stored_at: Instant::now(),
      },
    );
  }

  /// Remove every key containing `pattern` as a substring, or everything when
  /// no pattern is given. Returns the number of removed entries.
  pub async fn invalidate(&self, pattern: Option<&str>) -> usize {
    let mut entries = self.entries.lock().await;
    let before = entries.len();

    match pattern {
      Some(pattern) => entries.retain(|key, _| !key.contains(pattern)),
      None => entries.clear(),
    }

    let removed = before - entries.len();
    debug!(pattern = pattern.unwrap_or("*"), removed, "cache invalidated");
    removed
  }

  pub async fn get_stats(&self) -> CacheStats {
    let entries = self.entries.lock().await;
    if entries.is_empty() {
      return CacheStats::default();
    }

    let ages: Vec<f64> = entries
      .values()
      .map(|entry| entry.stored_at.elapsed().as_secs_f64())
      .collect();

    CacheStats {
      total_entries: ages.len(),
      oldest_age: ages.iter().copied().fold(f64::MIN, f64::max),
      newest_age: ages.iter().copied().fold(f64::MAX, f64::min),
      average_age: ages.iter().sum::<f64>() / ages.len() as f64,
    }
  }

  /// Currently held keys in sorted order, expired or not.
  pub async fn keys(&self) -> Vec<String> {
    let entries = self.entries.lock().await;
    let mut keys: Vec<String> = entries.keys().cloned().collect();
    keys.sort();
    keys
  }
}

impl<V: Clone> Default for TtlCache<V> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const MINUTE: Duration = Duration::from_secs(60);

  #[tokio::test(start_paused = true)]
  async fn test_get_within_ttl() {
    let cache = TtlCache::new();
    cache.set("available_users", 1).await;

    tokio::time::advance(Duration::from_secs(59)).await;
    assert_eq!(cache.get("available_users", MINUTE).await, Some(1));
  }

  #[tokio::test(start_paused = true)]
  async fn test_expired_entry_is_evicted() {
    let cache = TtlCache::new();
    cache.set("leftovers:alice", "soup").await;

    tokio::time::advance(MINUTE).await;
    // age == ttl counts as expired
    assert_eq!(cache.get("leftovers:alice", MINUTE).await, None);

    // Eviction sticks even for a more lenient reader
    assert_eq!(
      cache.get("leftovers:alice", Duration::from_secs(3600)).await,
      None
    );
    assert!(cache.keys().await.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_ttl_is_chosen_by_reader() {
    let cache = TtlCache::new();
    cache.set("encouragement:alice", "keep going").await;
    tokio::time::advance(Duration::from_secs(120)).await;

    let long = Duration::from_secs(3600);
    assert_eq!(
      cache.get("encouragement:alice", long).await,
      Some("keep going")
    );
    assert_eq!(cache.get("encouragement:alice", MINUTE).await, None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_set_overwrites_and_resets_age() {
    let cache = TtlCache::new();
    cache.set("all_tasks:None", 1).await;
    tokio::time::advance(Duration::from_secs(50)).await;
    cache.set("all_tasks:None", 2).await;
    tokio::time::advance(Duration::from_secs(50)).await;

    assert_eq!(cache.get("all_tasks:None", MINUTE).await, Some(2));
    assert_eq!(cache.get_stats().await.total_entries, 1);
  }

  #[tokio::test]
  async fn test_missing_key_is_absent() {
    let cache: TtlCache<u32> = TtlCache::new();
    assert_eq!(cache.get("nothing", MINUTE).await, None);
  }

  #[tokio::test]
  async fn test_pattern_invalidation_is_substring_match() {
    let cache = TtlCache::new();
    cache.set("user:alice:tasks", 1).await;
    cache.set("user:alice:plan", 2).await;
    cache.set("user:bob:tasks", 3).await;

    let removed = cache.invalidate(Some(":alice")).await;

    assert_eq!(removed, 2);
    assert_eq!(cache.keys().await, vec!["user:bob:tasks".to_string()]);
  }

  #[tokio::test]
  async fn test_prefix_pattern_leaves_other_operations() {
    let cache = TtlCache::new();
    cache.set("available_tasks:alice", 1).await;
    cache.set("available_tasks:None", 2).await;
    cache.set("available_users", 3).await;

    cache.invalidate(Some("available_tasks:")).await;

    assert_eq!(cache.keys().await, vec!["available_users".to_string()]);
  }

  #[tokio::test]
  async fn test_invalidate_everything() {
    let cache = TtlCache::new();
    for i in 0..5 {
      cache.set(&format!("recommended_tasks:user{}:30", i), i).await;
    }

    assert_eq!(cache.invalidate(None).await, 5);
    assert_eq!(cache.get_stats().await.total_entries, 0);
  }

  #[tokio::test]
  async fn test_empty_stats_are_zero() {
    let cache: TtlCache<u32> = TtlCache::new();
    assert_eq!(cache.get_stats().await, CacheStats::default());
  }

  #[tokio::test(start_paused = true)]
  async fn test_stats_ages() {
    let cache = TtlCache::new();
    cache.set("a", 1).await;
    tokio::time::advance(Duration::from_secs(30)).await;
    cache.set("b", 2).await;
    tokio::time::advance(Duration::from_secs(10)).await;

    let stats = cache.get_stats().await;
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.oldest_age, 40.0);
    assert_eq!(stats.newest_age, 10.0);
    assert_eq!(stats.average_age, 25.0);
  }
}
