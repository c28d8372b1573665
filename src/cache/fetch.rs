//! Read-through helper combining the cache with a network fetch.

use color_eyre::Result;
use std::future::Future;
use tokio::time::Duration;
use tracing::debug;

use super::store::TtlCache;
use super::traits::Cacheable;

/// Serve `key` from the cache when it is younger than `ttl`, otherwise call
/// `fetcher` and store its result if it is cacheable.
///
/// The result is returned whether or not it was stored, and transport errors
/// propagate without touching the cache. Concurrent misses on the same key are
/// not coalesced: each caller fetches and the last write wins.
pub async fn get_cached_or_fetch<V, F, Fut>(
  cache: &TtlCache<V>,
  key: &str,
  ttl: Duration,
  fetcher: F,
  force_refresh: bool,
) -> Result<V>
where
  V: Cacheable,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<V>>,
{
  if !force_refresh {
    if let Some(cached) = cache.get(key, ttl).await {
      return Ok(cached);
    }
  } else {
    debug!(key, "cache bypassed by forced refresh");
  }

  let fetched = fetcher().await?;
  if fetched.is_cacheable() {
    cache.set(key, fetched.clone()).await;
  } else {
    debug!(key, "not caching unsuccessful response");
  }

  Ok(fetched)
}

#[cfg(test)]
mod tests {
  use super::*;
  use color_eyre::eyre::eyre;
  use std::sync::atomic::{AtomicU32, Ordering};

  #[derive(Debug, Clone, PartialEq)]
  struct Reply {
    success: bool,
    body: &'static str,
  }

  impl Cacheable for Reply {
    fn is_cacheable(&self) -> bool {
      self.success
    }
  }

  fn ok(body: &'static str) -> Reply {
    Reply {
      success: true,
      body,
    }
  }

  const TTL: Duration = Duration::from_secs(60);

  #[tokio::test]
  async fn test_cached_value_skips_fetch() {
    let cache = TtlCache::new();
    cache.set("recommended_tasks:alice:30", ok("seeded")).await;

    let result = get_cached_or_fetch(
      &cache,
      "recommended_tasks:alice:30",
      TTL,
      || async { Err::<Reply, _>(eyre!("fetcher must not run")) },
      false,
    )
    .await
    .unwrap();

    assert_eq!(result, ok("seeded"));
  }

  #[tokio::test]
  async fn test_second_call_uses_cache() {
    let cache = TtlCache::new();
    let calls = AtomicU32::new(0);

    for _ in 0..2 {
      let result = get_cached_or_fetch(
        &cache,
        "leftovers:alice",
        TTL,
        || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(ok("fresh"))
        },
        false,
      )
      .await
      .unwrap();
      assert_eq!(result, ok("fresh"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_force_refresh_always_fetches() {
    let cache = TtlCache::new();
    cache.set("available_users", ok("old")).await;

    let result = get_cached_or_fetch(
      &cache,
      "available_users",
      TTL,
      || async { Ok(ok("new")) },
      true,
    )
    .await
    .unwrap();

    assert_eq!(result, ok("new"));
    assert_eq!(cache.get("available_users", TTL).await, Some(ok("new")));
  }

  #[tokio::test]
  async fn test_failures_are_not_cached() {
    let cache = TtlCache::new();
    let failure = Reply {
      success: false,
      body: "upstream down",
    };

    let result = get_cached_or_fetch(
      &cache,
      "all_tasks:None",
      TTL,
      || async { Ok(failure.clone()) },
      false,
    )
    .await
    .unwrap();

    assert_eq!(result, failure);
    assert!(cache.keys().await.is_empty());
  }

  #[tokio::test]
  async fn test_transport_error_propagates() {
    let cache: TtlCache<Reply> = TtlCache::new();

    let result = get_cached_or_fetch(
      &cache,
      "encouragement:alice",
      TTL,
      || async { Err(eyre!("connection refused")) },
      false,
    )
    .await;

    assert!(result.is_err());
    assert!(cache.keys().await.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_expired_entry_is_refetched() {
    let cache = TtlCache::new();
    cache.set("available_tasks:alice", ok("stale")).await;
    tokio::time::advance(TTL).await;

    let result = get_cached_or_fetch(
      &cache,
      "available_tasks:alice",
      TTL,
      || async { Ok(ok("refetched")) },
      false,
    )
    .await
    .unwrap();

    assert_eq!(result, ok("refetched"));
  }
}
