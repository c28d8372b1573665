//! Generic caching layer in front of the TaskTracker service.
//!
//! This module knows nothing about tasks or users:
//! - `TtlCache` stores values with reader-supplied TTLs and substring-pattern invalidation
//! - `get_cached_or_fetch` implements the read-through path
//! - `join_key` builds the colon-delimited keys the invalidation patterns rely on

mod fetch;
mod keys;
mod store;
mod traits;

pub use fetch::get_cached_or_fetch;
pub use keys::join_key;
pub use store::{CacheStats, TtlCache};
pub use traits::Cacheable;
