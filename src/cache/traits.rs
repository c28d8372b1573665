//! Core traits for values held by the cache.

/// Values the read-through helper may store.
///
/// A fetch result is written to the cache only when `is_cacheable` holds, so
/// failures are never served from the cache.
pub trait Cacheable: Clone + Send + Sync {
  fn is_cacheable(&self) -> bool;
}

/// Anything that can appear as one component of a cache key.
pub trait KeyPart {
  fn key_part(&self) -> String;
}

impl KeyPart for String {
  fn key_part(&self) -> String {
    self.clone()
  }
}

impl KeyPart for u32 {
  fn key_part(&self) -> String {
    self.to_string()
  }
}

/// Absent parameters are written as the literal `None`.
impl<T: KeyPart> KeyPart for Option<T> {
  fn key_part(&self) -> String {
    match self {
      Some(value) => value.key_part(),
      None => "None".to_string(),
    }
  }
}
