//! Cache key formatting.

use super::traits::KeyPart;

/// Build `"<operation>:<param1>:<param2>:..."`.
///
/// With no parameters the operation tag is the whole key, without a trailing
/// colon. Pattern invalidation relies on this exact layout.
pub fn join_key(operation: &str, params: &[&dyn KeyPart]) -> String {
  let mut key = operation.to_string();
  for param in params {
    key.push(':');
    key.push_str(&param.key_part());
  }
  key
}
