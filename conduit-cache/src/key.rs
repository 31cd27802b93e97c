//! Cache key derivation
//!
//! Keys are `prefix + TypeName + ":" + fingerprint`, where the fingerprint is
//! the first 128 bits of SHA-256 over a canonical JSON rendering of the
//! request. Canonical means object keys sorted and `null` fields dropped, so
//! equal field values always produce the same key regardless of declaration
//! order or optional fields left unset.

use crate::cacheable::CacheableRequest;
use crate::error::{CacheError, CacheResult};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Fingerprint length in bytes (32 hex characters)
pub const FINGERPRINT_BYTES: usize = 16;

/// Derives cache keys for cacheable requests
#[derive(Debug, Clone)]
pub struct CacheKeyGenerator {
    prefix: String,
}

impl CacheKeyGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key for `request`
    ///
    /// An explicit [`cache_key`](CacheableRequest::cache_key) is appended to
    /// the prefix as-is.
    pub fn generate<R: CacheableRequest>(&self, request: &R) -> CacheResult<String> {
        if let Some(key) = request.cache_key() {
            return Ok(format!("{}{}", self.prefix, key));
        }

        let bytes = canonical_json(request)?;
        Ok(format!(
            "{}{}:{}",
            self.prefix,
            short_type_name::<R>(),
            fingerprint(&bytes)
        ))
    }
}

/// Serialize `value` with sorted object keys and without `null` fields
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> CacheResult<Vec<u8>> {
    let value =
        serde_json::to_value(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
    serde_json::to_vec(&canonicalize(value)).map_err(|e| CacheError::Serialization(e.to_string()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (k, v) in entries {
                sorted.insert(k, v);
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Lowercase hex of the first [`FINGERPRINT_BYTES`] of SHA-256 over `bytes`
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

/// Type name with module paths stripped, generic arguments kept
///
/// `app::queries::Page<app::model::User>` becomes `Page<User>`.
pub fn short_type_name<T: ?Sized>() -> String {
    strip_paths(std::any::type_name::<T>())
}

fn strip_paths(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut start = 0;

    for (i, c) in full.char_indices() {
        if matches!(c, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';') {
            out.push_str(last_segment(&full[start..i]));
            out.push(c);
            start = i + c.len_utf8();
        }
    }
    out.push_str(last_segment(&full[start..]));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
