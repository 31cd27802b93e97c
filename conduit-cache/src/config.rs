//! Caching behavior configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Environment variable toggling the caching behavior
pub const ENV_ENABLED: &str = "CONDUIT_CACHE_ENABLED";
/// Environment variable holding the default TTL in whole seconds
pub const ENV_DEFAULT_TTL_SECS: &str = "CONDUIT_CACHE_DEFAULT_TTL_SECS";
/// Environment variable holding the key prefix
pub const ENV_KEY_PREFIX: &str = "CONDUIT_CACHE_KEY_PREFIX";

/// Options read by the caching behavior.
///
/// Register one in the container to override the defaults; a dispatcher
/// without one uses [`CacheOptions::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// TTL for requests that do not declare their own
    #[serde(with = "ttl_secs")]
    pub default_ttl: Duration,

    /// Prepended to every generated key
    pub key_prefix: String,

    /// Global switch; when off every request bypasses the cache
    pub enabled: bool,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Enable or disable caching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Load options from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(|name| env::var(name).ok())
    }

    /// Load options through `lookup`.
    ///
    /// Unset variables keep their defaults. Unparseable values also keep the
    /// default and log a warning.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(raw) = lookup(ENV_ENABLED) {
            match parse_bool(&raw) {
                Some(enabled) => options.enabled = enabled,
                None => warn!(variable = ENV_ENABLED, value = %raw, "Invalid boolean, using default"),
            }
        }

        if let Some(raw) = lookup(ENV_DEFAULT_TTL_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => options.default_ttl = Duration::from_secs(secs),
                Err(_) => {
                    warn!(variable = ENV_DEFAULT_TTL_SECS, value = %raw, "Invalid TTL, using default")
                }
            }
        }

        if let Some(prefix) = lookup(ENV_KEY_PREFIX) {
            options.key_prefix = prefix;
        }

        options
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5 * 60),
            key_prefix: "cqrs:".to_string(),
            enabled: true,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

mod ttl_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let options = CacheOptions::default();
        assert_eq!(options.default_ttl, Duration::from_secs(300));
        assert_eq!(options.key_prefix, "cqrs:");
        assert!(options.enabled);
    }

    #[test]
    fn test_builder() {
        let options = CacheOptions::new()
            .with_default_ttl(Duration::from_secs(30))
            .with_key_prefix("app:")
            .with_enabled(false);

        assert_eq!(options.default_ttl, Duration::from_secs(30));
        assert_eq!(options.key_prefix, "app:");
        assert!(!options.enabled);
    }

    #[test]
    fn test_from_env_with_values() {
        let options = CacheOptions::from_env_with(lookup_from(&[
            (ENV_ENABLED, "false"),
            (ENV_DEFAULT_TTL_SECS, "90"),
            (ENV_KEY_PREFIX, "svc:"),
        ]));

        assert!(!options.enabled);
        assert_eq!(options.default_ttl, Duration::from_secs(90));
        assert_eq!(options.key_prefix, "svc:");
    }

    #[test]
    fn test_from_env_invalid_values_fall_back() {
        let options = CacheOptions::from_env_with(lookup_from(&[
            (ENV_ENABLED, "maybe"),
            (ENV_DEFAULT_TTL_SECS, "-5"),
        ]));

        assert_eq!(options, CacheOptions::default());
    }

    #[test]
    fn test_from_env_missing_var() {
        let options = CacheOptions::from_env_with(|_| None);
        assert_eq!(options, CacheOptions::default());
    }

    #[test]
    fn test_deserialize_partial_document() {
        let options: CacheOptions = serde_json::from_str(r#"{"default_ttl": 60}"#).unwrap();
        assert_eq!(options.default_ttl, Duration::from_secs(60));
        assert_eq!(options.key_prefix, "cqrs:");
        assert!(options.enabled);
    }

    #[test]
    fn test_serialize_ttl_as_seconds() {
        let json = serde_json::to_value(CacheOptions::default()).unwrap();
        assert_eq!(json["default_ttl"], 300);
        assert_eq!(json["key_prefix"], "cqrs:");
    }
}
