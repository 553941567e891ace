//! Runtime configuration for the bridge and its worker front end.

use serde::Deserialize;
use tracing::warn;

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_LOG_FILTER: &str = "info";

pub const WORKERS_ENV: &str = "VISION_BRIDGE_WORKERS";
pub const MAX_OBJECTS_ENV: &str = "VISION_BRIDGE_MAX_OBJECTS";
pub const LOG_FILTER_ENV: &str = "RUST_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Calls allowed to run concurrently on the blocking pool.
    pub workers: usize,
    /// Upper bound on live stored objects; `None` means unbounded.
    pub max_objects: Option<usize>,
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_objects: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unparsable values keep the
    /// default and are logged.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(WORKERS_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.workers = n,
                _ => warn!("Ignoring invalid {}={:?}", WORKERS_ENV, raw),
            }
        }
        if let Some(raw) = lookup(MAX_OBJECTS_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(n) => config.max_objects = Some(n),
                Err(_) => warn!("Ignoring invalid {}={:?}", MAX_OBJECTS_ENV, raw),
            }
        }
        if let Some(filter) = lookup(LOG_FILTER_ENV).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = BridgeConfig::from_lookup(lookup(&[]));
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (WORKERS_ENV, "8"),
            (MAX_OBJECTS_ENV, "100"),
            (LOG_FILTER_ENV, "debug"),
        ]));
        assert_eq!(config.workers, 8);
        assert_eq!(config.max_objects, Some(100));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = BridgeConfig::from_lookup(lookup(&[(WORKERS_ENV, "0"), (MAX_OBJECTS_ENV, "lots")]));
        assert_eq!(config.workers, 4);
        assert_eq!(config.max_objects, None);
    }

    #[test]
    fn deserializes_partial_json() {
        let config: BridgeConfig = serde_json::from_str(r#"{"maxObjects": 10}"#).unwrap();
        assert_eq!(config.max_objects, Some(10));
        assert_eq!(config.workers, 4);
    }
}
