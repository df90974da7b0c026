//! Manager configuration
//!
//! Sources, in the order callers usually layer them:
//! - `ManagerConfig::default()`
//! - a TOML document via [`ManagerConfig::from_toml_str`]
//! - environment overrides via [`ManagerConfig::from_env`]
//!
//! The comparator is code, not data, and is configured on the manager.

use crate::errors::{Result, SnapshotError};
use serde::{Deserialize, Serialize};

/// Default number of snapshots a manager retains
pub const DEFAULT_MAX_CAPACITY: usize = 100;

pub const ENV_MAX_CAPACITY: &str = "SNAPVAULT_MAX_CAPACITY";
pub const ENV_COPY_ON_SAVE: &str = "SNAPVAULT_COPY_ON_SAVE";
pub const ENV_COPY_ON_RETRIEVE: &str = "SNAPVAULT_COPY_ON_RETRIEVE";

/// Capacity and copy-policy defaults for a `SnapshotManager`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Maximum number of stored snapshots (at least 1)
    pub max_capacity: usize,
    /// Store an isolated copy of each saved tree
    pub copy_on_save: bool,
    /// Hand out an isolated copy of each retrieved tree
    pub copy_on_retrieve: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
            copy_on_save: true,
            copy_on_retrieve: true,
        }
    }
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_copy_on_save(mut self, copy: bool) -> Self {
        self.copy_on_save = copy;
        self
    }

    pub fn with_copy_on_retrieve(mut self, copy: bool) -> Self {
        self.copy_on_retrieve = copy;
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidCapacity` if `max_capacity` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_capacity == 0 {
            return Err(SnapshotError::InvalidCapacity {
                requested: self.max_capacity,
            });
        }
        Ok(())
    }

    /// Parse a TOML document; absent keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for malformed TOML or unknown keys and
    /// `InvalidCapacity` for `max_capacity = 0`.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: ManagerConfig =
            toml::from_str(input).map_err(|e| SnapshotError::InvalidConfig {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `SNAPVAULT_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for unparseable values and
    /// `InvalidCapacity` for a zero capacity.
    pub fn from_env() -> Result<Self> {
        Self::default().overlay_env(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    ///
    /// Unset variables leave the current value in place.
    ///
    /// # Errors
    ///
    /// Same as [`ManagerConfig::from_env`].
    pub fn overlay_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_CAPACITY) {
            self.max_capacity =
                raw.trim()
                    .parse::<usize>()
                    .map_err(|e| SnapshotError::InvalidConfig {
                        reason: format!("{}={:?}: {}", ENV_MAX_CAPACITY, raw, e),
                    })?;
        }
        if let Some(raw) = lookup(ENV_COPY_ON_SAVE) {
            self.copy_on_save = parse_bool(ENV_COPY_ON_SAVE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_COPY_ON_RETRIEVE) {
            self.copy_on_retrieve = parse_bool(ENV_COPY_ON_RETRIEVE, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SnapshotError::InvalidConfig {
            reason: format!("{}={:?} is not a boolean", name, raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.max_capacity, 100);
        assert!(config.copy_on_save);
        assert!(config.copy_on_retrieve);
    }

    #[test]
    fn test_toml_partial_keeps_defaults() {
        let config = ManagerConfig::from_toml_str("max_capacity = 5\ncopy_on_save = false\n").unwrap();
        assert_eq!(config.max_capacity, 5);
        assert!(!config.copy_on_save);
        assert!(config.copy_on_retrieve);
    }

    #[test]
    fn test_toml_rejects_unknown_keys_and_zero_capacity() {
        assert!(matches!(
            ManagerConfig::from_toml_str("capacity = 5"),
            Err(SnapshotError::InvalidConfig { .. })
        ));
        assert!(matches!(
            ManagerConfig::from_toml_str("max_capacity = 0"),
            Err(SnapshotError::InvalidCapacity { requested: 0 })
        ));
    }

    #[test]
    fn test_env_overlay() {
        let config = ManagerConfig::default()
            .overlay_env(lookup(&[
                ("SNAPVAULT_MAX_CAPACITY", " 7 "),
                ("SNAPVAULT_COPY_ON_RETRIEVE", "Off"),
            ]))
            .unwrap();
        assert_eq!(config.max_capacity, 7);
        assert!(config.copy_on_save);
        assert!(!config.copy_on_retrieve);
    }

    #[test]
    fn test_env_overlay_rejects_bad_values() {
        let bad_bool = ManagerConfig::default().overlay_env(lookup(&[("SNAPVAULT_COPY_ON_SAVE", "maybe")]));
        assert!(matches!(bad_bool, Err(SnapshotError::InvalidConfig { .. })));

        let bad_cap = ManagerConfig::default().overlay_env(lookup(&[("SNAPVAULT_MAX_CAPACITY", "-1")]));
        assert!(matches!(bad_cap, Err(SnapshotError::InvalidConfig { .. })));
    }
}
