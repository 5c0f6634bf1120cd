//! # Application configuration — `keeptouch.toml`
//!
//! Tuning knobs for the sync core, read from a TOML file next to the app's
//! data directory (filename: [`KeeptouchConfig::filename`]).
//!
//! ```toml
//! [sync]
//! probe_timeout_secs = 10      # reachability check cut-off
//! recheck_interval_secs = 30   # while offline, how often to re-probe
//! delete_retry_attempts = 3    # remote delete attempts during sync
//! retry_backoff_ms = 1000      # linear backoff between delete attempts
//! request_timeout_secs = 30    # bound on every other remote call
//!
//! [contacts]
//! max_contacts = 150           # Dunbar's number
//! stale_after_days = 30        # reminder threshold
//! ```
//!
//! All structs derive `Default` with production values, so a missing or
//! empty file behaves like the defaults.

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `keeptouch.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeeptouchConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub contacts: ContactsConfig,
}

/// Sync and connectivity tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Hard cut-off for the connectivity probe, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u32,
    /// While offline, how often the host should re-probe reachability.
    #[serde(default = "default_recheck_interval")]
    pub recheck_interval_secs: u32,
    /// Attempts for a remote delete during sync before giving up on the item.
    #[serde(default = "default_delete_attempts")]
    pub delete_retry_attempts: u32,
    /// Linear backoff between delete attempts, in milliseconds.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
    /// Bound on create/update/delete/list calls, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u32,
}

/// Contact bookkeeping rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactsConfig {
    /// Dunbar's number: creates beyond this cap are rejected.
    #[serde(default = "default_max_contacts")]
    pub max_contacts: usize,
    /// Days without contact before a reminder fires.
    #[serde(default = "default_stale_after")]
    pub stale_after_days: i64,
}

fn default_probe_timeout() -> u32 {
    10
}

fn default_recheck_interval() -> u32 {
    30
}

fn default_delete_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    1000
}

fn default_request_timeout() -> u32 {
    30
}

fn default_max_contacts() -> usize {
    150
}

fn default_stale_after() -> i64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout(),
            recheck_interval_secs: default_recheck_interval(),
            delete_retry_attempts: default_delete_attempts(),
            retry_backoff_ms: default_retry_backoff(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            max_contacts: default_max_contacts(),
            stale_after_days: default_stale_after(),
        }
    }
}

impl KeeptouchConfig {
    /// Builder method to zero out retry backoff (used by tests that drive
    /// the delete retry loop).
    pub fn with_retry_backoff_ms(mut self, ms: u64) -> Self {
        self.sync.retry_backoff_ms = ms;
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "keeptouch.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KeeptouchConfig::default();
        assert_eq!(config.sync.probe_timeout_secs, 10);
        assert_eq!(config.sync.recheck_interval_secs, 30);
        assert_eq!(config.sync.delete_retry_attempts, 3);
        assert_eq!(config.sync.retry_backoff_ms, 1000);
        assert_eq!(config.contacts.max_contacts, 150);
        assert_eq!(config.contacts.stale_after_days, 30);
    }

    #[test]
    fn test_empty_toml_equals_defaults() {
        let config = KeeptouchConfig::from_toml("").unwrap();
        assert_eq!(config, KeeptouchConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = KeeptouchConfig::from_toml(
            "[sync]\nretry_backoff_ms = 0\n\n[contacts]\nmax_contacts = 5\n",
        )
        .unwrap();
        assert_eq!(config.sync.retry_backoff_ms, 0);
        assert_eq!(config.sync.probe_timeout_secs, 10);
        assert_eq!(config.contacts.max_contacts, 5);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = KeeptouchConfig::default().with_retry_backoff_ms(250);
        let toml = config.to_toml().unwrap();
        assert_eq!(KeeptouchConfig::from_toml(&toml).unwrap(), config);
    }
}
