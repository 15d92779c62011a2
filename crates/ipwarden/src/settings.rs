//! Configuration management.
//!
//! Settings are loaded fresh at the start of every pass, so editing `.env`
//! takes effect on the next tick without a restart.

use ipwarden_client::{DEFAULT_API_URL, DEFAULT_LOOKUP_URL, DEFAULT_TIMEOUT};
use ipwarden_core::{Result, WardenError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Bearer token for the firewall API
pub const PROVIDER_TOKEN: &str = "PROVIDER_TOKEN";
/// Numeric ID of the firewall to rewrite
pub const FIREWALL_ID: &str = "FIREWALL_ID";
/// Label prefix selecting the inbound rules to rewrite
pub const RULE_LABEL_PREFIX: &str = "RULE_LABEL_PREFIX";
/// Override for the address-discovery endpoint
pub const IP_LOOKUP_URL: &str = "IP_LOOKUP_URL";
/// Override for the Linode API base URL
pub const LINODE_API_URL: &str = "LINODE_API_URL";
/// Per-request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";

/// Older key names still honored when the primary key is unset
const LEGACY_ALIASES: &[(&str, &str)] = &[
    (PROVIDER_TOKEN, "LINODE_TOKEN"),
    (FIREWALL_ID, "FIREWALL"),
    (RULE_LABEL_PREFIX, "LABEL"),
];

/// Somewhere key/value settings can be read from.
pub trait ConfigSource: Send + Sync {
    /// Snapshot of all variables visible to this source
    fn vars(&self) -> Result<HashMap<String, String>>;
}

impl ConfigSource for HashMap<String, String> {
    fn vars(&self) -> Result<HashMap<String, String>> {
        Ok(self.clone())
    }
}

/// Process environment overlaid on a `.env` file.
///
/// Variables already set in the process win over the file. A missing file is
/// not an error.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    dotenv_path: Option<PathBuf>,
}

impl EnvSource {
    /// Read `.env` from the current directory or its ancestors
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a specific dotenv file instead of searching for `.env`
    #[must_use]
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            dotenv_path: Some(path.into()),
        }
    }

    fn file_vars(&self) -> Result<Vec<(String, String)>> {
        let iter = match &self.dotenv_path {
            Some(path) => dotenvy::from_path_iter(path),
            None => dotenvy::dotenv_iter(),
        };

        let iter = match iter {
            Ok(iter) => iter,
            Err(e) if e.not_found() => return Ok(Vec::new()),
            Err(e) => return Err(WardenError::Config(format!("failed to read .env: {e}"))),
        };

        iter.map(|item| item.map_err(|e| WardenError::Config(format!("invalid .env entry: {e}"))))
            .collect()
    }
}

impl ConfigSource for EnvSource {
    fn vars(&self) -> Result<HashMap<String, String>> {
        let mut vars: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        for (key, value) in self.file_vars()? {
            vars.entry(key).or_insert(value);
        }
        Ok(vars)
    }
}

/// Everything one reconciliation pass needs.
#[derive(Clone)]
pub struct Settings {
    /// Bearer credential for the firewall API
    pub token: String,

    /// Target firewall
    pub firewall_id: u64,

    /// Inbound rules whose label starts with this are rewritten
    pub label_prefix: String,

    /// Address-discovery endpoint
    pub lookup_url: String,

    /// Linode API base URL
    pub api_url: String,

    /// Timeout applied to each network call
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("token", &"<redacted>")
            .field("firewall_id", &self.firewall_id)
            .field("label_prefix", &self.label_prefix)
            .field("lookup_url", &self.lookup_url)
            .field("api_url", &self.api_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Settings {
    /// Load settings from a source.
    ///
    /// Fails on the first required key that is absent or empty, or when the
    /// firewall ID or timeout is not an integer.
    pub fn load(source: &dyn ConfigSource) -> Result<Self> {
        Self::from_vars(&source.vars()?)
    }

    /// Build settings from an already collected variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let token = required(vars, PROVIDER_TOKEN)?;
        let firewall_raw = required(vars, FIREWALL_ID)?;
        let label_prefix = required(vars, RULE_LABEL_PREFIX)?;

        let firewall_id = parse_firewall_id(&firewall_raw)?;

        let request_timeout = match optional(vars, REQUEST_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| {
                    WardenError::Config(format!("{REQUEST_TIMEOUT_SECS}={raw:?}: {e}"))
                })?;
                if secs == 0 {
                    return Err(WardenError::Config(format!(
                        "{REQUEST_TIMEOUT_SECS} must be greater than zero"
                    )));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            token,
            firewall_id,
            label_prefix,
            lookup_url: optional(vars, IP_LOOKUP_URL).unwrap_or_else(|| DEFAULT_LOOKUP_URL.into()),
            api_url: optional(vars, LINODE_API_URL).unwrap_or_else(|| DEFAULT_API_URL.into()),
            request_timeout,
        })
    }
}

/// Parse a firewall identifier, tolerating surrounding whitespace
pub fn parse_firewall_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| WardenError::InvalidFirewallId {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Non-empty value for `key`, falling back to its legacy alias
fn lookup(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    let non_empty = |k: &str| vars.get(k).filter(|v| !v.is_empty()).cloned();

    non_empty(key).or_else(|| {
        LEGACY_ALIASES
            .iter()
            .find(|(primary, _)| *primary == key)
            .and_then(|(_, legacy)| non_empty(legacy))
    })
}

fn required(vars: &HashMap<String, String>, key: &'static str) -> Result<String> {
    lookup(vars, key).ok_or(WardenError::MissingConfig { key })
}

fn optional(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    lookup(vars, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn complete() -> HashMap<String, String> {
        vars(&[
            (PROVIDER_TOKEN, "T"),
            (FIREWALL_ID, "42"),
            (RULE_LABEL_PREFIX, "vpn-"),
        ])
    }

    #[test]
    fn test_complete_settings_use_defaults() {
        let settings = Settings::from_vars(&complete()).unwrap();
        assert_eq!(settings.token, "T");
        assert_eq!(settings.firewall_id, 42);
        assert_eq!(settings.label_prefix, "vpn-");
        assert_eq!(settings.lookup_url, DEFAULT_LOOKUP_URL);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.request_timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_each_required_key_is_enforced() {
        for key in [PROVIDER_TOKEN, FIREWALL_ID, RULE_LABEL_PREFIX] {
            let mut v = complete();
            v.remove(key);
            match Settings::from_vars(&v) {
                Err(WardenError::MissingConfig { key: missing }) => assert_eq!(missing, key),
                other => panic!("expected MissingConfig for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut v = complete();
        v.insert(RULE_LABEL_PREFIX.into(), String::new());
        assert!(matches!(
            Settings::from_vars(&v),
            Err(WardenError::MissingConfig {
                key: RULE_LABEL_PREFIX
            })
        ));
    }

    #[test]
    fn test_legacy_keys() {
        let v = vars(&[("LINODE_TOKEN", "old"), ("FIREWALL", "7"), ("LABEL", "home")]);
        let settings = Settings::from_vars(&v).unwrap();
        assert_eq!(settings.token, "old");
        assert_eq!(settings.firewall_id, 7);
        assert_eq!(settings.label_prefix, "home");
    }

    #[test]
    fn test_primary_key_wins_over_legacy() {
        let mut v = complete();
        v.insert("LINODE_TOKEN".into(), "old".into());
        assert_eq!(Settings::from_vars(&v).unwrap().token, "T");
    }

    #[test]
    fn test_non_numeric_firewall_id() {
        let mut v = complete();
        v.insert(FIREWALL_ID.into(), "fw-42".into());
        let err = Settings::from_vars(&v).unwrap_err();
        assert_eq!(err.kind(), ipwarden_core::ErrorKind::Conversion);
    }

    #[test]
    fn test_timeout_override() {
        let mut v = complete();
        v.insert(REQUEST_TIMEOUT_SECS.into(), "5".into());
        assert_eq!(
            Settings::from_vars(&v).unwrap().request_timeout,
            Duration::from_secs(5)
        );

        v.insert(REQUEST_TIMEOUT_SECS.into(), "0".into());
        assert!(matches!(
            Settings::from_vars(&v),
            Err(WardenError::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings = Settings::from_vars(&complete()).unwrap();
        assert!(!format!("{settings:?}").contains("\"T\""));
    }

    #[test]
    fn test_env_source_reads_dotenv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "IPWARDEN_TEST_ONLY_KEY=from-file").unwrap();

        let vars = EnvSource::with_file(file.path()).vars().unwrap();
        assert_eq!(
            vars.get("IPWARDEN_TEST_ONLY_KEY").map(String::as_str),
            Some("from-file")
        );
    }

    #[test]
    fn test_env_source_missing_file_is_not_an_error() {
        let source = EnvSource::with_file("/nonexistent/ipwarden/.env");
        assert!(source.vars().is_ok());
    }
}
