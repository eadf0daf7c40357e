//! Configuration types for the DDI provider
//!
//! This module defines the configuration structures consumed by the core
//! and by the HTTP record store. Loading them (from the environment) is
//! the daemon's job.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filter::DomainFilter;
use crate::record::{DEFAULT_SOURCE, DEFAULT_SUPPORTED_TYPES};

/// Connection settings for the DDI management API
#[derive(Clone, Serialize, Deserialize)]
pub struct DdiConfig {
    /// Base address of the API (e.g. `https://ddi.example.net`)
    pub host: String,

    /// API user
    pub user: String,

    /// API key
    /// ⚠️ NEVER log this value
    pub key: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification
    #[serde(default = "default_skip_tls_verify")]
    pub skip_tls_verify: bool,

    /// Management view records live in
    #[serde(default = "default_view")]
    pub view: String,

    /// TTL applied to endpoints that carry none (0 = inherit from zone)
    #[serde(default)]
    pub default_ttl: u32,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for DdiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdiConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("key", &"<REDACTED>")
            .field("timeout_secs", &self.timeout_secs)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("view", &self.view)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl DdiConfig {
    /// Create a configuration with defaults for everything but the
    /// address and credentials
    pub fn new(host: impl Into<String>, user: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            key: key.into(),
            timeout_secs: default_timeout_secs(),
            skip_tls_verify: default_skip_tls_verify(),
            view: default_view(),
            default_ttl: 0,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.host)
            .map_err(|e| Error::config(format!("Invalid DDI host '{}': {}", self.host, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "DDI host must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.user.is_empty() {
            return Err(Error::config("DDI API user cannot be empty"));
        }
        if self.key.is_empty() {
            return Err(Error::config("DDI API key cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("DDI request timeout must be > 0"));
        }
        if self.view.is_empty() {
            return Err(Error::config("DDI view cannot be empty"));
        }
        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_skip_tls_verify() -> bool {
    true
}

fn default_view() -> String {
    "default".to_string()
}

/// Domain filter settings
///
/// Either the literal lists or the regex pair is used; the regex style
/// wins when `regex_include` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainFilterConfig {
    /// Zones to manage
    #[serde(default)]
    pub include: Vec<String>,

    /// Zones or subdomains to leave alone
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Inclusion regex
    #[serde(default)]
    pub regex_include: Option<String>,

    /// Exclusion regex (only used together with `regex_include`)
    #[serde(default)]
    pub regex_exclude: Option<String>,
}

impl DomainFilterConfig {
    /// Whether the regex style is active
    pub fn is_regex(&self) -> bool {
        self.regex_include.as_deref().is_some_and(|r| !r.is_empty())
    }

    /// Compile into a [`DomainFilter`]
    pub fn build(&self) -> Result<DomainFilter> {
        match self.regex_include.as_deref() {
            Some(include) if !include.is_empty() => {
                DomainFilter::regex(include, self.regex_exclude.as_deref())
            }
            _ => Ok(DomainFilter::literal(
                self.include.clone(),
                self.exclude.clone(),
            )),
        }
    }
}

/// Constants the reconciler is built with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Ownership tag written on every created record
    #[serde(default = "default_source")]
    pub source: String,

    /// TTL for endpoints that carry none (0 = inherit from zone)
    #[serde(default)]
    pub default_ttl: u32,

    /// Record types the reconciler manages
    #[serde(default = "default_supported_types")]
    pub supported_types: Vec<String>,
}

impl ReconcilerConfig {
    /// Set the default TTL
    pub fn with_default_ttl(mut self, default_ttl: u32) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Whether `record_type` is managed (case-insensitive)
    pub fn supports(&self, record_type: &str) -> bool {
        self.supported_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(record_type))
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            default_ttl: 0,
            supported_types: default_supported_types(),
        }
    }
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_supported_types() -> Vec<String> {
    DEFAULT_SUPPORTED_TYPES.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddi_config_defaults() {
        let config = DdiConfig::new("https://192.168.19.117", "admin", "secret");
        assert_eq!(config.timeout_secs, 60);
        assert!(config.skip_tls_verify);
        assert_eq!(config.view, "default");
        assert_eq!(config.default_ttl, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ddi_config_rejects_malformed_host() {
        let config = DdiConfig::new("not a url", "admin", "secret");
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = DdiConfig::new("ftp://ddi.example.net", "admin", "secret");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_ddi_config_requires_credentials() {
        assert!(DdiConfig::new("https://ddi", "", "secret").validate().is_err());
        assert!(DdiConfig::new("https://ddi", "admin", "").validate().is_err());
    }

    #[test]
    fn test_ddi_config_debug_hides_key() {
        let config = DdiConfig::new("https://ddi", "admin", "super_secret_key");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("super_secret_key"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn test_ddi_config_deserialize_fills_defaults() {
        let config: DdiConfig = serde_json::from_value(serde_json::json!({
            "host": "https://ddi",
            "user": "admin",
            "key": "k",
        }))
        .unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.view, "default");
    }

    #[test]
    fn test_regex_style_takes_precedence() {
        let config = DomainFilterConfig {
            include: vec!["test.com".to_string()],
            exclude: vec![],
            regex_include: Some(r"\.test\.com$".to_string()),
            regex_exclude: None,
        };
        assert!(config.is_regex());
        let filter = config.build().unwrap();
        assert!(filter.candidate_zones().is_empty());
    }

    #[test]
    fn test_empty_regex_falls_back_to_literal() {
        let config = DomainFilterConfig {
            include: vec!["test.com".to_string()],
            regex_include: Some(String::new()),
            ..DomainFilterConfig::default()
        };
        assert!(!config.is_regex());
        assert_eq!(config.build().unwrap().candidate_zones(), vec!["test.com"]);
    }

    #[test]
    fn test_reconciler_config_supports() {
        let config = ReconcilerConfig::default();
        assert!(config.supports("A"));
        assert!(config.supports("aaaa"));
        assert!(config.supports("CNAME"));
        assert!(!config.supports("TXT"));
        assert_eq!(config.source, "external-dns-yamu");
    }
}
