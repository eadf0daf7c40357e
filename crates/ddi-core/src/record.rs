// # Managed Records
//
// Wire form of a single record as the DDI management API stores it.
//
// A `ManagedRecord` is built transiently from one target of an
// `Endpoint` and never persisted locally: the remote side is the source
// of truth. Reading back collapses records sharing name and type into a
// single endpoint again.

use serde::{Deserialize, Deserializer, Serialize};

/// Record tag marking records owned by this provider
pub const DEFAULT_SOURCE: &str = "external-dns-yamu";

/// Record types the provider manages by default
pub const DEFAULT_SUPPORTED_TYPES: [&str; 3] = ["A", "AAAA", "CNAME"];

/// Whether a record's TTL is set explicitly or deferred to the zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtlStrategy {
    /// Use the remote zone's default TTL
    Inherit,
    /// Use the TTL carried on the record
    #[default]
    Rewrite,
}

/// Resolve the TTL written to the remote side
///
/// | endpoint ttl | default ttl | result            |
/// |--------------|-------------|-------------------|
/// | 0            | 0           | `(0, Inherit)`    |
/// | 0            | d           | `(d, Rewrite)`    |
/// | t            | any         | `(t, Rewrite)`    |
pub fn resolve_ttl(endpoint_ttl: u32, default_ttl: u32) -> (u32, TtlStrategy) {
    match (endpoint_ttl, default_ttl) {
        (0, 0) => (0, TtlStrategy::Inherit),
        (0, default) => (default, TtlStrategy::Rewrite),
        (ttl, _) => (ttl, TtlStrategy::Rewrite),
    }
}

/// A single record in the DDI API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedRecord {
    /// Host label relative to the zone
    pub name: String,

    /// Record type
    #[serde(rename = "qtype")]
    pub record_type: String,

    /// TTL in seconds (ignored by the API when strategy is `inherit`)
    #[serde(default)]
    pub ttl: u32,

    #[serde(default)]
    pub ttl_strategy: TtlStrategy,

    /// Record data; non-string values are rendered to text on read
    #[serde(rename = "rdata", deserialize_with = "rdata_as_string")]
    pub target: String,

    #[serde(default)]
    pub enabled: bool,

    /// Ownership tag
    #[serde(default)]
    pub source: String,
}

fn rdata_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
