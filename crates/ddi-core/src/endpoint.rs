//! Declarative endpoint types exchanged with external-dns
//!
//! Field names follow the external-dns webhook JSON encoding.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A desired DNS record: one name and type with one or more targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully-qualified name, with or without trailing dot
    #[serde(default)]
    pub dns_name: String,

    /// Record targets, in order
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Vec<String>,

    /// Record type (e.g. "A", "CNAME", "TXT")
    #[serde(default)]
    pub record_type: String,

    /// Distinguishes endpoints sharing name and type
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,

    /// TTL in seconds; zero means "not configured"
    #[serde(rename = "recordTTL", default, skip_serializing_if = "is_zero")]
    pub record_ttl: u32,

    /// Labels attached by external-dns
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: BTreeMap<String, String>,

    /// Provider specific properties
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub provider_specific: Vec<ProviderSpecificProperty>,
}

fn is_zero(ttl: &u32) -> bool {
    *ttl == 0
}

// external-dns encodes empty Go slices and maps as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Endpoint {
    /// Create an endpoint with the given name, type and targets
    pub fn new(
        dns_name: impl Into<String>,
        record_type: impl Into<String>,
        targets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            dns_name: dns_name.into(),
            record_type: record_type.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.record_ttl = ttl;
        self
    }
}

/// Name/value pair carried in `providerSpecific`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

/// A desired-state diff computed by the caller
///
/// `update_old` entries are removed and `update_new` entries are added;
/// the reconciler never computes a diff itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Changes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub create: Vec<Endpoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_old: Vec<Endpoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_new: Vec<Endpoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// Endpoints to remove: `update_old` followed by `delete`
    pub fn removals(&self) -> impl Iterator<Item = &Endpoint> {
        self.update_old.iter().chain(self.delete.iter())
    }

    /// Endpoints to add: `create` followed by `update_new`
    pub fn additions(&self) -> impl Iterator<Item = &Endpoint> {
        self.create.iter().chain(self.update_new.iter())
    }

    /// Whether there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty()
    }
}
