// # Yamu DDI Record Store
//
// This crate provides the `RecordStore` implementation backed by the
// Yamu DDI OpenAPI.
//
// ## Behaviour
//
// - One HTTP request per store call; no retries, no caching
// - Records are scoped by view and by ownership tag (`source`)
// - Creates send one record per request, deletes are bulk per zone
// - Zone existence checks never fail: errors are logged and read as "absent"
//
// ## Security Requirements
//
// - API key NEVER appears in logs or `Debug` output
// - Credentials are sent as HTTP Basic auth on every request
//
// ## API Reference
//
// All paths are relative to `<host>/openapi/dns`:
//
// - List records:  GET    `zone/auth/rr/all/view/:view/zone/:zone?source=:source`
// - Create record: POST   `zone/auth/rr/view/:view/zone/:zone`
// - Delete records: DELETE `zone/auth/rr/view/:view/zone/:zone`
// - Get zone:      GET    `zone/auth/view/:view/zone/:zone`
//
// A `400` whose body carries a non-zero `rcode` is an application-level
// rejection; its `description` is surfaced as-is.

use async_trait::async_trait;
use ddi_core::config::DdiConfig;
use ddi_core::traits::{RecordStore, RecordStoreFactory};
use ddi_core::{Error, ManagedRecord, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Path prefix of the DNS OpenAPI
const API_DNS_PREFIX: &str = "openapi/dns";

/// Store name used in logs and errors
const STORE_NAME: &str = "yamu";

/// `{"rcode": 0, "description": "..."}`
#[derive(Debug, Default, Deserialize)]
struct ResponseCode {
    #[serde(default)]
    rcode: i32,
    #[serde(default)]
    description: String,
}

/// `{"data": [record, ...]}`
#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    data: Option<Vec<ManagedRecord>>,
}

/// `{"rrs": [record, ...]}`
#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    rrs: &'a [ManagedRecord],
}

/// Yamu DDI record store
pub struct YamuRecordStore {
    /// Base URL including the OpenAPI prefix
    base_url: Url,

    /// API user
    user: String,

    /// API key
    /// ⚠️ NEVER log this value
    key: String,

    /// Management view
    view: String,

    /// Ownership tag used to scope listings
    source: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for YamuRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YamuRecordStore")
            .field("base_url", &self.base_url.as_str())
            .field("user", &self.user)
            .field("key", &"<REDACTED>")
            .field("view", &self.view)
            .field("source", &self.source)
            .finish()
    }
}

impl YamuRecordStore {
    /// Create a new store
    ///
    /// # Parameters
    ///
    /// - `config`: Address, credentials, view, timeout and TLS settings
    /// - `source`: Ownership tag; only records carrying it are listed
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the host is not a valid http(s) URL, the
    /// credentials are empty or the HTTP client cannot be built.
    pub fn new(config: &DdiConfig, source: impl Into<String>) -> Result<Self> {
        config.validate()?;

        let mut base_url = Url::parse(&config.host)
            .map_err(|e| Error::config(format!("Invalid DDI host '{}': {}", config.host, e)))?;
        base_url
            .path_segments_mut()
            .map_err(|_| Error::config(format!("DDI host '{}' cannot be a base URL", config.host)))?
            .pop_if_empty()
            .extend(API_DNS_PREFIX.split('/'));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if config.skip_tls_verify {
            tracing::warn!(host = %config.host, "TLS certificate verification is disabled");
        }

        Ok(Self {
            base_url,
            user: config.user.clone(),
            key: config.key.clone(),
            view: config.view.clone(),
            source: source.into(),
            client,
        })
    }

    /// Base URL all request paths are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a request URL from path segments under the base URL
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config(format!("Invalid DDI base URL: {}", self.base_url)))?
            .extend(segments);
        Ok(url)
    }

    fn records_url(&self, zone: &str) -> Result<Url> {
        self.url(&["zone", "auth", "rr", "view", self.view.as_str(), "zone", zone])
    }

    fn list_url(&self, zone: &str) -> Result<Url> {
        let mut url = self.url(&["zone", "auth", "rr", "all", "view", self.view.as_str(), "zone", zone])?;
        url.query_pairs_mut().append_pair("source", &self.source);
        Ok(url)
    }

    fn zone_url(&self, zone: &str) -> Result<Url> {
        self.url(&["zone", "auth", "view", self.view.as_str(), "zone", zone])
    }

    /// Send one request and apply the API's status rules
    ///
    /// - `200`: returned to the caller
    /// - `400` with `rcode != 0`: `Error::Api` carrying the description
    /// - anything else: `Error::Http` naming method, URL and status
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response> {
        tracing::debug!(method = %method, url = %url, "sending DDI request");

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .basic_auth(&self.user, Some(&self.key))
            .header(ACCEPT, "application/json");
        if method != Method::GET {
            request = request.header(CONTENT_TYPE, "application/json; charset=utf-8");
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(method = %method, url = %url, "DDI request failed");
            Error::http(format!("{} request to {} failed: {}", method, url, e))
        })?;

        let status = response.status();
        tracing::debug!(method = %method, url = %url, status = status.as_u16(), "DDI response");

        if status == StatusCode::BAD_REQUEST {
            let code: ResponseCode = response.json().await.map_err(|e| {
                Error::http(format!(
                    "{} request to {} returned 400 with an unreadable body: {}",
                    method, url, e
                ))
            })?;
            if code.rcode != 0 {
                tracing::error!(method = %method, url = %url, rcode = code.rcode, "DDI request rejected");
                return Err(Error::api(code.rcode, code.description));
            }
            return Err(Error::http(format!(
                "{} request to {} was not successful: {}",
                method,
                url,
                status.as_u16()
            )));
        }

        if status != StatusCode::OK {
            tracing::error!(method = %method, url = %url, status = status.as_u16(), "DDI request failed");
            return Err(Error::http(format!(
                "{} request to {} was not successful: {}",
                method,
                url,
                status.as_u16()
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl RecordStore for YamuRecordStore {
    async fn list_records(&self, zone: &str) -> Result<Vec<ManagedRecord>> {
        let url = self.list_url(zone)?;
        let response = self.send(Method::GET, url.clone(), None).await?;

        let list: RecordList = response.json().await.map_err(|e| {
            Error::http(format!("Failed to decode records from {}: {}", url, e))
        })?;
        let records = list.data.unwrap_or_default();

        tracing::debug!(zone = %zone, count = records.len(), "retrieved records");
        Ok(records)
    }

    async fn create_record(&self, zone: &str, record: &ManagedRecord) -> Result<()> {
        tracing::debug!(zone = %zone, name = %record.name, record_type = %record.record_type, "creating record");

        let body = serde_json::to_vec(std::slice::from_ref(record))?;
        self.send(Method::POST, self.records_url(zone)?, Some(body)).await?;
        Ok(())
    }

    async fn delete_records(&self, zone: &str, records: &[ManagedRecord]) -> Result<()> {
        tracing::debug!(zone = %zone, count = records.len(), "deleting records");

        let body = serde_json::to_vec(&DeleteRequest { rrs: records })?;
        self.send(Method::DELETE, self.records_url(zone)?, Some(body)).await?;
        Ok(())
    }

    async fn zone_exists(&self, zone: &str) -> bool {
        let url = match self.zone_url(zone) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(zone = %zone, error = %e, "failed to get zone");
                return false;
            }
        };

        let response = match self.send(Method::GET, url, None).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(zone = %zone, error = %e, "failed to get zone");
                return false;
            }
        };

        match response.json::<ResponseCode>().await {
            Ok(code) if code.rcode == 0 => true,
            Ok(code) => {
                tracing::warn!(zone = %zone, rcode = code.rcode, description = %code.description, "zone not found");
                false
            }
            Err(e) => {
                tracing::warn!(zone = %zone, error = %e, "failed to decode zone response");
                false
            }
        }
    }

    fn store_name(&self) -> &'static str {
        STORE_NAME
    }
}

/// Factory for creating Yamu record stores
pub struct YamuFactory;

impl RecordStoreFactory for YamuFactory {
    fn create(&self, config: &DdiConfig, source: &str) -> Result<Box<dyn RecordStore>> {
        Ok(Box::new(YamuRecordStore::new(config, source)?))
    }
}
