//! Test doubles and common utilities for reconciler contract tests
//!
//! This module provides an in-memory record store that records every call
//! made against it, so tests can assert on the exact remote traffic.

#![allow(dead_code)]

use ddi_core::error::{Error, Result};
use ddi_core::{DomainFilter, ManagedRecord, Reconciler, ReconcilerConfig, RecordStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One call observed by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ZoneExists(String),
    List(String),
    Create {
        zone: String,
        record: ManagedRecord,
    },
    Delete {
        zone: String,
        records: Vec<ManagedRecord>,
    },
}

/// Which call should fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Every `list_records` for this zone
    List(String),
    /// Every `delete_records` for this zone
    Delete(String),
    /// `create_record` for this target
    Create(String),
}

/// An in-memory RecordStore that tracks calls
pub struct MockRecordStore {
    /// Zones answered with "exists"
    zones: Arc<Mutex<Vec<String>>>,
    /// Stored records per zone
    records: Arc<Mutex<HashMap<String, Vec<ManagedRecord>>>>,
    /// Every call in order
    calls: Arc<Mutex<Vec<StoreCall>>>,
    /// Injected failures
    failures: Arc<Mutex<Vec<Failure>>>,
}

impl MockRecordStore {
    pub fn new(zones: &[&str]) -> Self {
        Self {
            zones: Arc::new(Mutex::new(zones.iter().map(|z| z.to_string()).collect())),
            records: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a new MockRecordStore that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            zones: Arc::clone(&other.zones),
            records: Arc::clone(&other.records),
            calls: Arc::clone(&other.calls),
            failures: Arc::clone(&other.failures),
        }
    }

    /// Make a zone exist from now on
    pub fn add_zone(&self, zone: &str) {
        self.zones.lock().unwrap().push(zone.to_string());
    }

    /// Seed a record without recording a call
    pub fn seed(&self, zone: &str, record: ManagedRecord) {
        self.records
            .lock()
            .unwrap()
            .entry(zone.to_string())
            .or_default()
            .push(record);
    }

    pub fn fail(&self, failure: Failure) {
        self.failures.lock().unwrap().push(failure);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change remote state, in order
    pub fn mutations(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::Create { .. } | StoreCall::Delete { .. }))
            .collect()
    }

    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Create { .. }))
            .count()
    }

    pub fn delete_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Delete { .. }))
            .count()
    }

    pub fn stored(&self, zone: &str) -> Vec<ManagedRecord> {
        self.records
            .lock()
            .unwrap()
            .get(zone)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn should_fail(&self, failure: &Failure) -> bool {
        self.failures.lock().unwrap().contains(failure)
    }
}

#[async_trait::async_trait]
impl RecordStore for MockRecordStore {
    async fn list_records(&self, zone: &str) -> Result<Vec<ManagedRecord>> {
        self.record(StoreCall::List(zone.to_string()));
        if self.should_fail(&Failure::List(zone.to_string())) {
            return Err(Error::http(format!("GET records for {} was not successful: 502", zone)));
        }
        Ok(self.stored(zone))
    }

    async fn create_record(&self, zone: &str, record: &ManagedRecord) -> Result<()> {
        self.record(StoreCall::Create {
            zone: zone.to_string(),
            record: record.clone(),
        });
        if self.should_fail(&Failure::Create(record.target.clone())) {
            return Err(Error::api(1, format!("record {} already exists", record.name)));
        }
        self.seed(zone, record.clone());
        Ok(())
    }

    async fn delete_records(&self, zone: &str, records: &[ManagedRecord]) -> Result<()> {
        self.record(StoreCall::Delete {
            zone: zone.to_string(),
            records: records.to_vec(),
        });
        if self.should_fail(&Failure::Delete(zone.to_string())) {
            return Err(Error::http(format!("DELETE records in {} was not successful: 500", zone)));
        }
        if let Some(stored) = self.records.lock().unwrap().get_mut(zone) {
            stored.retain(|s| {
                !records.iter().any(|r| {
                    r.name == s.name && r.record_type == s.record_type && r.target == s.target
                })
            });
        }
        Ok(())
    }

    async fn zone_exists(&self, zone: &str) -> bool {
        self.record(StoreCall::ZoneExists(zone.to_string()));
        self.zones.lock().unwrap().iter().any(|z| z == zone)
    }

    fn store_name(&self) -> &'static str {
        "mock"
    }
}

/// Build a reconciler over a store sharing state with `store`
pub fn reconciler(store: &MockRecordStore, zones: &[&str], default_ttl: u32) -> Reconciler {
    Reconciler::new(
        Box::new(MockRecordStore::sharing_state_with(store)),
        DomainFilter::literal(zones.iter().copied(), Vec::<String>::new()),
        ReconcilerConfig::default().with_default_ttl(default_ttl),
    )
}

/// A record as the store would hold it
pub fn stored_record(name: &str, record_type: &str, target: &str, ttl: u32) -> ManagedRecord {
    ManagedRecord {
        name: name.to_string(),
        record_type: record_type.to_string(),
        ttl,
        ttl_strategy: ddi_core::TtlStrategy::Rewrite,
        target: target.to_string(),
        enabled: true,
        source: "external-dns-yamu".to_string(),
    }
}
