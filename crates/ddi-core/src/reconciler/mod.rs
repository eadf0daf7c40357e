//! Record reconciler
//!
//! The Reconciler is responsible for:
//! - Refreshing the zone filter cache at the start of every pass
//! - Reading the remote records back as endpoints
//! - Turning a caller-supplied change set into grouped remote calls
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!  Changes ──────▶│  Reconciler  │──────▶ Vec<Endpoint>
//!                 └──────────────┘
//!                    │        │
//!          ┌─────────┘        └──────────┐
//!          ▼                             ▼
//! ┌─────────────────┐           ┌──────────────┐
//! │ ZoneFilterCache │           │ RecordStore  │
//! │ (refresh/read)  │           │ (list/create │
//! └─────────────────┘           │  /delete)    │
//!                               └──────────────┘
//! ```
//!
//! ## Apply Flow
//!
//! 1. Refresh the zone cache from the domain filter's candidate zones;
//!    an empty change set stops here
//! 2. `update_old ∪ delete` → one bulk delete per zone
//! 3. `create ∪ update_new` → one create per record
//! 4. First remote error aborts the pass; nothing is rolled back
//!
//! Deletes always run before creates so a record that is removed and
//! re-added with different targets never collides on the remote side.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ReconcilerConfig;
use crate::domain::{join_host_and_zone, match_longest_suffix};
use crate::endpoint::{Changes, Endpoint};
use crate::error::Result;
use crate::filter::DomainFilter;
use crate::record::{ManagedRecord, resolve_ttl};
use crate::traits::RecordStore;
use crate::zones::ZoneFilterCache;

/// Records destined for a single zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneBatch {
    /// Zone as it appears in the zone cache
    pub zone: String,
    /// Records in endpoint/target order
    pub records: Vec<ManagedRecord>,
}

/// Outcome of a successful `apply_changes` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Records removed through bulk deletes
    pub deleted: usize,
    /// Records created
    pub created: usize,
    /// Endpoints dropped for an unsupported type or unmatched zone
    pub skipped: usize,
}

/// Zone-matching and record-reconciliation engine
///
/// Stateless between calls apart from the zone cache; every call is an
/// independent pass against the store.
pub struct Reconciler {
    store: Box<dyn RecordStore>,
    filter: DomainFilter,
    config: ReconcilerConfig,
    zones: ZoneFilterCache,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `store`: Remote record store
    /// - `filter`: Domain filter providing the candidate zones
    /// - `config`: Source tag, default TTL and supported record types
    pub fn new(store: Box<dyn RecordStore>, filter: DomainFilter, config: ReconcilerConfig) -> Self {
        Self {
            store,
            filter,
            config,
            zones: ZoneFilterCache::new(),
        }
    }

    /// Domain filter this reconciler was built with
    pub fn domain_filter(&self) -> &DomainFilter {
        &self.filter
    }

    /// Reconciler constants
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Zones validated by the most recent pass
    pub fn zone_cache(&self) -> &ZoneFilterCache {
        &self.zones
    }

    async fn refresh_zones(&self) -> Arc<Vec<String>> {
        let candidates = self.filter.candidate_zones();
        self.zones.refresh(self.store.as_ref(), &candidates).await
    }

    /// Read the current remote state as endpoints
    ///
    /// Records sharing `(name, type)` collapse into one endpoint whose
    /// targets keep first-seen order. The endpoint TTL is the TTL of the
    /// first record seen for that key. Output order follows zone order,
    /// then record order, and is stable for a fixed remote state.
    pub async fn records(&self) -> Result<Vec<Endpoint>> {
        let zones = self.refresh_zones().await;

        let mut endpoints: Vec<Endpoint> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for zone in zones.iter() {
            let records = self.store.list_records(zone).await?;
            debug!(zone = %zone, count = records.len(), "fetched records");

            for record in records {
                let dns_name = join_host_and_zone(&record.name, zone);
                let key = (dns_name, record.record_type);

                match index.get(&key) {
                    Some(&i) => endpoints[i].targets.push(record.target),
                    None => {
                        let endpoint = Endpoint {
                            dns_name: key.0.clone(),
                            record_type: key.1.clone(),
                            targets: vec![record.target],
                            record_ttl: record.ttl,
                            ..Endpoint::default()
                        };
                        index.insert(key, endpoints.len());
                        endpoints.push(endpoint);
                    }
                }
            }
        }

        info!(zones = zones.len(), endpoints = endpoints.len(), "records retrieved");
        Ok(endpoints)
    }

    /// Apply a change set to the remote store
    ///
    /// Removals are sent as one bulk delete per zone, then additions as
    /// one create per record. Endpoints with an unsupported type, a name
    /// the domain filter rejects or no owning zone are skipped and counted
    /// in the summary. The first remote error is returned as-is.
    pub async fn apply_changes(&self, changes: &Changes) -> Result<ApplySummary> {
        info!(
            create = changes.create.len(),
            update_old = changes.update_old.len(),
            update_new = changes.update_new.len(),
            delete = changes.delete.len(),
            "applying changes"
        );

        let zones = self.refresh_zones().await;
        let mut summary = ApplySummary::default();
        if changes.is_empty() {
            debug!("change set is empty, nothing to apply");
            return Ok(summary);
        }

        let (removals, skipped) = self.zone_batches(changes.removals(), &zones);
        summary.skipped += skipped;
        for batch in &removals {
            debug!(zone = %batch.zone, count = batch.records.len(), "deleting records");
            self.store.delete_records(&batch.zone, &batch.records).await?;
            summary.deleted += batch.records.len();
        }

        let (additions, skipped) = self.zone_batches(changes.additions(), &zones);
        summary.skipped += skipped;
        for batch in &additions {
            debug!(zone = %batch.zone, count = batch.records.len(), "creating records");
            for record in &batch.records {
                self.store.create_record(&batch.zone, record).await?;
                summary.created += 1;
            }
        }

        info!(
            deleted = summary.deleted,
            created = summary.created,
            skipped = summary.skipped,
            "changes applied"
        );
        Ok(summary)
    }

    /// Expand endpoints into records grouped by owning zone
    ///
    /// Zones appear in first-seen order; zones that end up with no
    /// records are omitted. Returns the batches and the number of
    /// endpoints skipped.
    pub fn zone_batches<'a>(
        &self,
        endpoints: impl IntoIterator<Item = &'a Endpoint>,
        zones: &[String],
    ) -> (Vec<ZoneBatch>, usize) {
        let mut batches: Vec<ZoneBatch> = Vec::new();
        let mut skipped = 0;

        for endpoint in endpoints {
            if !self.config.supports(&endpoint.record_type) {
                info!(
                    name = %endpoint.dns_name,
                    record_type = %endpoint.record_type,
                    "record type is not supported, skipping"
                );
                skipped += 1;
                continue;
            }

            if !self.filter.matches(&endpoint.dns_name) {
                info!(name = %endpoint.dns_name, "name is excluded by the domain filter, skipping");
                skipped += 1;
                continue;
            }

            let Some(owner) = match_longest_suffix(&endpoint.dns_name, zones) else {
                info!(name = %endpoint.dns_name, "name does not match any zone, skipping");
                skipped += 1;
                continue;
            };

            let records = endpoint
                .targets
                .iter()
                .map(|target| self.to_record(&owner.label, endpoint, target));

            let zone = &zones[owner.index];
            match batches.iter_mut().find(|b| &b.zone == zone) {
                Some(batch) => batch.records.extend(records),
                None => batches.push(ZoneBatch {
                    zone: zone.clone(),
                    records: records.collect(),
                }),
            }
        }

        batches.retain(|b| !b.records.is_empty());
        (batches, skipped)
    }

    fn to_record(&self, label: &str, endpoint: &Endpoint, target: &str) -> ManagedRecord {
        let (ttl, ttl_strategy) = resolve_ttl(endpoint.record_ttl, self.config.default_ttl);
        ManagedRecord {
            name: label.to_string(),
            record_type: endpoint.record_type.clone(),
            ttl,
            ttl_strategy,
            target: target.to_string(),
            enabled: true,
            source: self.config.source.clone(),
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("store", &self.store.store_name())
            .field("filter", &self.filter)
            .field("config", &self.config)
            .field("zones", &self.zones.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TtlStrategy;
    use async_trait::async_trait;

    struct NullStore;

    #[async_trait]
    impl RecordStore for NullStore {
        async fn list_records(&self, _zone: &str) -> Result<Vec<ManagedRecord>> {
            Ok(Vec::new())
        }

        async fn create_record(&self, _zone: &str, _record: &ManagedRecord) -> Result<()> {
            Ok(())
        }

        async fn delete_records(&self, _zone: &str, _records: &[ManagedRecord]) -> Result<()> {
            Ok(())
        }

        async fn zone_exists(&self, _zone: &str) -> bool {
            true
        }

        fn store_name(&self) -> &'static str {
            "null"
        }
    }

    fn reconciler(default_ttl: u32) -> Reconciler {
        Reconciler::new(
            Box::new(NullStore),
            DomainFilter::default(),
            ReconcilerConfig::default().with_default_ttl(default_ttl),
        )
    }

    fn zones(names: &[&str]) -> Vec<String> {
        names.iter().map(|z| z.to_string()).collect()
    }

    #[test]
    fn test_batches_expand_targets() {
        let r = reconciler(0);
        let ep = Endpoint::new("www.test.com", "A", ["1.1.1.1", "2.2.2.2"]);

        let (batches, skipped) = r.zone_batches([&ep], &zones(&["test.com"]));

        assert_eq!(skipped, 0);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].zone, "test.com");
        let targets: Vec<_> = batches[0].records.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["1.1.1.1", "2.2.2.2"]);
        assert!(batches[0].records.iter().all(|r| r.name == "www"));
        assert!(batches[0].records.iter().all(|r| r.enabled && r.source == "external-dns-yamu"));
    }

    #[test]
    fn test_batches_use_longest_zone() {
        let r = reconciler(0);
        let a = Endpoint::new("a.sub.test.com", "A", ["1.1.1.1"]);
        let b = Endpoint::new("b.test.com", "A", ["2.2.2.2"]);

        let (batches, _) = r.zone_batches([&a, &b], &zones(&["test.com", "sub.test.com"]));

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].zone, "sub.test.com");
        assert_eq!(batches[0].records[0].name, "a");
        assert_eq!(batches[1].zone, "test.com");
        assert_eq!(batches[1].records[0].name, "b");
    }

    #[test]
    fn test_batches_keep_cached_zone_spelling() {
        let r = reconciler(0);
        let ep = Endpoint::new("www.test.com.", "CNAME", ["target.example."]);

        let (batches, _) = r.zone_batches([&ep], &zones(&["TEST.com"]));

        assert_eq!(batches[0].zone, "TEST.com");
        assert_eq!(batches[0].records[0].name, "www");
    }

    #[test]
    fn test_batches_skip_unsupported_and_unmatched() {
        let r = reconciler(0);
        let txt = Endpoint::new("www.test.com", "TXT", ["heritage=external-dns"]);
        let other = Endpoint::new("www.other.org", "A", ["1.1.1.1"]);

        let (batches, skipped) = r.zone_batches([&txt, &other], &zones(&["test.com"]));

        assert!(batches.is_empty());
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_batches_skip_names_excluded_by_filter() {
        let r = Reconciler::new(
            Box::new(NullStore),
            DomainFilter::literal(["test.com"], ["internal.test.com"]),
            ReconcilerConfig::default(),
        );
        let kept = Endpoint::new("www.test.com", "A", ["1.1.1.1"]);
        let excluded = Endpoint::new("db.internal.test.com", "A", ["2.2.2.2"]);

        let (batches, skipped) = r.zone_batches([&kept, &excluded], &zones(&["test.com"]));

        assert_eq!(skipped, 1);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].records.len(), 1);
        assert_eq!(batches[0].records[0].name, "www");
    }

    #[test]
    fn test_batches_ttl_strategy() {
        let ep_unset = Endpoint::new("a.test.com", "A", ["1.1.1.1"]);
        let ep_set = Endpoint::new("b.test.com", "A", ["1.1.1.1"]).with_ttl(30);
        let zone = zones(&["test.com"]);

        let (batches, _) = reconciler(0).zone_batches([&ep_unset, &ep_set], &zone);
        let records = &batches[0].records;
        assert_eq!((records[0].ttl, records[0].ttl_strategy), (0, TtlStrategy::Inherit));
        assert_eq!((records[1].ttl, records[1].ttl_strategy), (30, TtlStrategy::Rewrite));

        let (batches, _) = reconciler(300).zone_batches([&ep_unset, &ep_set], &zone);
        let records = &batches[0].records;
        assert_eq!((records[0].ttl, records[0].ttl_strategy), (300, TtlStrategy::Rewrite));
        assert_eq!((records[1].ttl, records[1].ttl_strategy), (30, TtlStrategy::Rewrite));
    }

    #[test]
    fn test_batches_omit_endpoints_without_targets() {
        let r = reconciler(0);
        let empty = Endpoint::new("www.test.com", "A", Vec::<String>::new());

        let (batches, skipped) = r.zone_batches([&empty], &zones(&["test.com"]));

        assert!(batches.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_debug_does_not_panic() {
        let debug_str = format!("{:?}", reconciler(0));
        assert!(debug_str.contains("Reconciler"));
        assert!(debug_str.contains("null"));
    }
}
