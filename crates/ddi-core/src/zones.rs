//! Zone filter cache
//!
//! Holds the configured zones that the remote side confirmed to exist.
//! A refresh builds a fresh list and publishes it with a single pointer
//! swap, so readers never see a half-built list and never wait on a
//! refresh in progress.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::traits::RecordStore;

/// Validated zone list shared between reconciliation passes
#[derive(Debug)]
pub struct ZoneFilterCache {
    zones: ArcSwap<Vec<String>>,
}

impl ZoneFilterCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            zones: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Re-validate `candidates` against the store and publish the result
    ///
    /// Zones whose existence check fails are left out; a failed check
    /// never aborts the refresh. The returned snapshot is the one this
    /// call published, which keeps a pass consistent even if another
    /// refresh lands right after it.
    pub async fn refresh(&self, store: &dyn RecordStore, candidates: &[String]) -> Arc<Vec<String>> {
        let mut zones: Vec<String> = Vec::with_capacity(candidates.len());

        for zone in candidates {
            if zones.iter().any(|z| z.eq_ignore_ascii_case(zone)) {
                continue;
            }
            if store.zone_exists(zone).await {
                zones.push(zone.clone());
            } else {
                info!(zone = %zone, store = store.store_name(), "zone not confirmed, skipping");
            }
        }

        debug!(
            candidates = candidates.len(),
            confirmed = zones.len(),
            "zone filter refreshed"
        );

        let zones = Arc::new(zones);
        self.zones.store(Arc::clone(&zones));
        zones
    }

    /// Current validated zone list
    pub fn snapshot(&self) -> Arc<Vec<String>> {
        self.zones.load_full()
    }

    /// Number of validated zones
    pub fn len(&self) -> usize {
        self.zones.load().len()
    }

    /// Whether no zone is currently validated
    pub fn is_empty(&self) -> bool {
        self.zones.load().is_empty()
    }
}

impl Default for ZoneFilterCache {
    fn default() -> Self {
        Self::new()
    }
}
