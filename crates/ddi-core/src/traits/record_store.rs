// # Record Store Trait
//
// Defines the interface to the remote DNS management API.
//
// ## Implementations
//
// - Yamu DDI: `ddi-provider-yamu` crate
//
// ## Usage
//
// ```rust,ignore
// use ddi_core::RecordStore;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* RecordStore implementation */;
//
//     if store.zone_exists("example.com").await {
//         for record in store.list_records("example.com").await? {
//             println!("{} {} {}", record.name, record.record_type, record.target);
//         }
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::record::ManagedRecord;

/// Trait for remote record store implementations
///
/// The store is the source of truth: the reconciler keeps no record state
/// of its own and re-reads the store on every pass.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Failure Model
///
/// - No retries inside the store; the caller re-runs the whole pass.
/// - `zone_exists` never fails: "cannot confirm" and "absent" are the
///   same answer.
/// - Everything else propagates transport and API errors unchanged.
/// - Cancellation is by dropping the returned future; requests already
///   sent are not undone.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List the records this provider owns in `zone`
    ///
    /// # Parameters
    ///
    /// - `zone`: Zone name without trailing dot (e.g. "example.com")
    async fn list_records(&self, zone: &str) -> Result<Vec<ManagedRecord>, crate::Error>;

    /// Create a single record in `zone`
    async fn create_record(&self, zone: &str, record: &ManagedRecord) -> Result<(), crate::Error>;

    /// Delete all of `records` from `zone` in one request
    async fn delete_records(
        &self,
        zone: &str,
        records: &[ManagedRecord],
    ) -> Result<(), crate::Error>;

    /// Whether `zone` exists on the remote side
    ///
    /// Errors are logged by the implementation and reported as `false`.
    async fn zone_exists(&self, zone: &str) -> bool;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing record stores from configuration
pub trait RecordStoreFactory: Send + Sync {
    /// Create a RecordStore instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Connection settings for the management API
    /// - `source`: Ownership tag used to scope listed records
    fn create(
        &self,
        config: &crate::config::DdiConfig,
        source: &str,
    ) -> Result<Box<dyn RecordStore>, crate::Error>;
}
