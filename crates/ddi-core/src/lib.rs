// # ddi-core
//
// Core library for the DDI external-dns provider.
//
// ## Architecture Overview
//
// This library keeps a set of desired DNS records in sync with a remote
// DNS management API, scoped to a configurable set of zones:
// - **domain**: FQDN normalization, label-aligned suffix tests and the
//   longest-suffix split that decides which zone owns a name
// - **DomainFilter**: literal or regex filter naming the candidate zones
// - **ZoneFilterCache**: candidate zones the remote side confirmed to exist
// - **Reconciler**: reads remote state as endpoints and applies change sets
// - **RecordStore**: trait for the remote API (list/create/bulk delete)
//
// ## Design Principles
//
// 1. **Remote is the source of truth**: no local record state is kept
// 2. **Caller owns the diff**: change sets arrive pre-partitioned
// 3. **Fail fast**: the first remote error ends the pass, no rollback
// 4. **Skip, don't fail**: unsupported types and unmatched names are logged
// 5. **Library-First**: the daemon is a thin layer over this crate

pub mod config;
pub mod domain;
pub mod endpoint;
pub mod error;
pub mod filter;
pub mod reconciler;
pub mod record;
pub mod traits;
pub mod zones;

// Re-export core types for convenience
pub use config::{DdiConfig, DomainFilterConfig, ReconcilerConfig};
pub use endpoint::{Changes, Endpoint};
pub use error::{Error, Result};
pub use filter::DomainFilter;
pub use reconciler::{ApplySummary, Reconciler, ZoneBatch};
pub use record::{ManagedRecord, TtlStrategy};
pub use traits::{RecordStore, RecordStoreFactory};
pub use zones::ZoneFilterCache;
