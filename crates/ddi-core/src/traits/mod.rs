//! Core traits for the DDI provider
//!
//! This module defines the abstract interfaces that implementations must follow.
//!
//! - [`RecordStore`]: List, create and delete records on the remote management API

pub mod record_store;

pub use record_store::{RecordStore, RecordStoreFactory};
