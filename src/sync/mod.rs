//! Reconciliation between the local SQLite store and the remote document
//! store.
//!
//! Each local row carries an optional remote key. A sync run pushes local
//! rows, adopts or creates their remote documents, and pulls documents the
//! device has not seen yet, entity by entity in dependency order.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use grocery_sync::db::{init_db, LocalStore};
//! use grocery_sync::sync::{MemoryRemoteStore, Reconciler, RemoteGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = init_db(std::path::Path::new("grocery.db")).await?;
//! let remote = RemoteGateway::new(Arc::new(MemoryRemoteStore::new()), "owner-1");
//! let report = Reconciler::new(LocalStore::new(pool), remote).synchronize().await?;
//! println!("{} remote documents created", report.remote_creates());
//! # Ok(())
//! # }
//! ```

pub mod convert;
pub mod error;
pub mod gateway;
pub mod phase;
pub mod reconciler;
pub mod remote;
pub mod report;

pub use error::{ConvertError, Side, SyncError};
pub use gateway::{RemoteGateway, DEFAULT_TIMEOUT};
pub use phase::{Phase, PIPELINE};
pub use reconciler::{merge_items, Reconciler, Removal};
pub use remote::{
    Collection, CollectionPath, Document, HttpRemoteStore, MemoryRemoteStore, RemoteError,
    RemoteStore,
};
pub use report::{PhaseReport, SkipReason, Skipped, SyncReport};
