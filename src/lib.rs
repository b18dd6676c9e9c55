//! Grocery list reconciliation between a local SQLite store and a remote,
//! per-user document store.

pub mod config;
pub mod db;
pub mod models;
pub mod sync;

pub use config::{Config, ConfigError};
pub use db::{init_db, LocalStore};
pub use sync::{Reconciler, RemoteGateway, SyncError, SyncReport};
