//! Earthquake record persistence
//!
//! Provides the upsert store contract, its backends and the read-side
//! query service.
//!
//! # Guarantees
//! - At most one logical record per `EventId` (insert-or-replace)
//! - Upserting the same record twice is observably the same as once
//! - Batch upserts are not atomic and report how many records landed
//! - Readers see whole records (read-committed), never a partial write
//!
//! # Backends
//! - `postgres`: the deployment backend
//! - `memory`: process-local, for tests and local runs

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};
pub use query::QueryService;
pub use store::{EarthquakeStore, ListQuery, Page, StoreHandle};
