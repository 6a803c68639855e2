//! Types library for the earthquake feed service
//!
//! Core type definitions shared by ingestion, persistence and the HTTP
//! gateway, plus the small amount of arithmetic the queries need.
//!
//! # Modules
//! - `ids`: `EventId` derivation (deduplication key)
//! - `record`: `EarthquakeRecord`, the canonical stored unit
//! - `geo`: haversine distance and radius filtering
//! - `stats`: magnitude histogram and summary statistics
//! - `time`: wall-clock helpers

pub mod geo;
pub mod ids;
pub mod record;
pub mod stats;
pub mod time;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::geo::*;
    pub use crate::ids::*;
    pub use crate::record::*;
    pub use crate::stats::*;
}
