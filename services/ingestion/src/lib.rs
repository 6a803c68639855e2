//! Earthquake Feed Ingestion
//!
//! Pulls the agency's three public feeds, turns raw entries into
//! `EarthquakeRecord`s and upserts them into the configured store:
//! - Feed document model tolerant of single-object and list payloads
//! - HTTP client with a bounded per-fetch timeout
//! - Pure normalizer with per-entry rejection
//! - Ingestion cycle with concurrent, isolated feed branches
//! - Periodic scheduler with a single-flight guard
//!
//! # Architecture
//!
//! ```text
//!   Scheduler tick / manual trigger
//!              │
//!        ┌─────▼─────┐
//!        │ Ingestor  │  ← one cycle at a time
//!        └─────┬─────┘
//!   ┌──────────┼───────────┐
//!   │          │           │
//! ┌─▼────┐ ┌───▼────┐ ┌────▼───┐
//! │latest│ │m5plus  │ │felt    │   fetch → normalize
//! └─┬────┘ └───┬────┘ └────┬───┘
//!   │          │           │
//! ┌─▼──────────▼───────────▼──┐
//! │   EarthquakeStore upsert  │
//! └───────────────────────────┘
//! ```

pub mod client;
pub mod cycle;
pub mod feed;
pub mod normalize;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use client::{FeedClient, FeedSource, FetchError, DEFAULT_FETCH_TIMEOUT};
pub use cycle::{CycleReport, FeedReport, Ingestor};
pub use feed::{Feed, RawEntry, DEFAULT_FEED_BASE_URL};
pub use normalize::{NormalizeError, NormalizedBatch, Normalizer};
pub use scheduler::{join_scheduler, Scheduler, TriggerOutcome, DEFAULT_INTERVAL};

// Library version
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
