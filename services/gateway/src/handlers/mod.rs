pub mod earthquakes;
pub mod health;
pub mod ingest;
