//! Postgres backend
//!
//! One `earthquakes` table keyed by event id. Writes are
//! `INSERT .. ON CONFLICT (id) DO UPDATE`, which makes every upsert
//! idempotent; `created_at` is left out of the update set so it keeps the
//! first ingestion time.
//!
//! Batches go out as one multi-row statement per chunk. A chunk that fails
//! is retried row by row, so a single bad row only costs itself.
//!
//! The pool connects lazily. The schema is created on the first operation
//! that reaches the database, so the service can start before Postgres is
//! reachable and recover once it is.
//!
//! The connection URL carries credentials and is never logged.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tokio::sync::OnceCell;
use tracing::{info, warn};
use types::ids::EventId;
use types::record::EarthquakeRecord;

use crate::error::{StoreError, StoreResult};
use crate::store::{dedupe_last_wins, EarthquakeStore, ListQuery, Page};

/// Rows per multi-row INSERT.
const BATCH_CHUNK: usize = 100;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS earthquakes (
    id                TEXT PRIMARY KEY,
    datetime          TEXT NOT NULL,
    "timestamp"       BIGINT NOT NULL,
    magnitude         DOUBLE PRECISION NOT NULL,
    depth             DOUBLE PRECISION NOT NULL,
    latitude          DOUBLE PRECISION NOT NULL,
    longitude         DOUBLE PRECISION NOT NULL,
    region            TEXT NOT NULL,
    tsunami_potential TEXT,
    felt_status       TEXT,
    shakemap_url      TEXT,
    created_at        BIGINT NOT NULL
)"#;

const TIMESTAMP_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS earthquakes_timestamp_idx ON earthquakes ("timestamp" DESC)"#;

const INSERT_PREFIX: &str = r#"INSERT INTO earthquakes (id, datetime, "timestamp", magnitude, depth, latitude, longitude, region, tsunami_potential, felt_status, shakemap_url, created_at) "#;

const ON_CONFLICT: &str = r#" ON CONFLICT (id) DO UPDATE SET
    datetime = EXCLUDED.datetime,
    "timestamp" = EXCLUDED."timestamp",
    magnitude = EXCLUDED.magnitude,
    depth = EXCLUDED.depth,
    latitude = EXCLUDED.latitude,
    longitude = EXCLUDED.longitude,
    region = EXCLUDED.region,
    tsunami_potential = EXCLUDED.tsunami_potential,
    felt_status = EXCLUDED.felt_status,
    shakemap_url = EXCLUDED.shakemap_url"#;

const SELECT_COLUMNS: &str = r#"SELECT id, datetime, "timestamp", magnitude, depth, latitude, longitude, region, tsunami_potential, felt_status, shakemap_url, created_at FROM earthquakes"#;

const MAGNITUDE_FILTER: &str =
    r#" WHERE ($1::float8 IS NULL OR magnitude >= $1) AND ($2::float8 IS NULL OR magnitude <= $2)"#;

/// Connection settings.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

pub struct PostgresStore {
    pool: PgPool,
    schema: OnceCell<()>,
}

/// Row shape of the `earthquakes` table.
#[derive(Debug, Clone, FromRow)]
struct DbEarthquake {
    id: String,
    datetime: String,
    timestamp: i64,
    magnitude: f64,
    depth: f64,
    latitude: f64,
    longitude: f64,
    region: String,
    tsunami_potential: Option<String>,
    felt_status: Option<String>,
    shakemap_url: Option<String>,
    created_at: i64,
}

impl From<DbEarthquake> for EarthquakeRecord {
    fn from(row: DbEarthquake) -> Self {
        EarthquakeRecord {
            id: EventId::from_raw(row.id),
            datetime: row.datetime,
            timestamp: row.timestamp,
            magnitude: row.magnitude,
            depth: row.depth,
            latitude: row.latitude,
            longitude: row.longitude,
            region: row.region,
            tsunami_potential: row.tsunami_potential,
            felt_status: row.felt_status,
            shakemap_url: row.shakemap_url,
            created_at: row.created_at,
        }
    }
}

impl PostgresStore {
    /// Build the pool and try to create the table.
    ///
    /// Fails only on a malformed URL. An unreachable server is logged and
    /// left to the first operation.
    pub async fn connect(config: &PostgresConfig) -> StoreResult<Self> {
        let options = PgConnectOptions::from_str(&config.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);

        let store = Self {
            pool,
            schema: OnceCell::new(),
        };
        match store.ensure_schema().await {
            Ok(()) => info!(max_connections = config.max_connections, "Connected to Postgres"),
            Err(e) => warn!(error = %e, "Postgres unreachable; schema will be created on first use"),
        }
        Ok(store)
    }

    /// Create the table once; retried on every call until it succeeds.
    async fn ensure_schema(&self) -> StoreResult<()> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::query(SCHEMA).execute(&self.pool).await?;
                sqlx::query(TIMESTAMP_INDEX).execute(&self.pool).await?;
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }

    async fn insert_many(&self, records: &[&EarthquakeRecord]) -> StoreResult<()> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(INSERT_PREFIX);
        builder.push_values(records.iter().copied(), |mut row, r| {
            row.push_bind(r.id.to_string())
                .push_bind(r.datetime.clone())
                .push_bind(r.timestamp)
                .push_bind(r.magnitude)
                .push_bind(r.depth)
                .push_bind(r.latitude)
                .push_bind(r.longitude)
                .push_bind(r.region.clone())
                .push_bind(r.tsunami_potential.clone())
                .push_bind(r.felt_status.clone())
                .push_bind(r.shakemap_url.clone())
                .push_bind(r.created_at);
        });
        builder.push(ON_CONFLICT);
        builder.build().execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl EarthquakeStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn upsert(&self, record: &EarthquakeRecord) -> StoreResult<()> {
        self.ensure_schema().await?;
        self.insert_many(&[record]).await
    }

    async fn upsert_batch(&self, records: &[EarthquakeRecord]) -> usize {
        if records.is_empty() {
            return 0;
        }
        if let Err(e) = self.ensure_schema().await {
            warn!(rows = records.len(), error = %e, "Batch upsert skipped");
            return 0;
        }

        // One ON CONFLICT statement may not touch the same row twice
        let unique = dedupe_last_wins(records);
        let mut written = 0;

        for chunk in unique.chunks(BATCH_CHUNK) {
            match self.insert_many(chunk).await {
                Ok(()) => written += chunk.len(),
                Err(e) => {
                    warn!(rows = chunk.len(), error = %e, "Batch insert failed, retrying row by row");
                    for r in chunk {
                        match self.insert_many(&[*r]).await {
                            Ok(()) => written += 1,
                            Err(e) => warn!(id = %r.id, error = %e, "Upsert failed"),
                        }
                    }
                }
            }
        }

        written
    }

    async fn get(&self, id: &str) -> StoreResult<Option<EarthquakeRecord>> {
        self.ensure_schema().await?;
        let row = sqlx::query_as::<_, DbEarthquake>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(EarthquakeRecord::from))
    }

    async fn latest(&self) -> StoreResult<Option<EarthquakeRecord>> {
        self.ensure_schema().await?;
        let row = sqlx::query_as::<_, DbEarthquake>(&format!(
            r#"{SELECT_COLUMNS} ORDER BY "timestamp" DESC, id ASC LIMIT 1"#
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(EarthquakeRecord::from))
    }

    async fn page(&self, query: &ListQuery) -> StoreResult<Page> {
        self.ensure_schema().await?;
        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM earthquakes{MAGNITUDE_FILTER}"))
                .bind(query.min_magnitude)
                .bind(query.max_magnitude)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, DbEarthquake>(&format!(
            r#"{SELECT_COLUMNS}{MAGNITUDE_FILTER} ORDER BY "timestamp" DESC, id ASC LIMIT $3 OFFSET $4"#
        ))
        .bind(query.min_magnitude)
        .bind(query.max_magnitude)
        .bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            records: rows.into_iter().map(EarthquakeRecord::from).collect(),
            total: total.max(0) as u64,
        })
    }

    async fn all(&self) -> StoreResult<Vec<EarthquakeRecord>> {
        self.ensure_schema().await?;
        let rows = sqlx::query_as::<_, DbEarthquake>(SELECT_COLUMNS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(EarthquakeRecord::from).collect())
    }
}
