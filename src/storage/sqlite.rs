//! SQLite plant store, for local runs and tests

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::Result;

use super::schema::{Dialect, Queries};
use super::PlantStore;

pub const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// `sqlite::memory:` or a `sqlite://path` URL
    pub url: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: MEMORY_URL.to_string(),
        }
    }
}

impl SqliteConfig {
    fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// SQLite-backed plant store
pub struct SqliteStore {
    pool: SqlitePool,
    queries: Queries,
}

impl SqliteStore {
    pub async fn connect(config: &SqliteConfig) -> Result<Self> {
        tracing::info!(url = %config.url, "Opening SQLite database");

        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        // An in-memory database lives as long as its one connection.
        let pool_options = if config.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options.connect_with(options).await?;
        Ok(Self::from_pool(pool))
    }

    /// Fresh private in-memory database with the schema in place.
    pub async fn in_memory() -> Result<Self> {
        let store = Self::connect(&SqliteConfig::default()).await?;
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            queries: Queries::for_dialect(Dialect::Sqlite),
        }
    }
}

impl_plant_store!(SqliteStore, "sqlite");
