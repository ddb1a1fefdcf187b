//! Storage abstraction layer
//!
//! Provides one interface over the PostgreSQL and SQLite plant stores

use async_trait::async_trait;

use crate::types::{NewPlant, Plant, PlantId};
use crate::Result;

/// Implement [`PlantStore`] for a store with `pool` and `queries` fields.
///
/// Both backends run the same statements from [`schema::Queries`]; only the
/// pool type differs, so the method bodies are written once here.
macro_rules! impl_plant_store {
    ($store:ty, $backend:literal) => {
        #[async_trait::async_trait]
        impl $crate::storage::PlantStore for $store {
            fn backend_name(&self) -> &'static str {
                $backend
            }

            #[tracing::instrument(name = "store.ensure_schema", skip(self))]
            async fn ensure_schema(&self) -> $crate::Result<()> {
                sqlx::query(&self.queries.create_table)
                    .execute(&self.pool)
                    .await?;
                Ok(())
            }

            #[tracing::instrument(name = "store.ping", skip(self))]
            async fn ping(&self) -> $crate::Result<()> {
                sqlx::query("SELECT 1").execute(&self.pool).await?;
                Ok(())
            }

            #[tracing::instrument(name = "store.create", skip(self, plant))]
            async fn create(
                &self,
                plant: $crate::types::NewPlant,
            ) -> $crate::Result<$crate::types::Plant> {
                let row = sqlx::query_as::<_, $crate::types::Plant>(&self.queries.insert)
                    .bind(plant.name)
                    .bind(plant.species)
                    .bind(plant.plan)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(row)
            }

            #[tracing::instrument(name = "store.list", skip(self))]
            async fn list(&self) -> $crate::Result<Vec<$crate::types::Plant>> {
                let rows = sqlx::query_as::<_, $crate::types::Plant>(&self.queries.select_all)
                    .fetch_all(&self.pool)
                    .await?;
                Ok(rows)
            }

            #[tracing::instrument(name = "store.get", skip(self))]
            async fn get(
                &self,
                id: $crate::types::PlantId,
            ) -> $crate::Result<$crate::types::Plant> {
                sqlx::query_as::<_, $crate::types::Plant>(&self.queries.select_one)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or($crate::Error::NotFound(id))
            }

            #[tracing::instrument(name = "store.save", skip(self, plant), fields(id = plant.id))]
            async fn save(
                &self,
                plant: &$crate::types::Plant,
            ) -> $crate::Result<$crate::types::Plant> {
                let row = sqlx::query_as::<_, $crate::types::Plant>(&self.queries.upsert)
                    .bind(plant.id)
                    .bind(plant.name.as_deref())
                    .bind(plant.species.as_deref())
                    .bind(plant.plan.as_deref())
                    .fetch_one(&self.pool)
                    .await?;
                Ok(row)
            }

            #[tracing::instrument(name = "store.delete", skip(self))]
            async fn delete(&self, id: $crate::types::PlantId) -> $crate::Result<u64> {
                let result = sqlx::query(&self.queries.delete)
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
                Ok(result.rows_affected())
            }
        }
    };
}

pub mod postgres;
pub mod schema;
pub mod sqlite;

pub use postgres::{PostgresConfig, PostgresStore};
pub use sqlite::{SqliteConfig, SqliteStore};

/// Plant store trait
///
/// Every method is a single statement against the backing database. The
/// store is shared by all request handlers; thread-safety of concurrent use
/// is the driver pool's concern.
#[async_trait]
pub trait PlantStore: Send + Sync {
    /// Short backend name used in logs and health output
    fn backend_name(&self) -> &'static str;

    /// Create the plants table if it does not exist
    async fn ensure_schema(&self) -> Result<()>;

    /// Round-trip a trivial statement
    async fn ping(&self) -> Result<()>;

    /// Insert a new row and return it with the assigned id
    async fn create(&self, plant: NewPlant) -> Result<Plant>;

    /// Fetch every row
    async fn list(&self) -> Result<Vec<Plant>>;

    /// Fetch one row by id. Missing rows are [`crate::Error::NotFound`].
    async fn get(&self, id: PlantId) -> Result<Plant>;

    /// Insert or overwrite the row with `plant.id`
    async fn save(&self, plant: &Plant) -> Result<Plant>;

    /// Delete by id, returning the number of rows removed
    async fn delete(&self, id: PlantId) -> Result<u64>;
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Postgres(PostgresConfig),
    Sqlite(SqliteConfig),
}

/// Create storage backend from config
pub async fn create_store(config: StorageConfig) -> Result<Box<dyn PlantStore>> {
    match config {
        StorageConfig::Postgres(config) => {
            let store = PostgresStore::connect(&config).await?;
            Ok(Box::new(store))
        }
        StorageConfig::Sqlite(config) => {
            let store = SqliteStore::connect(&config).await?;
            Ok(Box::new(store))
        }
    }
}
