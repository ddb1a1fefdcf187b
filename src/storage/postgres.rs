//! PostgreSQL plant store

use std::fmt;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};

use crate::Result;

use super::schema::{Dialect, Queries};

/// Connection settings for the PostgreSQL backend
#[derive(Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    /// `None` leaves the driver default (`prefer`)
    pub sslmode: Option<PgSslMode>,
    pub max_connections: u32,
}

impl PostgresConfig {
    /// Build driver connect options from the named settings.
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.dbname);

        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if let Some(mode) = self.sslmode {
            options = options.ssl_mode(mode);
        }

        options
    }
}

// Keyword/value form with the password masked, safe to log.
impl fmt::Display for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={} port={} user={} dbname={} password={} sslmode={}",
            self.host,
            self.port,
            self.user,
            self.dbname,
            if self.password.is_empty() { "" } else { "***" },
            self.sslmode.map(sslmode_name).unwrap_or("")
        )
    }
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PostgresConfig({})", self)
    }
}

fn sslmode_name(mode: PgSslMode) -> &'static str {
    match mode {
        PgSslMode::Disable => "disable",
        PgSslMode::Allow => "allow",
        PgSslMode::Prefer => "prefer",
        PgSslMode::Require => "require",
        PgSslMode::VerifyCa => "verify-ca",
        PgSslMode::VerifyFull => "verify-full",
    }
}

/// PostgreSQL-backed plant store
pub struct PostgresStore {
    pool: PgPool,
    queries: Queries,
}

impl PostgresStore {
    /// Open a connection pool. No retry: a failure here is fatal to startup.
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        tracing::info!(dsn = %config, "Connecting to PostgreSQL");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            queries: Queries::for_dialect(Dialect::Postgres),
        }
    }
}

impl_plant_store!(PostgresStore, "postgres");

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> PostgresConfig {
        PostgresConfig {
            host: "localhost".into(),
            port: 5432,
            user: "user".into(),
            password: "password".into(),
            dbname: "testdb".into(),
            sslmode: Some(PgSslMode::Disable),
            max_connections: 10,
        }
    }

    #[test]
    fn display_masks_password() {
        assert_eq!(
            full_config().to_string(),
            "host=localhost port=5432 user=user dbname=testdb password=*** sslmode=disable"
        );
    }

    #[test]
    fn display_with_partial_config() {
        let config = PostgresConfig {
            password: String::new(),
            sslmode: None,
            ..full_config()
        };
        assert_eq!(
            config.to_string(),
            "host=localhost port=5432 user=user dbname=testdb password= sslmode="
        );
    }

    #[test]
    fn debug_never_prints_password() {
        let rendered = format!("{:?}", full_config());
        assert!(!rendered.contains("password=password"));
    }

    #[test]
    fn connect_options_carry_named_values() {
        let options = full_config().connect_options();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "user");
        assert_eq!(options.get_database(), Some("testdb"));
    }

    #[tokio::test]
    async fn connect_fails_without_a_server() {
        // Port 1 on loopback refuses connections.
        let config = PostgresConfig {
            port: 1,
            ..full_config()
        };
        let options = config.connect_options();
        let result = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect_with(options)
            .await;
        assert!(result.is_err());
    }
}
