use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sqlx::postgres::PgSslMode;

use crate::storage::{PostgresConfig, SqliteConfig, StorageConfig};

pub const DEFAULT_COLLECTOR_ENDPOINT: &str = "http://localhost:4317";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Top-level application configuration loaded from file + environment.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageSection,
    pub logging: LoggingSection,
    pub tracing: TracingSection,
}

impl AppConfig {
    /// Load configuration from disk and environment.
    pub fn load() -> Result<Self> {
        let config_path = env::var("PLANTS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(Path::new(&config_path), |key| env::var(key).ok())
    }

    /// Load from `path` (skipped when missing) and `PLANTS_*`, then overlay
    /// the legacy variables resolved through `legacy_env`.
    pub fn load_from(path: &Path, legacy_env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if path.exists() {
            builder = builder.add_source(config::File::from(PathBuf::from(path)));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PLANTS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;
        let mut config: Self = settings.try_deserialize()?;

        config.apply_legacy_env(legacy_env);

        if config.logging.level.trim().is_empty() {
            config.logging.level = "info".to_string();
        }

        Ok(config)
    }

    /// Overlay the variable names the service was first deployed with.
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let pg = &mut self.storage.postgres;
        let fields: [(&str, &mut String); 6] = [
            ("DB_HOST", &mut pg.host),
            ("DB_PORT", &mut pg.port),
            ("DB_USER", &mut pg.user),
            ("DB_PASSWORD", &mut pg.password),
            ("DB_NAME", &mut pg.dbname),
            ("DB_SSLMODE", &mut pg.sslmode),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }

        if let Some(endpoint) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.tracing.endpoint = endpoint;
            }
        }
    }

    /// Resolve the storage backend settings.
    pub fn storage_runtime(&self) -> Result<StorageConfig> {
        self.storage.to_runtime()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageSection {
    pub backend: StorageBackendKind,
    pub postgres: PostgresSection,
    pub sqlite: SqliteSection,
}

impl StorageSection {
    pub fn to_runtime(&self) -> Result<StorageConfig> {
        match self.backend {
            StorageBackendKind::Postgres => {
                let pg = &self.postgres;

                if pg.host.trim().is_empty() {
                    bail!("storage.postgres.host must be specified");
                }
                if pg.user.trim().is_empty() {
                    bail!("storage.postgres.user must be specified");
                }
                if pg.dbname.trim().is_empty() {
                    bail!("storage.postgres.dbname must be specified");
                }

                let port = pg
                    .port
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("invalid storage.postgres.port {:?}", pg.port))?;

                let sslmode = match pg.sslmode.trim() {
                    "" => None,
                    mode => Some(
                        mode.parse::<PgSslMode>()
                            .with_context(|| format!("invalid storage.postgres.sslmode {:?}", mode))?,
                    ),
                };

                Ok(StorageConfig::Postgres(PostgresConfig {
                    host: pg.host.trim().to_string(),
                    port,
                    user: pg.user.clone(),
                    password: pg.password.clone(),
                    dbname: pg.dbname.clone(),
                    sslmode,
                    max_connections: pg.max_connections.max(1),
                }))
            }
            StorageBackendKind::Sqlite => {
                let url = match self.sqlite.path.trim() {
                    "" => SqliteConfig::default().url,
                    path if path.starts_with("sqlite:") => path.to_string(),
                    path => format!("sqlite://{}", path),
                };
                Ok(StorageConfig::Sqlite(SqliteConfig { url }))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Postgres,
    Sqlite,
}

/// Raw PostgreSQL settings. Kept as strings so the legacy `DB_*`
/// variables can be applied verbatim before validation.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct PostgresSection {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
    pub max_connections: u32,
}

impl Default for PostgresSection {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: String::new(),
            user: String::new(),
            password: String::new(),
            dbname: String::new(),
            sslmode: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl std::fmt::Debug for PostgresSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("sslmode", &self.sslmode)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SqliteSection {
    /// File path or `sqlite:` URL; empty means in-memory
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingSection {
    pub enabled: bool,
    pub endpoint: String,
    pub service_name: String,
}

impl Default for TracingSection {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_COLLECTOR_ENDPOINT.to_string(),
            service_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}
