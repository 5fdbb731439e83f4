use aurum_domain::entities::product::Product;
use aurum_domain::services::timestamps::TimestampLayout;
use aurum_infrastructure::persistence::validate_table_name;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_BATCH_CAP: usize = 8;
pub const DEFAULT_QUOTES_TABLE: &str = "quotes";
pub const DEFAULT_PRODUCTS_TABLE: &str = "products";
pub const DEFAULT_POOL_MAX_SIZE: u32 = 8;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DB_URL_ENV: &str = "AURUM_DB_URL";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub source: SourceConfig,
    pub db: DbConfig,
    pub ingest: Option<IngestConfig>,
    pub server: Option<ServerConfig>,
    pub log: Option<LogConfig>,
    #[serde(default)]
    pub catalog: Vec<Product>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_ms: Option<u64>,
    pub timestamp_layout: Option<TimestampLayout>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    pub backend: Option<DbBackend>,
    pub url: Option<String>,
    pub quotes_table: Option<String>,
    pub products_table: Option<String>,
    pub pool_max_size: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    pub interval_secs: Option<u64>,
    pub batch_cap: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl Config {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    pub fn timestamp_layout(&self) -> TimestampLayout {
        self.source.timestamp_layout.unwrap_or_default()
    }

    pub fn ingest_interval(&self) -> Duration {
        let secs = self
            .ingest
            .as_ref()
            .and_then(|ingest| ingest.interval_secs)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// Maximum number of upstream records persisted per ingestion cycle.
    pub fn batch_cap(&self) -> usize {
        self.ingest
            .as_ref()
            .and_then(|ingest| ingest.batch_cap)
            .unwrap_or(DEFAULT_BATCH_CAP)
    }

    pub fn db_backend(&self) -> DbBackend {
        self.db.backend.unwrap_or_default()
    }

    pub fn quotes_table(&self) -> &str {
        self.db.quotes_table.as_deref().unwrap_or(DEFAULT_QUOTES_TABLE)
    }

    pub fn products_table(&self) -> &str {
        self.db
            .products_table
            .as_deref()
            .unwrap_or(DEFAULT_PRODUCTS_TABLE)
    }

    pub fn pool_max_size(&self) -> u32 {
        self.db.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    pub fn bind_addr(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|server| server.bind_addr.as_deref())
            .unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn log_level(&self) -> &str {
        self.log
            .as_ref()
            .and_then(|log| log.level.as_deref())
            .unwrap_or("info")
    }

    pub fn log_format(&self) -> &str {
        self.log
            .as_ref()
            .and_then(|log| log.format.as_deref())
            .unwrap_or("text")
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.source.url.trim().is_empty() {
            return Err("source.url must not be empty".to_string());
        }
        if self.source.timeout_ms == Some(0) {
            return Err("source.timeout_ms must be >= 1".to_string());
        }
        if self.ingest_interval().is_zero() {
            return Err("ingest.interval_secs must be >= 1".to_string());
        }
        if self.batch_cap() == 0 {
            return Err("ingest.batch_cap must be >= 1".to_string());
        }
        if self.pool_max_size() == 0 {
            return Err("db.pool_max_size must be >= 1".to_string());
        }
        validate_table_name(self.quotes_table())
            .map_err(|err| format!("invalid db.quotes_table: {err}"))?;
        validate_table_name(self.products_table())
            .map_err(|err| format!("invalid db.products_table: {err}"))?;

        let mut seen = HashSet::new();
        for product in &self.catalog {
            if !seen.insert(product.id) {
                return Err(format!("duplicate catalog product id: {}", product.id));
            }
            if product.name.trim().is_empty() {
                return Err(format!("catalog product {} has an empty name", product.id));
            }
        }
        Ok(())
    }

    /// `db.url` when set, otherwise env `AURUM_DB_URL`.
    pub fn resolve_db_url(&self) -> Result<String, String> {
        match self.db.url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(url.to_string()),
            _ => env::var(DB_URL_ENV)
                .ok()
                .filter(|url| !url.trim().is_empty())
                .ok_or_else(|| format!("missing db.url in config and env {DB_URL_ENV} is not set")),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    parse_config(&contents).map_err(|err| format!("invalid config {}: {}", path.display(), err))
}

pub fn parse_config(contents: &str) -> Result<Config, String> {
    let config: Config =
        toml::from_str(contents).map_err(|err| format!("failed to parse TOML: {err}"))?;
    config.validate()?;
    Ok(config)
}
