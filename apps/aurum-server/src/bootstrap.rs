use aurum_application::config::{Config, DbBackend};
use aurum_application::context::AppContext;
use aurum_domain::repositories::quote_store::QuoteStore;
use aurum_infrastructure::market_data::http_feed::HttpQuoteSource;
use aurum_infrastructure::persistence::memory::InMemoryQuoteStore;
use aurum_infrastructure::persistence::postgres_quotes::PostgresQuoteStore;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

pub const CONFIG_ENV: &str = "AURUM_CONFIG";

pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Result<PathBuf, String> {
    cli_path
        .or_else(|| {
            env::var(CONFIG_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        })
        .ok_or_else(|| format!("missing --config and env {CONFIG_ENV} is not set"))
}

/// Builds the store and feed adapters. Must run outside the async runtime:
/// the Postgres pool and the blocking HTTP client own their own I/O threads.
pub fn build_context(config: Config) -> Result<AppContext, String> {
    let store = build_store(&config)?;
    let source = HttpQuoteSource::new(config.source.url.clone(), config.source_timeout())?;
    tracing::info!(
        backend = ?config.db_backend(),
        feed_url = %source.url(),
        batch_cap = config.batch_cap(),
        interval_secs = config.ingest_interval().as_secs(),
        timestamp_layout = config.timestamp_layout().as_str(),
        "context ready"
    );
    Ok(AppContext::new(config, store, Arc::new(source)))
}

fn build_store(config: &Config) -> Result<Arc<dyn QuoteStore>, String> {
    match config.db_backend() {
        DbBackend::Postgres => {
            let db_url = config.resolve_db_url()?;
            let store = PostgresQuoteStore::new(
                db_url,
                config.quotes_table().to_string(),
                config.products_table().to_string(),
                config.pool_max_size(),
            )?;
            Ok(Arc::new(store))
        }
        DbBackend::Memory => {
            tracing::warn!("using in-memory quote store; quotes are lost on restart");
            Ok(Arc::new(InMemoryQuoteStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_context, resolve_config_path};
    use aurum_application::config::parse_config;
    use std::path::PathBuf;

    #[test]
    fn resolve_config_path_prefers_cli_flag() {
        let path = resolve_config_path(Some(PathBuf::from("custom.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("custom.toml"));
    }

    #[test]
    fn build_context_with_memory_backend() {
        let config = parse_config(
            r#"
[source]
url = "http://127.0.0.1:1/feed"

[db]
backend = "memory"

[[catalog]]
id = 1
name = "Gram"
"#,
        )
        .unwrap();
        let context = build_context(config).expect("context");
        context.ensure_schema().expect("schema");
        assert!(context.price_service().quote(1, 1.into(), 1.into()).is_err());
    }

    #[test]
    fn invalid_table_is_rejected_at_config_load() {
        let err = parse_config(
            r#"
[source]
url = "http://127.0.0.1:1/feed"

[db]
url = "postgres://aurum@127.0.0.1:1/aurum"
quotes_table = "quotes;drop"
"#,
        )
        .expect_err("invalid table");
        assert!(err.contains("invalid db.quotes_table"));
    }
}
