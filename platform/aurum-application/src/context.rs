use crate::config::Config;
use crate::ingestion::IngestionService;
use crate::pricing::PriceQueryService;
use aurum_domain::repositories::quote_source::QuoteSource;
use aurum_domain::repositories::quote_store::QuoteStore;
use std::sync::Arc;

/// Process-wide handles built once at startup and passed to every service.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<dyn QuoteStore>,
    pub source: Arc<dyn QuoteSource>,
}

impl AppContext {
    pub fn new(config: Config, store: Arc<dyn QuoteStore>, source: Arc<dyn QuoteSource>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            source,
        }
    }

    /// Creates tables and seeds the configured catalog. Failure here is fatal.
    pub fn ensure_schema(&self) -> Result<(), String> {
        self.store
            .ensure_schema(&self.config.catalog)
            .map_err(|err| format!("failed to ensure schema: {err}"))
    }

    pub fn ingestion_service(&self) -> Result<IngestionService, String> {
        IngestionService::new(
            self.source.clone(),
            self.store.clone(),
            self.config.batch_cap(),
            self.config.timestamp_layout(),
        )
    }

    pub fn price_service(&self) -> PriceQueryService {
        PriceQueryService::new(self.store.clone())
    }
}
