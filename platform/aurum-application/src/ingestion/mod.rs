use aurum_domain::repositories::quote_source::{FetchError, QuoteSource, RawQuote};
use aurum_domain::repositories::quote_store::QuoteStore;
use aurum_domain::services::timestamps::{normalize_observed_at, TimestampLayout};
use aurum_domain::value_objects::quote::Quote;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one fetch-normalize-persist pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub fetched: usize,
    pub attempted: usize,
    pub inserted: usize,
    pub failed: usize,
    pub dropped: usize,
    pub timestamp_fallbacks: usize,
}

/// The only writer of the quote store. Each call to [`IngestionService::run_cycle`]
/// persists at most `batch_cap` records, one independent insert per record.
pub struct IngestionService {
    source: Arc<dyn QuoteSource>,
    store: Arc<dyn QuoteStore>,
    batch_cap: usize,
    layout: TimestampLayout,
}

impl IngestionService {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        store: Arc<dyn QuoteStore>,
        batch_cap: usize,
        layout: TimestampLayout,
    ) -> Result<Self, String> {
        if batch_cap == 0 {
            return Err("batch_cap must be > 0".to_string());
        }
        Ok(Self {
            source,
            store,
            batch_cap,
            layout,
        })
    }

    pub fn batch_cap(&self) -> usize {
        self.batch_cap
    }

    pub fn run_cycle(&self) -> Result<CycleReport, FetchError> {
        let span = tracing::info_span!(
            "app.ingest.cycle",
            batch_cap = self.batch_cap,
            layout = self.layout.as_str()
        );
        let _enter = span.enter();
        let start = Instant::now();

        let batch = match self.source.fetch_batch() {
            Ok(batch) => batch,
            Err(err) => {
                metrics::counter!("aurum.ingest.cycles_total", "result" => "fetch_err")
                    .increment(1);
                tracing::warn!(error = %err, "quote fetch failed; skipping cycle");
                return Err(err);
            }
        };

        let mut report = CycleReport {
            fetched: batch.len(),
            ..CycleReport::default()
        };

        for raw in batch.into_iter().take(self.batch_cap) {
            report.attempted += 1;
            let (quote, fallback) = match self.normalize(&raw) {
                Ok(normalized) => normalized,
                Err(err) => {
                    report.failed += 1;
                    metrics::counter!("aurum.ingest.inserts_total", "result" => "invalid")
                        .increment(1);
                    tracing::warn!(product_id = raw.product_id, error = %err, "rejected quote");
                    continue;
                }
            };
            if fallback {
                report.timestamp_fallbacks += 1;
            }

            match self.store.insert(&quote) {
                Ok(()) => {
                    report.inserted += 1;
                    metrics::counter!("aurum.ingest.inserts_total", "result" => "ok").increment(1);
                }
                Err(err) => {
                    report.failed += 1;
                    metrics::counter!("aurum.ingest.inserts_total", "result" => "err")
                        .increment(1);
                    tracing::warn!(
                        product_id = quote.product_id,
                        observed_at = %quote.observed_at,
                        error = %err,
                        "quote insert failed"
                    );
                }
            }
        }
        report.dropped = report.fetched - report.attempted;

        metrics::counter!("aurum.ingest.cycles_total", "result" => "ok").increment(1);
        metrics::counter!("aurum.ingest.records_dropped_total").increment(report.dropped as u64);
        metrics::histogram!("aurum.ingest.cycle_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::info!(
            fetched = report.fetched,
            attempted = report.attempted,
            inserted = report.inserted,
            failed = report.failed,
            dropped = report.dropped,
            timestamp_fallbacks = report.timestamp_fallbacks,
            "ingestion cycle complete"
        );
        Ok(report)
    }

    fn normalize(&self, raw: &RawQuote) -> Result<(Quote, bool), String> {
        let (observed_at, fallback) = normalize_observed_at(&raw.updated_at, self.layout);
        if fallback {
            tracing::warn!(
                product_id = raw.product_id,
                updated_at = %raw.updated_at,
                "unparseable upstream timestamp; using sentinel"
            );
        }
        let quote = Quote::from_f64(raw.product_id, observed_at, raw.buy_price, raw.sell_price)?;
        Ok((quote, fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::IngestionService;
    use aurum_domain::entities::product::Product;
    use aurum_domain::repositories::quote_source::{FetchError, QuoteSource, RawQuote};
    use aurum_domain::repositories::quote_store::{QuoteStore, StoreError};
    use aurum_domain::services::timestamps::TimestampLayout;
    use aurum_domain::value_objects::quote::{ProductId, Quote};
    use std::sync::Arc;

    struct EmptySource;

    impl QuoteSource for EmptySource {
        fn fetch_batch(&self) -> Result<Vec<RawQuote>, FetchError> {
            Ok(Vec::new())
        }
    }

    struct NullStore;

    impl QuoteStore for NullStore {
        fn ensure_schema(&self, _catalog: &[Product]) -> Result<(), StoreError> {
            Ok(())
        }
        fn insert(&self, _quote: &Quote) -> Result<(), StoreError> {
            Ok(())
        }
        fn latest_quote(&self, product_id: ProductId) -> Result<Quote, StoreError> {
            Err(StoreError::NotFound(product_id))
        }
    }

    #[test]
    fn zero_batch_cap_is_rejected() {
        let result = IngestionService::new(
            Arc::new(EmptySource),
            Arc::new(NullStore),
            0,
            TimestampLayout::Auto,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_batch_produces_empty_report() {
        let service = IngestionService::new(
            Arc::new(EmptySource),
            Arc::new(NullStore),
            8,
            TimestampLayout::Auto,
        )
        .unwrap();
        let report = service.run_cycle().unwrap();
        assert_eq!(report, super::CycleReport::default());
    }
}
