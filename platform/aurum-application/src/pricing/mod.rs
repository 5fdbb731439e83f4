use aurum_domain::repositories::quote_store::{QuoteStore, StoreError};
use aurum_domain::services::pricing::{compute_price, validate_multiplier, PricingError};
use aurum_domain::value_objects::price_quote::PriceQuote;
use aurum_domain::value_objects::quote::ProductId;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum PriceQueryError {
    InvalidInput(String),
    PriceUnavailable(ProductId),
    Store(String),
}

impl std::fmt::Display for PriceQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceQueryError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            PriceQueryError::PriceUnavailable(product_id) => {
                write!(f, "price not found for product {product_id}")
            }
            PriceQueryError::Store(msg) => write!(f, "store: {msg}"),
        }
    }
}

impl std::error::Error for PriceQueryError {}

/// Read-only price lookup. Every call re-reads the store; it never triggers a fetch.
pub struct PriceQueryService {
    store: Arc<dyn QuoteStore>,
}

impl PriceQueryService {
    pub fn new(store: Arc<dyn QuoteStore>) -> Self {
        Self { store }
    }

    pub fn quote(
        &self,
        product_id: ProductId,
        gram: Decimal,
        factor: Decimal,
    ) -> Result<PriceQuote, PriceQueryError> {
        let gram = validate_multiplier("gram", gram).map_err(invalid_input)?;
        let factor = validate_multiplier("factor", factor).map_err(invalid_input)?;

        let latest = match self.store.latest_quote(product_id) {
            Ok(quote) => quote,
            Err(StoreError::NotFound(_)) => {
                metrics::counter!("aurum.app.price_queries_total", "result" => "unavailable")
                    .increment(1);
                return Err(PriceQueryError::PriceUnavailable(product_id));
            }
            Err(err) => {
                metrics::counter!("aurum.app.price_queries_total", "result" => "store_err")
                    .increment(1);
                tracing::error!(product_id, error = %err, "latest quote lookup failed");
                return Err(PriceQueryError::Store(err.to_string()));
            }
        };

        let amount = compute_price(gram, latest.sell_price, factor).map_err(invalid_input)?;
        metrics::counter!("aurum.app.price_queries_total", "result" => "ok").increment(1);
        tracing::debug!(
            product_id,
            sell_price = %latest.sell_price,
            observed_at = %latest.observed_at,
            amount = %amount,
            "computed price"
        );

        Ok(PriceQuote {
            product_id,
            gram,
            factor,
            sell_price: latest.sell_price,
            observed_at: latest.observed_at,
            amount,
        })
    }
}

fn invalid_input(err: PricingError) -> PriceQueryError {
    PriceQueryError::InvalidInput(err.to_string())
}
