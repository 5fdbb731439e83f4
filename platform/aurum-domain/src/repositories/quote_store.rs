use crate::entities::product::Product;
use crate::value_objects::quote::{ProductId, Quote};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Connection(String),
    Schema(String),
    Insert(String),
    Query(String),
    NotFound(ProductId),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "connection: {msg}"),
            StoreError::Schema(msg) => write!(f, "schema: {msg}"),
            StoreError::Insert(msg) => write!(f, "insert: {msg}"),
            StoreError::Query(msg) => write!(f, "query: {msg}"),
            StoreError::NotFound(product_id) => {
                write!(f, "no quote found for product {product_id}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Append-only quote log keyed by `(product_id, observed_at)`.
///
/// Every call is an independent atomic unit: readers see either the state
/// before or after a given insert, never a partial row.
pub trait QuoteStore: Send + Sync {
    /// Idempotently creates the catalog and quote tables and seeds `catalog`.
    fn ensure_schema(&self, catalog: &[Product]) -> Result<(), StoreError>;

    fn insert(&self, quote: &Quote) -> Result<(), StoreError>;

    /// Row with the greatest `observed_at` for `product_id`.
    fn latest_quote(&self, product_id: ProductId) -> Result<Quote, StoreError>;

    fn latest_sell_price(&self, product_id: ProductId) -> Result<Decimal, StoreError> {
        self.latest_quote(product_id).map(|quote| quote.sell_price)
    }
}
